//! Standard PDF fonts: resource naming, WinAnsi encoding and advance widths.
//!
//! The PDF writer only uses the base-14 families so no font file is embedded.
//! Widths come from the Adobe AFM tables (ASCII range); accented Latin-1
//! letters are measured like their base letter, which is close enough for
//! alignment.

/// Base-14 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Map a template font name onto a base-14 family.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "times" | "times new roman" | "times-roman" | "serif" => Self::Times,
            "courier" | "courier new" | "monospace" => Self::Courier,
            _ => Self::Helvetica,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Helvetica => 0,
            Self::Times => 1,
            Self::Courier => 2,
        }
    }
}

/// One concrete face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

/// Base font names in resource order (`/F1` .. `/F12`).
pub const BASE_FONTS: [&str; 12] = [
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
];

impl Font {
    pub fn new(family: FontFamily, bold: bool, italic: bool) -> Self {
        Self {
            family,
            bold,
            italic,
        }
    }

    pub fn regular(family: FontFamily) -> Self {
        Self::new(family, false, false)
    }

    /// Resource name without the leading slash, e.g. `F2`.
    pub fn resource(&self) -> String {
        let idx = self.family.index() * 4 + usize::from(self.bold) + 2 * usize::from(self.italic);
        format!("F{}", idx + 1)
    }

    /// Advance width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        f64::from(units) * size / 1000.0
    }

    fn char_width(&self, c: char) -> u16 {
        if self.family == FontFamily::Courier {
            return 600;
        }
        let base = fold_accent(c);
        let helvetica = if (' '..='~').contains(&base) {
            let i = base as usize - 32;
            if self.bold { HELVETICA_BOLD[i] } else { HELVETICA[i] }
        } else {
            556
        };
        match self.family {
            // Times runs narrower than Helvetica; scale rather than carry a
            // third table.
            FontFamily::Times => (f64::from(helvetica) * 0.9) as u16,
            _ => helvetica,
        }
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        '\u{a0}' | '\u{202f}' | '\u{2009}' => ' ',
        '’' | '‘' => '\'',
        other => other,
    }
}

/// Encode one character as a WinAnsi byte; unmappable characters become `?`.
pub fn win_ansi(c: char) -> u8 {
    let code = c as u32;
    match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        '\u{202f}' | '\u{2009}' => 0xA0,
        '\t' | '\n' | '\r' => b' ',
        _ if (0x20..0x7F).contains(&code) || (0xA0..=0xFF).contains(&code) => code as u8,
        _ => b'?',
    }
}

/// Escape text for a PDF string literal. The result is pure ASCII: WinAnsi
/// bytes above 0x7E are written as octal escapes.
pub fn pdf_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match win_ansi(c) {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b @ 0x20..=0x7E => out.push(b as char),
            b => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_escape() {
        assert_eq!(pdf_escape("hello"), "hello");
        assert_eq!(pdf_escape("(test)"), "\\(test\\)");
        assert_eq!(pdf_escape("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_pdf_escape_latin1_as_octal() {
        assert_eq!(pdf_escape("é"), "\\351");
        assert_eq!(pdf_escape("€"), "\\200");
        assert_eq!(pdf_escape("1\u{202f}000"), "1\\240000");
        assert_eq!(pdf_escape("漢"), "?");
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(Font::regular(FontFamily::Helvetica).resource(), "F1");
        assert_eq!(Font::new(FontFamily::Helvetica, true, false).resource(), "F2");
        assert_eq!(Font::new(FontFamily::Helvetica, true, true).resource(), "F4");
        assert_eq!(Font::new(FontFamily::Times, false, true).resource(), "F7");
        assert_eq!(Font::new(FontFamily::Courier, true, true).resource(), "F12");
        assert_eq!(BASE_FONTS[6], "Times-Italic");
    }

    #[test]
    fn test_text_width() {
        let f = Font::regular(FontFamily::Helvetica);
        assert!((f.text_width("0", 10.0) - 5.56).abs() < 1e-9);
        assert!(f.text_width("WWW", 10.0) > f.text_width("iii", 10.0));
        let bold = Font::new(FontFamily::Helvetica, true, false);
        assert!(bold.text_width("bold", 10.0) > f.text_width("bold", 10.0));
        assert_eq!(Font::regular(FontFamily::Courier).text_width("ab", 10.0), 12.0);
        assert_eq!(f.text_width("é", 10.0), f.text_width("e", 10.0));
    }

    #[test]
    fn test_family_from_name() {
        assert_eq!(FontFamily::from_name("Times"), FontFamily::Times);
        assert_eq!(FontFamily::from_name("arial"), FontFamily::Helvetica);
        assert_eq!(FontFamily::from_name("courier"), FontFamily::Courier);
    }
}
