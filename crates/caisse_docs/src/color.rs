/// An sRGB colour parsed from the template's `#rrggbb` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Parse `#rgb` / `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Parse, falling back to `fallback` on malformed input.
    pub fn parse_or(hex: &str, fallback: Rgb) -> Self {
        Self::from_hex(hex).unwrap_or(fallback)
    }

    /// Mix toward white: at 100 % the colour is unchanged, lower opacities
    /// move every channel closer to 255.
    pub fn blend_toward_white(&self, opacity_percent: f64) -> Self {
        let alpha = (opacity_percent / 100.0).clamp(0.0, 1.0);
        let mix = |c: u8| (255.0 - (255.0 - f64::from(c)) * alpha).round() as u8;
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Upper-case `RRGGBB` as used by OOXML attributes.
    pub fn to_ooxml(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Packed `0xRRGGBB`.
    pub fn to_u32(&self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// PDF colour operands (`r g b`) in the 0–1 range.
    pub fn pdf_operands(&self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb { r: 255, g: 128, b: 0 }));
        assert_eq!(Rgb::from_hex("0f0"), Some(Rgb { r: 0, g: 255, b: 0 }));
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::parse_or("bad", Rgb::BLACK), Rgb::BLACK);
    }

    #[test]
    fn test_blend_is_monotonic() {
        let base = Rgb::from_hex("#336699").unwrap();
        let mut previous = Rgb::WHITE;
        for opacity in [5.0, 25.0, 50.0, 75.0, 100.0] {
            let c = base.blend_toward_white(opacity);
            assert!(c.r <= previous.r && c.g <= previous.g && c.b <= previous.b);
            previous = c;
        }
        assert_eq!(base.blend_toward_white(100.0), base);
        let faint = base.blend_toward_white(5.0);
        assert!(faint.r > 240 && faint.g > 240 && faint.b > 240);
    }

    #[test]
    fn test_hex_outputs() {
        let c = Rgb { r: 10, g: 20, b: 255 };
        assert_eq!(c.to_hex(), "#0a14ff");
        assert_eq!(c.to_ooxml(), "0A14FF");
        assert_eq!(c.to_u32(), 0x0A14FF);
        assert_eq!(Rgb::WHITE.pdf_operands(), "1.000 1.000 1.000");
    }
}
