//! Logo and watermark image loading.
//!
//! Images are optional decoration: a source that cannot be fetched or decoded
//! is logged and skipped, the report is still produced.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

/// Fetches the raw bytes behind an image source string.
pub trait ImageLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>>;
}

/// Resolves `data:` URLs, local paths and, when allowed, `http(s)` URLs.
#[derive(Debug, Clone)]
pub struct DefaultImageLoader {
    pub allow_remote: bool,
    pub timeout: Duration,
}

impl Default for DefaultImageLoader {
    fn default() -> Self {
        Self {
            allow_remote: true,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ImageLoader for DefaultImageLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>> {
        let src = src.trim();
        if src.is_empty() {
            bail!("Empty image source");
        }
        if src.starts_with("data:") {
            return decode_data_url(src);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            if !self.allow_remote {
                bail!("Remote images are disabled: {src}");
            }
            let client = reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .build()
                .context("Failed to build HTTP client")?;
            let response = client
                .get(src)
                .send()
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Failed to fetch image {src}"))?;
            let bytes = response
                .bytes()
                .with_context(|| format!("Failed to read image body {src}"))?;
            return Ok(bytes.to_vec());
        }
        let path = src.strip_prefix("file://").unwrap_or(src);
        std::fs::read(Path::new(path)).with_context(|| format!("Failed to read image file {path}"))
    }
}

/// Decode the payload of a `data:[mime][;base64],payload` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url.strip_prefix("data:").context("Not a data URL")?;
    let (meta, payload) = rest.split_once(',').context("Malformed data URL")?;
    if meta.ends_with(";base64") {
        BASE64
            .decode(payload.trim())
            .context("Invalid base64 in data URL")
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// A decoded 8-bit RGB image, alpha already flattened onto white.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterImage {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).context("Failed to decode image")?;
        Ok(Self::from_dynamic(&img))
    }

    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            let alpha = f64::from(a) / 255.0;
            for c in [r, g, b] {
                rgb.push((f64::from(c) * alpha + 255.0 * (1.0 - alpha)).round() as u8);
            }
        }
        Self { width, height, rgb }
    }

    /// Height / width.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 {
            1.0
        } else {
            f64::from(self.height) / f64::from(self.width)
        }
    }

    /// Copy with every pixel blended toward white, same rule as text colours.
    pub fn faded(&self, opacity_percent: f64) -> Self {
        let alpha = (opacity_percent / 100.0).clamp(0.0, 1.0);
        Self {
            width: self.width,
            height: self.height,
            rgb: self
                .rgb
                .iter()
                .map(|&c| (255.0 - (255.0 - f64::from(c)) * alpha).round() as u8)
                .collect(),
        }
    }
}

/// Load and decode `src`, or log why not and return `None`.
pub fn load_image(loader: &dyn ImageLoader, src: &str) -> Option<RasterImage> {
    let result = loader.load(src).and_then(|bytes| RasterImage::decode(&bytes));
    match result {
        Ok(img) => {
            debug!(width = img.width, height = img.height, "Image loaded");
            Some(img)
        }
        Err(e) => {
            warn!("Skipping image {}: {e:#}", short_source(src));
            None
        }
    }
}

fn short_source(src: &str) -> String {
    if src.starts_with("data:") {
        src.split(',').next().unwrap_or("data:").to_string()
    } else {
        src.to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// A small opaque PNG encoded as a data URL.
    pub(crate) fn png_data_url(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 30, 30]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(buf.into_inner()))
    }

    struct FailingLoader;

    impl ImageLoader for FailingLoader {
        fn load(&self, _src: &str) -> Result<Vec<u8>> {
            bail!("network down")
        }
    }

    #[test]
    fn test_data_url_roundtrip() {
        let url = png_data_url(4, 2);
        let img = load_image(&DefaultImageLoader::default(), &url).unwrap();
        assert_eq!((img.width, img.height), (4, 2));
        assert_eq!(img.rgb.len(), 4 * 2 * 3);
        assert_eq!(&img.rgb[0..3], &[200, 30, 30]);
        assert!((img.aspect() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_failures_are_not_fatal() {
        assert!(load_image(&FailingLoader, "http://example.invalid/logo.png").is_none());
        assert!(load_image(&DefaultImageLoader::default(), "data:image/png;base64,!!!").is_none());
        assert!(load_image(&DefaultImageLoader::default(), "/nonexistent/logo.png").is_none());
        assert!(load_image(&DefaultImageLoader::default(), "").is_none());
    }

    #[test]
    fn test_remote_can_be_disabled() {
        let loader = DefaultImageLoader {
            allow_remote: false,
            ..Default::default()
        };
        let err = loader.load("https://example.com/logo.png").unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_plain_data_url() {
        assert_eq!(decode_data_url("data:text/plain,abc").unwrap(), b"abc");
        assert!(decode_data_url("data:nocomma").is_err());
    }

    #[test]
    fn test_faded_moves_toward_white() {
        let img = RasterImage {
            width: 1,
            height: 1,
            rgb: vec![0, 100, 255],
        };
        assert_eq!(img.faded(100.0).rgb, vec![0, 100, 255]);
        let faded = img.faded(10.0);
        assert!(faded.rgb[0] > 200 && faded.rgb[1] > 200);
        assert_eq!(faded.rgb[2], 255);
    }

    #[test]
    fn test_file_loader_reads_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.bin");
        std::fs::write(&path, b"xyz").unwrap();
        let bytes = DefaultImageLoader::default().load(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"xyz");
    }
}
