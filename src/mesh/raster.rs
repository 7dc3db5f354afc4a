use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, ViewerError};

/// Row-major RGBA8 image, immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Wraps encoded image bytes as a `data:<mime>;base64,` URL, sniffing the
/// format from the bytes.
pub fn encode_data_url(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes)?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ViewerError::InvalidRaster {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds an image where every pixel is produced by `f(x, y)`.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }

        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    /// Decodes a `data:<mime>;base64,<payload>` string.
    pub fn decode_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ViewerError::data_url("missing `data:` scheme"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ViewerError::data_url("missing `,` separator"))?;

        if !header.ends_with(";base64") {
            return Err(ViewerError::data_url(format!(
                "unsupported encoding in header `{header}`"
            )));
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ViewerError::data_url(e.to_string()))?;

        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_url(image: &RasterImage) -> String {
        let buffer =
            image::RgbaImage::from_raw(image.width(), image.height(), image.pixels().to_vec())
                .unwrap();
        let mut bytes = std::io::Cursor::new(Vec::new());
        buffer
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        encode_data_url(&bytes.into_inner()).unwrap()
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = RasterImage::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::InvalidRaster {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn pixel_is_row_major() {
        let image = RasterImage::from_fn(3, 2, |x, y| [x as u8, y as u8, 7, 255]);
        assert_eq!(image.pixel(2, 1), [2, 1, 7, 255]);
        assert_eq!(image.pixel(0, 1), [0, 1, 7, 255]);
    }

    #[test]
    fn decodes_png_data_url() {
        let source = RasterImage::from_fn(4, 3, |x, y| [x as u8 * 10, y as u8 * 20, 30, 255]);
        let decoded = RasterImage::decode_data_url(&png_data_url(&source)).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn encoded_url_carries_sniffed_mime() {
        let url = png_data_url(&RasterImage::from_fn(1, 1, |_, _| [0, 0, 0, 255]));
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn encoding_unknown_bytes_fails() {
        assert!(encode_data_url(b"plain text").is_err());
    }

    #[test]
    fn rejects_non_data_url() {
        let err = RasterImage::decode_data_url("https://example.com/a.png").unwrap_err();
        assert!(matches!(err, ViewerError::DataUrl { .. }));
    }

    #[test]
    fn rejects_non_base64_payload() {
        let err = RasterImage::decode_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, ViewerError::DataUrl { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"not a png"));
        let err = RasterImage::decode_data_url(&url).unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)));
    }
}
