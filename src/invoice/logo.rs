//! Company logo loading.
//!
//! The logo is optional: any failure to read or decode it is logged and the
//! document is rendered without it.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageReader;
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogoError {
    #[error("failed to read logo: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode logo: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded logo ready to embed as an image XObject.
#[derive(Debug, Clone)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    /// Zlib-compressed RGB samples.
    pub data: Vec<u8>,
}

impl LogoImage {
    /// Decode a PNG or JPEG file. Transparent pixels are blended onto white.
    pub fn load(path: &Path) -> Result<Self, LogoError> {
        let bytes = std::fs::read(path)?;
        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in rgba.pixels() {
            let alpha = pixel[3] as f32 / 255.0;
            for channel in &pixel.0[..3] {
                rgb.push((*channel as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8);
            }
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&rgb)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Load the logo, logging and swallowing any failure.
    pub fn load_optional(path: &Path) -> Option<Self> {
        match Self::load(path) {
            Ok(logo) => {
                log::debug!(
                    "Loaded logo {} ({}x{})",
                    path.display(),
                    logo.width,
                    logo.height
                );
                Some(logo)
            }
            Err(e) => {
                log::warn!("Logo unavailable at {}, rendering without it: {}", path.display(), e);
                None
            }
        }
    }

    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", 8_i64);
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

        Stream::new(dict, self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_logo_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");

        assert!(matches!(LogoImage::load(&path), Err(LogoError::Io(_))));
        assert!(LogoImage::load_optional(&path).is_none());
    }

    #[test]
    fn test_garbage_logo_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(LogoImage::load_optional(&path).is_none());
    }

    #[test]
    fn test_png_logo_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let logo = LogoImage::load(&path).unwrap();
        assert_eq!((logo.width, logo.height), (4, 2));

        let stream = logo.to_pdf_stream();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 4);
        assert_eq!(
            stream.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"FlateDecode"
        );
    }
}
