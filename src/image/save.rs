//! Image encoding and saving utilities.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Save an RGBA buffer as a PNG file.
///
/// Parent directories are created if missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot be written.
pub fn save_png<P: AsRef<Path>>(img: &RgbaImage, path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    img.save_with_format(path, ImageFormat::Png)
        .map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}

/// Encode an RGBA buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`Error::ImageEncode`] if encoding fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)
        .map_err(|source| Error::ImageEncode { source })?;
    Ok(bytes.into_inner())
}

/// Encode an RGBA buffer as a `data:image/png;base64,` URL.
///
/// # Errors
///
/// Returns [`Error::ImageEncode`] if encoding fails.
pub fn to_data_url(img: &RgbaImage) -> Result<String> {
    let png = encode_png(img)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::decode_data_url;
    use image::Rgba;

    #[test]
    fn test_data_url_preserves_alpha() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(2, 1, Rgba([10, 20, 30, 40]));

        let url = to_data_url(&img).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let back = decode_data_url(&url).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_png_signature() {
        let png = encode_png(&RgbaImage::new(1, 1)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
