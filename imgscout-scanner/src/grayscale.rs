use crate::error::Result;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{error, info};

/// Convert encoded image bytes to grayscale, re-encoded in the same format.
///
/// Luminance and alpha are kept where the target encoder can store them;
/// JPEG drops alpha, and encoders without native gray support get the gray
/// values expanded back to RGBA.
pub fn convert_to_grayscale(bytes: &[u8]) -> Result<Vec<u8>> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let gray = DynamicImage::ImageLumaA8(decoded.to_luma_alpha8());

    let encodable = match format {
        ImageFormat::Png | ImageFormat::Bmp => gray,
        ImageFormat::Jpeg => DynamicImage::ImageLuma8(gray.to_luma8()),
        _ => DynamicImage::ImageRgba8(gray.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::with_capacity(bytes.len()));
    encodable.write_to(&mut out, format)?;
    Ok(out.into_inner())
}

/// Bytes to store for an image, and whether they were actually converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grayscaled {
    pub bytes: Vec<u8>,
    pub converted: bool,
}

/// Grayscale conversion that never fails: on any codec error the original
/// bytes come back unchanged with `converted` unset.
pub fn grayscale_or_original(bytes: Vec<u8>) -> Grayscaled {
    match convert_to_grayscale(&bytes) {
        Ok(converted) => {
            info!("Successfully converted image to grayscale");
            Grayscaled {
                bytes: converted,
                converted: true,
            }
        }
        Err(e) => {
            error!("Error converting image to grayscale: {}", e);
            Grayscaled {
                bytes,
                converted: false,
            }
        }
    }
}

/// Run the conversion on the blocking pool so the async workers keep
/// serving network and file I/O.
pub async fn grayscale_async(bytes: Vec<u8>) -> Result<Grayscaled> {
    let converted = tokio::task::spawn_blocking(move || grayscale_or_original(bytes)).await?;
    Ok(converted)
}
