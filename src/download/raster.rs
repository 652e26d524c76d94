//! PNG re-encoding of a loaded image

use crate::error::{Error, Result};
use image::{DynamicImage, ImageFormat, RgbaImage, imageops};
use std::io::Cursor;

/// Draw the loaded image onto a canvas of its natural size and serialize the
/// canvas as PNG.
///
/// Any failure to read pixels back is reported as [`Error::CanvasReadback`].
pub fn reencode_png(loaded: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(loaded)
        .map_err(|e| Error::CanvasReadback(format!("image is not readable: {e}")))?;

    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(Error::CanvasReadback("image has no pixels".to_string()));
    }

    let mut canvas = RgbaImage::new(width, height);
    imageops::overlay(&mut canvas, &decoded.to_rgba8(), 0, 0);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::CanvasReadback(format!("PNG serialization failed: {e}")))?;

    tracing::trace!(width, height, bytes = out.get_ref().len(), "Re-encoded PNG");
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn checker_png(size: u32) -> Vec<u8> {
        let img = GrayImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 { Luma([0]) } else { Luma([255]) }
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_keeps_natural_dimensions() {
        let png = reencode_png(&checker_png(21)).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();

        assert_eq!((decoded.width(), decoded.height()), (21, 21));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(decoded.to_rgba8().get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_unreadable_bytes() {
        let result = reencode_png(b"<html>Not Found</html>");
        assert!(matches!(result, Err(Error::CanvasReadback(_))));
    }
}
