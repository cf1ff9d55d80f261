//! Decoded RGBA8 pixel data handed from the loader to cells and textures.

use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::RgbaImage;

#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    /// A buffer of `width`×`height` pixels all set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Resample to exactly `width`×`height`. Callers pick the target size to
    /// preserve aspect; the source buffer is consumed and released here.
    pub fn scale_down(self, width: u32, height: u32) -> Result<Self> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width(), self.height()) {
            return Ok(self);
        }
        let src_view = fir::images::ImageRef::new(
            self.width(),
            self.height(),
            self.image.as_raw(),
            fir::PixelType::U8x4,
        )
        .context("failed to create source view for thumbnail resize")?;
        let mut dst_image = fir::images::Image::new(width, height, fir::PixelType::U8x4);
        let options = fir::ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
        fir::Resizer::new()
            .resize(&src_view, &mut dst_image, Some(&options))
            .context("thumbnail resize failed")?;
        let image = RgbaImage::from_raw(width, height, dst_image.into_vec())
            .context("resized buffer has unexpected length")?;
        Ok(Self { image })
    }
}

/// Target size for fitting `width`×`height` into `max_w`×`max_h`.
///
/// Landscape images are constrained by width, everything else by height.
/// Returns `None` when the image already fits along its constrained axis.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> Option<(u32, u32)> {
    if width > height {
        (width > max_w).then(|| {
            let new_h = (u64::from(max_w) * u64::from(height) / u64::from(width)) as u32;
            (max_w, new_h)
        })
    } else {
        (height > max_h && height > 0).then(|| {
            let new_w = (u64::from(max_h) * u64::from(width) / u64::from(height)) as u32;
            (new_w, max_h)
        })
    }
}
