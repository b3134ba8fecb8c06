//! Image-side collaborators: turning a decoded image into a [`Mask`] and
//! rendering a [`LabelGrid`] as pseudo-color.
//!
//! Nothing here affects labeling results. The threshold and channel only
//! decide what counts as foreground, and the colors only make distinct labels
//! distinguishable by eye.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::Mask;
use crate::labels::{Label, LabelGrid, NONE};

/// Color used for background pixels.
pub const BACKGROUND_COLOR: [u8; 3] = [0, 0, 0];

/// Image channel tested against the threshold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Red,
    #[default]
    Green,
    Blue,
    /// Rec. 601 luma of the RGB value.
    Luma,
}

/// Foreground test applied to every pixel of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskSource {
    pub channel: Channel,
    /// A pixel is foreground when its channel value is strictly greater.
    pub threshold: u8,
}

impl Default for MaskSource {
    fn default() -> Self {
        Self {
            channel: Channel::Green,
            threshold: 127,
        }
    }
}

impl MaskSource {
    #[inline]
    fn is_foreground(&self, pixel: &Rgb<u8>) -> bool {
        let [r, g, b] = pixel.0;
        let value = match self.channel {
            Channel::Red => r,
            Channel::Green => g,
            Channel::Blue => b,
            Channel::Luma => {
                ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
            }
        };
        value > self.threshold
    }
}

/// Thresholds one channel of `image` into a mask.
pub fn mask_from_image(image: &DynamicImage, source: &MaskSource) -> Result<Mask> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    Mask::from_fn(width as usize, height as usize, |x, y| {
        source.is_foreground(rgb.get_pixel(x as u32, y as u32))
    })
}

/// Decodes the image at `path` and thresholds it into a mask.
pub fn load_mask(path: impl AsRef<Path>, source: &MaskSource) -> Result<Mask> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Decoded source image"
    );
    mask_from_image(&image, source)
}

/// Deterministic pseudo-color of a label; [`BACKGROUND_COLOR`] for [`NONE`].
///
/// A linear congruential step spreads neighboring label values across the
/// color cube. The low 24 bits become RGB with red in the high byte.
#[inline]
pub fn label_color(label: Label) -> [u8; 3] {
    if label == NONE {
        return BACKGROUND_COLOR;
    }
    let rgb = label.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]
}

/// Renders every label with [`label_color`].
pub fn colorize(labels: &LabelGrid) -> RgbImage {
    let width = labels.width() as u32;
    RgbImage::from_fn(width, labels.height() as u32, |x, y| {
        Rgb(label_color(labels[(y * width + x) as usize]))
    })
}

/// Writes the colorized labels; the format follows the file extension.
pub fn save_labels(path: impl AsRef<Path>, labels: &LabelGrid) -> Result<()> {
    let path = path.as_ref();
    colorize(labels).save(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}
