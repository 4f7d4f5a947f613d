///! Layer → RGB compositing and JPEG encoding
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use super::stretch::asinh_stretch;
use crate::error::{AstroError, Result};

/// Output colour channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "R", alias = "r")]
    Red,
    #[serde(rename = "G", alias = "g")]
    Green,
    #[serde(rename = "B", alias = "b")]
    Blue,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Which raster layers feed which channels.
///
/// A channel fed by several layers takes the last one assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerMapping {
    assignments: Vec<(usize, Channel)>,
}

impl LayerMapping {
    pub fn assign(&mut self, layer: usize, channels: &[Channel]) {
        for &channel in channels {
            self.assignments.push((layer, channel));
        }
    }

    /// Builder form of [`LayerMapping::assign`]
    pub fn with(mut self, layer: usize, channels: &[Channel]) -> Self {
        self.assign(layer, channels);
        self
    }

    /// Layers assigned to `channel`, in assignment order
    pub fn layers_for(&self, channel: Channel) -> Vec<usize> {
        self.assignments
            .iter()
            .filter(|(_, c)| *c == channel)
            .map(|(layer, _)| *layer)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Stretch every mapped layer and compose an RGB image.
///
/// Unmapped channels stay zero, as do channels whose layer the raster does
/// not have.
pub fn composite(raster: &Array3<f32>, mapping: &LayerMapping) -> Result<RgbImage> {
    let (layers, height, width) = raster.dim();
    let width_u32 = u32::try_from(width)
        .map_err(|_| AstroError::Format(format!("raster width {} too large", width)))?;
    let height_u32 = u32::try_from(height)
        .map_err(|_| AstroError::Format(format!("raster height {} too large", height)))?;

    let mut planes: [Option<Array2<u8>>; 3] = [None, None, None];
    for (layer, channel) in &mapping.assignments {
        if *layer >= layers {
            tracing::debug!(
                "Layer {} mapped to {:?} but raster has {} layer(s); channel left empty",
                layer,
                channel,
                layers
            );
            continue;
        }
        let stretched = asinh_stretch(raster.index_axis(Axis(0), *layer));
        planes[channel.index()] = Some(stretched);
    }

    let image = RgbImage::from_fn(width_u32, height_u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let sample = |plane: &Option<Array2<u8>>| plane.as_ref().map_or(0, |p| p[[y, x]]);
        Rgb([sample(&planes[0]), sample(&planes[1]), sample(&planes[2])])
    });
    Ok(image)
}

/// Mirror rows so the first raster row ends up at the bottom
pub fn flip_vertical(image: &mut RgbImage) {
    imageops::flip_vertical_in_place(image);
}

/// Encode to an in-memory JPEG
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .map_err(|e| AstroError::Format(format!("JPEG encoding failed: {}", e)))?;
    Ok(bytes)
}
