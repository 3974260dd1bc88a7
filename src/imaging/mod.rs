//! Image decoding and geometry helpers.
//!
//! Images travel through the service as [`DecodedImage`]: an interleaved
//! three-channel raster in BGR order, which is the channel order the
//! detection and identification models were trained on.

mod codec;
mod ops;

pub use codec::{DecodeError, decode_base64_image};
pub use ops::{crop_or_pad, limit_longer_side};

use image::{Rgb, RgbImage};

/// Decoded raster image with BGR-ordered interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    // `Rgb<u8>` is only used as a 3-byte container; byte 0 is blue.
    bgr: RgbImage,
}

impl DecodedImage {
    /// Wrap a buffer whose channels are already in BGR order.
    pub fn from_bgr(bgr: RgbImage) -> Self {
        Self { bgr }
    }

    /// Convert an RGB buffer to BGR order.
    pub fn from_rgb(mut rgb: RgbImage) -> Self {
        swap_red_blue(&mut rgb);
        Self { bgr: rgb }
    }

    /// Image filled with a single BGR colour.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        Self {
            bgr: RgbImage::from_pixel(width, height, Rgb(bgr)),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.bgr.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.bgr.height()
    }

    /// Length of the longer side in pixels.
    pub fn longer_side(&self) -> u32 {
        self.width().max(self.height())
    }

    /// BGR value at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.bgr.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Borrow the underlying BGR buffer.
    pub fn as_bgr(&self) -> &RgbImage {
        &self.bgr
    }

    /// Copy of the image in RGB channel order.
    pub fn to_rgb(&self) -> RgbImage {
        let mut rgb = self.bgr.clone();
        swap_red_blue(&mut rgb);
        rgb
    }
}

fn swap_red_blue(buffer: &mut RgbImage) {
    for pixel in buffer.pixels_mut() {
        pixel.0.swap(0, 2);
    }
}
