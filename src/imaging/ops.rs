//! Resizing and cropping on [`DecodedImage`].

use super::DecodedImage;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Value written into regions of a crop that fall outside the source image.
const PAD_VALUE: Rgb<u8> = Rgb([0, 0, 0]);

/// Downscale so the longer side is at most `max_side`, keeping aspect ratio.
///
/// Images already within the limit are returned unchanged.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn limit_longer_side(image: DecodedImage, max_side: u32) -> DecodedImage {
    let longer = image.longer_side();
    if longer <= max_side {
        return image;
    }

    let scale = f64::from(max_side) / f64::from(longer);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    let (width, height) = if image.width() >= image.height() {
        (max_side, scaled(image.height()))
    } else {
        (scaled(image.width()), max_side)
    };

    DecodedImage::from_bgr(imageops::resize(
        image.as_bgr(),
        width,
        height,
        FilterType::Triangle,
    ))
}

/// Crop the inclusive box `[x_min, x_max] x [y_min, y_max]`.
///
/// Parts of the box outside the image are filled with black instead of
/// failing, so the output is always `(x_max - x_min + 1) x (y_max - y_min + 1)`.
/// Inverted boxes yield an empty image.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn crop_or_pad(
    image: &DecodedImage,
    x_min: i32,
    y_min: i32,
    x_max: i32,
    y_max: i32,
) -> DecodedImage {
    let width = (i64::from(x_max) - i64::from(x_min) + 1).max(0) as u32;
    let height = (i64::from(y_max) - i64::from(y_min) + 1).max(0) as u32;
    let src = image.as_bgr();
    let (src_w, src_h) = (i64::from(src.width()), i64::from(src.height()));

    let crop = RgbImage::from_fn(width, height, |dx, dy| {
        let sx = i64::from(x_min) + i64::from(dx);
        let sy = i64::from(y_min) + i64::from(dy);
        if (0..src_w).contains(&sx) && (0..src_h).contains(&sy) {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            PAD_VALUE
        }
    });

    DecodedImage::from_bgr(crop)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        #[allow(clippy::cast_possible_truncation)]
        let buffer = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 7])
        });
        DecodedImage::from_bgr(buffer)
    }

    #[test]
    fn test_limit_leaves_small_image_untouched() {
        let image = gradient(1280, 720);
        let out = limit_longer_side(image.clone(), 1280);
        assert_eq!(out, image);
    }

    #[test]
    fn test_limit_landscape() {
        let out = limit_longer_side(gradient(2560, 1440), 1280);
        assert_eq!((out.width(), out.height()), (1280, 720));
    }

    #[test]
    fn test_limit_portrait() {
        let out = limit_longer_side(gradient(1000, 4000), 1280);
        assert_eq!((out.width(), out.height()), (320, 1280));
    }

    #[test]
    fn test_limit_extreme_aspect_keeps_one_pixel() {
        let out = limit_longer_side(gradient(5000, 1), 1280);
        assert_eq!((out.width(), out.height()), (1280, 1));
    }

    #[test]
    fn test_crop_inside_bounds() {
        let image = gradient(100, 80);
        let crop = crop_or_pad(&image, 10, 20, 39, 49);
        assert_eq!((crop.width(), crop.height()), (30, 30));
        assert_eq!(crop.pixel(0, 0), Some([10, 20, 7]));
        assert_eq!(crop.pixel(29, 29), Some([39, 49, 7]));
    }

    #[test]
    fn test_crop_pads_outside_bounds() {
        let image = gradient(50, 50);
        let crop = crop_or_pad(&image, -5, -5, 54, 4);
        assert_eq!((crop.width(), crop.height()), (60, 10));
        assert_eq!(crop.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(crop.pixel(5, 5), Some([0, 0, 7]));
        assert_eq!(crop.pixel(59, 9), Some([0, 0, 0]));
    }

    #[test]
    fn test_crop_entirely_outside_is_black() {
        let image = gradient(10, 10);
        let crop = crop_or_pad(&image, 100, 100, 109, 109);
        assert_eq!((crop.width(), crop.height()), (10, 10));
        assert!(crop.as_bgr().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_crop_inverted_box_is_empty() {
        let crop = crop_or_pad(&gradient(10, 10), 5, 5, 2, 2);
        assert_eq!((crop.width(), crop.height()), (0, 0));
    }
}
