use image::imageops::{self, FilterType};
use image::{GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, RgbaImage};
use tracing::debug;

use crate::layout::{Rect, TextPolarity, IMAGE_HEIGHT, IMAGE_WIDTH};

/// Channel value at or below which a pixel still counts as black.
const BLACK_LEEWAY: u8 = 15;

/// Brings a card image to the canonical size the layout regions are defined against.
///
/// Scans that are slightly too large carry a thin black border; that border
/// is cropped away evenly. Anything else is rescaled.
pub fn normalize_size(img: RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == IMAGE_WIDTH && h == IMAGE_HEIGHT {
        return img;
    }

    let height_excess = h as i64 - IMAGE_HEIGHT as i64;
    let width_excess = w as i64 - IMAGE_WIDTH as i64;
    if (31..35).contains(&height_excess) && (18..23).contains(&width_excess) {
        let half_h = (height_excess / 2) as u32;
        let half_w = (width_excess / 2) as u32;
        debug!(
            "Image is {}x{}, assuming extra black borders, removing {} rows and {} columns per side",
            w, h, half_h, half_w
        );
        return imageops::crop_imm(&img, half_w, half_h, w - 2 * half_w, h - 2 * half_h).to_image();
    }

    debug!(
        "Image is {}x{} instead of {}x{}, resizing",
        w, h, IMAGE_WIDTH, IMAGE_HEIGHT
    );
    imageops::resize(&img, IMAGE_WIDTH, IMAGE_HEIGHT, FilterType::Triangle)
}

/// Location cards are printed sideways; rotating makes their text horizontal.
pub fn rotate_clockwise(img: &RgbaImage) -> RgbaImage {
    imageops::rotate90(img)
}

pub fn to_gray(img: &RgbaImage) -> GrayImage {
    imageops::grayscale(img)
}

/// Crops a pixel rectangle, clamped to the image bounds.
pub fn crop<P>(img: &ImageBuffer<P, Vec<P::Subpixel>>, rect: Rect) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    let (w, h) = img.dimensions();

    let x0 = rect.left.min(w);
    let y0 = rect.top.min(h);
    let rw = rect.width().min(w - x0);
    let rh = rect.height().min(h - y0);

    imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}

/// Binarizes a greyscale image so text ends up black on white.
///
/// Normal polarity: pixels above the threshold become white, the rest black.
/// Inverted polarity: pixels above the threshold become black, the rest white.
pub fn threshold(img: &GrayImage, polarity: TextPolarity) -> GrayImage {
    let cutoff = polarity.threshold();
    let inverted = polarity.is_inverted();

    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let above = img.get_pixel(x, y)[0] > cutoff;
        let value = if above != inverted { 255u8 } else { 0u8 };
        Luma([value])
    })
}

/// Returns a copy with `rect` filled with a flat value.
///
/// Binarizing a label often leaves stray pixels behind, which the recognizer
/// reads as phantom letters; masking the label area removes them.
pub fn mask(img: &GrayImage, rect: Rect, value: u8) -> GrayImage {
    let mut output = img.clone();
    let right = rect.right.min(img.width());
    let bottom = rect.bottom.min(img.height());
    for y in rect.top.min(bottom)..bottom {
        for x in rect.left.min(right)..right {
            output.put_pixel(x, y, Luma([value]));
        }
    }
    output
}

/// True when no pixel in the region has a channel above the black leeway.
pub fn is_image_black<I>(img: &I) -> bool
where
    I: GenericImageView<Pixel = image::Rgba<u8>>,
{
    img.pixels()
        .all(|(_, _, pixel)| pixel.channels()[..3].iter().all(|&c| c <= BLACK_LEEWAY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_crop() {
        let img: GrayImage = ImageBuffer::from_fn(100, 200, |x, y| Luma([(x + y) as u8]));

        let cropped = crop(&img, Rect::new(10, 50, 60, 70));

        assert_eq!(cropped.dimensions(), (50, 20));
        assert_eq!(cropped.get_pixel(0, 0)[0], 60);
    }

    #[test]
    fn test_crop_clamps() {
        let img: GrayImage = ImageBuffer::new(100, 100);
        let cropped = crop(&img, Rect::new(90, 90, 150, 150));
        assert_eq!(cropped.dimensions(), (10, 10));

        let cropped = crop(&img, Rect::new(120, 0, 150, 10));
        assert_eq!(cropped.dimensions(), (0, 10));
    }

    #[test]
    fn test_threshold_normal_and_inverted() {
        let mut img: GrayImage = ImageBuffer::new(3, 1);
        img.put_pixel(0, 0, Luma([20]));
        img.put_pixel(1, 0, Luma([127]));
        img.put_pixel(2, 0, Luma([200]));

        let black = threshold(&img, TextPolarity::Middle);
        assert_eq!(black.get_pixel(0, 0)[0], 0, "Dark text stays black");
        assert_eq!(black.get_pixel(1, 0)[0], 0, "Value equal to cutoff is not above it");
        assert_eq!(black.get_pixel(2, 0)[0], 255);

        let white = threshold(&img, TextPolarity::White);
        assert_eq!(white.get_pixel(0, 0)[0], 255, "Dark background becomes white");
        assert_eq!(white.get_pixel(2, 0)[0], 0, "Light text becomes black");
    }

    #[test]
    fn test_mask_leaves_source_untouched() {
        let img: GrayImage = ImageBuffer::from_pixel(10, 10, Luma([0]));
        let masked = mask(&img, Rect::new(0, 0, 4, 3), 255);
        assert_eq!(masked.get_pixel(3, 2)[0], 255);
        assert_eq!(masked.get_pixel(4, 2)[0], 0);
        assert_eq!(masked.get_pixel(3, 3)[0], 0);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_is_image_black() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(5, 5, Rgba([10, 15, 3, 255]));
        assert!(is_image_black(&img));
        img.put_pixel(4, 4, Rgba([10, 16, 3, 255]));
        assert!(!is_image_black(&img));
    }

    #[test]
    fn test_normalize_size_crops_thin_border() {
        let img: RgbaImage = ImageBuffer::new(IMAGE_WIDTH + 20, IMAGE_HEIGHT + 32);
        let normalized = normalize_size(img);
        assert_eq!(normalized.dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));
    }

    #[test]
    fn test_normalize_size_resizes_other_sizes() {
        let img: RgbaImage = ImageBuffer::new(734, 1024);
        let normalized = normalize_size(img);
        assert_eq!(normalized.dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));
    }
}
