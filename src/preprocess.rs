use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::box_filter;
use imageproc::morphology::{close, open};
use tracing::debug;

/// Radius of the 5x5 blur window and structuring element
const KERNEL_RADIUS: u8 = 2;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Output of the preprocessing stage
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Blurred intensity image, kept for diagnostics
    pub gray: GrayImage,
    /// Binary mask: 255 where an object is, 0 elsewhere
    pub mask: GrayImage,
}

/// Convert to intensity and apply a 5x5 mean blur
pub fn to_blurred_gray(img: &RgbImage) -> GrayImage {
    let gray = image::imageops::grayscale(img);
    box_filter(&gray, KERNEL_RADIUS as u32, KERNEL_RADIUS as u32)
}

/// Inverse binary threshold: pixels darker than `threshold` become foreground
pub fn threshold_inverse(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] < threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Opening removes speckles, then closing fills small holes
pub fn clean_mask(mask: &GrayImage) -> GrayImage {
    let opened = open(mask, Norm::LInf, KERNEL_RADIUS);
    close(&opened, Norm::LInf, KERNEL_RADIUS)
}

/// Turn a color image into a binary foreground mask
pub fn preprocess(img: &RgbImage, threshold: u8) -> Preprocessed {
    let gray = to_blurred_gray(img);
    let raw = threshold_inverse(&gray, threshold);
    let mask = clean_mask(&raw);

    debug!(
        threshold,
        foreground = foreground_count(&mask),
        "Preprocessed image"
    );

    Preprocessed { gray, mask }
}

/// Number of foreground pixels in a mask
pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != BACKGROUND).count()
}
