use image::{imageops, Rgb, RgbImage};
use nalgebra::Matrix3;
use tracing::debug;

use crate::error::{CropError, Result};
use crate::geometry::{perspective_transform, transform_point, AxisAlignedBox, RotatedBox};
use crate::selection::BoundaryDescriptor;

/// The two crops produced for one detected object
#[derive(Debug, Clone)]
pub struct CropResult {
    /// Position of the source boundary in the selection order
    pub index: usize,
    /// Pixels inside the axis-aligned bounding box
    pub straight: RgbImage,
    /// The minimum-area box resampled into an upright image
    pub rotated: RgbImage,
}

/// Sample a pixel, treating everything outside the image as black
fn sample(img: &RgbImage, x: i64, y: i64) -> [f64; 3] {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return [0.0; 3];
    }
    let p = img.get_pixel(x as u32, y as u32);
    [p[0] as f64, p[1] as f64, p[2] as f64]
}

/// Bilinear interpolation with a constant black border
fn bilinear_interpolate(img: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x_frac = x - x.floor();
    let y_frac = y - y.floor();

    let p00 = sample(img, x0, y0);
    let p10 = sample(img, x0 + 1, y0);
    let p01 = sample(img, x0, y0 + 1);
    let p11 = sample(img, x0 + 1, y0 + 1);

    let mut result = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] * (1.0 - x_frac) + p10[c] * x_frac;
        let bottom = p01[c] * (1.0 - x_frac) + p11[c] * x_frac;
        result[c] = (top * (1.0 - y_frac) + bottom * y_frac).round().clamp(0.0, 255.0) as u8;
    }

    Rgb(result)
}

/// Resample `img` through a forward projective matrix into a `width` x `height`
/// buffer, using inverse mapping. Returns `None` if the matrix cannot be inverted.
pub fn warp_perspective(
    img: &RgbImage,
    forward_matrix: &Matrix3<f64>,
    width: u32,
    height: u32,
) -> Option<RgbImage> {
    let inverse_matrix = forward_matrix.try_inverse()?;
    let (src_width, src_height) = (img.width() as f64, img.height() as f64);

    let output = RgbImage::from_fn(width, height, |out_x, out_y| {
        let (src_x, src_y) = transform_point(&inverse_matrix, out_x as f64, out_y as f64);

        if src_x.is_finite()
            && src_y.is_finite()
            && src_x > -1.0
            && src_x < src_width
            && src_y > -1.0
            && src_y < src_height
        {
            bilinear_interpolate(img, src_x, src_y)
        } else {
            Rgb([0, 0, 0])
        }
    });

    Some(output)
}

/// Copy the pixels inside an axis-aligned box
pub fn crop_straight(img: &RgbImage, bounds: &AxisAlignedBox) -> RgbImage {
    imageops::crop_imm(img, bounds.x, bounds.y, bounds.width, bounds.height).to_image()
}

/// Undo the in-plane rotation of a rotated box
pub fn crop_rotated(img: &RgbImage, rotated: &RotatedBox, index: usize) -> Result<RgbImage> {
    if rotated.is_degenerate() {
        return Err(CropError::DegenerateBoundary {
            index,
            reason: format!("rotated box is {:.1}x{:.1}", rotated.size.0, rotated.size.1),
        });
    }

    let (width, height) = rotated.pixel_size();
    let (w, h) = ((width - 1) as f64, (height - 1) as f64);

    let src = rotated.rounded_corners();
    let dst = [(w, 0.0), (w, h), (0.0, h), (0.0, 0.0)];

    let matrix = perspective_transform(&src, &dst).ok_or_else(|| CropError::DegenerateBoundary {
        index,
        reason: "corner points do not span a quadrilateral".to_string(),
    })?;

    debug!(index, width, height, angle = rotated.angle, "Rectifying boundary");

    warp_perspective(img, &matrix, width, height).ok_or_else(|| CropError::DegenerateBoundary {
        index,
        reason: "projective matrix is singular".to_string(),
    })
}

/// Produce both crops for one boundary
pub fn rectify(img: &RgbImage, boundary: &BoundaryDescriptor, index: usize) -> Result<CropResult> {
    let rotated = crop_rotated(img, boundary.rotated(), index)?;
    let straight = crop_straight(img, boundary.straight());
    Ok(CropResult {
        index,
        straight,
        rotated,
    })
}
