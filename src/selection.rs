use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::config::SelectionPolicy;
use crate::contours::Contour;
use crate::error::{CropError, Result};
use crate::geometry::{contour_area, min_area_rect, AxisAlignedBox, RotatedBox};

const STRAIGHT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ROTATED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LINE_HALF_WIDTH: i32 = 2;

/// Both bounding boxes of one contour.
///
/// Only built from a contour as a whole, so the straight and rotated boxes
/// always describe the same region.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryDescriptor {
    contour_index: usize,
    area: f64,
    straight: AxisAlignedBox,
    rotated: RotatedBox,
}

impl BoundaryDescriptor {
    /// `None` for a contour without points
    pub fn from_contour(contour_index: usize, contour: &Contour) -> Option<Self> {
        Some(Self {
            contour_index,
            area: contour_area(&contour.points),
            straight: AxisAlignedBox::from_points(&contour.points)?,
            rotated: min_area_rect(&contour.points)?,
        })
    }

    /// Position of the originating contour in the extractor's output
    pub fn contour_index(&self) -> usize {
        self.contour_index
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn straight(&self) -> &AxisAlignedBox {
        &self.straight
    }

    pub fn rotated(&self) -> &RotatedBox {
        &self.rotated
    }
}

/// Indices of the contours that make the top-`object_count` cut by area.
///
/// Zero-area contours never qualify. Indices are returned in encounter order.
pub fn select_largest(areas: &[f64], object_count: usize, policy: SelectionPolicy) -> Vec<usize> {
    let mut ranked: Vec<f64> = areas.iter().copied().filter(|&a| a > 0.0).collect();
    if ranked.is_empty() || object_count == 0 {
        return Vec::new();
    }

    ranked.sort_by(|a, b| a.total_cmp(b));
    let take = object_count.min(ranked.len());
    let cutoff = ranked[ranked.len() - take];

    let mut selected: Vec<usize> = areas
        .iter()
        .enumerate()
        .filter(|(_, a)| **a > 0.0 && **a >= cutoff)
        .map(|(i, _)| i)
        .collect();

    if policy == SelectionPolicy::StrictTopN && selected.len() > take {
        let above = selected.iter().filter(|&&i| areas[i] > cutoff).count();
        let mut ties_allowed = take - above;
        selected.retain(|&i| {
            if areas[i] > cutoff {
                true
            } else if ties_allowed > 0 {
                ties_allowed -= 1;
                true
            } else {
                false
            }
        });
    }

    selected
}

/// Pick the `object_count` largest contours and fit both boxes to each
pub fn select_boundaries(
    contours: &[Contour],
    object_count: usize,
    policy: SelectionPolicy,
) -> Result<Vec<BoundaryDescriptor>> {
    if object_count == 0 {
        return Err(CropError::InvalidObjectCount(object_count));
    }

    let areas: Vec<f64> = contours.iter().map(|c| contour_area(&c.points)).collect();

    let degenerate = areas.iter().filter(|&&a| a <= 0.0).count();
    if degenerate > 0 {
        debug!(degenerate, "Ignoring zero-area contours");
    }

    let usable = areas.len() - degenerate;
    if object_count > usable {
        debug!(requested = object_count, available = usable, "Clamping object count");
    }

    let boundaries: Vec<BoundaryDescriptor> = select_largest(&areas, object_count, policy)
        .into_iter()
        .filter_map(|i| BoundaryDescriptor::from_contour(i, &contours[i]))
        .collect();

    debug!(
        contours = contours.len(),
        selected = boundaries.len(),
        "Selected boundaries"
    );

    Ok(boundaries)
}

/// Copy of `img` with every boundary's boxes outlined: green for the
/// axis-aligned box, red for the rotated one.
pub fn draw_overlay(img: &RgbImage, boundaries: &[BoundaryDescriptor]) -> RgbImage {
    let mut canvas = img.clone();

    for boundary in boundaries {
        let b = boundary.straight();
        for grow in -LINE_HALF_WIDTH..=LINE_HALF_WIDTH {
            let width = b.width as i32 + 2 * grow;
            let height = b.height as i32 + 2 * grow;
            if width <= 0 || height <= 0 {
                continue;
            }
            let rect = Rect::at(b.x as i32 - grow, b.y as i32 - grow)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, rect, STRAIGHT_COLOR);
        }

        let corners = boundary.rotated().rounded_corners();
        for i in 0..4 {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % 4];
            for dy in -LINE_HALF_WIDTH..=LINE_HALF_WIDTH {
                for dx in -LINE_HALF_WIDTH..=LINE_HALF_WIDTH {
                    let (dx, dy) = (dx as f32, dy as f32);
                    draw_line_segment_mut(
                        &mut canvas,
                        (x0 as f32 + dx, y0 as f32 + dy),
                        (x1 as f32 + dx, y1 as f32 + dy),
                        ROTATED_COLOR,
                    );
                }
            }
        }
    }

    canvas
}
