use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Closed boundary polygon of one foreground region
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    /// Outer border of a region, or border of a hole inside one
    pub border: BorderType,
}

/// Trace every outer and hole border in a binary mask.
///
/// Hierarchy is discarded; each border becomes an independent contour with
/// collinear runs compressed down to their end points.
pub fn extract_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .map(|c| Contour {
            points: compress_collinear(&c.points),
            border: c.border_type,
        })
        .collect()
}

/// Drop repeated points and points that continue straight on from their
/// predecessor. The contour is treated as closed.
pub fn compress_collinear(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let compressed: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];

            let (ax, ay) = (curr.x - prev.x, curr.y - prev.y);
            let (bx, by) = (next.x - curr.x, next.y - curr.y);
            let cross = ax * by - ay * bx;
            let dot = ax * bx + ay * by;

            let repeated = ax == 0 && ay == 0;
            !(repeated || (cross == 0 && dot > 0))
        })
        .map(|i| points[i])
        .collect();

    // every point repeated
    if compressed.is_empty() {
        points.to_vec()
    } else {
        compressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn mask_with_rect(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = GrayImage::new(20, 20);
        assert!(extract_contours(&mask).is_empty());
    }

    #[test]
    fn test_rectangle_compresses_to_corners() {
        let mask = mask_with_rect(30, 30, 5, 8, 10, 6);
        let contours = extract_contours(&mask);
        assert_eq!(contours.len(), 1);

        let contour = &contours[0];
        assert_eq!(contour.border, BorderType::Outer);
        assert_eq!(contour.points.len(), 4);
        for corner in [
            Point::new(5, 8),
            Point::new(14, 8),
            Point::new(14, 13),
            Point::new(5, 13),
        ] {
            assert!(contour.points.contains(&corner), "missing {:?}", corner);
        }
    }

    #[test]
    fn test_hole_is_reported() {
        let mut mask = mask_with_rect(40, 40, 5, 5, 30, 30);
        for y in 15..25 {
            for x in 15..25 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        let contours = extract_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().any(|c| c.border == BorderType::Hole));
    }

    #[test]
    fn test_compress_keeps_turns() {
        let points = vec![
            Point::new(0, 0),
            Point::new(1, 0),
            Point::new(2, 0),
            Point::new(2, 1),
            Point::new(2, 2),
            Point::new(1, 1),
        ];
        let compressed = compress_collinear(&points);
        assert_eq!(
            compressed,
            vec![Point::new(0, 0), Point::new(2, 0), Point::new(2, 2)]
        );
    }
}
