use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

/// Smallest upright rectangle enclosing a set of pixels.
/// Width and height count pixels, so a single pixel is 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisAlignedBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AxisAlignedBox {
    /// Bounding box of the given points, `None` when there are none.
    /// Negative coordinates are clamped to the image origin.
    pub fn from_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let min_x = min_x.max(0);
        let min_y = min_y.max(0);

        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1).max(0) as u32,
            height: (max_y - min_y + 1).max(0) as u32,
        })
    }
}

/// Minimum-area rectangle of arbitrary orientation.
///
/// `size` follows the same pixel-counting convention as [`AxisAlignedBox`]:
/// it is the distance between the outermost pixel centers plus one, so an
/// upright rectangle gets identical sizes from both boxes. `angle` is the
/// direction of the width axis in degrees, normalized to `[0, 90)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedBox {
    pub center: (f64, f64),
    pub size: (f64, f64),
    pub angle: f64,
}

impl RotatedBox {
    /// Unit vectors along the width and height axes
    fn axes(&self) -> ((f64, f64), (f64, f64)) {
        let rad = self.angle.to_radians();
        let (sin, cos) = rad.sin_cos();
        ((cos, sin), (-sin, cos))
    }

    /// Centers of the four extreme pixels, ordered top-right, bottom-right,
    /// bottom-left, top-left in the box's own frame.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (u, v) = self.axes();
        let half_w = (self.size.0 - 1.0).max(0.0) / 2.0;
        let half_h = (self.size.1 - 1.0).max(0.0) / 2.0;
        let (cx, cy) = self.center;

        let corner = |su: f64, sv: f64| {
            (
                cx + su * half_w * u.0 + sv * half_h * v.0,
                cy + su * half_w * u.1 + sv * half_h * v.1,
            )
        };

        [
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
            corner(-1.0, -1.0),
        ]
    }

    /// Corners snapped to the nearest integer pixel
    pub fn rounded_corners(&self) -> [(f64, f64); 4] {
        self.corners().map(|(x, y)| (x.round(), y.round()))
    }

    /// Output dimensions of a rectified crop: the size truncated toward zero
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.size.0.max(0.0) as u32, self.size.1.max(0.0) as u32)
    }

    /// Rectification needs at least two distinct pixel columns and rows
    pub fn is_degenerate(&self) -> bool {
        let (w, h) = self.pixel_size();
        w < 2 || h < 2
    }
}

/// Signed area of a closed polygon (shoelace formula).
/// Positive for counter-clockwise order in a y-up frame.
pub fn signed_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let twice: i64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum();

    twice as f64 / 2.0
}

/// Unsigned enclosed area of a contour polygon
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    signed_area(points).abs()
}

/// Fit the minimum-area enclosing rectangle using rotating calipers over the
/// convex hull. Returns `None` for an empty point set.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<RotatedBox> {
    let first = points.first()?;

    let hull: Vec<(f64, f64)> = convex_hull(points)
        .iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();

    let mut best: Option<(f64, RotatedBox)> = None;
    let n = hull.len();

    for i in 0..n {
        let origin = hull[i];
        let next = hull[(i + 1) % n];
        let (ex, ey) = (next.0 - origin.0, next.1 - origin.1);
        let length = (ex * ex + ey * ey).sqrt();

        if length < f64::EPSILON {
            continue;
        }

        let (ux, uy) = (ex / length, ey / length);
        let (vx, vy) = (-uy, ux);

        let mut min_u = f64::INFINITY;
        let mut max_u = f64::NEG_INFINITY;
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;

        for p in &hull {
            let (dx, dy) = (p.0 - origin.0, p.1 - origin.1);
            let proj_u = dx * ux + dy * uy;
            let proj_v = dx * vx + dy * vy;
            min_u = min_u.min(proj_u);
            max_u = max_u.max(proj_u);
            min_v = min_v.min(proj_v);
            max_v = max_v.max(proj_v);
        }

        let extent_u = max_u - min_u;
        let extent_v = max_v - min_v;
        let area = extent_u * extent_v;

        if best.as_ref().map_or(true, |(best_area, _)| area < *best_area - 1e-9) {
            let mid_u = (min_u + max_u) / 2.0;
            let mid_v = (min_v + max_v) / 2.0;
            let center = (
                origin.0 + mid_u * ux + mid_v * vx,
                origin.1 + mid_u * uy + mid_v * vy,
            );
            let rect = normalize_rect(center, extent_u, extent_v, uy.atan2(ux).to_degrees());
            best = Some((area, rect));
        }
    }

    // All points coincide: a single pixel
    let rect = best.map(|(_, rect)| rect).unwrap_or(RotatedBox {
        center: (first.x as f64, first.y as f64),
        size: (1.0, 1.0),
        angle: 0.0,
    });

    Some(rect)
}

/// Bring the width-axis angle into `[0, 90)`, swapping width and height on
/// every odd quarter turn removed. Sizes gain one pixel.
fn normalize_rect(center: (f64, f64), extent_u: f64, extent_v: f64, angle: f64) -> RotatedBox {
    const SNAP: f64 = 1e-7;

    let turns = (angle / 90.0).floor();
    let mut angle = angle - turns * 90.0;
    let (mut width, mut height) = (extent_u, extent_v);

    if (turns as i64).rem_euclid(2) == 1 {
        std::mem::swap(&mut width, &mut height);
    }

    if 90.0 - angle < SNAP {
        angle = 0.0;
        std::mem::swap(&mut width, &mut height);
    } else if angle < SNAP {
        angle = 0.0;
    }

    RotatedBox {
        center,
        size: (width + 1.0, height + 1.0),
        angle,
    }
}

/// Solve for the projective matrix mapping each `src[i]` onto `dst[i]`.
/// Returns `None` when the control points are degenerate.
pub fn perspective_transform(src: &[(f64, f64); 4], dst: &[(f64, f64); 4]) -> Option<Matrix3<f64>> {
    if quad_area(src) < 1e-9 || quad_area(dst) < 1e-9 {
        return None;
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (&(x, y), &(u, v))) in src.iter().zip(dst.iter()).enumerate() {
        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -x * u;
        a[(r, 7)] = -y * u;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -x * v;
        a[(r + 1, 7)] = -y * v;
        b[r + 1] = v;
    }

    let h = a.lu().solve(&b)?;
    if h.iter().any(|value| !value.is_finite()) {
        return None;
    }

    let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);

    if matrix.determinant().abs() < 1e-12 {
        return None;
    }

    Some(matrix)
}

fn quad_area(quad: &[(f64, f64); 4]) -> f64 {
    let twice: f64 = (0..4)
        .map(|i| {
            let (x0, y0) = quad[i];
            let (x1, y1) = quad[(i + 1) % 4];
            x0 * y1 - x1 * y0
        })
        .sum();
    (twice / 2.0).abs()
}

/// Transform a point using a homogeneous 3x3 matrix
pub fn transform_point(matrix: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = Vector3::new(x, y, 1.0);
    let result = matrix * p;
    (result.x / result.z, result.y / result.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i32, y0: i32, side: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + side - 1, y0),
            Point::new(x0 + side - 1, y0 + side - 1),
            Point::new(x0, y0 + side - 1),
        ]
    }

    #[test]
    fn test_axis_aligned_box_counts_pixels() {
        let bounds = AxisAlignedBox::from_points(&square(25, 25, 50)).unwrap();
        assert_eq!(
            bounds,
            AxisAlignedBox {
                x: 25,
                y: 25,
                width: 50,
                height: 50,
            }
        );
        assert!(AxisAlignedBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_shoelace_area() {
        assert_eq!(contour_area(&square(0, 0, 11)), 100.0);
        assert_eq!(contour_area(&[Point::new(0, 0), Point::new(5, 5)]), 0.0);

        let mut reversed = square(0, 0, 11);
        reversed.reverse();
        assert_eq!(signed_area(&reversed), -signed_area(&square(0, 0, 11)));
    }

    #[test]
    fn test_min_area_rect_upright_square() {
        let rect = min_area_rect(&square(25, 25, 50)).unwrap();
        assert_eq!(rect.angle, 0.0);
        assert!((rect.size.0 - 50.0).abs() < 1e-9);
        assert!((rect.size.1 - 50.0).abs() < 1e-9);
        assert!((rect.center.0 - 49.5).abs() < 1e-9);
        assert!((rect.center.1 - 49.5).abs() < 1e-9);

        let corners = rect.rounded_corners();
        assert_eq!(corners, [(74.0, 25.0), (74.0, 74.0), (25.0, 74.0), (25.0, 25.0)]);
    }

    #[test]
    fn test_min_area_rect_tall_rectangle_keeps_orientation() {
        let points = vec![
            Point::new(10, 10),
            Point::new(19, 10),
            Point::new(19, 49),
            Point::new(10, 49),
        ];
        let rect = min_area_rect(&points).unwrap();
        assert_eq!(rect.angle, 0.0);
        assert_eq!(rect.pixel_size(), (10, 40));
    }

    #[test]
    fn test_min_area_rect_diamond() {
        // A square rotated by 45 degrees
        let points = vec![
            Point::new(20, 0),
            Point::new(40, 20),
            Point::new(20, 40),
            Point::new(0, 20),
        ];
        let rect = min_area_rect(&points).unwrap();
        assert!((rect.angle - 45.0).abs() < 1e-6);
        let side = (20.0f64 * 20.0 * 2.0).sqrt() + 1.0;
        assert!((rect.size.0 - side).abs() < 1e-6);
        assert!((rect.size.1 - side).abs() < 1e-6);
        assert!((rect.center.0 - 20.0).abs() < 1e-6);
        assert!((rect.center.1 - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_pixel_is_degenerate() {
        let rect = min_area_rect(&[Point::new(3, 4)]).unwrap();
        assert_eq!(rect.pixel_size(), (1, 1));
        assert!(rect.is_degenerate());
        assert!(min_area_rect(&[]).is_none());
    }

    #[test]
    fn test_perspective_identity() {
        let pts = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let m = perspective_transform(&pts, &pts).unwrap();
        let (x, y) = transform_point(&m, 3.0, 7.0);
        assert!((x - 3.0).abs() < 1e-9);
        assert!((y - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_perspective_maps_control_points() {
        let src = [(74.0, 25.0), (74.0, 74.0), (25.0, 74.0), (25.0, 25.0)];
        let dst = [(49.0, 0.0), (49.0, 49.0), (0.0, 49.0), (0.0, 0.0)];
        let m = perspective_transform(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let (x, y) = transform_point(&m, s.0, s.1);
            assert!((x - d.0).abs() < 1e-6);
            assert!((y - d.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_perspective_rejects_collapsed_points() {
        let src = [(5.0, 5.0); 4];
        let dst = [(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)];
        assert!(perspective_transform(&src, &dst).is_none());
    }
}
