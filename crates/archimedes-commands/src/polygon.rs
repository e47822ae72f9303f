//! Polygon simplification for traced contours.

use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

fn dist2(a: Point<i32>, b: Point<i32>) -> i64 {
    let dx = i64::from(a.x - b.x);
    let dy = i64::from(a.y - b.y);
    dx * dx + dy * dy
}

fn farthest_from(points: &[Point<i32>], from: Point<i32>) -> usize {
    points
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| dist2(**p, from))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Douglas–Peucker simplification of a closed contour.
///
/// The contour is split at two mutually distant points and both arcs are
/// simplified independently, so the result does not depend much on where
/// the tracer started. Vertices keep the contour's winding.
pub fn approximate_closed_polygon(contour: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if contour.len() < 3 || epsilon.is_nan() || epsilon <= 0.0 {
        return contour.to_vec();
    }
    let a = farthest_from(contour, contour[0]);
    let b = farthest_from(contour, contour[a]);
    if contour[a] == contour[b] {
        return vec![contour[a]];
    }
    let (lo, hi) = (a.min(b), a.max(b));

    let backward: Vec<Point<i32>> = contour[hi..]
        .iter()
        .chain(contour[..=lo].iter())
        .copied()
        .collect();

    // each arc keeps both ends; drop the end the other arc starts with
    let mut out = approximate_polygon_dp(&contour[lo..=hi], epsilon, false);
    out.pop();
    let mut back = approximate_polygon_dp(&backward, epsilon, false);
    back.pop();
    out.extend(back);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Border pixels of the rectangle `[x0, x1] × [y0, y1]`, clockwise from
    /// the top-left corner, as a contour tracer reports them.
    fn rect_border(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        let mut pts = Vec::new();
        pts.extend((x0..x1).map(|x| Point::new(x, y0)));
        pts.extend((y0..y1).map(|y| Point::new(x1, y)));
        pts.extend((x0 + 1..=x1).rev().map(|x| Point::new(x, y1)));
        pts.extend((y0 + 1..=y1).rev().map(|y| Point::new(x0, y)));
        pts
    }

    #[test]
    fn traced_rectangle_reduces_to_its_corners() {
        let border = rect_border(5, 7, 45, 30);
        let poly = approximate_closed_polygon(&border, 2.0);
        assert_eq!(poly.len(), 4);
        for corner in [
            Point::new(5, 7),
            Point::new(45, 7),
            Point::new(45, 30),
            Point::new(5, 30),
        ] {
            assert!(poly.contains(&corner), "missing {corner:?} in {poly:?}");
        }
    }

    #[test]
    fn zero_tolerance_keeps_the_contour() {
        let border = rect_border(0, 0, 6, 4);
        assert_eq!(approximate_closed_polygon(&border, 0.0), border);
    }

    #[test]
    fn start_point_does_not_change_the_result() {
        let mut border = rect_border(0, 0, 30, 20);
        border.rotate_left(17);
        let poly = approximate_closed_polygon(&border, 1.5);
        assert_eq!(poly.len(), 4);
    }

    #[test]
    fn notched_outline_keeps_extra_vertices() {
        let outline = [
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 10),
            Point::new(10, 10),
            Point::new(10, 20),
            Point::new(0, 20),
        ];
        assert_eq!(approximate_closed_polygon(&outline, 1.0).len(), 6);
    }

    #[test]
    fn wobbly_edge_within_tolerance_is_straightened() {
        let mut border = rect_border(0, 0, 40, 40);
        for p in border.iter_mut().filter(|p| p.y == 0 && p.x % 2 == 1) {
            p.y = 1;
        }
        assert_eq!(approximate_closed_polygon(&border, 3.0).len(), 4);
    }
}
