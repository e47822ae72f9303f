use crate::sample_bilinear_rgb;
use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Planar projective transform `dst ~ h * src`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Pure translation by `(dx, dy)`.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(Matrix3::new(
            1.0, 0.0, dx, //
            0.0, 1.0, dy, //
            0.0, 0.0, 1.0,
        ))
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// `self` applied after `first`.
    pub fn compose(&self, first: &Homography) -> Self {
        Self::new(self.h * first.h)
    }

    /// Element-wise arithmetic mean of the matrices.
    ///
    /// This is an algebraic average of the nine coefficients, not a geometric
    /// blend of the underlying transforms. Returns `None` for an empty slice.
    pub fn mean(items: &[Homography]) -> Option<Self> {
        let (first, rest) = items.split_first()?;
        let mut acc = first.h;
        for item in rest {
            acc += item.h;
        }
        Some(Self::new(acc / items.len() as f64))
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let n = 4.0_f64;
    let (cx, cy) = pts.iter().fold((0.0_f64, 0.0_f64), |(sx, sy), p| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    let (cx, cy) = (cx / n, cy / n);

    let mean_dist = pts
        .iter()
        .map(|p| {
            let dx = p.x as f64 - cx;
            let dy = p.y as f64 - cy;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    });

    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Compute H such that: dst ~ H * src (projective), using 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. The result is
/// scaled so that `h[(2, 2)] == 1`. Returns `None` for degenerate
/// configurations (three collinear points, repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h_den = t_dst.try_inverse()? * hn * t_src;
    let h_den = normalize_homography(h_den)?;

    Some(Homography::new(h_den))
}

/// Warp `src` into a `out_w × out_h` canvas through `h_dst_from_src`.
///
/// Every destination pixel is mapped back into the source with the inverse
/// transform and bilinearly sampled; samples that fall outside the source
/// blend towards `fill`. Returns `None` if the transform is not invertible.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, h_dst_from_src, fill), fields(width = src.width(), height = src.height()))
)]
pub fn warp_perspective_rgb(
    src: &RgbImage,
    h_dst_from_src: &Homography,
    out_w: u32,
    out_h: u32,
    fill: Rgb<u8>,
) -> Option<RgbImage> {
    let h_src_from_dst = h_dst_from_src.inverse()?;

    let mut out = RgbImage::from_pixel(out_w, out_h, fill);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let ps = h_src_from_dst.apply(Point2::new(x as f32, y as f32));
        if !ps.x.is_finite() || !ps.y.is_finite() {
            continue;
        }
        *px = sample_bilinear_rgb(src, ps.x, ps.y, fill);
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(50.0_f32, -20.0),
            Point2::new(320.0_f32, 200.0),
        ] {
            let back = inv.apply(h.apply(p));
            assert_abs_diff_eq!(back, p, epsilon = 1e-3);
        }
    }

    #[test]
    fn four_point_solve_recovers_h() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));

        let rect = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(180.0_f32, 0.0),
            Point2::new(180.0_f32, 130.0),
            Point2::new(0.0_f32, 130.0),
        ];
        let dst = rect.map(|p| ground_truth.apply(p));

        let recovered = homography_from_4pt(&rect, &dst).expect("recoverable");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_abs_diff_eq!(recovered.apply(p), ground_truth.apply(p), epsilon = 1e-3);
        }
    }

    #[test]
    fn collinear_points_have_no_solution() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        let dst = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn mean_is_elementwise() {
        let a = Homography::from_array([[1.0, 0.0, 10.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let b = Homography::from_array([[3.0, 0.0, -2.0], [0.0, 1.0, 4.0], [0.0, 0.0, 1.0]]);
        let avg = Homography::mean(&[a, b]).expect("non-empty");
        assert_eq!(
            avg.to_array(),
            [[2.0, 0.0, 4.0], [0.0, 1.0, 2.0], [0.0, 0.0, 1.0]]
        );
        assert_eq!(Homography::mean(&[a]), Some(a));
        assert!(Homography::mean(&[]).is_none());
    }

    #[test]
    fn warp_by_translation_shifts_content() {
        let mut src = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        src.put_pixel(2, 3, Rgb([200, 10, 10]));

        let h = Homography::translation(3.0, 1.0);
        let out = warp_perspective_rgb(&src, &h, 8, 8, Rgb([0, 0, 0])).expect("invertible");
        assert_eq!(out.get_pixel(5, 4), &Rgb([200, 10, 10]));
        assert_eq!(out.get_pixel(2, 3), &Rgb([0, 0, 0]));
    }

    #[test]
    fn warp_rejects_singular_transform() {
        let src = RgbImage::new(4, 4);
        let singular = Homography::new(Matrix3::zeros());
        assert!(warp_perspective_rgb(&src, &singular, 4, 4, Rgb([0, 0, 0])).is_none());
    }
}
