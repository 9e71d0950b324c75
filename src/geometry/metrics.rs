//! Vector helpers and triangle metrics.
//!
//! Points and vectors are plain `[f64; 3]`. The freestream axis is `+x`
//! throughout the crate: "aft" means increasing `x`.

use crate::mesh_error::WakeMeshError;

pub(crate) const EPS: f64 = 1e-12;

/// Unit vector along the freestream axis.
pub const FREESTREAM: [f64; 3] = [1.0, 0.0, 0.0];

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Normalizes `a`, returning `None` for a (numerically) zero vector.
pub fn normalize(a: [f64; 3]) -> Option<[f64; 3]> {
    let len = norm(a);
    (len > EPS).then(|| scale(a, 1.0 / len))
}

/// Angle between two vectors in degrees, clamped against round-off.
pub fn angle_deg(a: [f64; 3], b: [f64; 3]) -> f64 {
    let denom = norm(a) * norm(b);
    if denom <= EPS {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Mean of a set of points.
pub fn mean(points: &[[f64; 3]]) -> [f64; 3] {
    if points.is_empty() {
        return [0.0; 3];
    }
    let sum = points.iter().fold([0.0; 3], |acc, p| add(acc, *p));
    scale(sum, 1.0 / points.len() as f64)
}

/// Un-normalized area vector `(b - a) x (c - a)` of a triangle.
#[inline]
pub fn area_vector(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    cross(sub(b, a), sub(c, a))
}

/// Unit normal and area of a triangle.
///
/// Returns an error for a zero-area triangle since its normal is undefined.
pub fn triangle_normal_area(
    a: [f64; 3],
    b: [f64; 3],
    c: [f64; 3],
) -> Result<([f64; 3], f64), WakeMeshError> {
    let n = area_vector(a, b, c);
    let len = norm(n);
    if len <= EPS {
        return Err(WakeMeshError::InvalidGeometry(format!(
            "zero-area triangle at {a:?}, {b:?}, {c:?}"
        )));
    }
    Ok((scale(n, 1.0 / len), 0.5 * len))
}

#[inline]
pub fn triangle_centroid(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    scale(add(add(a, b), c), 1.0 / 3.0)
}

/// Root-mean-square distance between two equally long point rows.
pub fn rms_distance(a: &[[f64; 3]], b: &[[f64; 3]]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(p, q)| {
            let d = sub(*p, *q);
            dot(d, d)
        })
        .sum();
    (sum / n as f64).sqrt()
}

/// Axis-aligned bounding box of a point cloud.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let bbox = BoundingBox {
            min: first,
            max: first,
        };
        Some(iter.fold(bbox, |b, p| b.including(*p)))
    }

    /// The smallest box holding `self` and `p`.
    pub fn including(mut self, p: [f64; 3]) -> Self {
        for k in 0..3 {
            self.min[k] = self.min[k].min(p[k]);
            self.max[k] = self.max[k].max(p[k]);
        }
        self
    }

    pub fn extent(&self) -> [f64; 3] {
        sub(self.max, self.min)
    }

    /// Largest of the three extents.
    pub fn max_extent(&self) -> f64 {
        let e = self.extent();
        e[0].max(e[1]).max(e[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_right_triangle() {
        let (n, area) =
            triangle_normal_area([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).unwrap();
        assert_eq!(n, [0.0, 0.0, 1.0]);
        assert!((area - 0.5).abs() < 1e-15);
    }

    #[test]
    fn collinear_triangle_is_rejected() {
        let err = triangle_normal_area([0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, WakeMeshError::InvalidGeometry(_)));
    }

    #[test]
    fn angle_between_opposite_vectors() {
        assert!((angle_deg([1.0, 0.0, 0.0], [-2.0, 0.0, 0.0]) - 180.0).abs() < 1e-12);
        assert!((angle_deg([1.0, 0.0, 0.0], [0.0, 3.0, 0.0]) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn rms_distance_of_shifted_rows() {
        let a = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let b = [[0.0, 2.0, 0.0], [1.0, 2.0, 0.0]];
        assert!((rms_distance(&a, &b) - 2.0).abs() < 1e-15);
    }

    #[test]
    fn bounding_box_extent() {
        let pts = [[0.0, -1.0, 2.0], [3.0, 1.0, 2.5]];
        let bbox = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bbox.extent(), [3.0, 2.0, 0.5]);
        assert_eq!(bbox.max_extent(), 3.0);
        assert!(BoundingBox::from_points(std::iter::empty::<&[f64; 3]>()).is_none());
    }
}
