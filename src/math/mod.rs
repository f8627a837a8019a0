/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Area of the triangle `(p0, p1, p2)`.
#[must_use]
pub fn triangle_area(p0: &Point3, p1: &Point3, p2: &Point3) -> f64 {
    (p1 - p0).cross(&(p2 - p0)).norm() * 0.5
}

/// Distance from `p` to the segment `[p0, p1]`.
#[must_use]
pub fn point_segment_distance(p: &Point3, p0: &Point3, p1: &Point3) -> f64 {
    let dir = p1 - p0;
    let len2 = dir.norm_squared();
    if len2 < TOLERANCE * TOLERANCE {
        return (p - p0).norm();
    }
    let t = ((p - p0).dot(&dir) / len2).clamp(0.0, 1.0);
    (p - (p0 + dir * t)).norm()
}

/// Squared distance from `p` to the triangle `(a, b, c)`.
///
/// Region-based closest point computation (Ericson, Real-Time Collision
/// Detection, 5.1.5).
#[must_use]
pub fn point_triangle_squared_distance(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return ap.norm_squared();
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return bp.norm_squared();
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (p - (a + ab * v)).norm_squared();
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return cp.norm_squared();
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (p - (a + ac * w)).norm_squared();
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (p - (b + (c - b) * w)).norm_squared();
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (p - (a + ab * v + ac * w)).norm_squared()
}
