use glam::{Mat4, Vec3};

/// Direction the camera backs away along when framing a model.
pub const FRAMING_DIRECTION: Vec3 = Vec3::new(0.0, 0.3, 1.0);

/// Camera distance as a multiple of the model's largest dimension.
pub const FRAMING_DISTANCE_FACTOR: f32 = 2.0;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point will expand.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.extend(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Size along each axis. Zero for an empty box.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }
}

/// Uniform scale and offset that map a box onto the origin at a fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f32,
    pub offset: Vec3,
}

/// Scale so the largest dimension equals `target_size`, then shift by
/// `-center * scale` so the scaled box is centered on the origin.
///
/// Returns `None` for empty, flat-to-a-point, or non-finite boxes.
pub fn fit_to_target(bounds: &Aabb, target_size: f32) -> Option<Fit> {
    if bounds.is_empty() {
        return None;
    }
    let max_dim = bounds.max_dimension();
    if !max_dim.is_finite() || max_dim <= f32::EPSILON {
        return None;
    }
    let scale = target_size / max_dim;
    Some(Fit {
        scale,
        offset: -bounds.center() * scale,
    })
}

/// Camera position that frames an origin-centered model of the given size.
pub fn framing_position(max_dimension: f32) -> Vec3 {
    let distance = max_dimension * FRAMING_DISTANCE_FACTOR;
    FRAMING_DIRECTION * distance
}

/// Right-handed perspective with a [0, 1] depth range (WebGPU convention).
pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y_radians, aspect.max(f32::EPSILON), near, far)
}

/// Inverse-transpose of the upper 3x3, for transforming normals.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    let inv = model.inverse();
    if inv.is_finite() {
        inv.transpose()
    } else {
        Mat4::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    // ── Aabb ──

    #[test]
    fn test_empty_box_has_zero_size() {
        assert!(Aabb::EMPTY.is_empty());
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
        assert_eq!(Aabb::EMPTY.center(), Vec3::ZERO);
    }

    #[test]
    fn test_from_points_size_and_center() {
        let aabb = Aabb::from_points([Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 2.5)]);
        assert!(vec_approx_eq(aabb.size(), Vec3::new(4.0, 4.0, 0.5)));
        assert!(vec_approx_eq(aabb.center(), Vec3::new(1.0, 2.0, 2.25)));
        assert!(approx_eq(aabb.max_dimension(), 4.0));
    }

    #[test]
    fn test_union_encloses_both() {
        let a = Aabb::from_points([Vec3::ZERO, Vec3::ONE]);
        let b = Aabb::from_points([Vec3::splat(-2.0), Vec3::splat(-1.0)]);
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::splat(-2.0));
        assert_eq!(u.max, Vec3::ONE);
        assert_eq!(Aabb::EMPTY.union(&a), a);
    }

    // ── fit_to_target ──

    #[test]
    fn test_fit_scales_largest_dimension() {
        let aabb = Aabb::from_points([Vec3::new(10.0, 20.0, 30.0), Vec3::new(14.0, 21.0, 31.0)]);
        let fit = fit_to_target(&aabb, 8.0).unwrap();
        assert!(approx_eq(fit.scale, 2.0));
        assert!(vec_approx_eq(fit.offset, Vec3::new(-24.0, -41.0, -61.0)));

        let placed = Aabb::from_points([
            aabb.min * fit.scale + fit.offset,
            aabb.max * fit.scale + fit.offset,
        ]);
        assert!(approx_eq(placed.max_dimension(), 8.0));
        assert!(vec_approx_eq(placed.center(), Vec3::ZERO));
    }

    #[test]
    fn test_fit_rejects_degenerate_boxes() {
        assert!(fit_to_target(&Aabb::EMPTY, 8.0).is_none());
        let point = Aabb::from_points([Vec3::ONE]);
        assert!(fit_to_target(&point, 8.0).is_none());
        let inf = Aabb::from_points([Vec3::ZERO, Vec3::new(f32::INFINITY, 0.0, 0.0)]);
        assert!(fit_to_target(&inf, 8.0).is_none());
    }

    #[test]
    fn test_fit_flat_model_uses_remaining_dimension() {
        let plane = Aabb::from_points([Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 0.0, 1.0)]);
        let fit = fit_to_target(&plane, 8.0).unwrap();
        assert!(approx_eq(fit.scale, 2.0));
    }

    // ── framing ──

    #[test]
    fn test_framing_position_proportional() {
        let p = framing_position(8.0);
        assert!(vec_approx_eq(p, Vec3::new(0.0, 4.8, 16.0)));
        let q = framing_position(4.0);
        assert!(vec_approx_eq(q * 2.0, p));
    }

    #[test]
    fn test_perspective_tolerates_zero_aspect() {
        let m = perspective(1.0, 0.0, 0.1, 100.0);
        assert!(m.is_finite());
    }

    #[test]
    fn test_normal_matrix_of_uniform_scale_is_inverse_scale() {
        let m = Mat4::from_scale(Vec3::splat(2.0));
        let n = normal_matrix(&m);
        assert!(approx_eq(n.x_axis.x, 0.5));
        assert_eq!(normal_matrix(&Mat4::ZERO), Mat4::IDENTITY);
    }
}
