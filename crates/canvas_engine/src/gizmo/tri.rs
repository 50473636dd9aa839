//! Ray/triangle intersection

use crate::foundation::math::Vec3;

/// Default tolerance for parallel rays and hits at the origin
pub const TRI_EPSILON: f32 = 1e-6;

/// A triangle used for picking
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tri {
    /// First corner
    pub v0: Vec3,
    /// Second corner
    pub v1: Vec3,
    /// Third corner
    pub v2: Vec3,
}

impl Tri {
    /// Create a triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Replace the corners in place
    pub fn set(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) -> &mut Self {
        self.v0 = v0;
        self.v1 = v1;
        self.v2 = v2;
        self
    }

    /// Intersect a ray with the default tolerance
    ///
    /// See [`Tri::intersect_ray_eps`].
    pub fn intersect_ray(&self, origin: &Vec3, dir: &Vec3) -> Option<Vec3> {
        self.intersect_ray_eps(origin, dir, TRI_EPSILON)
    }

    /// Möller–Trumbore intersection
    ///
    /// Returns the hit point for forward hits only (`t > epsilon`). Rays
    /// parallel to the triangle plane never hit. Both faces are pickable.
    pub fn intersect_ray_eps(&self, origin: &Vec3, dir: &Vec3, epsilon: f32) -> Option<Vec3> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let h = dir.cross(&e2);
        let a = e1.dot(&h);
        if a.abs() < epsilon {
            return None;
        }

        let f = 1.0 / a;
        let s = origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&e1);
        let v = f * dir.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * e2.dot(&q);
        (t > epsilon).then(|| origin + dir * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tri() -> Tri {
        Tri::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_hits_interior_point() {
        let tri = unit_tri();
        let target = Vec3::new(0.25, 0.25, 0.0);
        for origin in [Vec3::new(0.0, 0.0, 5.0), Vec3::new(3.0, -2.0, -4.0), Vec3::new(-1.0, 2.0, 0.5)] {
            let dir = (target - origin).normalize();
            let hit = tri.intersect_ray(&origin, &dir).unwrap();
            assert_relative_eq!(hit, target, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_misses_outside_and_parallel() {
        let tri = unit_tri();
        let origin = Vec3::new(0.0, 0.0, 5.0);
        // beyond the hypotenuse
        let dir = (Vec3::new(0.8, 0.8, 0.0) - origin).normalize();
        assert!(tri.intersect_ray(&origin, &dir).is_none());
        // in the triangle plane
        assert!(tri
            .intersect_ray(&Vec3::new(-1.0, 0.2, 0.0), &Vec3::new(1.0, 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_no_hit_behind_origin() {
        let tri = unit_tri();
        let origin = Vec3::new(0.25, 0.25, 5.0);
        assert!(tri.intersect_ray(&origin, &Vec3::new(0.0, 0.0, 1.0)).is_none());
        assert!(tri.intersect_ray(&origin, &Vec3::new(0.0, 0.0, -1.0)).is_some());
    }

    #[test]
    fn test_set_replaces_corners() {
        let mut tri = unit_tri();
        tri.set(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0), Vec3::new(5.0, 1.0, 0.0));
        let origin = Vec3::new(0.25, 0.25, 5.0);
        assert!(tri.intersect_ray(&origin, &Vec3::new(0.0, 0.0, -1.0)).is_none());
    }
}
