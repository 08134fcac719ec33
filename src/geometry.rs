use serde::{ Serialize, Deserialize };

use crate::vector::Vector3D;
use crate::ray::Ray3D;
use crate::color::Color;

/// Which roots of the ray-sphere quadratic count as a hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitPolicy {
    /// Both roots count, including those behind the ray origin. The nearer
    /// of the two by absolute distance is taken.
    Unrestricted,

    /// Only roots with `t >= 0` count.
    Forward,
}

impl Default for HitPolicy {
    fn default() -> HitPolicy {
        HitPolicy::Unrestricted
    }
}

/// A sphere with a flat color.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sphere {
    pub origin: Vector3D,
    pub radius: f64,
    pub color: Color,
}

impl Sphere {
    pub fn new(origin: Vector3D, radius: f64, color: Color) -> Sphere {
        Sphere { origin, radius, color }
    }

    /// Checks whether a sphere has a positive, finite radius and a finite
    /// center.
    pub fn is_valid(&self) -> bool {
        self.radius > 0.0 && self.radius.is_finite() && self.origin.is_finite()
    }

    /// Intersects a ray with this sphere.
    ///
    /// Solves `|o + t*d - c|^2 = r^2` for `t` and returns the distance from
    /// the ray origin to the nearer of the two intersection points. Returns
    /// `None` if the ray misses, or if the ray is degenerate (a zero-length
    /// direction, or a non-finite discriminant).
    ///
    /// The direction does not need to be normalized; distances are measured
    /// between the actual intersection points and the origin.
    pub fn intersect(&self, ray: &Ray3D, policy: HitPolicy) -> Option<f64> {
        let v = ray.origin - self.origin;
        let dir_squared = ray.direction.squared_length();

        if !(dir_squared > 0.0) || !dir_squared.is_finite() {
            return None
        }

        let b = -2.0 * ray.direction.dot(&v);
        let discriminant = b.powi(2)
            - 4.0 * dir_squared * (v.squared_length() - self.radius.powi(2));

        // There is no (usable) solution.
        if !discriminant.is_finite() || discriminant < 0.0 {
            return None
        }

        let div = 2.0 * dir_squared;
        let t0 = (b + discriminant.sqrt()) / div;
        let t1 = (b - discriminant.sqrt()) / div;

        let distance_at = |t: f64| -> Option<f64> {
            if policy == HitPolicy::Forward && !(t >= 0.0) {
                return None
            }

            let d = ray.position(t).difference(&ray.origin).length();
            if d.is_finite() { Some(d) } else { None }
        };

        match (distance_at(t0), distance_at(t1)) {
            (Some(d0), Some(d1)) => Some(if d0 < d1 { d0 } else { d1 }),
            (Some(d), None) | (None, Some(d)) => Some(d),
            (None, None) => None,
        }
    }
}

/// The nearest sphere hit by a ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit<'a> {
    /// The sphere which was hit.
    pub sphere: &'a Sphere,

    /// The position of the sphere within the scanned collection.
    pub index: usize,

    /// The distance from the ray origin to the intersection point.
    pub distance: f64,
}

/// Finds the nearest sphere intersected by a ray.
///
/// Every sphere is tested; there is no acceleration structure. When two
/// spheres are hit at the same distance, the one appearing first wins.
/// An empty collection never produces a hit.
pub fn solve<'a>(ray: &Ray3D, spheres: &'a [Sphere], policy: HitPolicy)
    -> Option<Hit<'a>> {
    let mut nearest: Option<Hit<'a>> = None;

    for (index, sphere) in spheres.iter().enumerate() {
        let distance = match sphere.intersect(ray, policy) {
            Some(d) => d,
            None => continue,
        };

        let closer = match nearest {
            Some(ref hit) => distance < hit.distance,
            None => true,
        };

        if closer {
            nearest = Some(Hit { sphere, index, distance });
        }
    }

    nearest
}

/* Tests */

#[cfg(test)]
use crate::feq;

#[test]
fn ray_through_center_hits_near_surface() {
    let r = Ray3D::new(Vector3D::new(0.0, 0.0, 5.0),
                       Vector3D::new(0.0, 0.0, -1.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    let d = s.intersect(&r, HitPolicy::Unrestricted).unwrap();
    assert!(feq(d, 4.0));
}

#[test]
fn unnormalized_direction_gives_same_distance() {
    let r = Ray3D::new(Vector3D::new(0.0, 0.0, 5.0),
                       Vector3D::new(0.0, 0.0, -3.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    let d = s.intersect(&r, HitPolicy::Forward).unwrap();
    assert!(feq(d, 4.0));
}

#[test]
fn ray_through_off_axis_center() {
    let origin = Vector3D::new(10.0, 10.0, 10.0);
    let center = Vector3D::new(-2.0, 3.0, 1.0);
    let r = Ray3D::new(origin, center - origin);
    let s = Sphere::new(center, 2.5, Color::red());

    let expected = (center - origin).length() - 2.5;
    let d = s.intersect(&r, HitPolicy::Unrestricted).unwrap();
    assert!(feq(d, expected));
}

#[test]
fn ray_misses_sphere() {
    let r = Ray3D::new(Vector3D::new(0.0, 2.0, -5.0),
                       Vector3D::new(0.0, 0.0, 1.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    assert_eq!(s.intersect(&r, HitPolicy::Unrestricted), None);
    assert_eq!(s.intersect(&r, HitPolicy::Forward), None);
}

#[test]
fn ray_tangent_to_sphere() {
    let r = Ray3D::new(Vector3D::new(0.0, 1.0, -5.0),
                       Vector3D::new(0.0, 0.0, 1.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    let d = s.intersect(&r, HitPolicy::Unrestricted).unwrap();
    assert!(feq(d, 5.0));
}

#[test]
fn ray_inside_sphere() {
    let r = Ray3D::new(Vector3D::zero(), Vector3D::new(1.0, 0.0, 0.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    assert!(feq(s.intersect(&r, HitPolicy::Unrestricted).unwrap(), 1.0));
    assert!(feq(s.intersect(&r, HitPolicy::Forward).unwrap(), 1.0));
}

#[test]
fn sphere_behind_ray() {
    let r = Ray3D::new(Vector3D::new(0.0, 0.0, 5.0),
                       Vector3D::new(0.0, 0.0, 1.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    // Both roots are negative: -4 and -6.
    assert!(feq(s.intersect(&r, HitPolicy::Unrestricted).unwrap(), 4.0));
    assert_eq!(s.intersect(&r, HitPolicy::Forward), None);
}

#[test]
fn zero_direction_is_a_miss() {
    let r = Ray3D::new(Vector3D::zero(), Vector3D::zero());
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    assert_eq!(s.intersect(&r, HitPolicy::Unrestricted), None);
}

#[test]
fn non_finite_ray_is_a_miss() {
    let r = Ray3D::new(Vector3D::new(f64::NAN, 0.0, 0.0),
                       Vector3D::new(1.0, 0.0, 0.0));
    let s = Sphere::new(Vector3D::zero(), 1.0, Color::red());

    assert_eq!(s.intersect(&r, HitPolicy::Unrestricted), None);
}

#[test]
fn solve_empty_scene() {
    let r = Ray3D::new(Vector3D::zero(), Vector3D::new(1.0, 0.0, 0.0));

    assert!(solve(&r, &[], HitPolicy::Unrestricted).is_none());
}

#[test]
fn solve_picks_nearest() {
    let r = Ray3D::new(Vector3D::new(-10.0, 0.0, 0.0),
                       Vector3D::new(1.0, 0.0, 0.0));
    let spheres = vec![
        Sphere::new(Vector3D::new(5.0, 0.0, 0.0), 1.0, Color::blue()),
        Sphere::new(Vector3D::new(0.0, 0.0, 0.0), 1.0, Color::red()),
        Sphere::new(Vector3D::new(0.0, 5.0, 0.0), 1.0, Color::green()),
    ];

    let hit = solve(&r, &spheres, HitPolicy::Unrestricted).unwrap();
    assert_eq!(hit.index, 1);
    assert_eq!(hit.sphere.color, Color::red());
    assert!(feq(hit.distance, 9.0));
}

#[test]
fn solve_ties_keep_first() {
    let r = Ray3D::new(Vector3D::new(-10.0, 0.0, 0.0),
                       Vector3D::new(1.0, 0.0, 0.0));
    let spheres = vec![
        Sphere::new(Vector3D::zero(), 1.0, Color::blue()),
        Sphere::new(Vector3D::zero(), 1.0, Color::red()),
    ];

    let hit = solve(&r, &spheres, HitPolicy::Unrestricted).unwrap();
    assert_eq!(hit.index, 0);
}

#[test]
fn solve_unrestricted_prefers_sphere_behind() {
    let r = Ray3D::new(Vector3D::zero(), Vector3D::new(1.0, 0.0, 0.0));
    let spheres = vec![
        Sphere::new(Vector3D::new(10.0, 0.0, 0.0), 1.0, Color::blue()),
        Sphere::new(Vector3D::new(-3.0, 0.0, 0.0), 1.0, Color::red()),
    ];

    let hit = solve(&r, &spheres, HitPolicy::Unrestricted).unwrap();
    assert_eq!(hit.sphere.color, Color::red());

    let hit = solve(&r, &spheres, HitPolicy::Forward).unwrap();
    assert_eq!(hit.sphere.color, Color::blue());
}

#[test]
fn invalid_spheres() {
    assert!(Sphere::new(Vector3D::zero(), 1.0, Color::red()).is_valid());
    assert!(!Sphere::new(Vector3D::zero(), 0.0, Color::red()).is_valid());
    assert!(!Sphere::new(Vector3D::zero(), -1.0, Color::red()).is_valid());
    assert!(!Sphere::new(Vector3D::new(f64::INFINITY, 0.0, 0.0), 1.0,
        Color::red()).is_valid());
}
