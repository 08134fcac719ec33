use crate::vector::Vector3D;

/// A ray with an origin and a direction.
///
/// The direction is not normalized. Anything consuming a ray has to account
/// for the length of `direction`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray3D {
    pub origin: Vector3D,
    pub direction: Vector3D,
}

impl Ray3D {
    pub fn new(origin: Vector3D, direction: Vector3D) -> Ray3D {
        Ray3D { origin, direction }
    }

    /// The point at parameter `t` along the ray.
    pub fn position(&self, t: f64) -> Vector3D {
        self.origin + (t * self.direction)
    }
}

#[test]
fn ray_position() {
    let r = Ray3D::new(
                Vector3D::new(2.0, 3.0, 4.0),
                Vector3D::new(1.0, 0.0, 0.0)
            );

    assert_eq!(r.position(0.0), Vector3D::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Vector3D::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Vector3D::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Vector3D::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_position_unnormalized() {
    let r = Ray3D::new(
                Vector3D::new(0.0, 0.0, 0.0),
                Vector3D::new(0.0, 2.0, 0.0)
            );

    assert_eq!(r.position(1.5), Vector3D::new(0.0, 3.0, 0.0));
}
