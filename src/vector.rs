use std::ops::{ Add, Sub, Neg, Mul };

use crate::feq;

/// A three-dimensional vector.
///
/// Used for points and directions alike; the caster has no need for the
/// point/vector distinction a homogeneous coordinate would give.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Vector3D {
    fn eq(&self, other: &Vector3D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D { x, y, z }
    }

    pub fn zero() -> Vector3D {
        Default::default()
    }

    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
    }

    pub fn squared_length(&self) -> f64 {
        self.dot(self)
    }

    /// The (non-negative) Euclidean length of the vector.
    pub fn length(&self) -> f64 {
        self.squared_length().sqrt()
    }

    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        Vector3D {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// The vector pointing from `other` to `self`.
    pub fn difference(&self, other: &Vector3D) -> Vector3D {
        *self - *other
    }

    /// Returns a copy of this vector, scaled by `s`.
    pub fn scaled(&self, s: f64) -> Vector3D {
        *self * s
    }

    /// Scales this vector in place.
    pub fn scale(&mut self, s: f64) {
        self.x *= s;
        self.y *= s;
        self.z *= s;
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Conversion from a slice of floats to a `Vector3D`.
///
/// Missing trailing components default to zero, the same way `Color`
/// handles short channel lists.
impl From<&[f64]> for Vector3D {
    fn from(v: &[f64]) -> Vector3D {
        match v.len() {
            0 => Default::default(),
            1 => Vector3D { x: v[0], ..Default::default() },
            2 => Vector3D { x: v[0], y: v[1], ..Default::default() },
            _ => Vector3D { x: v[0], y: v[1], z: v[2] }
        }
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Implements scalar right-multiplication for a vector.
///
/// ```
/// use sphere_caster::vector::Vector3D;
///
/// let v = Vector3D::new(1.0, 2.0, 3.0);
/// assert_eq!(v * 2.0, Vector3D::new(2.0, 4.0, 6.0));
/// ```
impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
        }
    }
}

/// Implements scalar left-multiplication for a vector.
///
/// ```
/// use sphere_caster::vector::Vector3D;
///
/// let v = Vector3D::new(1.0, 2.0, 3.0);
/// assert_eq!(2.0 * v, Vector3D::new(2.0, 4.0, 6.0));
/// ```
impl Mul<Vector3D> for f64 {
    type Output = Vector3D;

    fn mul(self, other: Vector3D) -> Vector3D {
        Vector3D {
            x: self * other.x,
            y: self * other.y,
            z: self * other.z,
        }
    }
}

/* Tests */

#[test]
fn add_vectors() {
    let a1 = Vector3D::new(3.0, -2.0, 5.0);
    let a2 = Vector3D::new(-2.0, 3.0, 1.0);

    assert_eq!(a1 + a2, Vector3D::new(1.0, 1.0, 6.0));
}

#[test]
fn difference_of_vectors() {
    let p1 = Vector3D::new(3.0, 2.0, 1.0);
    let p2 = Vector3D::new(5.0, 6.0, 7.0);

    assert_eq!(p1.difference(&p2), Vector3D::new(-2.0, -4.0, -6.0));
    assert_eq!(p1 - p2, p1.difference(&p2));
}

#[test]
fn neg_vector() {
    let a = Vector3D::new(1.0, -2.0, 3.0);

    assert_eq!(-a, Vector3D::new(-1.0, 2.0, -3.0));
}

#[test]
fn scale_in_place() {
    let mut a = Vector3D::new(1.0, -2.0, 3.0);
    a.scale(3.5);

    assert_eq!(a, Vector3D::new(3.5, -7.0, 10.5));
}

#[test]
fn scaled_leaves_original() {
    let a = Vector3D::new(1.0, -2.0, 3.0);
    let b = a.scaled(0.5);

    assert_eq!(a, Vector3D::new(1.0, -2.0, 3.0));
    assert_eq!(b, Vector3D::new(0.5, -1.0, 1.5));
}

#[test]
fn length_pos() {
    let v = Vector3D::new(1.0, 2.0, 3.0);

    assert_eq!(v.squared_length(), 14.0);
    assert_eq!(v.length(), f64::sqrt(14.0));
}

#[test]
fn length_neg() {
    let v = Vector3D::new(-1.0, -2.0, -3.0);

    assert_eq!(v.length(), f64::sqrt(14.0));
}

#[test]
fn length_zero() {
    assert_eq!(Vector3D::zero().length(), 0.0);
}

#[test]
fn dot_vectors() {
    let a = Vector3D::new(1.0, 2.0, 3.0);
    let b = Vector3D::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn cross_vectors() {
    let a = Vector3D::new(1.0, 2.0, 3.0);
    let b = Vector3D::new(2.0, 3.0, 4.0);

    assert_eq!(a.cross(&b), Vector3D::new(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Vector3D::new(1.0, -2.0, 1.0));
}

#[test]
fn vector_from_short_slice() {
    let v: Vector3D = (&[1.0, 2.0][..]).into();

    assert_eq!(v, Vector3D::new(1.0, 2.0, 0.0));
}
