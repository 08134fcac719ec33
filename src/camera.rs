use crate::ray::Ray3D;
use crate::vector::Vector3D;
use crate::canvas::PixelIndex;

/// A pinhole camera looking down the negative X axis.
///
/// The camera sits at `(d, 0, 0)`, where `d` is the distance to a viewport
/// through the world origin, chosen so the viewport spans `hsize` units
/// horizontally for the given field of view. Pixel `(x, y)` maps to the
/// viewport point `(0, x - hsize / 2, y - vsize / 2)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    /// The angle describing "how much" the camera can see.
    pub field_of_view: f64,

    /// The distance from the camera to the viewport.
    pub distance: f64,
}

impl Camera {
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64) -> Camera {
        let half_width = (hsize / 2) as f64;
        let distance = half_width / (field_of_view / 2.0).tan();

        Camera { hsize, vsize, field_of_view, distance }
    }

    /// The point every ray starts from.
    pub fn origin(&self) -> Vector3D {
        Vector3D::new(self.distance, 0.0, 0.0)
    }

    /// The (unnormalized) ray passing through a pixel.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray3D {
        let direction = Vector3D::new(
            -self.distance,
            px as f64 - (self.hsize / 2) as f64,
            py as f64 - (self.vsize / 2) as f64,
        );

        Ray3D::new(self.origin(), direction)
    }

    /// Generates a ray for every pixel, in row-major order.
    ///
    /// Each ray is tagged with the pixel it belongs to.
    pub fn rays(&self) -> impl Iterator<Item = (PixelIndex, Ray3D)> + '_ {
        let hsize = self.hsize;
        (0..self.vsize)
            .flat_map(move |y| (0..hsize).map(move |x| PixelIndex::new(x, y)))
            .map(move |index| (index, self.ray_for_pixel(index.x, index.y)))
    }
}

#[cfg(test)]
use crate::feq;

#[test]
fn distance_for_right_angle_fov() {
    let c = Camera::new(256, 256, std::f64::consts::PI / 2.0);

    assert!(feq(c.distance, 128.0));
    assert_eq!(c.origin(), Vector3D::new(128.0, 0.0, 0.0));
}

#[test]
fn odd_width_halves_by_integer_division() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);

    assert!(feq(c.distance, 100.0));
}

#[test]
fn ray_through_center() {
    let c = Camera::new(256, 256, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(128, 128);

    assert_eq!(r.origin, Vector3D::new(128.0, 0.0, 0.0));
    assert_eq!(r.direction, Vector3D::new(-128.0, 0.0, 0.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(8, 4, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.direction, Vector3D::new(-4.0, -4.0, -2.0));
}

#[test]
fn rays_are_row_major() {
    let c = Camera::new(3, 2, std::f64::consts::PI / 2.0);
    let indices: Vec<PixelIndex> = c.rays().map(|(i, _)| i).collect();

    assert_eq!(indices, vec![
        PixelIndex::new(0, 0), PixelIndex::new(1, 0), PixelIndex::new(2, 0),
        PixelIndex::new(0, 1), PixelIndex::new(1, 1), PixelIndex::new(2, 1),
    ]);

    for (index, ray) in c.rays() {
        assert_eq!(ray, c.ray_for_pixel(index.x, index.y));
    }
}
