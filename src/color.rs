use serde::{ Serialize, Deserialize };

/// A color.
///
/// Represented with red-green-blue (RGB) values, each stored as a byte. The
/// caster does no shading, so a color is only ever copied from a sphere to a
/// pixel; it never needs floating point channels.
///
/// # Examples
///
/// Construct the color red:
///
/// ```
/// # use sphere_caster::color::Color;
/// let red = Color::red();
/// assert_eq!(red, Color::rgb(255, 0, 0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Conversion from a vector to a `Color`.
///
/// Takes the first `n` elements of a vector, and assigns them to the `r`, `g`
/// and `b` fields of the `Color`, in that order. If there aren't enough
/// elements in the vector, the remaining fields are zero.
impl From<&Vec<u8>> for Color {
    fn from(v: &Vec<u8>) -> Color {
        match v.len() {
            0 => Default::default(),
            1 => Color { r: v[0], ..Default::default() },
            2 => Color { r: v[0], g: v[1], ..Default::default() },
            _ => Color { r: v[0], g: v[1], b: v[2] }
        }
    }
}

impl From<Vec<u8>> for Color {
    fn from(v: Vec<u8>) -> Color {
        (&v).into()
    }
}

impl From<Color> for Vec<u8> {
    fn from(c: Color) -> Vec<u8> {
        vec![c.r, c.g, c.b]
    }
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// The color assigned to pixels whose ray hits nothing.
    pub fn background() -> Color {
        Color::black()
    }

    /// The color black.
    pub fn black() -> Color {
        Color { r: 0, g: 0, b: 0 }
    }

    /// The color white.
    pub fn white() -> Color {
        Color { r: 255, g: 255, b: 255 }
    }

    /// The color red.
    pub fn red() -> Color {
        Color { r: 255, g: 0, b: 0 }
    }

    /// The color green.
    pub fn green() -> Color {
        Color { r: 0, g: 255, b: 0 }
    }

    /// The color blue.
    pub fn blue() -> Color {
        Color { r: 0, g: 0, b: 255 }
    }

    /// The color as four RGBA bytes, fully opaque.
    pub fn to_rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

#[test]
fn background_is_black() {
    assert_eq!(Color::background(), Color::rgb(0, 0, 0));
    assert_eq!(Color::background(), Color::default());
}

#[test]
fn color_from_short_vec() {
    let c: Color = (&vec![12, 34]).into();

    assert_eq!(c, Color::rgb(12, 34, 0));
}

#[test]
fn color_from_long_vec() {
    let c: Color = (&vec![1, 2, 3, 4]).into();

    assert_eq!(c, Color::rgb(1, 2, 3));
}

#[test]
fn color_to_rgba_is_opaque() {
    assert_eq!(Color::rgb(9, 8, 7).to_rgba(), [9, 8, 7, 255]);
}

#[test]
fn color_json() {
    let c: Color = serde_json::from_str("[1, 2, 3]").unwrap();
    assert_eq!(c, Color::rgb(1, 2, 3));
    assert_eq!(serde_json::to_string(&c).unwrap(), "[1,2,3]");
}
