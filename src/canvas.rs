use std::fmt;

use crate::color::Color;
use crate::error::RenderError;

/// The position of a pixel on a canvas.
///
/// `x` is the column and `y` the row, both zero-indexed. The linear offset of
/// a pixel is always row-major: `y * width + x`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelIndex {
    pub x: usize,
    pub y: usize,
}

impl PixelIndex {
    pub fn new(x: usize, y: usize) -> PixelIndex {
        PixelIndex { x, y }
    }

    /// The row-major offset of this pixel, or `None` if it lies outside a
    /// `width`-by-`height` frame.
    pub fn offset(&self, width: usize, height: usize) -> Option<usize> {
        if self.x >= width || self.y >= height {
            return None
        }

        Some(self.y * width + self.x)
    }
}

impl fmt::Display for PixelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The color computed for one pixel, tagged with the pixel it belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelResult {
    pub index: PixelIndex,
    pub color: Color,
}

/// A canvas of rendered pixels.
///
/// The canvas stores the resultant colors for each pixel ray. Once a render
/// finishes, the canvas can be flattened into an RGBA buffer for an image
/// sink.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened vector.
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a new canvas with specified width and height, filled with
    /// `fill`.
    pub fn new(width: usize, height: usize, fill: Color) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![fill; width * height]
        }
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. Pixels are specified in row-column
    /// order, where `y` is the row of the pixel, and `x` is the column. Rows
    /// and columns are zero-indexed.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use sphere_caster::color::Color;
    /// # use sphere_caster::canvas::Canvas;
    /// let purple = Color::rgb(255, 0, 255);
    /// let mut canvas = Canvas::new(8, 8, Color::black());
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        // Silently ignore out-of-bounds pixels
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// If the specified pixel location is out-of-bounds, `None` is returned.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        // Return nothing if pixel is out-of-bounds
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// All pixels, in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Flattens the canvas into RGBA bytes.
    ///
    /// Pixel `(x, y)` starts at byte `4 * (y * width + x)`. Alpha is always
    /// fully opaque.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in self.pixels.iter() {
            out.extend_from_slice(&pixel.to_rgba());
        }

        out
    }
}

/// Collects tagged pixel results into a `Canvas`.
///
/// Results may arrive in any order. Each is placed by its own index, and the
/// assembler refuses anything which would leave the frame wrong: an index
/// outside the frame, the same pixel twice, or a frame with holes in it.
#[derive(Debug)]
pub struct FrameAssembler {
    canvas: Canvas,
    written: Vec<bool>,
    remaining: usize,
}

impl FrameAssembler {
    pub fn new(width: usize, height: usize) -> FrameAssembler {
        FrameAssembler {
            canvas: Canvas::new(width, height, Color::background()),
            written: vec![false; width * height],
            remaining: width * height,
        }
    }

    /// Records the color of one pixel.
    pub fn accept(&mut self, result: PixelResult) -> Result<(), RenderError> {
        let width = self.canvas.width;
        let height = self.canvas.height;

        let offset = result.index.offset(width, height).ok_or(
            RenderError::PixelOutOfBounds { index: result.index, width, height }
        )?;

        if self.written[offset] {
            return Err(RenderError::DuplicatePixel { index: result.index });
        }

        self.written[offset] = true;
        self.remaining -= 1;
        self.canvas.pixels[offset] = result.color;

        Ok(())
    }

    /// The number of pixels still missing.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Hands over the finished canvas, provided every pixel was written.
    pub fn finish(self) -> Result<Canvas, RenderError> {
        if self.remaining > 0 {
            return Err(RenderError::IncompleteFrame { missing: self.remaining });
        }

        Ok(self.canvas)
    }
}

/* Tests */

#[test]
fn pixel_offset_is_row_major() {
    assert_eq!(PixelIndex::new(2, 1).offset(4, 3), Some(6));
    assert_eq!(PixelIndex::new(3, 2).offset(4, 3), Some(11));
    assert_eq!(PixelIndex::new(4, 0).offset(4, 3), None);
    assert_eq!(PixelIndex::new(0, 3).offset(4, 3), None);
}

#[test]
fn write_out_of_bounds_is_ignored() {
    let mut canvas = Canvas::new(2, 2, Color::black());
    canvas.write_pixel(2, 0, &Color::red());

    assert_eq!(canvas.read_pixel(2, 0), None);
    assert!(canvas.pixels().iter().all(|&c| c == Color::black()));
}

#[test]
fn rgba_layout() {
    let mut canvas = Canvas::new(3, 2, Color::black());
    canvas.write_pixel(2, 1, &Color::rgb(1, 2, 3));
    let rgba = canvas.to_rgba();

    assert_eq!(rgba.len(), 3 * 2 * 4);
    let o = 4 * (1 * 3 + 2);
    assert_eq!(&rgba[o..o + 4], &[1, 2, 3, 255]);
    assert!(rgba.chunks(4).all(|p| p[3] == 255));
}

#[test]
fn assembler_accepts_any_order() {
    let mut assembler = FrameAssembler::new(3, 2);
    let mut results = Vec::new();
    for y in 0..2 {
        for x in 0..3 {
            let color = Color::rgb(x as u8, y as u8, 7);
            results.push(PixelResult { index: PixelIndex::new(x, y), color });
        }
    }

    for result in results.into_iter().rev() {
        assembler.accept(result).unwrap();
    }

    assert!(assembler.is_complete());
    let canvas = assembler.finish().unwrap();
    assert_eq!(canvas.read_pixel(2, 1), Some(Color::rgb(2, 1, 7)));
    assert_eq!(canvas.read_pixel(0, 1), Some(Color::rgb(0, 1, 7)));
    assert_eq!(canvas.read_pixel(1, 0), Some(Color::rgb(1, 0, 7)));
}

#[test]
fn assembler_rejects_duplicates() {
    let mut assembler = FrameAssembler::new(2, 2);
    let r = PixelResult { index: PixelIndex::new(1, 1), color: Color::red() };

    assembler.accept(r).unwrap();
    match assembler.accept(r) {
        Err(RenderError::DuplicatePixel { index }) => {
            assert_eq!(index, PixelIndex::new(1, 1));
        },
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn assembler_rejects_out_of_bounds() {
    let mut assembler = FrameAssembler::new(2, 2);
    let r = PixelResult { index: PixelIndex::new(0, 2), color: Color::red() };

    match assembler.accept(r) {
        Err(RenderError::PixelOutOfBounds { width, height, .. }) => {
            assert_eq!((width, height), (2, 2));
        },
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(assembler.remaining(), 4);
}

#[test]
fn assembler_rejects_incomplete_frame() {
    let mut assembler = FrameAssembler::new(2, 2);
    assembler.accept(PixelResult {
        index: PixelIndex::new(0, 0),
        color: Color::red(),
    }).unwrap();

    match assembler.finish() {
        Err(RenderError::IncompleteFrame { missing }) => assert_eq!(missing, 3),
        other => panic!("unexpected result {:?}", other),
    }
}
