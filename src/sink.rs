use std::convert::TryFrom;
use std::fs::File;
use std::io::{ BufWriter, Write };
use std::path::{ Path, PathBuf };

use log::info;

use crate::canvas::Canvas;
use crate::error::SinkError;

/// A destination for finished frames.
///
/// Sinks receive a flat RGBA buffer, four bytes per pixel in row-major
/// order, along with the frame dimensions.
pub trait ImageSink {
    fn save(&self, path: &Path, width: usize, height: usize, rgba: &[u8])
        -> Result<(), SinkError>;

    /// Saves a finished canvas.
    fn save_canvas(&self, path: &Path, canvas: &Canvas) -> Result<(), SinkError> {
        self.save(path, canvas.width, canvas.height, &canvas.to_rgba())
    }
}

/// Checks that `rgba` holds exactly one RGBA quad per pixel.
fn check_buffer(width: usize, height: usize, rgba: &[u8]) -> Result<(), SinkError> {
    let expected = width.checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(SinkError::Dimensions { width, height })?;

    if rgba.len() != expected {
        return Err(SinkError::BufferSize { expected, actual: rgba.len() });
    }

    Ok(())
}

/// Writes PNG files through the `image` crate.
#[derive(Copy, Clone, Debug, Default)]
pub struct PngSink;

impl ImageSink for PngSink {
    fn save(&self, path: &Path, width: usize, height: usize, rgba: &[u8])
        -> Result<(), SinkError> {
        check_buffer(width, height, rgba)?;

        let too_large = || SinkError::Dimensions { width, height };
        let w = u32::try_from(width).map_err(|_| too_large())?;
        let h = u32::try_from(height).map_err(|_| too_large())?;

        let image = image::RgbaImage::from_raw(w, h, rgba.to_vec())
            .ok_or_else(too_large)?;
        image.save_with_format(path, image::ImageFormat::Png)?;

        info!("Saved {}x{} PNG to {}", width, height, path.display());
        Ok(())
    }
}

/// Writes plain-text (P3) PPM files.
///
/// Alpha is dropped. Lines in the file are clamped to 70 columns; if some
/// value would pass the 70 column mark, it moves to the next line.
#[derive(Copy, Clone, Debug, Default)]
pub struct PpmSink;

impl PpmSink {
    /// Writes the PPM encoding of a frame to any writer.
    pub fn write<W: Write>(&self, out: &mut W, width: usize, height: usize,
        rgba: &[u8]) -> Result<(), SinkError> {
        check_buffer(width, height, rgba)?;

        // Write PPM header, as well as metadata
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", width, height)?;
        writeln!(out, "255")?; // Maximum color value

        let mut col = 0;
        for pixel in rgba.chunks(4) {
            for channel in &pixel[..3] {
                let value = channel.to_string();

                if col == 0 {
                    write!(out, "{}", value)?;
                    col = value.len();
                } else if col + 1 + value.len() > 70 {
                    write!(out, "\n{}", value)?;
                    col = value.len();
                } else {
                    write!(out, " {}", value)?;
                    col += 1 + value.len();
                }
            }
        }

        // Terminate the PPM file with a newline
        writeln!(out)?;

        Ok(())
    }
}

impl ImageSink for PpmSink {
    fn save(&self, path: &Path, width: usize, height: usize, rgba: &[u8])
        -> Result<(), SinkError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out, width, height, rgba)?;
        out.flush()?;

        info!("Saved {}x{} PPM to {}", width, height, path.display());
        Ok(())
    }
}

/// Picks a sink from the extension of `path`.
pub fn sink_for_path(path: &Path) -> Result<Box<dyn ImageSink>, SinkError> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => Ok(Box::new(PngSink)),
        Some("ppm") => Ok(Box::new(PpmSink)),
        _ => Err(SinkError::UnsupportedFormat(path.to_path_buf())),
    }
}

/* Tests */

#[cfg(test)]
use crate::color::Color;

#[test]
fn ppm_header() {
    let canvas = Canvas::new(5, 3, Color::black());
    let mut out = Vec::new();
    PpmSink.write(&mut out, 5, 3, &canvas.to_rgba()).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(&lines[..3], &["P3", "5 3", "255"]);
}

#[test]
fn ppm_pixel_data() {
    let mut canvas = Canvas::new(3, 1, Color::black());
    canvas.write_pixel(0, 0, &Color::red());
    canvas.write_pixel(2, 0, &Color::rgb(0, 128, 7));

    let mut out = Vec::new();
    PpmSink.write(&mut out, 3, 1, &canvas.to_rgba()).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "P3\n3 1\n255\n255 0 0 0 0 0 0 128 7\n");
}

#[test]
fn ppm_lines_wrap_at_70_columns() {
    let canvas = Canvas::new(10, 2, Color::rgb(255, 204, 153));
    let mut out = Vec::new();
    PpmSink.write(&mut out, 10, 2, &canvas.to_rgba()).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.lines().all(|l| l.len() <= 70));
    let values: usize = text.lines().skip(3)
        .map(|l| l.split_whitespace().count())
        .sum();
    assert_eq!(values, 10 * 2 * 3);
    assert!(text.ends_with('\n'));
}

#[test]
fn wrong_buffer_size_is_rejected() {
    match PpmSink.write(&mut Vec::<u8>::new(), 2, 2, &[0; 15]) {
        Err(SinkError::BufferSize { expected, actual }) => {
            assert_eq!((expected, actual), (16, 15));
        },
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn sink_selection() {
    assert!(sink_for_path(Path::new("out/a.png")).is_ok());
    assert!(sink_for_path(Path::new("out/a.PPM")).is_ok());
    assert!(sink_for_path(Path::new("out/a.bmp")).is_err());
    assert!(sink_for_path(Path::new("out/a")).is_err());
}

/// Builds an output path of the form `dir/render_YYYY_MM_DD_HH_MM_SS.png`
/// from seconds since the Unix epoch (UTC).
pub fn timestamped_path(dir: &Path, unix_secs: u64) -> PathBuf {
    let days = (unix_secs / 86_400) as i64;
    let secs_of_day = unix_secs % 86_400;

    // Civil date from days since 1970-01-01 (proleptic Gregorian).
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };

    dir.join(format!(
        "render_{:04}_{:02}_{:02}_{:02}_{:02}_{:02}.png",
        year, month, day,
        secs_of_day / 3_600, (secs_of_day / 60) % 60, secs_of_day % 60
    ))
}

#[test]
fn timestamped_names() {
    let dir = Path::new("out");

    assert_eq!(timestamped_path(dir, 0),
        dir.join("render_1970_01_01_00_00_00.png"));
    // 2000-02-29 12:34:56 UTC
    assert_eq!(timestamped_path(dir, 951_827_696),
        dir.join("render_2000_02_29_12_34_56.png"));
}
