use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{ Serialize, Deserialize };

use crate::color::Color;
use crate::geometry::HitPolicy;
use crate::error::RenderError;
use crate::consts::{ DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_FIELD_OF_VIEW };

/// Parameters for a single render.
///
/// Can be embedded in a scene file under the `"render"` key; any field left
/// out takes its default. Command line flags override file values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Width of the frame, in pixels.
    pub width: usize,

    /// Height of the frame, in pixels.
    pub height: usize,

    /// Horizontal field of view, in radians.
    pub field_of_view: f64,

    /// Number of worker threads. `None` means one per logical core.
    pub workers: Option<usize>,

    /// Whether intersections behind the camera count.
    pub hit_policy: HitPolicy,

    /// Color used for pixels whose ray hits nothing.
    pub background: Color,

    /// How often to report progress while rendering, in milliseconds. No
    /// progress is reported when unset.
    pub progress_interval_ms: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            workers: None,
            hit_policy: Default::default(),
            background: Color::background(),
            progress_interval_ms: None,
        }
    }
}

impl RenderConfig {
    /// Creates a default configuration for a frame of the given size.
    pub fn new(width: usize, height: usize) -> RenderConfig {
        RenderConfig { width, height, ..Default::default() }
    }

    /// The number of workers the pool will be started with.
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n,
            None => available_workers(),
        }
    }

    pub fn progress_interval(&self) -> Option<Duration> {
        self.progress_interval_ms.map(Duration::from_millis)
    }

    /// Rejects configurations which cannot produce a frame.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "frame must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }

        if self.width.checked_mul(self.height).is_none() {
            return Err(RenderError::InvalidConfig(format!(
                "frame of {}x{} has too many pixels",
                self.width, self.height
            )));
        }

        if self.workers == Some(0) {
            return Err(RenderError::InvalidConfig(
                "worker count must be at least 1".to_string()
            ));
        }

        if !(self.field_of_view > 0.0 && self.field_of_view < std::f64::consts::PI) {
            return Err(RenderError::InvalidConfig(format!(
                "field of view must lie strictly between 0 and pi, got {}",
                self.field_of_view
            )));
        }

        if self.progress_interval_ms == Some(0) {
            return Err(RenderError::InvalidConfig(
                "progress interval must be at least 1ms".to_string()
            ));
        }

        Ok(())
    }
}

/// The parallelism of the host, falling back to a single worker.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[test]
fn default_config_is_valid() {
    let config: RenderConfig = Default::default();

    assert!(config.validate().is_ok());
    assert!(config.worker_count() >= 1);
    assert_eq!(config.hit_policy, HitPolicy::Unrestricted);
}

#[test]
fn zero_sized_frame_is_invalid() {
    assert!(RenderConfig::new(0, 10).validate().is_err());
    assert!(RenderConfig::new(10, 0).validate().is_err());
}

#[test]
fn zero_workers_is_invalid() {
    let config = RenderConfig { workers: Some(0), ..RenderConfig::new(4, 4) };

    match config.validate() {
        Err(RenderError::InvalidConfig(_)) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn partial_config_json() {
    let config: RenderConfig = serde_json::from_str(r#"{
        "width": 320,
        "workers": 2,
        "hit_policy": "forward",
        "background": [10, 20, 30]
    }"#).unwrap();

    assert_eq!(config.width, 320);
    assert_eq!(config.height, DEFAULT_HEIGHT);
    assert_eq!(config.worker_count(), 2);
    assert_eq!(config.hit_policy, HitPolicy::Forward);
    assert_eq!(config.background, Color::rgb(10, 20, 30));
    assert_eq!(config.progress_interval(), None);
}
