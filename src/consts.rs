// Runtime parameters
pub const DEFAULT_WIDTH: usize = 256;
pub const DEFAULT_HEIGHT: usize = 256;
pub const DEFAULT_OUT_DIR: &'static str = "out";

// Field of view. Half of it goes through `tan`, giving `tan(PI / 4)`.
pub const DEFAULT_FIELD_OF_VIEW: f64 = std::f64::consts::PI / 2.0;

// Capacity of the bounded task and result channels, per worker.
pub const CHANNEL_BUFFER_PER_WORKER: usize = 256;

// How often the collector checks for cancellation while waiting, in ms.
pub const CANCEL_POLL_MS: u64 = 20;

// Random scene generation
pub const RANDOM_SPHERE_RADIUS: f64 = 10.0;
pub const RANDOM_SPHERE_COUNT: usize = 5000;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;
