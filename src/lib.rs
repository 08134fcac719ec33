pub mod consts;

pub mod vector;
pub mod ray;
pub mod color;

pub mod geometry;
pub mod scene;
pub mod camera;

pub mod canvas;
pub mod parallel;
pub mod sink;

pub mod config;
pub mod error;

pub use parallel::{ render, Renderer, CancelToken };
pub use error::{ RenderError, SceneError, SinkError };

use consts::FEQ_EPSILON;
pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
