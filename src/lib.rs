pub mod canvas;
pub mod config;
pub mod display;
pub mod error;
pub mod fireworks;
pub mod surface;

pub use error::{Error, Result};
