//! Configuration for the galaxy viewer.
//!
//! Settings persist to disk as RON and can be overridden from the command
//! line. Every section defaults independently so partial files load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, ClampedParameter, Config, DebugConfig, GalaxyConfig, RenderConfig, WindowConfig,
};
pub use error::ConfigError;
