//! Galaxy viewer application: window, input, orbit controls, and the
//! keyboard parameter panel wired to the point-cloud lifecycle.

pub mod input;
pub mod orbit;
pub mod panel;
pub mod platform;
pub mod window;

pub use window::{AppError, run};
