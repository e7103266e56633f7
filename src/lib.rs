// Library surface for the binary and for headless/integration tests.
// Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod clip;
pub mod config;
pub mod error;
pub mod export;
pub mod mpv;
pub mod player;
pub mod runtime;
pub mod session;
pub mod timestamp;
pub mod word;

pub use error::{Error, Result};
