//! Aural CLI
//!
//! Terminal front end for `aural-playback`: a line-command shell over a
//! playlist of files, with a clock-driven stand-in for the audio device.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod probe;
pub mod shell;

pub use config::AppConfig;
pub use error::{CliError, Result};
