pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod storage;
pub mod trace;
pub mod tui;
pub mod viewport;

pub use error::{Error, Result};
