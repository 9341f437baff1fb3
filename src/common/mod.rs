//! Common utilities shared by the driver and the scenario runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
