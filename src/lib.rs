//! Shape Driver - GUI automation for network editor regression tests
//!
//! This library drives a running network/shape editor through keyboard and
//! mouse input, confirming every action by matching reference images on
//! screen. Screen matching and input injection are traits so any backend can
//! be plugged in.

pub mod common;
pub mod driver;
pub mod geometry;
pub mod input;
pub mod locator;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use driver::{Anchor, Driver, FieldEdit, Session, Termination};
pub use input::{Chord, InputSink};
pub use locator::{Locator, Match};
