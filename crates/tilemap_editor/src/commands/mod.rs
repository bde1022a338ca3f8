//! Keyboard commands

mod shortcuts;

pub use shortcuts::*;
