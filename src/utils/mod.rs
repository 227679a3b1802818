//! Utility functions for ctfetch

pub mod encoding;
pub mod share;

pub use encoding::*;
pub use share::*;
