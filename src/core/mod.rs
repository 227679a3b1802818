//! Core functionality for ctfetch

pub mod extractor;
pub mod params;
pub mod result;

pub use extractor::*;
pub use params::*;
pub use result::*;
