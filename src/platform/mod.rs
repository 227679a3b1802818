//! File host API client and related functionality

pub mod agents;
pub mod client;
pub mod links;
pub mod resolver;

pub use agents::*;
pub use client::*;
pub use links::*;
pub use resolver::*;
