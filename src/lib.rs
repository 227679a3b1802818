//! # ctfetch - direct link fetcher for ctfile shares
//!
//! Turns a ctfile / 400gb share URL into direct download links.
//!
//! ## Features
//!
//! - Parameter resolution from the share page or the `getfile.php` API
//! - User agent rotation against the direct-link API
//! - gzip / deflate / brotli response decoding
//! - Per-agent failure isolation
//!
//! ## Example
//!
//! ```rust,no_run
//! use ctfetch::{ExtractOptions, LinkExtractor, ShareReference, TabSeparated};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = LinkExtractor::from_options(&ExtractOptions::default())?;
//!     let share = ShareReference::parse("https://abc.400gb.com/i/123/f/XYZ")?;
//!
//!     let mut sink = TabSeparated::new(std::io::stdout());
//!     let result = extractor.run(&share, &mut sink).await?;
//!     eprintln!("Found {} links", result.links().len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use crate::core::{
    AttemptOutcome, AttemptStatus, DownloadResult, ExtractOptions, FileParameters, FreeDownArgs,
    LinkExtractor, Strategy,
};
pub use error::{CtError, ErrorKind};
pub use platform::{LinkFetcher, LinkSink, ParameterResolver, ShuffleMode, TabSeparated, UserAgentPool};
pub use utils::ShareReference;

/// Result type alias for ctfetch operations
pub type Result<T> = std::result::Result<T, CtError>;
