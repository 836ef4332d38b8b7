//! mdon - read and post to Mastodon from the terminal
//!
//! This library holds everything behind the `md` binary: configuration,
//! the server client seam, status rendering and the HTML-to-text extractor
//! used to print status bodies.

pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod instance;
pub mod logging;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, InstanceError, MdError, Result};
pub use extract::extract_text;
pub use instance::Instance;
pub use render::Palette;
pub use types::{Account, Status, StreamEvent};
