//! Response rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! upstream HTML text + page URL + proxy prefix
//!     → content.rs (attribute pass, then CSS url() pass)
//!         → resolver.rs (reference → absolute URL, or leave alone)
//!         → encoder.rs (absolute URL → proxy-relative link)
//!     → rewritten text
//! ```
//!
//! # Design Decisions
//! - Pattern-based substitution, no DOM: a missed reference simply loads
//!   from the origin directly
//! - A reference that fails to resolve is left byte-identical
//! - Compiled patterns live in an immutable `ContentRewriter` built once

pub mod content;
pub mod encoder;
pub mod resolver;

pub use content::{ContentRewriter, Rewritten};
pub use encoder::{encode, ProxyPrefix};
pub use resolver::{resolve, Resolution, ResolutionError};
