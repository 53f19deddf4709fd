//! Resolve Module - context → concrete path
//!
//! - `resolver`: Resolver, ResolvedPath, Platform (substitution + normalization)
//! - `translate`: Translator, Translation (same context, another studio)
//!
//! Resolution is pure: same registry + studio + path type + context gives
//! the same string, on any thread.

mod resolver;
mod translate;

pub use resolver::{normalize, Platform, ResolvedPath, Resolver};
pub use translate::{Translation, Translator};
