//! Macro dependency resolution.
//!
//! Declared macro names are looked up by file name across the target's
//! search locations, recursively, and conflicting matches are collapsed by
//! override precedence. All I/O goes through [`crate::util::FileSystem`], so
//! the same input tree always resolves to the same path list.

pub mod errors;
pub mod precedence;
pub mod resolve;

pub use errors::ResolveError;
pub use precedence::prioritise;
pub use resolve::{Resolution, Resolver, Unresolved};
