//! Unit assembly and bundling.
//!
//! This module turns resolved dependencies into compiled text: it embeds
//! programs, assembles units in their fixed section order and folds a
//! compiled output tree into a deployable bundle.

pub mod assemble;
pub mod bundle;
pub mod comments;
pub mod embed;
pub mod render;
pub mod server;

pub use assemble::{assemble, MacroSource};
pub use bundle::{build_bundle, Bundle, Node, TreeDocument};
pub use comments::strip_comments;
pub use embed::{embed, EmbedError, EmbedPlan, EmbeddedProgram};
pub use server::{publisher_for, Publisher, Sas9Publisher, ViyaPublisher};
