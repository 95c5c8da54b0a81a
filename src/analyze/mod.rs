//! Static heuristics over source text. These are textual approximations,
//! not parsers; see each module for what it counts.

pub mod complexity;
pub mod dependencies;
pub mod function_length;
pub mod patterns;
pub mod project;

pub use project::{scan_project, ProjectScan};
