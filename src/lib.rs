pub mod adapters;
pub mod analyze;
pub mod bench;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod templates;
pub mod tools;
pub mod types;
