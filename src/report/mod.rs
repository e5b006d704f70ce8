//! Dashboard rendering for the Markdown and JSON outputs.

pub mod generator;

pub use generator::*;
