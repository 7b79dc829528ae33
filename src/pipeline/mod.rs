//! File-level workflows built on top of the session.

mod process;

pub use process::{Config, Pipeline, SplitReport};
