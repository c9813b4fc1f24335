//! Ski link CLI library.
//!
//! Output formatting for the pipeline summary, shared by the binary and its
//! tests.

pub mod output;
