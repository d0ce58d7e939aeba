// Type definitions for the redaction pipeline

pub mod geometry;
pub mod redaction;

pub use geometry::*;
pub use redaction::*;
