//! The window-based reflectivity retrieval pipeline.

pub mod binning;
pub mod calibrate;
pub mod decompose;
pub mod dispatch;
pub mod error;
pub mod frames;
pub mod invert;
pub mod processor;
pub mod record;
pub mod scaling;
