//! Geometry utilities: small vector helpers on `[f64; 3]` and bounding boxes.

pub mod metrics;
