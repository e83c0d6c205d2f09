//! Animation baking
//!
//! Each configured clip is resampled at a fixed rate: every animatable node
//! gets one translation, rotation and scale sample per frame, all sharing the
//! clip's time accessor.

pub mod clip;
pub mod node;

pub use clip::{frame_count, ExportableClip};
pub use node::{NodeAnimation, SampleFailure};
