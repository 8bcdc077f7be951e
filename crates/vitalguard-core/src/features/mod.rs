//! Windowed feature extraction over per-patient vitals streams.

pub mod extractor;
pub mod snapshot;
pub mod window;

pub use extractor::FeatureExtractor;
pub use snapshot::{FeatureSnapshot, HorizonFeatures, VitalAggregate};
pub use window::{FeatureWindow, WindowConfig};
