pub mod board;
pub mod patterns;
pub mod registry;
pub mod sample_image;

pub use board::{BoardConfig, BoardError, Sample, WaveBoard};
pub use registry::PatternEntry;
pub use sample_image::{SampleImage, SampleLoadError};
