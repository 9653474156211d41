pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod pose;
pub mod video;

pub use error::PipelineError;
