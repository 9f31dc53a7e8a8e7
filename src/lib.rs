pub mod image_pipeline;
pub mod job;
pub mod logger;
