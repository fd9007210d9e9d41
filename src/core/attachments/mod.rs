//! Size-adaptive email attachments

pub mod encode;
pub mod pipeline;

pub use encode::{compress_and_encode, encode_chunked, Base64ChunkSize};
pub use pipeline::{
    encoded_size, ArtifactFailure, AttachmentPipeline, AttachmentSettings, PipelineOutcome,
};
