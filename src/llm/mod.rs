//! Language-model request pipeline
//!
//! - `ChatModel`: the inference capability agents hold as a collaborator
//! - `LlmPipeline`: chat endpoint with bounded retry, then generate fallback
//! - Response normalization across the payload shapes model servers emit

pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod response;
pub mod transport;

pub use model::ChatModel;
pub use pipeline::{is_error_sentinel, Endpoint, LlmPipeline, PipelineSettings, LLM_ERROR_SENTINEL};
pub use response::{extract_content, ResponseShape};
pub use transport::{HttpTransport, LlmTransport, TransportResponse};
