//! Remote model adapters.
//!
//! The orchestrator only talks to [`RemoteModel`]; [`gemini::GeminiClient`] is
//! the production implementation.

pub mod gemini;
pub mod model;
pub mod sse;

pub use gemini::{ApiKey, GeminiClient};
pub use model::{FragmentStream, ImagePayload, ModelRequest, RemoteModel};
