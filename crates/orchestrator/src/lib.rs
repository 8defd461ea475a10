//! Health-assistant request orchestration.
//!
//! Turns user requests into prompts for a [`providers::RemoteModel`], shapes
//! the replies and applies each operation's failure policy. See
//! [`MedicalAssistant`] for the operations and [`ChatSession`] for streaming
//! chat with cancellation.

pub mod analysis;
pub mod assistant;
pub mod chat;
pub mod error;
pub mod fallback;
pub mod language;
pub mod normalize;
pub mod prompts;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use analysis::{
    ImageSubject, KeyFinding, MedicalImageAnalysis, MedicineAnalysis, OverallAssessment,
    Recommendations, SideEffects, WhenToTake,
};
pub use assistant::MedicalAssistant;
pub use chat::{ChatSession, ChatStream};
pub use error::{AssistError, AssistResult, Operation};
