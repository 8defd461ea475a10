//! Failure taxonomy for caller-facing operations.

/// Operations that can fail with a generic "try again" message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SymptomAnalysis,
    DrugInteraction,
    ExplainTerm,
    SummarizeReport,
    HealthQuestion,
    PolicyQuery,
    ReportQuery,
    MedicalImageAnalysis,
    MedicineAnalysis,
    StreamChat,
}

impl Operation {
    /// Message shown to the user when the remote call or its reply fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::SymptomAnalysis => "Failed to analyze symptoms. Please try again.",
            Operation::DrugInteraction => "Failed to analyze drug interactions. Please try again.",
            Operation::ExplainTerm => "Failed to explain the medical term. Please try again.",
            Operation::SummarizeReport => {
                "Failed to summarize the medical report. Please try again."
            }
            Operation::HealthQuestion => "Failed to process your question. Please try again.",
            Operation::PolicyQuery => "Failed to analyze the policy query. Please try again.",
            Operation::ReportQuery => {
                "Failed to analyze your medical report query. Please try again."
            }
            Operation::MedicalImageAnalysis => {
                "Failed to analyze medical image. Please try again."
            }
            Operation::MedicineAnalysis => "Failed to analyze medicine. Please try again.",
            Operation::StreamChat => "Failed to stream response from AI",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// Required input missing; raised before any remote call.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// The remote model could not be reached or returned an error.
    #[error("{}", .operation.failure_message())]
    Remote { operation: Operation, detail: String },

    /// The remote model answered, but not in the agreed shape.
    #[error("{}", .operation.failure_message())]
    MalformedResponse { operation: Operation, detail: String },

    #[error("Request cancelled by user")]
    Cancelled,
}

impl AssistError {
    pub(crate) fn remote(operation: Operation, err: &anyhow::Error) -> Self {
        tracing::error!(?operation, error = %err, "remote model call failed");
        AssistError::Remote {
            operation,
            detail: format!("{:#}", err),
        }
    }

    pub(crate) fn malformed(operation: Operation, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!(?operation, %detail, "unusable model reply");
        AssistError::MalformedResponse { operation, detail }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AssistError::Cancelled)
    }
}

pub type AssistResult<T> = std::result::Result<T, AssistError>;
