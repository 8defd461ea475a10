//! Validity checks and what each one does when the model cannot answer.

use shared::validation::ValidationResult;

use crate::analysis::ImageSubject;
use crate::fallback::{medication_name_heuristic, policy_document_heuristic};
use crate::prompts;

pub const IMAGE_UNVERIFIED_MESSAGE: &str =
    "Unable to validate image type, proceeding with analysis";

/// Outcome of a text check whose remote call failed.
#[derive(Debug, Clone, Copy)]
pub enum FailurePolicy {
    /// Reject the input
    FailClosed,
    /// Decide locally from the input text
    Heuristic(fn(&str) -> bool),
}

impl FailurePolicy {
    pub fn resolve(&self, input: &str) -> bool {
        match self {
            FailurePolicy::FailClosed => false,
            FailurePolicy::Heuristic(check) => check(input),
        }
    }
}

/// Text checks answered with a bare VALID / INVALID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCheck {
    MedicalTerm,
    MedicationName,
    MedicalReport,
    PolicyDocument,
}

impl TextCheck {
    pub fn name(&self) -> &'static str {
        match self {
            TextCheck::MedicalTerm => "medical term",
            TextCheck::MedicationName => "medication name",
            TextCheck::MedicalReport => "medical report",
            TextCheck::PolicyDocument => "policy document",
        }
    }

    pub fn prompt(&self, input: &str) -> String {
        match self {
            TextCheck::MedicalTerm => prompts::medical_term_validity(input),
            TextCheck::MedicationName => prompts::medication_name_validity(input),
            TextCheck::MedicalReport => prompts::report_validity(input),
            TextCheck::PolicyDocument => prompts::policy_validity(input),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            TextCheck::MedicalTerm | TextCheck::MedicalReport => FailurePolicy::FailClosed,
            TextCheck::MedicationName => FailurePolicy::Heuristic(medication_name_heuristic),
            TextCheck::PolicyDocument => FailurePolicy::Heuristic(policy_document_heuristic),
        }
    }
}

impl ImageSubject {
    pub fn prompt(&self) -> &'static str {
        match self {
            ImageSubject::MedicalImage => prompts::MEDICAL_IMAGE_VALIDITY,
            ImageSubject::Medicine => prompts::MEDICINE_IMAGE_VALIDITY,
        }
    }

    /// Image checks fail open: when the model cannot give a verdict the image
    /// goes on to analysis with a warning.
    pub fn unverified(&self) -> ValidationResult {
        ValidationResult::accepted(IMAGE_UNVERIFIED_MESSAGE, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_checks_fail_closed_or_fall_back() {
        assert!(!TextCheck::MedicalTerm.failure_policy().resolve("asthma"));
        assert!(!TextCheck::MedicalReport.failure_policy().resolve("CBC normal"));
        assert!(TextCheck::MedicationName.failure_policy().resolve("ibuprofen"));
        assert!(!TextCheck::MedicationName.failure_policy().resolve("music"));
        assert!(TextCheck::PolicyDocument
            .failure_policy()
            .resolve("Insurance policy for hospital stays"));
    }

    #[test]
    fn test_images_fail_open_with_warning() {
        for subject in [ImageSubject::MedicalImage, ImageSubject::Medicine] {
            let res = subject.unverified();
            assert!(res.is_valid);
            assert_eq!(res.message, IMAGE_UNVERIFIED_MESSAGE);
            assert_eq!(res.detected_type, None);
        }
    }
}
