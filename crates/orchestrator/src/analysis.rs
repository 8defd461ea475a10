//! Structured replies from the image prompts.
//!
//! Only the sentinel field (`imageType` / `medicineName`) is required. Every
//! other field tolerates absence, `null` or a wrong type, since the shape is
//! agreed with the model only through the prompt.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::validation::ValidationResult;

use crate::normalize::{confidence, extract_payload, lenient};

/// A JSON reply that is only usable when one key is present.
pub trait StructuredReply: DeserializeOwned {
    const SENTINEL: &'static str;

    fn sentinel(&self) -> &str;
}

/// Parse a reply and check its sentinel. The error string is for logs only.
pub fn decode_reply<T: StructuredReply>(reply: &str) -> Result<T, String> {
    let parsed: T = extract_payload(reply).decode()?;
    if parsed.sentinel().trim().is_empty() {
        return Err(format!("reply is missing `{}`", T::SENTINEL));
    }
    Ok(parsed)
}

// ── Medical image ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalImageAnalysis {
    #[serde(deserialize_with = "lenient")]
    pub image_type: String,
    #[serde(deserialize_with = "lenient")]
    pub body_part: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub key_findings: Vec<KeyFinding>,
    #[serde(deserialize_with = "lenient")]
    pub overall_assessment: OverallAssessment,
    #[serde(deserialize_with = "lenient")]
    pub recommendations: Recommendations,
    #[serde(deserialize_with = "lenient")]
    pub differential_diagnosis: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub red_flags: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub next_steps: Vec<String>,
    #[serde(deserialize_with = "confidence")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyFinding {
    pub finding: String,
    pub location: Option<String>,
    /// Normal | Mild | Moderate | Severe | Critical
    pub severity: Option<String>,
    pub significance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverallAssessment {
    /// Normal | Attention Needed | Urgent Care Required
    pub status: Option<String>,
    pub summary: Option<String>,
    /// Low | Medium | High
    pub urgency_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendations {
    pub immediate: Vec<String>,
    pub follow_up: Vec<String>,
    pub lifestyle: Vec<String>,
}

impl StructuredReply for MedicalImageAnalysis {
    const SENTINEL: &'static str = "imageType";

    fn sentinel(&self) -> &str {
        &self.image_type
    }
}

// ── Medicine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicineAnalysis {
    #[serde(deserialize_with = "lenient")]
    pub medicine_name: String,
    #[serde(deserialize_with = "lenient")]
    pub active_ingredients: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub what_it_helps: Vec<String>,
    /// Low | Medium | High
    #[serde(deserialize_with = "lenient")]
    pub severity: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub doctor_consultation_required: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub when_to_take: WhenToTake,
    #[serde(deserialize_with = "lenient")]
    pub side_effects: SideEffects,
    #[serde(deserialize_with = "lenient")]
    pub precautions: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub interactions: Vec<String>,
    #[serde(deserialize_with = "confidence")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhenToTake {
    pub timing: Vec<String>,
    /// Before | After | With | Doesn't matter
    pub with_food: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SideEffects {
    pub common: Vec<String>,
    pub serious: Vec<String>,
    pub patient_specific: Vec<String>,
}

impl StructuredReply for MedicineAnalysis {
    const SENTINEL: &'static str = "medicineName";

    fn sentinel(&self) -> &str {
        &self.medicine_name
    }
}

// ── Image validity verdicts ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSubject {
    MedicalImage,
    Medicine,
}

impl ImageSubject {
    fn detected_label(&self) -> &'static str {
        match self {
            ImageSubject::MedicalImage => "Medical image detected",
            ImageSubject::Medicine => "Medicine detected",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            ImageSubject::MedicalImage => "a medical image",
            ImageSubject::Medicine => "a medicine image",
        }
    }
}

/// `{isValid, confidence, detectedType, reason}` reply of the validity prompts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageVerdict {
    #[serde(deserialize_with = "lenient")]
    pub is_valid: bool,
    #[serde(deserialize_with = "confidence")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub detected_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub reason: Option<String>,
}

impl ImageVerdict {
    /// Accept only when the model says valid with at least `threshold`
    /// confidence.
    pub fn into_validation(self, subject: ImageSubject, threshold: u8) -> ValidationResult {
        let confident = self
            .confidence
            .map(|c| c >= f64::from(threshold))
            .unwrap_or(false);
        let detected = self
            .detected_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        if self.is_valid && confident {
            ValidationResult::accepted(
                format!("{}: {}", subject.detected_label(), detected),
                Some(detected),
            )
        } else {
            let reason = self.reason.unwrap_or_default();
            ValidationResult::rejected(
                format!(
                    "This doesn't appear to be {}. Detected: {}. {}",
                    subject.noun(),
                    detected,
                    reason
                )
                .trim_end()
                .to_string(),
            )
        }
    }
}
