use providers::{ImagePayload, ModelRequest, RemoteModel};
use shared::conversation::ConversationMessage;
use shared::settings::AssistantSettings;
use shared::validation::ValidationResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::analysis::{
    decode_reply, ImageSubject, ImageVerdict, MedicalImageAnalysis, MedicineAnalysis,
    StructuredReply,
};
use crate::chat::{cancellable_stream, ChatStream};
use crate::error::{AssistError, AssistResult, Operation};
use crate::normalize::{extract_payload, is_valid_verdict};
use crate::prompts;
use crate::validation::TextCheck;

fn require(text: &str, message: &'static str) -> AssistResult<()> {
    if text.trim().is_empty() {
        return Err(AssistError::InvalidInput(message));
    }
    Ok(())
}

/// Caller-facing operations. Cheap to clone; clones share one remote model.
#[derive(Clone)]
pub struct MedicalAssistant {
    model: Arc<dyn RemoteModel>,
    settings: AssistantSettings,
}

impl MedicalAssistant {
    pub fn new(model: Arc<dyn RemoteModel>, settings: AssistantSettings) -> Self {
        Self { model, settings }
    }

    async fn ask(&self, operation: Operation, prompt: String) -> AssistResult<String> {
        tracing::debug!(?operation, prompt_chars = prompt.chars().count(), "sending prompt");
        self.model
            .generate(ModelRequest::text(prompt))
            .await
            .map_err(|e| AssistError::remote(operation, &e))
    }

    // ── Prose operations ─────────────────────────────────────────────

    pub async fn analyze_symptoms(&self, symptoms: &str) -> AssistResult<String> {
        require(symptoms, "Please describe your symptoms.")?;
        self.ask(Operation::SymptomAnalysis, prompts::symptom_analysis(symptoms))
            .await
    }

    /// One name gets a drug profile; several get an interaction analysis.
    pub async fn check_drug_interaction(&self, drugs: &[String]) -> AssistResult<String> {
        if drugs.is_empty() {
            return Err(AssistError::InvalidInput(
                "Please enter at least one medication to analyze.",
            ));
        }
        self.ask(Operation::DrugInteraction, prompts::drug_interaction(drugs))
            .await
    }

    pub async fn explain_medical_term(&self, term: &str) -> AssistResult<String> {
        require(term, "Please enter a medical term to explain.")?;
        self.ask(Operation::ExplainTerm, prompts::explain_term(term))
            .await
    }

    pub async fn summarize_medical_report(&self, report: &str) -> AssistResult<String> {
        require(report, "No report content provided to analyze.")?;
        self.ask(Operation::SummarizeReport, prompts::summarize_report(report))
            .await
    }

    pub async fn get_ai_response(&self, message: &str) -> AssistResult<String> {
        require(message, "Please enter your health-related question.")?;
        self.ask(Operation::HealthQuestion, prompts::health_question(message))
            .await
    }

    pub async fn query_policy_document(
        &self,
        query: &str,
        policy_text: &str,
    ) -> AssistResult<String> {
        require(query, "Please enter your policy question.")?;
        require(policy_text, "No policy document provided to analyze.")?;
        self.ask(
            Operation::PolicyQuery,
            prompts::policy_query(query, policy_text),
        )
        .await
    }

    pub async fn query_medical_report(
        &self,
        query: &str,
        report_text: &str,
    ) -> AssistResult<String> {
        require(query, "Please enter your question about the medical report.")?;
        require(report_text, "No medical report provided to analyze.")?;
        self.ask(
            Operation::ReportQuery,
            prompts::report_query(query, report_text),
        )
        .await
    }

    // ── Text validity checks ─────────────────────────────────────────

    /// Ask the model for a VALID/INVALID verdict. Never fails: a remote error
    /// is settled by the check's failure policy.
    async fn check_text(&self, check: TextCheck, input: &str) -> bool {
        if input.trim().is_empty() {
            return false;
        }
        match self.model.generate(ModelRequest::text(check.prompt(input))).await {
            Ok(reply) => is_valid_verdict(&reply),
            Err(e) => {
                let policy = check.failure_policy();
                let outcome = policy.resolve(input);
                tracing::warn!(
                    check = check.name(),
                    ?policy,
                    outcome,
                    error = %e,
                    "validity check degraded"
                );
                outcome
            }
        }
    }

    pub async fn validate_medical_term(&self, term: &str) -> bool {
        self.check_text(TextCheck::MedicalTerm, term).await
    }

    pub async fn validate_medication_name(&self, drug_name: &str) -> bool {
        self.check_text(TextCheck::MedicationName, drug_name).await
    }

    pub async fn validate_medical_report(&self, text: &str) -> bool {
        self.check_text(TextCheck::MedicalReport, text).await
    }

    pub async fn validate_policy_document(&self, text: &str) -> bool {
        self.check_text(TextCheck::PolicyDocument, text).await
    }

    // ── Images ───────────────────────────────────────────────────────

    async fn check_image(&self, subject: ImageSubject, image: &ImagePayload) -> ValidationResult {
        if image.is_empty() {
            return ValidationResult::rejected("No image provided");
        }
        let request = ModelRequest::with_image(subject.prompt(), image.clone());
        let verdict = match self.model.generate(request).await {
            Ok(reply) => extract_payload(&reply).decode::<ImageVerdict>(),
            Err(e) => Err(format!("{:#}", e)),
        };
        match verdict {
            Ok(verdict) => {
                verdict.into_validation(subject, self.settings.image_confidence_threshold)
            }
            Err(reason) => {
                tracing::warn!(?subject, %reason, "image validation degraded, letting image through");
                subject.unverified()
            }
        }
    }

    pub async fn validate_medical_image(&self, image: &ImagePayload) -> ValidationResult {
        self.check_image(ImageSubject::MedicalImage, image).await
    }

    pub async fn validate_medicine_image(&self, image: &ImagePayload) -> ValidationResult {
        self.check_image(ImageSubject::Medicine, image).await
    }

    async fn analyze_image<T: StructuredReply>(
        &self,
        operation: Operation,
        prompt: String,
        image: &ImagePayload,
    ) -> AssistResult<T> {
        let request = ModelRequest::with_image(prompt, image.clone());
        let reply = self
            .model
            .generate(request)
            .await
            .map_err(|e| AssistError::remote(operation, &e))?;
        decode_reply(&reply).map_err(|detail| AssistError::malformed(operation, detail))
    }

    pub async fn analyze_medical_image(
        &self,
        image: &ImagePayload,
        patient_context: Option<&str>,
    ) -> AssistResult<MedicalImageAnalysis> {
        if image.is_empty() {
            return Err(AssistError::InvalidInput("Please upload a medical image."));
        }
        self.analyze_image(
            Operation::MedicalImageAnalysis,
            prompts::medical_image_analysis(patient_context),
            image,
        )
        .await
    }

    pub async fn analyze_medicine(
        &self,
        image: &ImagePayload,
        patient_info: Option<&str>,
    ) -> AssistResult<MedicineAnalysis> {
        if image.is_empty() {
            return Err(AssistError::InvalidInput("Please upload a medicine image."));
        }
        self.analyze_image(
            Operation::MedicineAnalysis,
            prompts::medicine_analysis(patient_info),
            image,
        )
        .await
    }

    // ── Streaming chat ───────────────────────────────────────────────

    /// Stream a chat reply. The remote call starts on the first poll; cancel
    /// it through `cancel`, which belongs to this stream alone.
    pub fn stream_chat(
        &self,
        message: &str,
        history: &[ConversationMessage],
        cancel: CancellationToken,
    ) -> AssistResult<ChatStream> {
        require(message, "Please enter your health-related question.")?;
        let prompt = prompts::chat(message, history, self.settings.context_window);
        Ok(cancellable_stream(
            Arc::clone(&self.model),
            ModelRequest::text(prompt),
            cancel,
        ))
    }
}
