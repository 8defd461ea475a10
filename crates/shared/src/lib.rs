pub mod settings {
    use serde::{Deserialize, Serialize};

    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    fn default_timeout() -> u64 {
        120
    }

    fn default_context_window() -> usize {
        5
    }

    fn default_confidence_threshold() -> u8 {
        70
    }

    /// Runtime settings for the assistant. Every field has a default so a
    /// partial settings.json is accepted.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AssistantSettings {
        #[serde(default = "default_model")]
        pub model: String, // e.g., "gemini-2.0-flash"
        #[serde(default = "default_base_url")]
        pub base_url: String,
        #[serde(default = "default_timeout")]
        pub request_timeout_secs: u64,
        /// How many prior chat messages are replayed as context
        #[serde(default = "default_context_window")]
        pub context_window: usize,
        /// Minimum model confidence (0-100) for an image to pass validation
        #[serde(default = "default_confidence_threshold")]
        pub image_confidence_threshold: u8,
    }

    impl Default for AssistantSettings {
        fn default() -> Self {
            Self {
                model: default_model(),
                base_url: default_base_url(),
                request_timeout_secs: default_timeout(),
                context_window: default_context_window(),
                image_confidence_threshold: default_confidence_threshold(),
            }
        }
    }
}

pub mod conversation {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
    }

    impl Role {
        /// Speaker label used when replaying history into a prompt
        pub fn label(&self) -> &'static str {
            match self {
                Role::User => "User",
                Role::Assistant => "Assistant",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConversationMessage {
        pub role: Role,
        pub content: String,
    }

    impl ConversationMessage {
        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: content.into(),
            }
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self {
                role: Role::Assistant,
                content: content.into(),
            }
        }
    }
}

pub mod validation {
    use serde::{Deserialize, Serialize};

    /// Outcome of an image validity check.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ValidationResult {
        pub is_valid: bool,
        pub message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub detected_type: Option<String>,
    }

    impl ValidationResult {
        pub fn accepted(message: impl Into<String>, detected_type: Option<String>) -> Self {
            Self {
                is_valid: true,
                message: message.into(),
                detected_type,
            }
        }

        pub fn rejected(message: impl Into<String>) -> Self {
            Self {
                is_valid: false,
                message: message.into(),
                detected_type: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::conversation::{ConversationMessage, Role};
    use super::settings::AssistantSettings;
    use super::validation::ValidationResult;

    #[test]
    fn test_partial_settings_use_defaults() {
        let s: AssistantSettings = serde_json::from_str(r#"{"model":"gemini-1.5-pro"}"#).unwrap();
        assert_eq!(s.model, "gemini-1.5-pro");
        assert_eq!(s.context_window, 5);
        assert_eq!(s.image_confidence_threshold, 70);
        assert_eq!(s.request_timeout_secs, 120);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ConversationMessage::assistant("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(Role::User.label(), "User");
    }

    #[test]
    fn test_validation_result_omits_missing_type() {
        let json = serde_json::to_value(ValidationResult::rejected("No image provided")).unwrap();
        assert_eq!(json["isValid"], false);
        assert!(json.get("detectedType").is_none());
    }
}
