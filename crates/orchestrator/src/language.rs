//! Script-based language detection and the localized prompt preamble.
//!
//! Only the opening "As a medical AI assistant" clause is localized; the task
//! instruction that follows it stays in English.

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Chinese,
    Japanese,
    Korean,
    Arabic,
    Hindi,
    English,
}

static CHINESE: LazyLock<Regex> = LazyLock::new(|| script(r"[\u{4E00}-\u{9FFF}]"));
static JAPANESE: LazyLock<Regex> =
    LazyLock::new(|| script(r"[\u{3040}-\u{309F}\u{30A0}-\u{30FF}]"));
static KOREAN: LazyLock<Regex> = LazyLock::new(|| script(r"[\u{AC00}-\u{D7AF}\u{1100}-\u{11FF}]"));
static ARABIC: LazyLock<Regex> = LazyLock::new(|| script(r"[\u{0600}-\u{06FF}]"));
static HINDI: LazyLock<Regex> = LazyLock::new(|| script(r"[\u{0900}-\u{097F}]"));

fn script(pattern: &str) -> Regex {
    Regex::new(pattern).expect("script range pattern is valid")
}

impl Language {
    pub fn preamble(&self) -> &'static str {
        match self {
            Language::Chinese => "作为医疗AI助手，",
            Language::Japanese => "医療AIアシスタントとして、",
            Language::Korean => "의료 AI 보조자로서, ",
            Language::Arabic => "كمساعد طبي ذكي، ",
            Language::Hindi => "एक चिकित्सा AI सहायक के रूप में, ",
            Language::English => "As a medical AI assistant, ",
        }
    }
}

/// Pick the language bucket for `text`.
///
/// Scripts are tested in a fixed order (zh, ja, ko, ar, hi) and the first hit
/// wins, so mixed Han/kana text resolves to Chinese.
pub fn detect_language(text: &str) -> Language {
    let checks: [(&LazyLock<Regex>, Language); 5] = [
        (&CHINESE, Language::Chinese),
        (&JAPANESE, Language::Japanese),
        (&KOREAN, Language::Korean),
        (&ARABIC, Language::Arabic),
        (&HINDI, Language::Hindi),
    ];
    checks
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, lang)| *lang)
        .unwrap_or(Language::English)
}

/// Prefix `instruction` with the preamble matching the script of `input`.
pub fn localize(instruction: &str, input: &str) -> String {
    format!("{}{}", detect_language(input).preamble(), instruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_script_bucket() {
        assert_eq!(detect_language("头痛发烧"), Language::Chinese);
        assert_eq!(detect_language("ずつう"), Language::Japanese);
        assert_eq!(detect_language("カタカナ"), Language::Japanese);
        assert_eq!(detect_language("두통이 있어요"), Language::Korean);
        assert_eq!(detect_language("صداع"), Language::Arabic);
        assert_eq!(detect_language("सिरदर्द"), Language::Hindi);
    }

    #[test]
    fn test_ascii_and_unknown_scripts_default_to_english() {
        assert_eq!(detect_language("headache and fever"), Language::English);
        assert_eq!(detect_language("головная боль"), Language::English);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn test_detection_order_wins_on_mixed_input() {
        // Japanese sentence with kanji: Han range is checked first
        assert_eq!(detect_language("頭痛がします"), Language::Chinese);
        assert_eq!(detect_language("두통 صداع"), Language::Korean);
        assert_eq!(detect_language("صداع सिरदर्द"), Language::Arabic);
    }

    #[test]
    fn test_localize_only_prefixes() {
        let prompt = localize("Explain: 高血压", "高血压");
        assert_eq!(prompt, "作为医疗AI助手，Explain: 高血压");
        assert_eq!(
            localize("Explain: asthma", "asthma"),
            "As a medical AI assistant, Explain: asthma"
        );
    }
}
