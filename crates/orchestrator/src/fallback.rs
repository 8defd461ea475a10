//! Local checks used when the remote model is unreachable during the
//! medication-name and policy-document validity checks.

/// Subjects that are never medications. Anything else is accepted.
const NON_MEDICAL_TERMS: &[&str] = &[
    "maths",
    "math",
    "physics",
    "chemistry",
    "biology",
    "history",
    "geography",
    "english",
    "science",
    "art",
    "music",
];

const POLICY_KEYWORDS: &[&str] = &[
    "policy",
    "insurance",
    "insured",
    "coverage",
    "premium",
    "deductible",
    "co-payment",
    "claim",
    "beneficiary",
];

const HEALTH_KEYWORDS: &[&str] = &[
    "medical",
    "health",
    "hospital",
    "treatment",
    "surgery",
    "doctor",
    "patient",
    "diagnosis",
    "healthcare",
];

/// Terms that mark competition or event material rather than a policy.
const ANTI_KEYWORDS: &[&str] = &[
    "techathon",
    "hackathon",
    "competition",
    "guideline",
    "statement",
    "event",
    "participant",
    "submission",
];

pub const MIN_POLICY_MATCHES: usize = 2;
pub const MIN_HEALTH_MATCHES: usize = 1;

/// Denylist check: reject only exact (trimmed, case-insensitive) subject names.
pub fn medication_name_heuristic(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    !NON_MEDICAL_TERMS.contains(&normalized.as_str())
}

/// Number of distinct keywords contained in `text` (already lowercased).
fn distinct_matches(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// Keyword check for health insurance policies.
///
/// Any anti-keyword rejects outright. Otherwise at least two distinct policy
/// keywords and one health keyword must appear. Repeats of one keyword count
/// once.
pub fn policy_document_heuristic(text: &str) -> bool {
    let lower = text.to_lowercase();
    if ANTI_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return false;
    }
    distinct_matches(&lower, POLICY_KEYWORDS) >= MIN_POLICY_MATCHES
        && distinct_matches(&lower, HEALTH_KEYWORDS) >= MIN_HEALTH_MATCHES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medication_denylist() {
        assert!(!medication_name_heuristic("maths"));
        assert!(!medication_name_heuristic("  Physics "));
        assert!(!medication_name_heuristic("HISTORY"));
        assert!(medication_name_heuristic("aspirin"));
        // Unknown words pass
        assert!(medication_name_heuristic("blorptex"));
        // Exact match only
        assert!(medication_name_heuristic("art therapy"));
    }

    #[test]
    fn test_anti_keyword_rejects_regardless_of_keywords() {
        let text = "Hackathon rules: insurance policy coverage premium for medical claims";
        assert!(!policy_document_heuristic(text));
    }

    #[test]
    fn test_two_policy_one_health_accepts() {
        assert!(policy_document_heuristic("Policy coverage for surgery"));
    }

    #[test]
    fn test_one_policy_keyword_rejects() {
        assert!(!policy_document_heuristic("Coverage for surgery and surgery again"));
    }

    #[test]
    fn test_repeats_count_once() {
        assert!(!policy_document_heuristic("premium premium premium hospital"));
    }

    #[test]
    fn test_health_keyword_required() {
        assert!(!policy_document_heuristic("Policy coverage and deductible terms"));
    }
}
