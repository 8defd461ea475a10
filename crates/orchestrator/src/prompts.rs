//! Instruction templates sent to the remote model.
//!
//! Section headings, JSON keys and the severity/urgency vocabularies are read
//! back by the response parsers, so they must not drift.

use crate::language::localize;
use shared::conversation::ConversationMessage;

/// Characters of a report included in the validity check prompt
pub const REPORT_VALIDATION_CHARS: usize = 2000;
/// Characters of a policy included in the validity check prompt
pub const POLICY_VALIDATION_CHARS: usize = 3000;

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful healthcare AI assistant. Provide concise, accurate health information. Keep responses under 150 words unless specifically asked for details. Always remind users this is educational information, not medical diagnosis.";

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ── Localized prose prompts ──────────────────────────────────────────

pub fn symptom_analysis(symptoms: &str) -> String {
    localize(
        &format!("Please analyze these symptoms: {}", symptoms),
        symptoms,
    )
}

/// One drug gets the informational template, two or more the interaction one.
pub fn drug_interaction(drugs: &[String]) -> String {
    let joined = drugs.join(", ");
    let instruction = match drugs {
        [single] => format!(
            r#"Provide detailed information about the medication "{}" including:
- What it is used for (indications)
- Common dosage
- Side effects
- Precautions and warnings
- Drug class/category
Format the response in a clear, organized manner."#,
            single
        ),
        _ => format!(
            r#"Analyze potential drug interactions between these medications: {}

Provide:
1. **Interaction Summary**: Are there any known interactions?
2. **Severity Level**: (None/Minor/Moderate/Severe)
3. **Details**: Explain any interactions found
4. **Recommendations**: Any precautions or advice
5. **Individual Drug Info**: Brief info about each medication

Format the response clearly with proper headings."#,
            joined
        ),
    };
    localize(&instruction, &joined)
}

pub fn explain_term(term: &str) -> String {
    localize(&format!("Explain: {}", term), term)
}

pub fn summarize_report(report: &str) -> String {
    localize(&format!("Summarize this medical report: {}", report), report)
}

pub fn health_question(message: &str) -> String {
    localize(&format!("Respond to this question: {}", message), message)
}

/// Language follows the query, not the policy text.
pub fn policy_query(query: &str, policy_text: &str) -> String {
    let instruction = format!(
        r#"You are an expert policy analysis assistant. Analyze the following policy document and answer the user's query with detailed information.

POLICY DOCUMENT:
{policy_text}

USER QUERY: {query}

Please provide a comprehensive response that includes:
1. **Decision**: Clear answer (Approved/Rejected/Covered/Not Covered/etc.)
2. **Amount**: If applicable, mention any monetary amounts, limits, or percentages
3. **Justification**: Detailed explanation of your decision
4. **Policy Clauses**: Reference specific sections or clauses from the policy that support your answer
5. **Additional Information**: Any relevant conditions, waiting periods, or requirements

Parse the query to identify key details like:
- Age and demographics
- Medical procedure or condition
- Location
- Policy duration/age
- Any other relevant factors

Use semantic understanding to find relevant information even if the query is vague or incomplete. Always reference specific policy clauses and provide clear justification for your decisions.

Format your response in a clear, structured manner with proper headings and bullet points where appropriate."#
    );
    localize(&instruction, query)
}

pub fn report_query(query: &str, report_text: &str) -> String {
    let instruction = format!(
        r#"You are an expert medical report analysis assistant. Analyze the following medical report and answer the user's query with detailed, easy-to-understand information.

MEDICAL REPORT:
{report_text}

USER QUERY: {query}

Please provide a comprehensive response that includes:
1. **Direct Answer**: Clear, concise answer to the user's question
2. **Detailed Explanation**: In-depth explanation in simple, non-technical language
3. **Key Findings**: Highlight any important test results, diagnoses, or observations relevant to the query
4. **Report References**: Quote specific sections or values from the report that support your answer
5. **Clinical Significance**: Explain what the findings mean for the patient's health
6. **Recommendations**: If applicable, suggest follow-up questions or areas to discuss with a doctor

Important guidelines:
- Explain medical terminology in simple terms
- Provide context for test results (normal ranges, significance)
- Be empathetic and clear
- If uncertain, suggest consulting with a healthcare provider
- Identify trends or patterns in the report data

Format your response in a clear, structured manner with proper headings and bullet points where appropriate."#
    );
    localize(&instruction, query)
}

// ── Text validity checks (VALID / INVALID replies) ───────────────────

pub fn medical_term_validity(term: &str) -> String {
    format!(
        r#"Analyze the following input and determine if it is a legitimate medical term, condition, medication, or medical code.

Look for these indicators:
- Medical terminology (diseases, conditions, symptoms)
- Medication names (generic or brand names)
- Medical codes (ICD-10, CPT, NDC)
- Anatomical terms
- Medical procedures or treatments
- Medical abbreviations or acronyms

Respond with ONLY "VALID" if this is a legitimate medical term, or "INVALID" if it is:
- Random numbers or digits
- Gibberish or meaningless text
- Non-medical words
- Common everyday words unrelated to medicine

INPUT TO ANALYZE: {term}"#
    )
}

pub fn medication_name_validity(drug_name: &str) -> String {
    format!(
        r#"Determine if "{drug_name}" is a valid medication, drug, or pharmaceutical name.

Valid medication names include:
- Generic drug names (e.g., aspirin, ibuprofen, metformin)
- Brand names (e.g., Tylenol, Advil, Lipitor)
- Medical supplements (e.g., Vitamin D, Calcium)
- Over-the-counter medicines
- Prescription medications
- Herbal medications

Respond with ONLY "VALID" if this is a legitimate medication name.
Respond with ONLY "INVALID" if it is:
- A non-medical term (e.g., "maths", "physics", "history")
- Random words or gibberish
- Food items (unless they are medicinal supplements)
- General subjects or topics
- Numbers or symbols only

TERM TO VALIDATE: {drug_name}"#
    )
}

pub fn report_validity(text: &str) -> String {
    let excerpt = truncate_chars(text, REPORT_VALIDATION_CHARS);
    format!(
        r#"Analyze the following text and determine if it is a legitimate medical report or medical document.

Look for these medical indicators:
- Medical terminology (diagnosis, symptoms, medications, procedures)
- Lab results and test values
- Patient information sections
- Doctor/physician names or signatures
- Medical facility information
- Vital signs, measurements, or clinical observations
- Treatment plans or recommendations
- Medical codes (ICD, CPT)
- Prescription information

Respond with ONLY "VALID" if this appears to be a medical document, or "INVALID" if it appears to be:
- A resume or CV
- A novel, story, or fiction
- Academic papers (non-medical)
- Business documents
- Random text or gibberish
- Non-medical content

TEXT TO ANALYZE:
{excerpt}"#
    )
}

pub fn policy_validity(text: &str) -> String {
    let excerpt = truncate_chars(text, POLICY_VALIDATION_CHARS);
    format!(
        r#"Analyze the following text and determine if it is a legitimate health insurance policy or health policy document.

Look for these health policy indicators:
- Insurance policy terminology (coverage, premium, deductible, co-payment, exclusions)
- Health insurance terms (policyholder, insured, beneficiary, claims)
- Medical coverage details (hospitalization, surgery, treatment coverage)
- Policy terms and conditions
- Sum insured or coverage limits
- Waiting periods for treatments or pre-existing conditions
- Network hospitals or healthcare providers
- Policy exclusions and limitations
- Insurance company name or policy number
- Health-related benefits (maternity, ambulance, daycare procedures)
- Terms like "policy", "insurance", "healthcare coverage", "medical expenses"

Respond with ONLY "VALID" if this appears to be a health insurance policy or health policy document.

Respond with ONLY "INVALID" if it appears to be:
- Competition guidelines or rules (Techathon, Hackathon)
- Academic papers or research documents
- Business documents or contracts (non-health insurance)
- Resumes, CVs, or portfolios
- Novels, stories, or fiction
- Random text or gibberish
- Non-policy content
- General medical documents (not insurance policies)
- Technical documentation
- Event guidelines or statements

TEXT TO ANALYZE:
{excerpt}"#
    )
}

// ── Image prompts (JSON replies) ─────────────────────────────────────

pub const MEDICAL_IMAGE_VALIDITY: &str = r#"You are an expert medical image validator. Analyze the provided image and determine if it is a legitimate MEDICAL IMAGE.

VALID medical images include:
- X-rays (chest, bone, dental, etc.)
- CT scans (computed tomography)
- MRI scans (magnetic resonance imaging)
- Ultrasound images
- ECG/EKG (electrocardiogram) charts
- Mammograms
- PET scans
- Endoscopy images
- Pathology slides/microscopy
- Medical charts with diagnostic data
- DICOM medical images

INVALID (NON-MEDICAL) images include:
- Regular photographs (landscapes, people, selfies)
- Screenshots of applications or websites
- Memes, cartoons, or illustrations
- Tech/coding related images
- General graphics or design images
- Food photos
- Nature or landscape photos
- Any non-medical content

Respond in JSON format ONLY:
{
  "isValid": true/false,
  "confidence": 0-100,
  "detectedType": "X-Ray/CT/MRI/Ultrasound/ECG/Photo/Screenshot/Illustration/etc.",
  "reason": "Brief explanation of why it is or isn't a medical image"
}

Return ONLY the JSON object, no additional text."#;

pub const MEDICINE_IMAGE_VALIDITY: &str = r#"You are an expert pharmaceutical image validator. Analyze the provided image and determine if it contains legitimate MEDICINE or PHARMACEUTICAL PRODUCTS.

VALID medicine images include:
- Medicine tablets, capsules, or pills
- Medicine bottles or containers
- Medicine packaging or boxes with drug information
- Prescription medication labels
- Medicine strips or blister packs
- Syringes with medication
- Medicine vials or ampoules
- Over-the-counter medicine packages
- Pharmaceutical products with visible branding/labels

INVALID (NON-MEDICINE) images include:
- Random objects (toys, food, electronics, furniture)
- People, animals, or nature scenes
- Screenshots of applications or websites
- Memes, cartoons, or illustrations
- Documents or text without medicine
- Medical equipment (not medicine itself)
- Unclear or blurry images where medicine cannot be identified
- Any non-pharmaceutical content

Respond in JSON format ONLY:
{
  "isValid": true/false,
  "confidence": 0-100,
  "detectedType": "Tablets/Capsules/Bottle/Packaging/Blister Pack/Photo/Screenshot/etc.",
  "reason": "Brief explanation of why it is or isn't a medicine image"
}

Return ONLY the JSON object, no additional text."#;

fn optional_context(label: &str, info: Option<&str>) -> String {
    match info.map(str::trim).filter(|s| !s.is_empty()) {
        Some(info) => format!("\n\n{}: {}", label, info),
        None => String::new(),
    }
}

pub fn medical_image_analysis(patient_context: Option<&str>) -> String {
    let context = optional_context("Patient Context", patient_context);
    format!(
        r#"You are an expert medical AI assistant specializing in medical image analysis. Analyze the medical image provided and give comprehensive insights.{context}

Please analyze the medical image and provide detailed information in the following JSON format:

{{
  "imageType": "X-Ray/CT Scan/MRI/Ultrasound/ECG/etc.",
  "bodyPart": "Affected body part or organ system",
  "keyFindings": [
    {{
      "finding": "Description of the finding",
      "location": "Specific location in the image",
      "severity": "Normal" | "Mild" | "Moderate" | "Severe" | "Critical",
      "significance": "What this finding means clinically"
    }}
  ],
  "overallAssessment": {{
    "status": "Normal" | "Attention Needed" | "Urgent Care Required",
    "summary": "Overall summary of the image findings",
    "urgencyLevel": "Low" | "Medium" | "High"
  }},
  "recommendations": {{
    "immediate": ["Immediate actions needed if any"],
    "followUp": ["Follow-up tests or consultations needed"],
    "lifestyle": ["Lifestyle modifications based on findings"]
  }},
  "differentialDiagnosis": ["Possible conditions based on findings"],
  "redFlags": ["Critical findings that need immediate attention"],
  "nextSteps": ["Ordered list of next steps for the patient"],
  "confidence": 85
}}

Analysis Guidelines:
1. Identify the type of medical imaging (X-ray, CT, MRI, Ultrasound, ECG, etc.)
2. Analyze all visible anatomical structures and abnormalities
3. Identify any pathological findings, fractures, masses, or irregularities
4. Assess the severity and clinical significance of findings
5. Provide differential diagnosis based on visible findings
6. Highlight any critical findings requiring immediate attention
7. Consider the patient context if provided
8. Suggest appropriate follow-up imaging or consultations
9. Always err on the side of caution for patient safety
10. Be specific about urgency levels and timeframes

Return ONLY the JSON object, no additional text."#
    )
}

pub fn medicine_analysis(patient_info: Option<&str>) -> String {
    let context = optional_context("Additional patient information", patient_info);
    format!(
        r#"You are a highly advanced pharmaceutical AI assistant. Analyze the medicine image provided and give comprehensive information about the medication.{context}

Please analyze the medicine in the image and provide detailed information in the following JSON format:

{{
  "medicineName": "Full name of the medicine",
  "activeIngredients": ["list", "of", "active", "ingredients"],
  "whatItHelps": ["condition1", "condition2", "what this medicine treats"],
  "severity": "Low" | "Medium" | "High",
  "doctorConsultationRequired": true | false,
  "whenToTake": {{
    "timing": ["morning", "evening", "specific times"],
    "withFood": "Before" | "After" | "With" | "Doesn't matter",
    "frequency": "how often to take"
  }},
  "sideEffects": {{
    "common": ["common side effects"],
    "serious": ["serious side effects that require immediate medical attention"],
    "patientSpecific": ["side effects specific to patient's mentioned conditions"]
  }},
  "precautions": ["important precautions and warnings"],
  "interactions": ["drug interactions to be aware of"],
  "confidence": 85
}}

Important guidelines:
1. If you cannot clearly identify the medicine, indicate lower confidence
2. Consider the patient's additional information when providing patient-specific advice
3. Always err on the side of caution for safety recommendations
4. Provide practical, actionable information
5. Consider both generic and brand names if visible
6. Be specific about timing and dosage instructions
7. Include relevant warnings based on the medicine type

Return ONLY the JSON object, no additional text."#
    )
}

// ── Streaming chat ───────────────────────────────────────────────────

/// Render the last `window` messages as "User: …" / "Assistant: …" lines.
pub fn conversation_context(history: &[ConversationMessage], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat(message: &str, history: &[ConversationMessage], window: usize) -> String {
    format!(
        "{}\n\nConversation History:\n{}\n\nUser: {}\n\nAssistant:",
        CHAT_SYSTEM_PROMPT,
        conversation_context(history, window),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_drug_uses_information_template() {
        let prompt = drug_interaction(&["aspirin".to_string()]);
        assert!(prompt.starts_with("As a medical AI assistant, "));
        assert!(prompt.contains(r#"the medication "aspirin" including"#));
        assert!(!prompt.contains("Interaction Summary"));
    }

    #[test]
    fn test_multiple_drugs_use_interaction_template() {
        let prompt = drug_interaction(&["aspirin".to_string(), "warfarin".to_string()]);
        assert!(prompt.contains("between these medications: aspirin, warfarin"));
        assert!(prompt.contains("**Severity Level**: (None/Minor/Moderate/Severe)"));
    }

    #[test]
    fn test_drug_language_follows_drug_names() {
        let prompt = drug_interaction(&["阿司匹林".to_string(), "华法林".to_string()]);
        assert!(prompt.starts_with("作为医疗AI助手，Analyze potential drug interactions"));
    }

    #[test]
    fn test_policy_query_language_follows_query() {
        let prompt = policy_query("手术是否在保障范围内？", "This policy covers surgery.");
        assert!(prompt.starts_with("作为医疗AI助手，You are an expert policy analysis assistant."));
        assert!(prompt.contains("POLICY DOCUMENT:\nThis policy covers surgery."));

        let prompt = report_query("What is my HbA1c?", "HbA1c 6.1% 血糖");
        assert!(prompt.starts_with("As a medical AI assistant, "));
    }

    #[test]
    fn test_validity_prompts_are_not_localized() {
        assert!(medical_term_validity("高血压").starts_with("Analyze the following input"));
        assert!(medication_name_validity("aspirin").starts_with(r#"Determine if "aspirin""#));
    }

    #[test]
    fn test_report_validity_truncates_by_chars() {
        let report = "é".repeat(REPORT_VALIDATION_CHARS + 50);
        let prompt = report_validity(&report);
        let excerpt = prompt.rsplit("TEXT TO ANALYZE:\n").next().unwrap();
        assert_eq!(excerpt.chars().count(), REPORT_VALIDATION_CHARS);

        let policy = "a".repeat(10);
        assert!(policy_validity(&policy).ends_with("TEXT TO ANALYZE:\naaaaaaaaaa"));
    }

    #[test]
    fn test_image_analysis_context_is_optional() {
        let with = medical_image_analysis(Some("58-year-old smoker"));
        assert!(with.contains("comprehensive insights.\n\nPatient Context: 58-year-old smoker\n\n"));
        let without = medical_image_analysis(Some("  "));
        assert!(without.contains("comprehensive insights.\n\nPlease analyze"));
        assert!(without.contains(r#""urgencyLevel": "Low" | "Medium" | "High""#));

        let med = medicine_analysis(Some("diabetic"));
        assert!(med.contains("\n\nAdditional patient information: diabetic"));
        assert!(med.contains(r#""medicineName": "Full name of the medicine""#));
    }

    #[test]
    fn test_chat_context_keeps_last_five() {
        let history: Vec<ConversationMessage> = (1..=7)
            .map(|i| {
                if i % 2 == 1 {
                    ConversationMessage::user(format!("q{}", i))
                } else {
                    ConversationMessage::assistant(format!("a{}", i))
                }
            })
            .collect();
        let context = conversation_context(&history, 5);
        assert_eq!(context, "User: q3\nAssistant: a4\nUser: q5\nAssistant: a6\nUser: q7");
    }

    #[test]
    fn test_chat_prompt_layout() {
        let prompt = chat("Is it contagious?", &[ConversationMessage::user("I have flu")], 5);
        assert_eq!(
            prompt,
            format!(
                "{}\n\nConversation History:\nUser: I have flu\n\nUser: Is it contagious?\n\nAssistant:",
                CHAT_SYSTEM_PROMPT
            )
        );
    }
}
