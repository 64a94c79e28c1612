//! Candidate info-collection: form validation and the committed record.
//!
//! Validation failures are data (a list of field errors reported inline),
//! never `Err` in the crate sense; any failure blocks stage advancement.

use crate::llm::{OracleOptions, PromptOracle};
use crate::validate;

use super::prompts;
use super::record::CandidateRecord;

/// Country codes offered on the form.
pub const COUNTRY_CODES: &[&str] = &[
    "+1 (USA/Canada)",
    "+44 (UK)",
    "+91 (India)",
    "+61 (Australia)",
    "+49 (Germany)",
    "+33 (France)",
    "+81 (Japan)",
    "+86 (China)",
    "+55 (Brazil)",
    "+7 (Russia)",
    "+27 (South Africa)",
    "+34 (Spain)",
];

/// Raw form fields as submitted by the candidate.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CandidateForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country_code: String,
    /// Digits only; separators are tolerated.
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub years_experience: String,
    #[serde(default)]
    pub current_company: String,
    #[serde(default)]
    pub desired_positions: String,
    #[serde(default)]
    pub current_location: String,
    /// Free text; technologies are extracted by the oracle.
    #[serde(default)]
    pub tech_stack: String,
    #[serde(default)]
    pub linkedin_profile: String,
    pub preferred_language: Option<String>,
}

/// A user-correctable validation failure on one form field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Validate a submitted form and, when everything passes, commit it into
/// the record in one step.
pub async fn validate_and_commit(
    form: &CandidateForm,
    record: &mut CandidateRecord,
    oracle: &PromptOracle,
) -> Result<(), Vec<FieldError>> {
    let language = form
        .preferred_language
        .clone()
        .unwrap_or_else(|| record.preferred_language.clone());
    let opts = OracleOptions::new(language.clone());

    let mut errors = Vec::new();

    if form.full_name.trim().is_empty() {
        errors.push(FieldError::new("full_name", "Please enter your full name."));
    }

    if !validate::is_valid_email(form.email.trim()) {
        errors.push(FieldError::new(
            "email",
            "Please enter a valid email address.",
        ));
    }

    if !COUNTRY_CODES.contains(&form.country_code.as_str()) {
        errors.push(FieldError::new(
            "country_code",
            "Please select your country code.",
        ));
    }

    if !validate::is_valid_phone(&form.phone_number) {
        errors.push(FieldError::new(
            "phone_number",
            "Please enter a valid phone number (digits only).",
        ));
    }

    let years = if validate::is_valid_experience(&form.years_experience) {
        form.years_experience.trim().parse::<u32>().ok()
    } else {
        errors.push(FieldError::new(
            "years_experience",
            "Please enter a valid number of years of experience.",
        ));
        None
    };

    if form.desired_positions.trim().is_empty() {
        errors.push(FieldError::new(
            "desired_positions",
            "Please enter your desired position(s).",
        ));
    } else {
        let verdict = oracle
            .instruct(
                &prompts::position_validation_prompt(form.desired_positions.trim(), &language),
                &opts,
            )
            .await;
        // Lenient on purpose: only an exact "Invalid" verdict rejects, so
        // a degraded oracle reply never blocks the candidate.
        if verdict.trim() == "Invalid" {
            errors.push(FieldError::new(
                "desired_positions",
                "Please enter a valid desired job title or type of position \
                 (e.g., 'Software Engineer', 'Data Scientist').",
            ));
        }
    }

    if form.current_location.trim().is_empty() {
        errors.push(FieldError::new(
            "current_location",
            "Please enter your current location.",
        ));
    }

    let tech_stack = extract_tech_stack(&form.tech_stack, &language, oracle, &opts).await;
    if tech_stack.is_empty() {
        errors.push(FieldError::new(
            "tech_stack",
            "Please enter a valid list of technologies (e.g., Python, React, AWS).",
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    record.full_name = Some(form.full_name.trim().to_string());
    record.email = Some(form.email.trim().to_string());
    record.country_code = Some(form.country_code.clone());
    record.phone_number = Some(format!(
        "{} {}",
        form.country_code,
        form.phone_number.trim()
    ));
    record.years_experience = years;
    record.desired_positions = Some(form.desired_positions.trim().to_string());
    record.current_location = Some(form.current_location.trim().to_string());
    record.current_company = Some(normalize_company(&form.current_company));
    record.linkedin_profile = if form.linkedin_profile.trim().is_empty() {
        None
    } else {
        Some(form.linkedin_profile.trim().to_string())
    };
    record.tech_stack = tech_stack;
    record.preferred_language = language;

    Ok(())
}

/// Extract distinct technologies from free text via the oracle.
///
/// Order is preserved, duplicates collapse to their first occurrence, and
/// a "None" reply (or empty input) yields an empty list.
async fn extract_tech_stack(
    raw: &str,
    language: &str,
    oracle: &PromptOracle,
    opts: &OracleOptions,
) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let reply = oracle
        .instruct(&prompts::tech_stack_extraction_prompt(raw, language), opts)
        .await;
    let reply = reply.trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut seen = std::collections::HashSet::new();
    reply
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

fn normalize_company(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        "N/A (Fresher)".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::provider::{
        CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    };
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedProvider {
        script: Mutex<VecDeque<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let content = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "Valid".to_string());
            Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn good_form() -> CandidateForm {
        CandidateForm {
            full_name: "Alice Doe".to_string(),
            email: "alice@example.com".to_string(),
            country_code: "+44 (UK)".to_string(),
            phone_number: "123-456-7890".to_string(),
            years_experience: "5".to_string(),
            current_company: "Acme".to_string(),
            desired_positions: "Software Engineer".to_string(),
            current_location: "London, UK".to_string(),
            tech_stack: "Python, React, AWS".to_string(),
            linkedin_profile: String::new(),
            preferred_language: None,
        }
    }

    #[tokio::test]
    async fn valid_form_commits_record() {
        // Position verdict, then extraction echo.
        let oracle = PromptOracle::new(ScriptedProvider::new(&["Valid", "Python, React, AWS"]));
        let mut record = CandidateRecord::default();

        validate_and_commit(&good_form(), &mut record, &oracle)
            .await
            .expect("form should validate");

        assert_eq!(record.full_name.as_deref(), Some("Alice Doe"));
        assert_eq!(record.phone_number.as_deref(), Some("+44 (UK) 123-456-7890"));
        assert_eq!(record.years_experience, Some(5));
        assert_eq!(record.tech_stack, vec!["Python", "React", "AWS"]);
        assert_eq!(record.current_company.as_deref(), Some("Acme"));
        assert!(record.linkedin_profile.is_none());
        assert_eq!(record.preferred_language, "English");
    }

    #[tokio::test]
    async fn extraction_preserves_order_and_drops_duplicates() {
        let oracle = PromptOracle::new(ScriptedProvider::new(&[
            "Valid",
            "Python, React, AWS, python, React",
        ]));
        let mut record = CandidateRecord::default();

        validate_and_commit(&good_form(), &mut record, &oracle)
            .await
            .unwrap();
        assert_eq!(record.tech_stack, vec!["Python", "React", "AWS"]);
    }

    #[tokio::test]
    async fn none_extraction_is_a_field_error() {
        let oracle = PromptOracle::new(ScriptedProvider::new(&["Valid", "None"]));
        let mut record = CandidateRecord::default();

        let errors = validate_and_commit(&good_form(), &mut record, &oracle)
            .await
            .unwrap_err();
        assert!(errors.iter().any(|e| e.field == "tech_stack"));
        // Nothing committed on failure.
        assert!(record.full_name.is_none());
        assert!(record.tech_stack.is_empty());
    }

    #[tokio::test]
    async fn invalid_position_verdict_is_a_field_error() {
        let oracle = PromptOracle::new(ScriptedProvider::new(&["Invalid", "Python"]));
        let mut record = CandidateRecord::default();

        let mut form = good_form();
        form.desired_positions = "asdfgh".to_string();
        let errors = validate_and_commit(&form, &mut record, &oracle)
            .await
            .unwrap_err();
        assert!(errors.iter().any(|e| e.field == "desired_positions"));
    }

    #[tokio::test]
    async fn all_failures_are_collected_together() {
        let oracle = PromptOracle::new(ScriptedProvider::new(&["Python"]));
        let mut record = CandidateRecord::default();

        let form = CandidateForm {
            full_name: String::new(),
            email: "abc".to_string(),
            country_code: "+999".to_string(),
            phone_number: "12".to_string(),
            years_experience: "-3".to_string(),
            desired_positions: String::new(),
            current_location: String::new(),
            tech_stack: "Python".to_string(),
            ..CandidateForm::default()
        };

        let errors = validate_and_commit(&form, &mut record, &oracle)
            .await
            .unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        for expected in [
            "full_name",
            "email",
            "country_code",
            "phone_number",
            "years_experience",
            "desired_positions",
            "current_location",
        ] {
            assert!(fields.contains(&expected), "missing error for {expected}");
        }
    }

    #[tokio::test]
    async fn company_normalizes_to_fresher_marker() {
        let oracle = PromptOracle::new(ScriptedProvider::new(&["Valid", "Python"]));
        let mut record = CandidateRecord::default();

        let mut form = good_form();
        form.current_company = "n/a".to_string();
        form.preferred_language = Some("Spanish".to_string());
        validate_and_commit(&form, &mut record, &oracle)
            .await
            .unwrap();
        assert_eq!(record.current_company.as_deref(), Some("N/A (Fresher)"));
        assert_eq!(record.preferred_language, "Spanish");
    }
}
