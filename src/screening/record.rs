//! Candidate data model accumulated across the screening stages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sentiment::Sentiment;

/// Technologies considered for question generation, in source order.
pub const MAX_TECHNOLOGIES: usize = 5;

/// Minimum questions per technology; short parses are topped up with
/// synthesized generic questions.
pub const MIN_QUESTIONS_PER_TECH: usize = 2;

/// Oracle verdict on whether an answer reads as AI-written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    AiGenerated,
    HumanLike,
    /// The judgment call degraded or answered off-script.
    Inconclusive,
}

impl AnswerOrigin {
    /// Parse the oracle's verdict text ("AI-generated" / "Human-like").
    pub fn from_verdict(text: &str) -> Self {
        let cleaned = text.trim().trim_end_matches('.').to_lowercase();
        if cleaned.contains("ai-generated") || cleaned.contains("ai generated") {
            Self::AiGenerated
        } else if cleaned.contains("human-like") || cleaned.contains("human like") {
            Self::HumanLike
        } else {
            Self::Inconclusive
        }
    }
}

impl std::fmt::Display for AnswerOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AiGenerated => "AI-generated",
            Self::HumanLike => "Human-like",
            Self::Inconclusive => "Inconclusive",
        };
        write!(f, "{s}")
    }
}

/// A generated interview question, tagged with its source technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalQuestion {
    pub technology: String,
    pub text: String,
}

impl TechnicalQuestion {
    pub fn new(technology: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            technology: technology.into(),
            text: text.into(),
        }
    }

    /// Display label used as the key for answers and insights.
    pub fn label(&self) -> String {
        format!("{} - {}", self.technology, self.text)
    }
}

/// Per-session candidate record.
///
/// All identity fields stay empty until the info form validates and
/// commits; the technical fields fill incrementally during the chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub country_code: Option<String>,
    /// Stored as "<country_code> <digits>".
    pub phone_number: Option<String>,
    pub years_experience: Option<u32>,
    pub desired_positions: Option<String>,
    pub current_location: Option<String>,
    pub current_company: Option<String>,
    pub linkedin_profile: Option<String>,
    /// Distinct technologies, insertion order = relevance order.
    pub tech_stack: Vec<String>,
    /// Append-only within a session.
    pub questions: Vec<TechnicalQuestion>,
    /// Cursor into `questions`; monotonically non-decreasing.
    pub current_question_index: usize,
    /// Answer text per question label; elaborations append.
    pub answers: HashMap<String, String>,
    /// Scored once per question; elaborations are not re-scored.
    pub answer_sentiment: HashMap<String, Sentiment>,
    pub answer_origin: HashMap<String, AnswerOrigin>,
    /// Per-technology question lists, as generated.
    pub tech_to_questions: HashMap<String, Vec<String>>,
    pub preferred_language: String,
    /// Monotonic once true, until a full session reset.
    pub resume_uploaded: bool,
}

impl Default for CandidateRecord {
    fn default() -> Self {
        Self {
            full_name: None,
            email: None,
            country_code: None,
            phone_number: None,
            years_experience: None,
            desired_positions: None,
            current_location: None,
            current_company: None,
            linkedin_profile: None,
            tech_stack: Vec::new(),
            questions: Vec::new(),
            current_question_index: 0,
            answers: HashMap::new(),
            answer_sentiment: HashMap::new(),
            answer_origin: HashMap::new(),
            tech_to_questions: HashMap::new(),
            preferred_language: "English".to_string(),
            resume_uploaded: false,
        }
    }
}

impl CandidateRecord {
    /// The question currently awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&TechnicalQuestion> {
        self.questions.get(self.current_question_index)
    }

    /// Whether the cursor has passed the last generated question.
    pub fn questions_exhausted(&self) -> bool {
        self.current_question_index >= self.questions.len()
    }

    /// Advance the cursor, clamped so it never exceeds the question count.
    pub fn advance_question(&mut self) {
        if self.current_question_index < self.questions.len() {
            self.current_question_index += 1;
        }
    }

    /// Clear all question state ahead of (re)generation.
    pub fn clear_questions(&mut self) {
        self.questions.clear();
        self.current_question_index = 0;
        self.answers.clear();
        self.answer_sentiment.clear();
        self.answer_origin.clear();
        self.tech_to_questions.clear();
    }

    /// Record the initial answer for a question label.
    pub fn record_answer(&mut self, label: &str, answer: &str) {
        self.answers.insert(label.to_string(), answer.to_string());
    }

    /// Append elaboration text to an existing answer.
    ///
    /// Returns false when no answer exists under `label` (a
    /// data-consistency warning for the caller to recover from).
    pub fn append_elaboration(&mut self, label: &str, text: &str) -> bool {
        match self.answers.get_mut(label) {
            Some(existing) => {
                existing.push_str("\n\n(Elaboration): ");
                existing.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Store the one-time classifier outputs for a question label.
    pub fn record_scores(&mut self, label: &str, sentiment: Sentiment, origin: AnswerOrigin) {
        self.answer_sentiment.insert(label.to_string(), sentiment);
        self.answer_origin.insert(label.to_string(), origin);
    }

    /// Mark the resume as uploaded (never reset except by a full reset).
    pub fn mark_resume_uploaded(&mut self) {
        self.resume_uploaded = true;
    }

    /// Count sentiments across all scored answers: (positive, negative, neutral).
    pub fn sentiment_tally(&self) -> (usize, usize, usize) {
        let mut tally = (0, 0, 0);
        for sentiment in self.answer_sentiment.values() {
            match sentiment {
                Sentiment::Positive => tally.0 += 1,
                Sentiment::Negative => tally.1 += 1,
                Sentiment::Neutral => tally.2 += 1,
            }
        }
        tally
    }

    /// Render the candidate profile as the block used in report prompts
    /// and the summary panel.
    pub fn profile_summary(&self) -> String {
        let or_na = |field: &Option<String>| -> String {
            field.clone().unwrap_or_else(|| "N/A".to_string())
        };

        let mut parts = Vec::new();
        parts.push(format!("Name: {}", or_na(&self.full_name)));
        parts.push(format!("Email: {}", or_na(&self.email)));
        parts.push(format!("Phone: {}", or_na(&self.phone_number)));
        parts.push(format!("Current Company: {}", or_na(&self.current_company)));
        parts.push(format!(
            "Years of Experience: {}",
            self.years_experience
                .map(|y| y.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        ));
        parts.push(format!(
            "Desired Positions: {}",
            or_na(&self.desired_positions)
        ));
        parts.push(format!("Location: {}", or_na(&self.current_location)));
        parts.push(format!(
            "Tech Stack: {}",
            if self.tech_stack.is_empty() {
                "N/A".to_string()
            } else {
                self.tech_stack.join(", ")
            }
        ));
        parts.push(format!("Resume Uploaded: {}", self.resume_uploaded));
        parts.push(format!(
            "LinkedIn Profile: {}",
            or_na(&self.linkedin_profile)
        ));
        parts.join("\n")
    }
}
