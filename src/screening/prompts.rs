//! Prompt templates and deterministic parsing helpers for the screening
//! flow.
//!
//! Every oracle prompt is a parameterized function of typed arguments so
//! prompt construction stays testable without network calls.

use std::sync::LazyLock;

use regex::Regex;

use super::record::CandidateRecord;

/// Inputs whose presence anywhere in a candidate turn ends the interview.
pub const TERMINATION_KEYWORDS: &[&str] = &[
    "bye",
    "exit",
    "quit",
    "thank you",
    "end conversation",
    "done",
    "finish",
    "stop",
    "i don't know",
];

/// Wording in an acknowledgment that counts as an elaboration request.
const ELABORATION_MARKERS: &[&str] = &["elaborate", "further", "more details", "can you tell me"];

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("ordinal regex"));

/// Fixed greeting opening the screening chat.
pub fn greeting_message(full_name: &str) -> String {
    format!(
        "👋 Hi {full_name}, thanks for applying! Let's dive into your tech expertise. \
         I'll now ask you some technical questions based on your skills."
    )
}

/// Ask for 2-3 interview questions on one technology.
pub fn question_generation_prompt(technology: &str, years_experience: u32, language: &str) -> String {
    format!(
        "You are an AI Hiring Assistant for a tech recruitment agency.\n\
         The candidate has {years_experience} years of experience.\n\
         Based on the technology or concept \"{technology}\", generate 2-3 distinct, varied, \
         and concise technical interview questions suitable for a candidate with \
         {years_experience} years of experience.\n\
         Ensure a good mix of conceptual, practical/scenario-based, and best-practice questions.\n\
         Present them as a numbered list, one question per line. Do NOT include any introductory \
         or concluding sentences or conversational filler.\n\
         Respond in {language}.\n\n\
         Example for Python and 3 years experience:\n\
         1. Explain decorator patterns in Python and provide a use case.\n\
         2. How would you optimize a Python application for memory efficiency?"
    )
}

/// Fallback: one generic question for a technology (used when fewer than
/// two questions parsed).
pub fn generic_question_prompt(technology: &str, years_experience: u32) -> String {
    format!(
        "Generate a general question about {technology} for someone with \
         {years_experience} years of experience."
    )
}

/// Explain that no technologies were available for question generation.
pub fn no_technologies_prompt() -> String {
    "Inform user that no technologies were found for questions and suggest they go back \
     to the info page to provide a tech stack, then restart the screening."
        .to_string()
}

/// Explain that question generation produced nothing.
pub fn no_questions_prompt() -> String {
    "Inform user that technical questions could not be generated and to try again later."
        .to_string()
}

/// Judge whether an answer reads as AI-written or human-written.
pub fn ai_detection_prompt(question: &str, answer: &str, language: &str) -> String {
    format!(
        "Analyze the following candidate's answer to a technical question. Determine if the \
         answer appears to be generated by an AI (e.g., overly formal, generic, comprehensive \
         without natural pauses/hesitations, sounds like a textbook definition) or if it \
         exhibits human-like characteristics (e.g., conversational, potentially less \
         structured, specific examples from experience, some natural imperfection).\n\
         Respond only with \"AI-generated\" or \"Human-like\".\n\
         Respond in {language}.\n\n\
         Question: {question}\n\
         Candidate Answer: {answer}"
    )
}

/// Ask for a brief acknowledgment that may solicit elaboration.
pub fn acknowledgment_prompt(question: &str, answer: &str, language: &str) -> String {
    format!(
        "Given the following technical question and a candidate's response, provide a very \
         brief (1-2 sentences), neutral, and encouraging acknowledgment or transition phrase.\n\
         If the candidate's response seems brief, generic, or if it doesn't fully address the \
         question, politely prompt them to \"elaborate\" or \"provide more details\" at the end \
         of your acknowledgment.\n\
         Do NOT provide correct answers, evaluate the correctness of the response, or give away \
         solutions. If the response is a clear non-answer (e.g., 'no', 'I don't know', 'skip', \
         'abc'), acknowledge that politely and suggest moving on.\n\
         Respond in {language}.\n\n\
         Question: {question}\n\
         Candidate Response: {answer}\n\n\
         Your acknowledgment/transition:"
    )
}

/// Transition phrase after an elaboration, with another question coming.
pub fn elaboration_next_prompt() -> String {
    "Acknowledge additional details and present the next question.".to_string()
}

/// Transition phrase after an elaboration when no questions remain.
pub fn elaboration_done_prompt() -> String {
    "Acknowledge additional details and inform user that all technical questions are collected."
        .to_string()
}

/// Thank the candidate once every question has an answer.
pub fn all_answered_prompt() -> String {
    "Thank user for answering all technical questions and inform that all necessary \
     information is collected."
        .to_string()
}

/// Judge whether a desired-position field looks like a real job title.
pub fn position_validation_prompt(input: &str, language: &str) -> String {
    format!(
        "You are an AI assistant tasked with validating user input for the \"Desired \
         Position\" field.\n\
         Given the user's input, determine if it appears to be a reasonable and relevant job \
         title or type of position.\n\
         Respond only with \"Valid\" if the input is reasonable, or \"Invalid\" if it seems \
         irrelevant, nonsensical, or clearly not a valid job title.\n\
         Respond in {language}.\n\
         Input: \"{input}\"\n\
         Output:"
    )
}

/// Extract distinct technologies from free text as a comma-separated list.
pub fn tech_stack_extraction_prompt(text: &str, language: &str) -> String {
    format!(
        "You are an expert AI assistant tasked with identifying and extracting all distinct \
         technologies from a given text.\n\
         A technology can be a programming language, framework, library, database, tool, or a \
         specific concept/domain within tech.\n\
         Parse the following text and return a *comma-separated list of ONLY the identified \
         technologies*.\n\
         Ensure that if a technology is mentioned, it is included. Do not include any \
         conversational filler or extra sentences.\n\
         If no clear technologies are identified, respond with 'None'.\n\
         Respond in {language}.\n\
         Text: {text}"
    )
}

/// Build the full hiring-recommendation prompt from the record.
pub fn hiring_report_prompt(record: &CandidateRecord) -> String {
    let mut prompt = format!(
        "You are an AI Hiring Manager. Based on the following candidate's profile and their \
         performance in a technical screening, provide a concise hiring recommendation.\n\
         Your recommendation should include:\n\
         1. A clear \"Hire\", \"Do Not Hire\", or \"Maybe\" verdict.\n\
         2. A brief justification for the verdict, considering:\n\
            - Completeness and clarity of provided personal information.\n\
            - Relevance of their experience and desired role to their tech stack.\n\
            - Overall perceived quality and depth of their technical answers (DO NOT evaluate \
         correctness, only perceived effort/engagement).\n\
            - General sentiment from their technical answers.\n\
            - Any red flags (e.g., consistently generic/AI-generated answers, lack of \
         engagement).\n\
            - Consideration of their years of experience and if the answers align with it.\n\
         3. A summary of their strengths and areas for potential development based on the \
         technical answers.\n\n\
         Maintain a professional and objective tone.\n\n\
         Candidate Information:\n{}\n\n\
         Technical Questions and Answers:\n",
        record.profile_summary()
    );

    for question in &record.questions {
        let label = question.label();
        let Some(answer) = record.answers.get(&label) else {
            continue;
        };
        let origin = record
            .answer_origin
            .get(&label)
            .map(|o| o.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let sentiment = record
            .answer_sentiment
            .get(&label)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        prompt.push_str(&format!(
            "\n- Q: {label}\n  A: {answer}\n  AI Detection: {origin}, Sentiment: {sentiment}\n"
        ));
    }

    if record.answer_sentiment.is_empty() {
        prompt.push_str("\nOverall sentiment of technical answers: Not enough data.");
    } else {
        let (positive, negative, neutral) = record.sentiment_tally();
        prompt.push_str(&format!(
            "\nOverall sentiment of technical answers: Positive ({positive}), \
             Negative ({negative}), Neutral ({neutral})."
        ));
    }

    prompt.push_str("\n\nHiring Recommendation Report:");
    prompt
}

/// Parse a numbered list of questions, stripping leading ordinal markers.
pub fn parse_numbered_questions(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| ORDINAL_RE.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Heuristic: does the acknowledgment solicit elaboration?
pub fn is_elaboration_request(acknowledgment: &str) -> bool {
    if acknowledgment.contains('?') {
        return true;
    }
    let lowered = acknowledgment.to_lowercase();
    ELABORATION_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Does a candidate turn contain a termination keyword?
pub fn is_termination(input: &str) -> bool {
    let lowered = input.to_lowercase();
    TERMINATION_KEYWORDS.iter().any(|k| lowered.contains(k))
}
