//! InterviewFlow — stage orchestration for the screening chat.
//!
//! One candidate turn in, one assistant reply out. All oracle failures
//! arrive here already degraded to text, so the flow never branches on
//! transport errors; the only `Err` paths are stage-machine violations.

use crate::error::SessionError;
use crate::llm::{OracleOptions, PromptOracle};
use crate::sentiment::SentimentClassifier;

use super::prompts;
use super::record::{
    AnswerOrigin, CandidateRecord, TechnicalQuestion, MAX_TECHNOLOGIES, MIN_QUESTIONS_PER_TECH,
};
use super::stage::{transition, Stage};

/// Reply sent when a termination keyword cuts the interview short.
const TERMINATION_ACK: &str = "Acknowledged. Transitioning to conclusion.";

/// Screening state owned by the session and mutated one turn at a time.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ScreeningState {
    pub stage: Stage,
    /// Set when the last acknowledgment solicited elaboration.
    pub awaiting_elaboration: bool,
    /// Label of the question the elaboration belongs to.
    pub elaboration_target: Option<String>,
    pub record: CandidateRecord,
}

/// Result of processing one candidate turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Assistant reply to surface.
    pub reply: String,
    /// Stage after the turn.
    pub stage: Stage,
    /// The interview concluded this turn; the router should navigate to
    /// the exit screen.
    pub concluded: bool,
}

impl TurnOutcome {
    fn new(reply: String, stage: Stage) -> Self {
        Self {
            reply,
            stage,
            concluded: stage == Stage::ConcludeInterview,
        }
    }
}

/// Coordinates the interview stages over the oracle and the sentiment
/// classifier.
pub struct InterviewFlow {
    oracle: PromptOracle,
    sentiment: SentimentClassifier,
}

impl InterviewFlow {
    pub fn new(oracle: PromptOracle, sentiment: SentimentClassifier) -> Self {
        Self { oracle, sentiment }
    }

    fn opts(record: &CandidateRecord) -> OracleOptions {
        OracleOptions::new(record.preferred_language.clone())
    }

    /// Open the chat after a successful intake: emit the fixed greeting
    /// and auto-advance to question generation without consuming input.
    pub fn open_screening(&self, state: &mut ScreeningState) -> Result<String, SessionError> {
        transition(&mut state.stage, Stage::StartScreening)?;
        let name = state
            .record
            .full_name
            .clone()
            .unwrap_or_else(|| "Candidate".to_string());
        let greeting = prompts::greeting_message(&name);
        transition(&mut state.stage, Stage::GenerateTechnicalQuestions)?;
        Ok(greeting)
    }

    /// Process one candidate turn.
    pub async fn handle_turn(
        &self,
        state: &mut ScreeningState,
        input: &str,
    ) -> Result<TurnOutcome, SessionError> {
        if !state.stage.accepts_input() {
            return Err(SessionError::TurnNotAccepted {
                stage: state.stage.to_string(),
            });
        }

        if prompts::is_termination(input) {
            transition(&mut state.stage, Stage::ConcludeInterview)?;
            state.awaiting_elaboration = false;
            state.elaboration_target = None;
            return Ok(TurnOutcome::new(TERMINATION_ACK.to_string(), state.stage));
        }

        match state.stage {
            Stage::GenerateTechnicalQuestions => self.generate_questions(state).await,
            Stage::AskTechnicalQuestions => self.answer_turn(state, input).await,
            // accepts_input() covers exactly the two stages above.
            _ => Err(SessionError::TurnNotAccepted {
                stage: state.stage.to_string(),
            }),
        }
    }

    /// Generate the hiring recommendation from the accumulated record.
    pub async fn hiring_report(&self, record: &CandidateRecord) -> String {
        let prompt = prompts::hiring_report_prompt(record);
        self.oracle.instruct(&prompt, &Self::opts(record)).await
    }

    async fn generate_questions(
        &self,
        state: &mut ScreeningState,
    ) -> Result<TurnOutcome, SessionError> {
        let opts = Self::opts(&state.record);
        state.record.clear_questions();

        if state.record.tech_stack.is_empty() {
            let reply = self
                .oracle
                .instruct(&prompts::no_technologies_prompt(), &opts)
                .await;
            transition(&mut state.stage, Stage::Ended)?;
            return Ok(TurnOutcome::new(reply, state.stage));
        }

        let years = state.record.years_experience.unwrap_or(0);
        let technologies: Vec<String> = state
            .record
            .tech_stack
            .iter()
            .take(MAX_TECHNOLOGIES)
            .cloned()
            .collect();

        for technology in technologies {
            let raw = self
                .oracle
                .instruct(
                    &prompts::question_generation_prompt(
                        &technology,
                        years,
                        &state.record.preferred_language,
                    ),
                    &opts,
                )
                .await;
            let mut questions = prompts::parse_numbered_questions(&raw);

            while questions.len() < MIN_QUESTIONS_PER_TECH {
                let filler = self
                    .oracle
                    .instruct(&prompts::generic_question_prompt(&technology, years), &opts)
                    .await;
                questions.push(filler);
            }

            state
                .record
                .tech_to_questions
                .insert(technology.clone(), questions.clone());
            state.record.questions.extend(
                questions
                    .into_iter()
                    .map(|q| TechnicalQuestion::new(technology.clone(), q)),
            );
        }

        if let Some(first) = state.record.questions.first() {
            let reply = format!(
                "Great! Let's start with the technical questions.\n\nQuestion {}: {}",
                state.record.current_question_index + 1,
                first.label()
            );
            transition(&mut state.stage, Stage::AskTechnicalQuestions)?;
            Ok(TurnOutcome::new(reply, state.stage))
        } else {
            let reply = self
                .oracle
                .instruct(&prompts::no_questions_prompt(), &opts)
                .await;
            transition(&mut state.stage, Stage::Ended)?;
            Ok(TurnOutcome::new(reply, state.stage))
        }
    }

    async fn answer_turn(
        &self,
        state: &mut ScreeningState,
        input: &str,
    ) -> Result<TurnOutcome, SessionError> {
        let opts = Self::opts(&state.record);
        let answer = input.trim();

        if state.awaiting_elaboration {
            return self.elaboration_turn(state, answer, &opts).await;
        }

        let Some(question) = state.record.current_question().cloned() else {
            // Cursor past the end while still accepting input means the
            // state drifted; recover by concluding instead of panicking.
            tracing::warn!("No current question while asking; concluding interview");
            transition(&mut state.stage, Stage::ConcludeInterview)?;
            let reply = self.oracle.instruct(&prompts::all_answered_prompt(), &opts).await;
            return Ok(TurnOutcome::new(reply, state.stage));
        };
        let label = question.label();

        state.record.record_answer(&label, answer);

        let sentiment = self.sentiment.classify(answer);
        let verdict = self
            .oracle
            .instruct(
                &prompts::ai_detection_prompt(&label, answer, &state.record.preferred_language),
                &opts,
            )
            .await;
        let origin = AnswerOrigin::from_verdict(&verdict);
        state.record.record_scores(&label, sentiment, origin);

        let acknowledgment = self
            .oracle
            .instruct(
                &prompts::acknowledgment_prompt(&label, answer, &state.record.preferred_language),
                &opts,
            )
            .await
            .trim()
            .to_string();

        if prompts::is_elaboration_request(&acknowledgment) {
            state.awaiting_elaboration = true;
            state.elaboration_target = Some(label);
            return Ok(TurnOutcome::new(
                format!("{acknowledgment}\n\n---\n"),
                state.stage,
            ));
        }

        state.record.advance_question();
        self.surface_next(state, acknowledgment, &opts).await
    }

    async fn elaboration_turn(
        &self,
        state: &mut ScreeningState,
        answer: &str,
        opts: &OracleOptions,
    ) -> Result<TurnOutcome, SessionError> {
        let target = state.elaboration_target.take();
        state.awaiting_elaboration = false;

        let appended = match target.as_deref() {
            Some(label) => state.record.append_elaboration(label, answer),
            None => false,
        };
        if !appended {
            tracing::warn!(
                question = target.as_deref().unwrap_or("<none>"),
                "Elaboration received but its answer was not found; assigning to current question"
            );
            if let Some(question) = state.record.current_question() {
                let label = question.label();
                state.record.record_answer(&label, answer);
            }
        }

        state.record.advance_question();

        if let Some(next) = state.record.current_question() {
            let label = next.label();
            let ack = self
                .oracle
                .instruct(&prompts::elaboration_next_prompt(), opts)
                .await;
            Ok(TurnOutcome::new(
                format!(
                    "{ack}\n\nQuestion {}: {}",
                    state.record.current_question_index + 1,
                    label
                ),
                state.stage,
            ))
        } else {
            let reply = self
                .oracle
                .instruct(&prompts::elaboration_done_prompt(), opts)
                .await;
            transition(&mut state.stage, Stage::ConcludeInterview)?;
            Ok(TurnOutcome::new(reply, state.stage))
        }
    }

    async fn surface_next(
        &self,
        state: &mut ScreeningState,
        acknowledgment: String,
        opts: &OracleOptions,
    ) -> Result<TurnOutcome, SessionError> {
        if let Some(next) = state.record.current_question() {
            let reply = format!(
                "{acknowledgment}\n\n---\n\nQuestion {}: {}",
                state.record.current_question_index + 1,
                next.label()
            );
            Ok(TurnOutcome::new(reply, state.stage))
        } else {
            let thanks = self
                .oracle
                .instruct(&prompts::all_answered_prompt(), opts)
                .await;
            transition(&mut state.stage, Stage::ConcludeInterview)?;
            Ok(TurnOutcome::new(
                format!("{acknowledgment}\n\n---\n\n{thanks}"),
                state.stage,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::provider::{
        CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    };
    use crate::sentiment::{SentimentClassifier, SentimentScorer};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Provider that pops scripted replies in order, then repeats a
    /// default. Deterministic, so decision-making is reproducible.
    struct ScriptedProvider {
        script: Mutex<VecDeque<String>>,
        default: String,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str], default: &str) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                default: default.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let prompt = request.messages.last().unwrap().content.clone();
            self.calls.lock().unwrap().push(prompt);
            let content = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default.clone());
            Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    struct NeutralScorer;

    impl SentimentScorer for NeutralScorer {
        fn compound(&self, text: &str) -> f64 {
            // Cheap deterministic polarity for tests.
            if text.contains("great") {
                0.6
            } else if text.contains("awful") {
                -0.6
            } else {
                0.0
            }
        }
    }

    fn flow_with(provider: Arc<ScriptedProvider>) -> InterviewFlow {
        InterviewFlow::new(
            PromptOracle::new(provider),
            SentimentClassifier::new(Box::new(NeutralScorer)),
        )
    }

    fn screening_state(techs: &[&str]) -> ScreeningState {
        let mut state = ScreeningState::default();
        state.record.full_name = Some("Alice".to_string());
        state.record.years_experience = Some(3);
        state.record.tech_stack = techs.iter().map(|t| t.to_string()).collect();
        state
    }

    /// Walk a state from Greeting into AskTechnicalQuestions with one
    /// technology and two questions.
    async fn state_in_ask_stage(provider: &Arc<ScriptedProvider>) -> (InterviewFlow, ScreeningState) {
        let flow = flow_with(Arc::clone(provider));
        let mut state = screening_state(&["Rust"]);
        flow.open_screening(&mut state).unwrap();
        flow.handle_turn(&mut state, "ready").await.unwrap();
        assert_eq!(state.stage, Stage::AskTechnicalQuestions);
        (flow, state)
    }

    #[tokio::test]
    async fn open_screening_greets_and_advances() {
        let provider = ScriptedProvider::new(&[], "unused");
        let flow = flow_with(provider);
        let mut state = screening_state(&["Rust"]);

        let greeting = flow.open_screening(&mut state).unwrap();
        assert!(greeting.contains("Alice"));
        assert_eq!(state.stage, Stage::GenerateTechnicalQuestions);
    }

    #[tokio::test]
    async fn empty_tech_stack_routes_to_ended() {
        let provider = ScriptedProvider::new(&["Please go back and add a tech stack."], "x");
        let flow = flow_with(provider);
        let mut state = screening_state(&[]);
        flow.open_screening(&mut state).unwrap();

        let outcome = flow.handle_turn(&mut state, "hello").await.unwrap();
        assert_eq!(outcome.stage, Stage::Ended);
        assert_ne!(outcome.stage, Stage::AskTechnicalQuestions);
        assert!(!outcome.concluded);
        assert!(outcome.reply.contains("tech stack"));
    }

    #[tokio::test]
    async fn generation_labels_questions_and_surfaces_first() {
        let provider = ScriptedProvider::new(
            &[
                "1. Explain ownership.\n2. What are lifetimes?",
                "1. What are hooks?\n2. Explain the virtual DOM.",
            ],
            "unused",
        );
        let flow = flow_with(Arc::clone(&provider));
        let mut state = screening_state(&["Rust", "React"]);
        flow.open_screening(&mut state).unwrap();

        let outcome = flow.handle_turn(&mut state, "let's go").await.unwrap();
        assert_eq!(outcome.stage, Stage::AskTechnicalQuestions);
        assert_eq!(state.record.questions.len(), 4);
        assert_eq!(state.record.questions[0].technology, "Rust");
        assert_eq!(state.record.questions[2].technology, "React");
        assert!(outcome.reply.contains("Question 1: Rust - Explain ownership."));
        assert_eq!(state.record.tech_to_questions["React"].len(), 2);
    }

    #[tokio::test]
    async fn short_parse_is_topped_up_with_generic_questions() {
        let provider = ScriptedProvider::new(
            &["1. Only one question here.", "A generic Rust question?"],
            "unused",
        );
        let flow = flow_with(Arc::clone(&provider));
        let mut state = screening_state(&["Rust"]);
        flow.open_screening(&mut state).unwrap();

        flow.handle_turn(&mut state, "go").await.unwrap();
        assert_eq!(state.record.questions.len(), 2);
        assert_eq!(state.record.questions[1].text, "A generic Rust question?");
        // One generation call plus one fallback call.
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn technology_list_is_truncated_to_five() {
        let provider = ScriptedProvider::new(&[], "1. Q one.\n2. Q two.");
        let flow = flow_with(Arc::clone(&provider));
        let mut state = screening_state(&["A", "B", "C", "D", "E", "F", "G"]);
        flow.open_screening(&mut state).unwrap();

        flow.handle_turn(&mut state, "go").await.unwrap();
        // One oracle call per technology, first five only.
        assert_eq!(provider.call_count(), 5);
        assert_eq!(state.record.questions.len(), 10);
        assert!(!state.record.tech_to_questions.contains_key("F"));
    }

    #[tokio::test]
    async fn termination_keyword_short_circuits_to_conclusion() {
        let provider = ScriptedProvider::new(
            &["1. Q one.\n2. Q two.", "unused-detect", "unused-ack"],
            "unused",
        );
        let (flow, mut state) = state_in_ask_stage(&provider).await;
        let calls_before = provider.call_count();

        let outcome = flow.handle_turn(&mut state, "I don't know").await.unwrap();
        assert_eq!(outcome.stage, Stage::ConcludeInterview);
        assert!(outcome.concluded);
        assert_eq!(outcome.reply, "Acknowledged. Transitioning to conclusion.");
        // Short-circuit bypasses detection/acknowledgment oracle calls.
        assert_eq!(provider.call_count(), calls_before);
        assert!(!state.awaiting_elaboration);
    }

    #[tokio::test]
    async fn normal_answer_records_scores_and_advances() {
        let provider = ScriptedProvider::new(
            &[
                "1. Q one.\n2. Q two.",
                "Human-like",
                "Nice, that covers it. Moving on.",
            ],
            "unused",
        );
        let (flow, mut state) = state_in_ask_stage(&provider).await;

        let outcome = flow
            .handle_turn(&mut state, "A great borrow checker story")
            .await
            .unwrap();

        let label = "Rust - Q one.";
        assert_eq!(state.record.answers[label], "A great borrow checker story");
        assert_eq!(
            state.record.answer_origin[label],
            AnswerOrigin::HumanLike
        );
        assert_eq!(
            state.record.answer_sentiment[label],
            crate::sentiment::Sentiment::Positive
        );
        assert_eq!(state.record.current_question_index, 1);
        assert!(outcome.reply.contains("Question 2: Rust - Q two."));
        assert!(!state.awaiting_elaboration);
    }

    #[tokio::test]
    async fn elaborating_acknowledgment_holds_the_cursor() {
        let provider = ScriptedProvider::new(
            &[
                "1. Q one.\n2. Q two.",
                "AI-generated",
                "Thanks. Can you elaborate on that?",
            ],
            "unused",
        );
        let (flow, mut state) = state_in_ask_stage(&provider).await;

        let outcome = flow.handle_turn(&mut state, "it compiles").await.unwrap();
        assert!(state.awaiting_elaboration);
        assert_eq!(state.elaboration_target.as_deref(), Some("Rust - Q one."));
        assert_eq!(state.record.current_question_index, 0);
        assert!(!outcome.concluded);
        assert!(outcome.reply.contains("elaborate"));
    }

    #[tokio::test]
    async fn elaboration_appends_without_rescoring_then_advances() {
        let provider = ScriptedProvider::new(
            &[
                "1. Q one.\n2. Q two.",
                "Human-like",
                "Could you share more details?",
                "Got it, thanks for the extra detail.",
            ],
            "unused",
        );
        let (flow, mut state) = state_in_ask_stage(&provider).await;

        flow.handle_turn(&mut state, "short answer").await.unwrap();
        let outcome = flow
            .handle_turn(&mut state, "the longer story")
            .await
            .unwrap();

        let label = "Rust - Q one.";
        let stored = &state.record.answers[label];
        assert!(stored.contains("short answer"));
        assert!(stored.contains("(Elaboration): the longer story"));
        // Scored exactly once.
        assert_eq!(state.record.answer_sentiment.len(), 1);
        assert_eq!(state.record.answer_origin.len(), 1);
        assert_eq!(state.record.current_question_index, 1);
        assert!(outcome.reply.contains("Question 2: Rust - Q two."));
        assert!(!state.awaiting_elaboration);
    }

    #[tokio::test]
    async fn answering_final_question_concludes() {
        let provider = ScriptedProvider::new(
            &[
                "1. Q one.\n2. Q two.",
                "Human-like",
                "Good. Moving on.",
                "Human-like",
                "Noted, thanks.",
                "Thanks for completing the questions!",
            ],
            "unused",
        );
        let (flow, mut state) = state_in_ask_stage(&provider).await;

        flow.handle_turn(&mut state, "first answer").await.unwrap();
        let outcome = flow.handle_turn(&mut state, "second answer").await.unwrap();

        assert_eq!(outcome.stage, Stage::ConcludeInterview);
        assert!(outcome.concluded);
        assert!(outcome.reply.contains("Thanks for completing the questions!"));
        assert_eq!(state.record.current_question_index, 2);
        assert!(state.record.questions_exhausted());
    }

    #[tokio::test]
    async fn identical_turns_yield_identical_decisions() {
        // Same scripted oracle, same (question, answer) pair: the
        // elaboration-or-advance decision must match across runs.
        let script: &[&str] = &[
            "1. Q one.\n2. Q two.",
            "Human-like",
            "Thanks. Please elaborate a little.",
        ];
        let mut decisions = Vec::new();
        for _ in 0..2 {
            let provider = ScriptedProvider::new(script, "unused");
            let (flow, mut state) = state_in_ask_stage(&provider).await;
            flow.handle_turn(&mut state, "same answer").await.unwrap();
            decisions.push(state.awaiting_elaboration);
        }
        assert_eq!(decisions[0], decisions[1]);
        assert!(decisions[0]);
    }

    #[tokio::test]
    async fn cursor_never_exceeds_question_count() {
        let provider = ScriptedProvider::new(
            &["1. Q one.\n2. Q two."],
            "Fine, moving on.",
        );
        let (flow, mut state) = state_in_ask_stage(&provider).await;

        for answer in ["one", "two"] {
            flow.handle_turn(&mut state, answer).await.unwrap();
            assert!(state.record.current_question_index <= state.record.questions.len());
        }
        assert_eq!(state.record.current_question_index, 2);
    }

    #[tokio::test]
    async fn input_rejected_outside_accepting_stages() {
        let provider = ScriptedProvider::new(&[], "unused");
        let flow = flow_with(provider);

        let mut state = screening_state(&["Rust"]);
        let err = flow.handle_turn(&mut state, "hi").await.unwrap_err();
        assert!(matches!(err, SessionError::TurnNotAccepted { .. }));

        state.stage = Stage::Ended;
        let err = flow.handle_turn(&mut state, "hi").await.unwrap_err();
        assert!(matches!(err, SessionError::TurnNotAccepted { .. }));
    }

    #[tokio::test]
    async fn hiring_report_uses_record_prompt() {
        let provider = ScriptedProvider::new(&["Verdict: Maybe. Solid basics."], "unused");
        let flow = flow_with(Arc::clone(&provider));

        let mut record = CandidateRecord::default();
        record.full_name = Some("Alice".to_string());
        let report = flow.hiring_report(&record).await;
        assert_eq!(report, "Verdict: Maybe. Solid basics.");

        let calls = provider.calls.lock().unwrap();
        assert!(calls[0].contains("AI Hiring Manager"));
        assert!(calls[0].contains("Name: Alice"));
    }
}
