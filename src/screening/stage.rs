//! Interview stage machine.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The stages of the screening conversation.
///
/// Progresses `Greeting → StartScreening → GenerateTechnicalQuestions →
/// AskTechnicalQuestions → ConcludeInterview`. `Ended` is reached from
/// question generation when no tech stack or no questions are available;
/// `ConcludeInterview` is additionally reachable from any input-accepting
/// stage via the termination-keyword short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greeting,
    StartScreening,
    GenerateTechnicalQuestions,
    AskTechnicalQuestions,
    ConcludeInterview,
    Ended,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Greeting, StartScreening)
                | (StartScreening, GenerateTechnicalQuestions)
                | (GenerateTechnicalQuestions, AskTechnicalQuestions)
                | (GenerateTechnicalQuestions, Ended)
                | (GenerateTechnicalQuestions, ConcludeInterview)
                | (AskTechnicalQuestions, ConcludeInterview)
        )
    }

    /// Whether candidate input is consumed in this stage.
    pub fn accepts_input(&self) -> bool {
        matches!(
            self,
            Self::GenerateTechnicalQuestions | Self::AskTechnicalQuestions
        )
    }

    /// Whether the chat portion of the screening is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ConcludeInterview | Self::Ended)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Greeting
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Greeting => "greeting",
            Self::StartScreening => "start_screening",
            Self::GenerateTechnicalQuestions => "generate_technical_questions",
            Self::AskTechnicalQuestions => "ask_technical_questions",
            Self::ConcludeInterview => "conclude_interview",
            Self::Ended => "ended",
        };
        write!(f, "{s}")
    }
}

/// Apply a transition, rejecting any pair the table does not allow.
pub fn transition(current: &mut Stage, target: Stage) -> Result<(), SessionError> {
    if !current.can_transition_to(target) {
        return Err(SessionError::InvalidTransition {
            from: current.to_string(),
            to: target.to_string(),
        });
    }
    *current = target;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use Stage::*;
        let transitions = [
            (Greeting, StartScreening),
            (StartScreening, GenerateTechnicalQuestions),
            (GenerateTechnicalQuestions, AskTechnicalQuestions),
            (GenerateTechnicalQuestions, Ended),
            (GenerateTechnicalQuestions, ConcludeInterview),
            (AskTechnicalQuestions, ConcludeInterview),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use Stage::*;
        // Skip stages
        assert!(!Greeting.can_transition_to(GenerateTechnicalQuestions));
        assert!(!StartScreening.can_transition_to(AskTechnicalQuestions));
        // Go backward
        assert!(!AskTechnicalQuestions.can_transition_to(GenerateTechnicalQuestions));
        // Terminal
        assert!(!ConcludeInterview.can_transition_to(Ended));
        assert!(!Ended.can_transition_to(Greeting));
        // Self-transition
        assert!(!AskTechnicalQuestions.can_transition_to(AskTechnicalQuestions));
        // Questions can never start without generation
        assert!(!Ended.can_transition_to(AskTechnicalQuestions));
    }

    #[test]
    fn input_acceptance() {
        use Stage::*;
        assert!(GenerateTechnicalQuestions.accepts_input());
        assert!(AskTechnicalQuestions.accepts_input());
        assert!(!Greeting.accepts_input());
        assert!(!StartScreening.accepts_input());
        assert!(!ConcludeInterview.accepts_input());
        assert!(!Ended.accepts_input());
    }

    #[test]
    fn terminal_stages() {
        use Stage::*;
        assert!(ConcludeInterview.is_terminal());
        assert!(Ended.is_terminal());
        assert!(!Greeting.is_terminal());
        assert!(!AskTechnicalQuestions.is_terminal());
    }

    #[test]
    fn transition_rejects_undefined_pairs() {
        let mut stage = Stage::Greeting;
        assert!(transition(&mut stage, Stage::StartScreening).is_ok());
        assert_eq!(stage, Stage::StartScreening);

        let err = transition(&mut stage, Stage::AskTechnicalQuestions).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        // Stage unchanged after a rejected transition.
        assert_eq!(stage, Stage::StartScreening);
    }

    #[test]
    fn display_matches_serde() {
        use Stage::*;
        for stage in [
            Greeting,
            StartScreening,
            GenerateTechnicalQuestions,
            AskTechnicalQuestions,
            ConcludeInterview,
            Ended,
        ] {
            let display = format!("{stage}");
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
