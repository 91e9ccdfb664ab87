//! Pure state transition function

use super::{Effect, Event, SessionContext, SessionState};
use crate::notify::Severity;
use crate::query::{Answer, QueryError};
use crate::transcript::{MessageDraft, Transcript};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event leaves the session untouched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("A request is already in flight")]
    Busy,
    #[error("Discarding response for superseded request (generation {0})")]
    StaleResponse(u64),
    #[error("Transcript is already empty")]
    NothingToClear,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// The transcript is read only to decide whether `Clear` has anything to do.
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    transcript: &Transcript,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (*state, event) {
        // ============================================================
        // Submit
        // ============================================================
        (SessionState::Idle { generation }, Event::Submit { text }) => {
            let question = text.trim();
            if question.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            let next = generation + 1;
            Ok(
                TransitionResult::new(SessionState::AwaitingResponse { generation: next })
                    .with_effect(Effect::AppendMessage(MessageDraft::user(question)))
                    .with_effect(Effect::PersistTranscript)
                    .with_effect(Effect::NotifyAppended)
                    .with_effect(Effect::NotifyStateChange)
                    .with_effect(Effect::AskRemote {
                        generation: next,
                        question: question.to_string(),
                    }),
            )
        }

        (SessionState::AwaitingResponse { .. }, Event::Submit { text }) => {
            if text.trim().is_empty() {
                Err(TransitionError::EmptyInput)
            } else {
                Err(TransitionError::Busy)
            }
        }

        // ============================================================
        // Remote outcomes
        // ============================================================
        (
            SessionState::AwaitingResponse { generation },
            Event::QueryAnswered {
                generation: issued,
                answer,
            },
        ) if issued == generation => Ok(answered(generation, answer)),

        (
            SessionState::AwaitingResponse { generation },
            Event::QueryFailed {
                generation: issued,
                error,
            },
        ) if issued == generation => Ok(failed(generation, context, &error)),

        (
            _,
            Event::QueryAnswered {
                generation: issued,
                ..
            }
            | Event::QueryFailed {
                generation: issued,
                ..
            },
        ) => Err(TransitionError::StaleResponse(issued)),

        // ============================================================
        // Clear
        // ============================================================
        (SessionState::Idle { .. }, Event::Clear) if transcript.is_empty() => {
            Err(TransitionError::NothingToClear)
        }

        (current, Event::Clear) => {
            // The in-flight request, if any, is not cancelled. Keeping the
            // generation makes its eventual result stale.
            let generation = current.generation();
            let mut result = TransitionResult::new(SessionState::Idle { generation })
                .with_effect(Effect::ResetTranscript)
                .with_effect(Effect::PersistTranscript)
                .with_effect(Effect::NotifyReset);
            if current.is_pending() {
                result = result.with_effect(Effect::NotifyStateChange);
            }
            Ok(result.with_effect(Effect::notify(
                "Conversation cleared",
                Severity::Success,
                context.notification_duration,
            )))
        }
    }
}

fn answered(generation: u64, answer: Answer) -> TransitionResult {
    let draft = MessageDraft::assistant(answer.text, answer.tools, answer.timestamp);
    TransitionResult::new(SessionState::Idle { generation })
        .with_effect(Effect::AppendMessage(draft))
        .with_effect(Effect::PersistTranscript)
        .with_effect(Effect::NotifyAppended)
        .with_effect(Effect::NotifyStateChange)
}

fn failed(generation: u64, context: &SessionContext, error: &QueryError) -> TransitionResult {
    TransitionResult::new(SessionState::Idle { generation })
        .with_effect(Effect::AppendMessage(MessageDraft::error(
            error.message.clone(),
        )))
        .with_effect(Effect::PersistTranscript)
        .with_effect(Effect::NotifyAppended)
        .with_effect(Effect::notify(
            format!("Failed to get response: {}", error.message),
            Severity::Error,
            context.notification_duration,
        ))
        .with_effect(Effect::NotifyStateChange)
}
