//! Per-session dashboard state machine
//!
//! ```text
//! Idle ─► AwaitingInput ─► Submitted ─► Processing ─┬─► ReportReady ─┐
//!                                                    └─► Failed ──────┴─(reset)─► Idle
//! ```
//!
//! [`SessionState::apply`] is the only way to move between phases. It never
//! mutates in place and never performs I/O: the completion call is requested
//! through [`Effect::Complete`] and its outcome fed back as an [`Event`].

use serde::Serialize;

use crate::error::{ServiceError, SessionError};
use crate::patient::{InputMode, ManualForm, PatientRecord, StoreOverrides};
use crate::prompt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    AwaitingInput,
    Submitted,
    Processing,
    ReportReady,
    Failed,
}

/// Text returned by the completion service, displayed as is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportText(String);

impl ReportText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// User actions and completion outcomes
#[derive(Debug, Clone)]
pub enum Event {
    SelectMode(InputMode),
    SubmitManual(ManualForm),
    SelectStored {
        record: PatientRecord,
        overrides: StoreOverrides,
    },
    TriggerAnalysis,
    CompletionSucceeded(String),
    CompletionFailed(String),
    Reset,
    Download,
}

impl From<Result<String, ServiceError>> for Event {
    fn from(outcome: Result<String, ServiceError>) -> Self {
        match outcome {
            Ok(text) => Event::CompletionSucceeded(text),
            Err(e) => Event::CompletionFailed(e.to_string()),
        }
    }
}

/// Work the caller must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Complete { prompt: String },
    Download { text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    mode: InputMode,
    phase: Phase,
    record: Option<PatientRecord>,
    report: Option<ReportText>,
    failure: Option<String>,
    processing: bool,
    analysis_requested: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn record(&self) -> Option<&PatientRecord> {
        self.record.as_ref()
    }

    pub fn report(&self) -> Option<&ReportText> {
        self.report.as_ref()
    }

    /// Message of the last failed completion, until the next trigger or reset
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn analysis_requested(&self) -> bool {
        self.analysis_requested
    }

    /// Whether the trigger control should be enabled
    pub fn can_trigger(&self) -> bool {
        self.record.is_some()
            && matches!(
                self.phase,
                Phase::Submitted | Phase::ReportReady | Phase::Failed
            )
    }

    /// Compute the next state for `event`.
    ///
    /// On error the caller keeps the current state unchanged.
    pub fn apply(&self, event: Event) -> Result<(SessionState, Effect), SessionError> {
        let mut next = self.clone();

        let effect = match event {
            Event::SelectMode(mode) => {
                self.ensure_idle_control()?;
                next.mode = mode;
                if matches!(
                    self.phase,
                    Phase::Idle | Phase::AwaitingInput | Phase::Submitted
                ) {
                    next.phase = Phase::AwaitingInput;
                    next.record = None;
                }
                Effect::None
            }
            Event::SubmitManual(form) => {
                self.ensure_idle_control()?;
                self.ensure_mode(InputMode::Manual)?;
                next.record = Some(form.into_record()?);
                next.phase = Phase::Submitted;
                Effect::None
            }
            Event::SelectStored { record, overrides } => {
                self.ensure_idle_control()?;
                self.ensure_mode(InputMode::Store)?;
                let record = overrides.apply_to(record);
                record.validate()?;
                next.record = Some(record);
                next.phase = Phase::Submitted;
                Effect::None
            }
            Event::TriggerAnalysis => {
                self.ensure_idle_control()?;
                let record = self.record.as_ref().ok_or(SessionError::NoRecord)?;
                if !self.can_trigger() {
                    return Err(SessionError::InvalidTransition(self.phase));
                }
                next.phase = Phase::Processing;
                next.processing = true;
                next.analysis_requested = true;
                next.failure = None;
                Effect::Complete {
                    prompt: prompt::build(record),
                }
            }
            Event::CompletionSucceeded(text) => {
                self.ensure_processing()?;
                next.phase = Phase::ReportReady;
                next.report = Some(ReportText::new(text));
                next.processing = false;
                next.analysis_requested = false;
                Effect::None
            }
            Event::CompletionFailed(message) => {
                self.ensure_processing()?;
                next.phase = Phase::Failed;
                next.failure = Some(message);
                next.processing = false;
                next.analysis_requested = false;
                Effect::None
            }
            Event::Reset => {
                self.ensure_idle_control()?;
                next = SessionState {
                    mode: self.mode,
                    ..SessionState::default()
                };
                Effect::None
            }
            Event::Download => {
                let report = self.report.as_ref().ok_or(SessionError::NoReport)?;
                Effect::Download {
                    text: report.as_str().to_string(),
                }
            }
        };

        if next.phase != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next.phase, "Session transition");
        }

        Ok((next, effect))
    }

    /// Controls are inert while a completion is in flight
    fn ensure_idle_control(&self) -> Result<(), SessionError> {
        if self.phase == Phase::Processing {
            return Err(SessionError::AnalysisInFlight);
        }
        Ok(())
    }

    fn ensure_processing(&self) -> Result<(), SessionError> {
        if self.phase != Phase::Processing {
            return Err(SessionError::InvalidTransition(self.phase));
        }
        Ok(())
    }

    fn ensure_mode(&self, expected: InputMode) -> Result<(), SessionError> {
        if self.mode != expected {
            return Err(SessionError::ModeMismatch {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionClient;
    use crate::error::ValidationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedReply {
        text: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for FixedReply {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    struct Unavailable;

    #[async_trait]
    impl CompletionClient for Unavailable {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            Err(ServiceError::QuotaExhausted {
                status: 429,
                message: "Resource has been exhausted".to_string(),
            })
        }

        fn model_id(&self) -> &str {
            "unavailable"
        }
    }

    fn siti() -> PatientRecord {
        PatientRecord {
            name: "Siti".to_string(),
            anthropometrics: None,
            ethnicity: None,
            age: None,
            diagnosis: "Type 2 Diabetes".to_string(),
            medication: None,
            rsid: "rs4149056".to_string(),
            observation: None,
            nutrigenomic_focus: None,
            risk_notes: None,
        }
    }

    fn step(state: &SessionState, event: Event) -> SessionState {
        state.apply(event).unwrap().0
    }

    fn submitted_siti() -> SessionState {
        let state = step(&SessionState::new(), Event::SelectMode(InputMode::Store));
        step(
            &state,
            Event::SelectStored {
                record: siti(),
                overrides: StoreOverrides {
                    medication: "Simvastatin 20mg".to_string(),
                    observation: String::new(),
                },
            },
        )
    }

    /// Trigger, call the client, feed the outcome back
    async fn analyze(state: &SessionState, client: &dyn CompletionClient) -> SessionState {
        let (processing, effect) = state.apply(Event::TriggerAnalysis).unwrap();
        assert_eq!(processing.phase(), Phase::Processing);
        assert!(processing.is_processing());
        let prompt = match effect {
            Effect::Complete { prompt } => prompt,
            other => panic!("expected completion effect, got {other:?}"),
        };
        step(&processing, Event::from(client.complete(&prompt).await))
    }

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.mode(), InputMode::Store);
        assert!(!state.can_trigger());
    }

    #[test]
    fn test_invalid_manual_submission_stays_awaiting_input() {
        let state = step(&SessionState::new(), Event::SelectMode(InputMode::Manual));
        assert_eq!(state.phase(), Phase::AwaitingInput);

        let form = ManualForm {
            name: String::new(),
            rsid: "rs4149056".to_string(),
            ..Default::default()
        };
        let err = state.apply(Event::SubmitManual(form)).unwrap_err();
        assert_eq!(err, SessionError::Validation(ValidationError::MissingName));
        assert!(!err.to_string().is_empty());

        let form = ManualForm {
            name: "Siti".to_string(),
            rsid: "   ".to_string(),
            ..Default::default()
        };
        let err = state.apply(Event::SubmitManual(form)).unwrap_err();
        assert_eq!(err, SessionError::Validation(ValidationError::MissingRsid));
        assert_eq!(state.phase(), Phase::AwaitingInput);
        assert!(state.record().is_none());
    }

    #[test]
    fn test_valid_manual_submission() {
        let state = step(&SessionState::new(), Event::SelectMode(InputMode::Manual));
        let form = ManualForm {
            name: "Rina".to_string(),
            rsid: "rs429358".to_string(),
            diagnosis: "Dislipidemia".to_string(),
            ..Default::default()
        };
        let state = step(&state, Event::SubmitManual(form));
        assert_eq!(state.phase(), Phase::Submitted);
        assert_eq!(state.record().unwrap().name, "Rina");
        assert!(state.can_trigger());
    }

    #[test]
    fn test_modes_do_not_mix() {
        let state = SessionState::new();
        let err = state
            .apply(Event::SubmitManual(ManualForm::default()))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::ModeMismatch {
                expected: InputMode::Manual,
                actual: InputMode::Store,
            }
        );
    }

    #[test]
    fn test_stored_selection_applies_overrides() {
        let state = submitted_siti();
        assert_eq!(state.phase(), Phase::Submitted);
        let record = state.record().unwrap();
        assert_eq!(record.medication.as_deref(), Some("Simvastatin 20mg"));
        assert_eq!(record.rsid, "rs4149056");
    }

    #[test]
    fn test_switching_mode_drops_uncommitted_record() {
        let state = step(&submitted_siti(), Event::SelectMode(InputMode::Manual));
        assert_eq!(state.phase(), Phase::AwaitingInput);
        assert!(state.record().is_none());
    }

    #[test]
    fn test_second_trigger_rejected_while_processing() {
        let (processing, _) = submitted_siti().apply(Event::TriggerAnalysis).unwrap();
        assert_eq!(
            processing.apply(Event::TriggerAnalysis).unwrap_err(),
            SessionError::AnalysisInFlight
        );
        assert_eq!(
            processing.apply(Event::Reset).unwrap_err(),
            SessionError::AnalysisInFlight
        );
        assert_eq!(
            processing
                .apply(Event::SelectMode(InputMode::Manual))
                .unwrap_err(),
            SessionError::AnalysisInFlight
        );
    }

    #[test]
    fn test_trigger_without_record() {
        let state = step(&SessionState::new(), Event::SelectMode(InputMode::Store));
        assert_eq!(
            state.apply(Event::TriggerAnalysis).unwrap_err(),
            SessionError::NoRecord
        );
    }

    #[test]
    fn test_completion_outside_processing_rejected() {
        let err = submitted_siti()
            .apply(Event::CompletionSucceeded("late".to_string()))
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidTransition(Phase::Submitted));
    }

    #[tokio::test]
    async fn test_siti_analysis_then_reset() {
        let client = FixedReply {
            text: "Laporan klinis Siti",
            calls: AtomicUsize::new(0),
        };

        let ready = analyze(&submitted_siti(), &client).await;
        assert_eq!(ready.phase(), Phase::ReportReady);
        assert!(!ready.is_processing());
        assert!(!ready.analysis_requested());
        assert_eq!(ready.report().unwrap().as_str(), "Laporan klinis Siti");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let (same, effect) = ready.apply(Event::Download).unwrap();
        assert_eq!(same, ready);
        assert_eq!(
            effect,
            Effect::Download {
                text: "Laporan klinis Siti".to_string()
            }
        );

        let idle = step(&ready, Event::Reset);
        assert_eq!(idle.phase(), Phase::Idle);
        assert!(idle.record().is_none());
        assert!(idle.report().is_none());
        assert_eq!(idle.apply(Event::Download).unwrap_err(), SessionError::NoReport);
    }

    #[tokio::test]
    async fn test_failed_completion_keeps_record() {
        let failed = analyze(&submitted_siti(), &Unavailable).await;
        assert_eq!(failed.phase(), Phase::Failed);
        assert!(!failed.is_processing());
        assert_eq!(failed.record().unwrap().name, "Siti");
        assert!(failed.failure().unwrap().contains("Resource has been exhausted"));
        assert!(failed.can_trigger());

        // Retry without re-entering data
        let client = FixedReply {
            text: "Laporan setelah retry",
            calls: AtomicUsize::new(0),
        };
        let ready = analyze(&failed, &client).await;
        assert_eq!(ready.phase(), Phase::ReportReady);
        assert!(ready.failure().is_none());
    }

    #[tokio::test]
    async fn test_sequential_triggers_show_same_report() {
        let client = FixedReply {
            text: "Laporan tetap",
            calls: AtomicUsize::new(0),
        };

        let first = analyze(&submitted_siti(), &client).await;
        let second = analyze(&first, &client).await;
        assert_eq!(first.report(), second.report());
        assert_eq!(second.report().unwrap().as_str(), "Laporan tetap");
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }
}
