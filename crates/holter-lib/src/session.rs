use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationLog};
use crate::config::ReviewConfig;
use crate::error::{ReviewError, Result};
use crate::plot::{figure_from_window, Figure, PlotBackend};
use crate::report::{ReportBuilder, ReportDocument};
use crate::selection::{validate_confirmation, CandidateRange, Rejection, SelectionPolicy};
use crate::signal::SignalStore;
use crate::window::{WindowNavigator, WindowSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No recording loaded.
    Empty,
    /// A window is on screen; no selection pending.
    Browsing,
    /// A candidate range awaits a label and confirmation.
    Selecting,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Browsing => "browsing",
            SessionState::Selecting => "selecting",
        }
    }
}

/// One user action, delivered to [`ReviewSession::apply`] in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReviewEvent {
    SetWindow { hour: usize },
    CaptureSelection { start: f64, end: f64 },
    Confirm {
        #[serde(default)]
        label: String,
    },
    CancelSelection,
    Retract { index: usize },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    WindowChanged { window: WindowSpec },
    SelectionCaptured { candidate: CandidateRange },
    Accepted { annotation: Annotation },
    Rejected { rejection: Rejection },
    Cancelled,
    Retracted { annotation: Annotation },
    Reset,
}

/// Result of confirming a pending selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Accepted(Annotation),
    /// The session stays in [`SessionState::Selecting`].
    Rejected(Rejection),
}

/// Review state for one recording: what is loaded, which window is shown,
/// any pending selection, and the findings so far.
#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    store: Option<SignalStore>,
    navigator: WindowNavigator,
    policy: SelectionPolicy,
    current_window: Option<WindowSpec>,
    pending_candidate: Option<CandidateRange>,
    annotation_log: AnnotationLog,
}

impl ReviewSession {
    pub fn new(navigator: WindowNavigator, policy: SelectionPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            navigator,
            policy,
            ..Self::default()
        })
    }

    pub fn from_config(cfg: &ReviewConfig) -> Result<Self> {
        cfg.validate()?;
        Self::new(cfg.window, cfg.selection)
    }

    pub fn state(&self) -> SessionState {
        match (&self.store, &self.pending_candidate) {
            (None, _) => SessionState::Empty,
            (Some(_), None) => SessionState::Browsing,
            (Some(_), Some(_)) => SessionState::Selecting,
        }
    }

    pub fn store(&self) -> Option<&SignalStore> {
        self.store.as_ref()
    }

    pub fn navigator(&self) -> &WindowNavigator {
        &self.navigator
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn current_window(&self) -> Option<WindowSpec> {
        self.current_window
    }

    pub fn pending_candidate(&self) -> Option<CandidateRange> {
        self.pending_candidate
    }

    pub fn annotation_log(&self) -> &AnnotationLog {
        &self.annotation_log
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotation_log.all()
    }

    /// Install a recording and show its first window. Findings already made
    /// in this session are kept.
    pub fn load_recording(&mut self, store: SignalStore) -> Result<WindowSpec> {
        self.expect_not(SessionState::Selecting, "load a recording")?;
        let window = self.navigator.window_for(&store, 0)?;
        self.store = Some(store);
        self.current_window = Some(window);
        log::debug!("session -> browsing, window 0");
        Ok(window)
    }

    pub fn set_window(&mut self, hour_index: usize) -> Result<WindowSpec> {
        self.expect(SessionState::Browsing, "change window")?;
        let store = self.loaded_store("change window")?;
        let window = self.navigator.window_for(store, hour_index)?;
        self.current_window = Some(window);
        log::debug!(
            "window {} -> samples {}..{}",
            hour_index,
            window.start_sample,
            window.end_sample
        );
        Ok(window)
    }

    /// Hold a zoom-box range for labeling; replaces any range already held.
    pub fn capture_selection(&mut self, candidate: CandidateRange) -> Result<()> {
        if self.state() == SessionState::Empty {
            return Err(self.invalid("capture a selection"));
        }
        self.pending_candidate = Some(candidate);
        log::debug!(
            "session -> selecting {:.2}..{:.2}s",
            candidate.start_time,
            candidate.end_time
        );
        Ok(())
    }

    /// Validate the held range with `label` and log it when accepted.
    pub fn confirm(&mut self, label: &str) -> Result<Confirmation> {
        let candidate = self
            .pending_candidate
            .ok_or_else(|| self.invalid("confirm a selection"))?;
        if let Err(rejection) = validate_confirmation(&candidate, label, &self.policy) {
            log::warn!("selection rejected: {}", rejection);
            return Ok(Confirmation::Rejected(rejection));
        }
        let annotation =
            self.annotation_log
                .append(candidate.start_time, candidate.end_time, label)?;
        self.pending_candidate = None;
        log::debug!(
            "session -> browsing, saved '{}' at {:.2}-{:.2}s",
            annotation.label,
            annotation.start_time,
            annotation.end_time
        );
        Ok(Confirmation::Accepted(annotation))
    }

    pub fn cancel_selection(&mut self) -> Result<()> {
        self.expect(SessionState::Selecting, "cancel a selection")?;
        self.pending_candidate = None;
        log::debug!("session -> browsing, selection discarded");
        Ok(())
    }

    pub fn retract(&mut self, index: usize) -> Result<Annotation> {
        if self.state() == SessionState::Empty {
            return Err(self.invalid("retract an annotation"));
        }
        let annotation = self.annotation_log.retract(index)?;
        log::debug!("retracted annotation {} '{}'", index, annotation.label);
        Ok(annotation)
    }

    /// Drop the recording, selection and every finding.
    pub fn reset(&mut self) {
        self.store = None;
        self.current_window = None;
        self.pending_candidate = None;
        self.annotation_log.clear();
        log::debug!("session -> empty");
    }

    /// Plot data for the window on screen, decimated to `max_points`.
    pub fn current_view(&self, max_points: usize) -> Result<Figure> {
        let store = self.loaded_store("view a window")?;
        let window = self
            .current_window
            .ok_or_else(|| self.invalid("view a window"))?;
        Ok(figure_from_window(
            &window,
            window.samples(store)?,
            max_points,
        ))
    }

    pub fn build_report(
        &self,
        builder: &ReportBuilder,
        backend: &mut dyn PlotBackend,
    ) -> Result<ReportDocument> {
        let store = self.loaded_store("build a report")?;
        builder.build(store, &self.annotation_log.all(), backend)
    }

    /// Process one event to completion.
    pub fn apply(&mut self, event: ReviewEvent) -> Result<EventOutcome> {
        match event {
            ReviewEvent::SetWindow { hour } => {
                let window = self.set_window(hour)?;
                Ok(EventOutcome::WindowChanged { window })
            }
            ReviewEvent::CaptureSelection { start, end } => {
                let candidate = CandidateRange::new(start, end)?;
                self.capture_selection(candidate)?;
                Ok(EventOutcome::SelectionCaptured { candidate })
            }
            ReviewEvent::Confirm { label } => Ok(match self.confirm(&label)? {
                Confirmation::Accepted(annotation) => EventOutcome::Accepted { annotation },
                Confirmation::Rejected(rejection) => EventOutcome::Rejected { rejection },
            }),
            ReviewEvent::CancelSelection => {
                self.cancel_selection()?;
                Ok(EventOutcome::Cancelled)
            }
            ReviewEvent::Retract { index } => {
                let annotation = self.retract(index)?;
                Ok(EventOutcome::Retracted { annotation })
            }
            ReviewEvent::Reset => {
                self.reset();
                Ok(EventOutcome::Reset)
            }
        }
    }

    fn loaded_store(&self, operation: &'static str) -> Result<&SignalStore> {
        self.store.as_ref().ok_or_else(|| self.invalid(operation))
    }

    fn expect(&self, state: SessionState, operation: &'static str) -> Result<()> {
        if self.state() == state {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn expect_not(&self, state: SessionState, operation: &'static str) -> Result<()> {
        if self.state() == state {
            Err(self.invalid(operation))
        } else {
            Ok(())
        }
    }

    fn invalid(&self, operation: &'static str) -> ReviewError {
        ReviewError::InvalidTransition {
            operation,
            state: self.state().name(),
        }
    }
}
