use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ReviewError, Result};

/// A user-proposed interval awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateRange {
    pub start_time: f64,
    pub end_time: f64,
}

impl CandidateRange {
    pub fn new(start_time: f64, end_time: f64) -> Result<Self> {
        if !start_time.is_finite() || !end_time.is_finite() || end_time <= start_time {
            return Err(ReviewError::range(format!(
                "selection {}..{} is not an increasing interval",
                start_time, end_time
            )));
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Acceptance band for abnormality selections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    pub min_duration_s: f64,
    pub max_duration_s: f64,
    pub require_non_empty_label: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            min_duration_s: 8.0,
            max_duration_s: 12.0,
            require_non_empty_label: false,
        }
    }
}

impl SelectionPolicy {
    /// The band must be non-negative and ordered.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_duration_s >= 0.0 && self.min_duration_s <= self.max_duration_s) {
            return Err(ReviewError::format(format!(
                "selection band {}..{} is invalid",
                self.min_duration_s, self.max_duration_s
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accepted {
    pub duration: f64,
}

/// Why a selection was turned down. A normal outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    DurationOutOfRange { actual: f64, min: f64, max: f64 },
    EmptyLabel,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DurationOutOfRange { actual, min, max } => write!(
                f,
                "selection lasts {:.2}s; select between {}s and {}s",
                actual, min, max
            ),
            Rejection::EmptyLabel => write!(f, "a label is required"),
        }
    }
}

/// Closed-band duration check: `min <= end - start <= max`.
pub fn validate(
    candidate: &CandidateRange,
    policy: &SelectionPolicy,
) -> std::result::Result<Accepted, Rejection> {
    let duration = candidate.duration();
    if duration >= policy.min_duration_s && duration <= policy.max_duration_s {
        Ok(Accepted { duration })
    } else {
        Err(Rejection::DurationOutOfRange {
            actual: duration,
            min: policy.min_duration_s,
            max: policy.max_duration_s,
        })
    }
}

/// Duration check followed by the optional label requirement.
pub fn validate_confirmation(
    candidate: &CandidateRange,
    label: &str,
    policy: &SelectionPolicy,
) -> std::result::Result<Accepted, Rejection> {
    let accepted = validate(candidate, policy)?;
    if policy.require_non_empty_label && label.trim().is_empty() {
        return Err(Rejection::EmptyLabel);
    }
    Ok(accepted)
}
