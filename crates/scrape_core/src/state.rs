use std::fmt;

use thiserror::Error;

/// Lifecycle of one remote job as observed by the poller.
///
/// `Pending → Running → {Succeeded | Failed}`; any non-terminal state may move
/// to `TimedOut` when the local deadline elapses. Terminal states never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job state transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

const GENERIC_FAILURE: &str = "job failed";

/// Provider state vocabulary, before the failure message is attached.
#[derive(Clone, Copy)]
enum Reported {
    Pending,
    Running,
    Succeeded,
    Failed,
}

fn classify(state: &str) -> Option<Reported> {
    match state.trim().to_ascii_lowercase().as_str() {
        "pending" | "ready" | "queued" => Some(Reported::Pending),
        "running" => Some(Reported::Running),
        "succeeded" => Some(Reported::Succeeded),
        "failed" | "aborted" | "timed-out" | "timed_out" => Some(Reported::Failed),
        _ => None,
    }
}

impl JobState {
    /// Maps a provider-reported state string to a job state.
    ///
    /// Matching is case-insensitive. Unrecognized values are reported as
    /// `Running`, so polling simply continues.
    pub fn from_provider(state: &str, message: Option<&str>) -> Self {
        let Some(kind) = classify(state) else {
            return JobState::Running;
        };
        match kind {
            Reported::Pending => JobState::Pending,
            Reported::Running => JobState::Running,
            Reported::Succeeded => JobState::Succeeded,
            Reported::Failed => {
                let reason = message
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(GENERIC_FAILURE);
                JobState::Failed(reason.to_string())
            }
        }
    }

    /// Whether `state` is one of the strings [`JobState::from_provider`] knows.
    pub fn is_recognized(state: &str) -> bool {
        classify(state).is_some()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed(_) | JobState::TimedOut
        )
    }

    /// Moves to `next`, refusing any transition out of a terminal state.
    pub fn advance(self, next: JobState) -> Result<JobState, InvalidTransition> {
        if self.is_terminal() {
            return Err(InvalidTransition {
                from: self,
                to: next,
            });
        }
        // A provider may briefly report `pending` again after `running`;
        // the observed job does not go backwards.
        if self == JobState::Running && next == JobState::Pending {
            return Ok(JobState::Running);
        }
        Ok(next)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Failed(reason) => write!(f, "failed ({reason})"),
            JobState::TimedOut => write!(f, "timed out"),
        }
    }
}
