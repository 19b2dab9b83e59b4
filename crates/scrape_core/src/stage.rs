use serde::Serialize;

/// Stage of a whole scrape operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Submitted,
    Polling,
    Normalizing,
    Done,
    Reported,
}

impl Stage {
    pub fn is_finished(self) -> bool {
        matches!(self, Stage::Done | Stage::Reported)
    }
}

/// Observations that drive [`update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMsg {
    /// The provider accepted the job.
    Accepted,
    /// First status query is about to be issued.
    PollStarted,
    /// Job reached `Succeeded`; results are being normalized.
    JobSucceeded,
    /// Normalization produced at least one record.
    Normalized,
    /// Any failure: rejection, job failure, timeout, normalization error.
    Failed,
}

/// Pure transition function for the scrape pipeline.
///
/// `Idle → Submitted → Polling → {Normalizing → Done | Reported}`. Messages that
/// do not apply to the current stage leave it unchanged; finished stages are
/// final.
pub fn update(stage: Stage, msg: StageMsg) -> Stage {
    match (stage, msg) {
        (Stage::Done | Stage::Reported, _) => stage,
        (_, StageMsg::Failed) => Stage::Reported,
        (Stage::Idle, StageMsg::Accepted) => Stage::Submitted,
        (Stage::Submitted, StageMsg::PollStarted) => Stage::Polling,
        (Stage::Polling, StageMsg::JobSucceeded) => Stage::Normalizing,
        (Stage::Normalizing, StageMsg::Normalized) => Stage::Done,
        _ => stage,
    }
}
