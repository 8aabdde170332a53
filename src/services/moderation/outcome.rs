use serenity::all::UserId;
use thiserror::Error;

use super::policy::DenyReason;

/// Why a target was left untouched without it counting as a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("already muted")]
    AlreadyMuted,

    #[error("already unmuted")]
    AlreadyUnmuted,

    #[error("not processed: an earlier target failed")]
    BatchAborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailReason {
    #[error("{0}")]
    PolicyDenied(DenyReason),

    #[error("not muted")]
    NotMuted,

    #[error("platform error: {0}")]
    Platform(String),

    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Muted,
    Unmuted,
    Skipped(SkipReason),
    Failed(FailReason),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    pub target: UserId,
    pub outcome: Outcome,
}

impl TargetResult {
    pub fn new(target: UserId, outcome: Outcome) -> Self {
        Self { target, outcome }
    }
}
