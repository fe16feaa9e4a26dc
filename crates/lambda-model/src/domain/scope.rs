use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{SegmentId, TaskId};

/// Target of an orchestration run: a whole task or one job segment of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Scope {
    Task { task: TaskId },
    Job { task: TaskId, job: SegmentId },
}

impl Scope {
    /// Build a scope from a task id and an optional segment id.
    pub fn new(task: TaskId, job: Option<SegmentId>) -> Self {
        match job {
            Some(job) => Scope::Job { task, job },
            None => Scope::Task { task },
        }
    }

    pub fn task(&self) -> TaskId {
        match self {
            Scope::Task { task } | Scope::Job { task, .. } => *task,
        }
    }

    pub fn job(&self) -> Option<SegmentId> {
        match self {
            Scope::Task { .. } => None,
            Scope::Job { job, .. } => Some(*job),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Task { task } => write!(f, "task#{task}"),
            Scope::Job { task, job } => write!(f, "task#{task}/job#{job}"),
        }
    }
}
