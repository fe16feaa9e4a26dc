use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{FrameIndex, SegmentId, TaskId, TaskLabelSchema};

/// How the media of a task is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum DataLayout {
    Video {
        path: String,
    },
    /// One path per task frame.
    Images {
        paths: Vec<String>,
    },
    #[default]
    Other,
}

/// Immutable facts about a task needed to run functions over it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub id: TaskId,
    /// Number of task frames.
    pub size: u64,
    #[serde(default)]
    pub start_frame: u64,
    #[serde(default = "default_step")]
    pub frame_step: u64,
    #[serde(default)]
    pub deleted_frames: BTreeSet<FrameIndex>,
    #[serde(default)]
    pub labels: TaskLabelSchema,
    #[serde(default)]
    pub data: DataLayout,
}

fn default_step() -> u64 {
    1
}

impl TaskMeta {
    pub fn new(id: TaskId, size: u64) -> Self {
        Self {
            id,
            size,
            start_frame: 0,
            frame_step: 1,
            deleted_frames: BTreeSet::new(),
            labels: TaskLabelSchema::new(),
            data: DataLayout::Other,
        }
    }

    pub fn with_labels(mut self, labels: TaskLabelSchema) -> Self {
        self.labels = labels;
        self
    }

    /// Absolute media frame of a task-relative index; `None` when it does not fit in `u64`.
    pub fn absolute(&self, frame: FrameIndex) -> Option<u64> {
        frame
            .checked_mul(self.frame_step.max(1))
            .and_then(|offset| offset.checked_add(self.start_frame))
    }

    /// Task-relative index of an absolute media frame.
    pub fn relative(&self, absolute: u64) -> FrameIndex {
        absolute.saturating_sub(self.start_frame) / self.frame_step.max(1)
    }

    /// Ordered task-relative frames of the whole task or of one segment.
    pub fn frame_set(&self, segment: Option<&SegmentMeta>) -> Vec<FrameIndex> {
        match segment {
            Some(segment) => {
                let frames: BTreeSet<FrameIndex> =
                    segment.frames.iter().map(|abs| self.relative(*abs)).collect();
                frames.into_iter().collect()
            }
            None => (0..self.size).collect(),
        }
    }

    pub fn is_deleted(&self, frame: FrameIndex) -> bool {
        self.deleted_frames.contains(&frame)
    }

    /// Media path forwarded to detectors.
    pub fn data_path(&self, frame: FrameIndex) -> String {
        match &self.data {
            DataLayout::Video { path } => path.clone(),
            DataLayout::Images { paths } => usize::try_from(frame)
                .ok()
                .and_then(|i| paths.get(i))
                .cloned()
                .unwrap_or_default(),
            DataLayout::Other => String::new(),
        }
    }
}

/// A job segment: a subset of a task's absolute frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    pub task_id: TaskId,
    /// Absolute media frame numbers.
    pub frames: BTreeSet<u64>,
}

impl SegmentMeta {
    /// Segment covering the absolute frames `start..=stop`.
    pub fn range(id: SegmentId, task_id: TaskId, start: u64, stop: u64) -> Self {
        Self {
            id,
            task_id,
            frames: (start..=stop).collect(),
        }
    }

    pub fn contains(&self, absolute: u64) -> bool {
        self.frames.contains(&absolute)
    }
}

/// How a commit merges into the existing annotations of a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Append to what is already stored.
    Create,
    /// Overwrite everything stored for the scope.
    Replace,
}
