//! In-process implementations of the storage ports.
//!
//! Used by the agent binary for fixture-driven runs and by tests.
use std::{
    collections::HashMap,
    sync::RwLock,
};

use async_trait::async_trait;

use lambda_model::{
    CommitMode, FrameIndex, LabeledData, Quality, Scope, SegmentId, SegmentMeta, TaskId, TaskMeta,
};

use crate::{
    error::{CoreError, CoreResult},
    ports::{AnnotationStore, FrameSource, TaskCatalog},
    sync::{read, write},
};

/// One accepted commit, as seen by [`MemoryStore::commits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub scope: Scope,
    pub mode: CommitMode,
    pub items: usize,
}

/// Annotation store keeping data per scope in memory.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<Scope, LabeledData>>,
    log: RwLock<Vec<CommitRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(self, scope: Scope, data: LabeledData) -> Self {
        write(&self.data).insert(scope, data);
        self
    }

    /// Current data of a scope.
    pub fn snapshot(&self, scope: Scope) -> LabeledData {
        read(&self.data).get(&scope).cloned().unwrap_or_default()
    }

    /// Accepted commits in order.
    pub fn commits(&self) -> Vec<CommitRecord> {
        read(&self.log).clone()
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn data(&self, scope: Scope) -> CoreResult<LabeledData> {
        Ok(self.snapshot(scope))
    }

    async fn commit(&self, scope: Scope, data: LabeledData, mode: CommitMode) -> CoreResult<()> {
        let items = data.len();
        {
            let mut all = write(&self.data);
            match mode {
                CommitMode::Replace => {
                    all.insert(scope, data);
                }
                CommitMode::Create => {
                    let stored = all.entry(scope).or_default();
                    stored.tags.extend(data.tags);
                    stored.shapes.extend(data.shapes);
                    stored.tracks.extend(data.tracks);
                }
            }
        }
        write(&self.log).push(CommitRecord { scope, mode, items });
        Ok(())
    }

    async fn delete(&self, scope: Scope) -> CoreResult<()> {
        write(&self.data).remove(&scope);
        Ok(())
    }
}

/// Task catalog backed by maps.
#[derive(Default)]
pub struct MemoryCatalog {
    tasks: HashMap<TaskId, TaskMeta>,
    segments: HashMap<SegmentId, SegmentMeta>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: TaskMeta) -> Self {
        self.tasks.insert(task.id, task);
        self
    }

    pub fn with_segment(mut self, segment: SegmentMeta) -> Self {
        self.segments.insert(segment.id, segment);
        self
    }
}

#[async_trait]
impl TaskCatalog for MemoryCatalog {
    async fn task(&self, id: TaskId) -> CoreResult<TaskMeta> {
        self.tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("task #{id} is not found")))
    }

    async fn segment(&self, id: SegmentId) -> CoreResult<SegmentMeta> {
        self.segments
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("job #{id} is not found")))
    }
}

/// Frame source serving preloaded bytes, with an optional fallback image.
#[derive(Default)]
pub struct MemoryFrames {
    frames: HashMap<(TaskId, FrameIndex), Vec<u8>>,
    fallback: Option<Vec<u8>>,
}

impl MemoryFrames {
    /// Serve the same bytes for every frame of every task.
    pub fn uniform(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            frames: HashMap::new(),
            fallback: Some(bytes.into()),
        }
    }

    pub fn with_frame(mut self, task: TaskId, frame: FrameIndex, bytes: impl Into<Vec<u8>>) -> Self {
        self.frames.insert((task, frame), bytes.into());
        self
    }
}

#[async_trait]
impl FrameSource for MemoryFrames {
    async fn frame(&self, task: TaskId, frame: FrameIndex, _: Quality) -> CoreResult<Vec<u8>> {
        self.frames
            .get(&(task, frame))
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("frame {frame} of task #{task} is not found")))
    }
}
