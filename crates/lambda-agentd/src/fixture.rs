//! Task fixtures: a task snapshot on disk that the agent runs one job against.
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use lambda_core::{
    CoreError, CoreResult,
    memory::{MemoryCatalog, MemoryStore},
    ports::FrameSource,
};
use lambda_model::{
    CreateJobRequest, FrameIndex, LabeledData, Quality, Scope, SegmentMeta, TaskId, TaskMeta,
};

/// On-disk layout:
///
/// ```json
/// {
///   "task": {"id": 1, "size": 250, "labels": {...}},
///   "segments": [{"id": 7, "task_id": 1, "frames": [0, 1, 2]}],
///   "annotations": {"shapes": [...]},
///   "frames_dir": "frames",
///   "request": {"function": "yolo", "task": 1, "cleanup": true}
/// }
/// ```
///
/// `frames_dir` is relative to the fixture file and holds `<frame>.jpg` files.
#[derive(Debug, Deserialize)]
pub struct TaskFixture {
    pub task: TaskMeta,
    #[serde(default)]
    pub segments: Vec<SegmentMeta>,
    /// Task annotations present before the run.
    #[serde(default)]
    pub annotations: LabeledData,
    #[serde(default)]
    pub frames_dir: Option<PathBuf>,
    #[serde(default)]
    pub request: Option<CreateJobRequest>,
}

impl TaskFixture {
    pub async fn load(path: &Path) -> anyhow::Result<(Self, PathBuf)> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read task file {}", path.display()))?;
        let fixture: Self =
            serde_json::from_str(&raw).with_context(|| format!("parse task file {}", path.display()))?;

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let frames = match &fixture.frames_dir {
            Some(dir) => base.join(dir),
            None => base,
        };
        Ok((fixture, frames))
    }

    /// Job request for `function`; the fixture's own request wins over defaults.
    pub fn request(&self, function: Option<&str>) -> anyhow::Result<CreateJobRequest> {
        let mut request = match (&self.request, function) {
            (Some(request), _) => request.clone(),
            (None, Some(function)) => CreateJobRequest::new(function, self.task.id),
            (None, None) => anyhow::bail!("no function configured and the task file has no request"),
        };
        if let Some(function) = function {
            request.function = function.to_string();
        }
        request.task = self.task.id;
        Ok(request)
    }

    pub fn catalog(&self) -> MemoryCatalog {
        self.segments
            .iter()
            .cloned()
            .fold(MemoryCatalog::new().with_task(self.task.clone()), |catalog, segment| {
                catalog.with_segment(segment)
            })
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new().with_data(Scope::Task { task: self.task.id }, self.annotations.clone()))
    }
}

/// Frame source reading `<root>/<frame>.jpg`.
pub struct DirFrames {
    root: PathBuf,
}

impl DirFrames {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, frame: FrameIndex) -> PathBuf {
        self.root.join(format!("{frame}.jpg"))
    }
}

#[async_trait]
impl FrameSource for DirFrames {
    async fn frame(&self, task: TaskId, frame: FrameIndex, _: Quality) -> CoreResult<Vec<u8>> {
        let path = self.path(frame);
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::not_found(format!("frame {frame} of task #{task} is not found")),
            _ => CoreError::Internal(format!("read {}: {e}", path.display())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_core::ports::TaskCatalog;

    fn fixture(json: &str) -> TaskFixture {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_fixture_needs_only_a_task() {
        let f = fixture(r#"{"task": {"id": 3, "size": 10}}"#);

        assert_eq!(f.task.id, 3);
        assert!(f.segments.is_empty());
        assert!(f.annotations.is_empty());
        assert!(f.request.is_none());
    }

    #[test]
    fn request_prefers_configured_function() {
        let f = fixture(r#"{"task": {"id": 3, "size": 10}, "request": {"function": "a", "task": 99, "cleanup": true}}"#);

        let request = f.request(Some("b")).unwrap();
        assert_eq!(request.function, "b");
        assert_eq!(request.task, 3);
        assert!(request.cleanup);

        assert_eq!(f.request(None).unwrap().function, "a");
    }

    #[test]
    fn request_without_function_fails() {
        let f = fixture(r#"{"task": {"id": 3, "size": 10}}"#);
        assert!(f.request(None).is_err());
        assert_eq!(f.request(Some("yolo")).unwrap().function, "yolo");
    }

    #[tokio::test]
    async fn catalog_knows_task_and_segments() {
        let f = fixture(
            r#"{"task": {"id": 3, "size": 10}, "segments": [{"id": 8, "task_id": 3, "frames": [0, 1]}]}"#,
        );
        let catalog = f.catalog();

        assert_eq!(catalog.task(3).await.unwrap().size, 10);
        assert_eq!(catalog.segment(8).await.unwrap().frames.len(), 2);
    }

    #[tokio::test]
    async fn dir_frames_reads_files() {
        let root = std::env::temp_dir().join(format!("lambda-agentd-frames-{}", std::process::id()));
        tokio::fs::create_dir_all(&root).await.unwrap();
        tokio::fs::write(root.join("4.jpg"), b"jpeg").await.unwrap();

        let frames = DirFrames::new(&root);
        assert_eq!(frames.frame(1, 4, Quality::Original).await.unwrap(), b"jpeg");

        let err = frames.frame(1, 5, Quality::Original).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
