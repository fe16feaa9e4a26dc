use tracing::{debug, info, instrument, trace};

use lambda_model::{CallRequest, CreateJobRequest, DEFAULT_FLUSH_EVERY};

use crate::{
    error::CoreResult,
    invoke::decode_annotations,
    mapping::ResolvedMapping,
    pipeline::{
        Progress, RunContext, RunOutcome,
        batch::ResultsBatch,
        convert::{Converted, convert},
        percent,
    },
};

/// Sweeps a detector over every frame of a scope.
///
/// Results are remapped into task vocabulary, converted to tags and shapes
/// and committed in batches, so memory stays bounded on long tasks. A store
/// rejection aborts the sweep; batches committed before it stay.
pub struct DetectionPipeline<'a> {
    ctx: &'a RunContext,
    request: &'a CreateJobRequest,
    flush_every: usize,
}

impl<'a> DetectionPipeline<'a> {
    pub fn new(ctx: &'a RunContext, request: &'a CreateJobRequest) -> Self {
        Self {
            ctx,
            request,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }

    /// Commit cadence in processed frames.
    pub fn with_flush_every(mut self, frames: usize) -> Self {
        self.flush_every = frames.max(1);
        self
    }

    #[instrument(level = "debug", skip_all, fields(function = %self.ctx.function.id, scope = %self.ctx.scope()))]
    pub async fn run(&self, progress: &dyn Progress) -> CoreResult<RunOutcome> {
        let ctx = self.ctx;
        let mapping = ResolvedMapping::resolve(
            &ctx.function,
            &ctx.task.labels,
            self.request.mapping.as_ref(),
        );
        let frames = ctx.frame_set();
        let total = frames.len();
        let mut batch = ResultsBatch::new(ctx.scope(), self.flush_every);

        debug!(frames = total, "detection started");
        for (i, frame) in frames.into_iter().enumerate() {
            if !ctx.task.is_deleted(frame) {
                let args = CallRequest {
                    frame: Some(frame),
                    quality: self.request.quality.clone(),
                    threshold: self.request.threshold,
                    ..ctx.base_args()
                };
                let raw = ctx.invoke(&args).await?;
                let found = decode_annotations(raw)?;
                trace!(frame, results = found.len(), "frame processed");

                if !progress.update(percent(i + 1, total)) {
                    info!(frame, commits = batch.commits(), "job removed; detection stopped");
                    return Ok(RunOutcome::Canceled);
                }

                for anno in found {
                    let Some(anno) = mapping.remap(&ctx.function, anno) else {
                        continue;
                    };
                    match convert(anno, frame, &ctx.task.labels, self.request.conv_mask_to_poly) {
                        Some(Converted::Tag(tag)) => batch.push_tag(tag),
                        Some(Converted::Shape(shape)) => batch.push_shape(shape),
                        None => {}
                    }
                }
                batch.frame_done(ctx).await?;
                continue;
            }

            trace!(frame, "skipping deleted frame");
            if !progress.update(percent(i + 1, total)) {
                info!(frame, commits = batch.commits(), "job removed; detection stopped");
                return Ok(RunOutcome::Canceled);
            }
        }

        batch.flush(ctx).await?;
        debug!(commits = batch.commits(), "detection finished");
        Ok(RunOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        error::CoreError,
        invoke::Payload,
        memory::MemoryStore,
        ports::AnnotationStore,
        testing::{StubRegistry, context},
    };
    use lambda_model::{
        CommitMode, FunctionDescriptor, FunctionKind, LabeledData, Scope, SegmentMeta,
        ShapeType, TaskLabel, TaskLabelSchema, TaskMeta,
    };

    fn detector() -> FunctionDescriptor {
        FunctionDescriptor::new("yolo", FunctionKind::Detector)
            .with_label("car", vec![])
            .with_label("day", vec![])
            .with_label("boat", vec![])
    }

    fn task(size: u64) -> TaskMeta {
        TaskMeta::new(1, size).with_labels(
            TaskLabelSchema::new()
                .with_label("car", TaskLabel::new(10))
                .with_label("day", TaskLabel::new(11)),
        )
    }

    fn one_box_per_frame() -> Arc<StubRegistry> {
        Arc::new(StubRegistry::new(vec![detector()], |_| {
            Ok(json!([{"type": "rectangle", "label": "car", "points": [0, 0, 10, 10]}]))
        }))
    }

    #[tokio::test]
    async fn commits_every_hundred_frames() {
        let store = Arc::new(MemoryStore::new());
        let registry = one_box_per_frame();
        let ctx = context(detector(), task(250), None, registry.clone(), store.clone());
        let request = CreateJobRequest::new("yolo", 1);

        let outcome = DetectionPipeline::new(&ctx, &request)
            .run(&|_: u8| true)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Completed);
        let commits = store.commits();
        assert_eq!(commits.len(), 3);
        assert_eq!(
            commits.iter().map(|c| c.items).collect::<Vec<_>>(),
            vec![100, 100, 50]
        );
        assert!(commits.iter().all(|c| c.mode == CommitMode::Create));
        assert_eq!(store.snapshot(Scope::Task { task: 1 }).shapes.len(), 250);
        assert_eq!(registry.call_count(), 250);
    }

    #[tokio::test]
    async fn removal_stops_the_sweep_and_keeps_flushed_batches() {
        let store = Arc::new(MemoryStore::new());
        let registry = one_box_per_frame();
        let ctx = context(detector(), task(10), None, registry.clone(), store.clone());
        let request = CreateJobRequest::new("yolo", 1);

        let seen = Mutex::new(Vec::new());
        let progress = |p: u8| {
            seen.lock().unwrap().push(p);
            p < 40
        };

        let outcome = DetectionPipeline::new(&ctx, &request)
            .with_flush_every(3)
            .run(&progress)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Canceled);
        assert_eq!(registry.call_count(), 4);
        assert_eq!(store.commits().len(), 1);
        assert_eq!(store.snapshot(Scope::Task { task: 1 }).shapes.len(), 3);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn removal_during_a_call_drops_the_pending_batch() {
        let store = Arc::new(MemoryStore::new());
        let removed = Arc::new(AtomicBool::new(false));
        let calls = AtomicUsize::new(0);
        let flag = Arc::clone(&removed);
        let registry = Arc::new(StubRegistry::new(vec![detector()], move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                flag.store(true, Ordering::SeqCst);
            }
            Ok(json!([{"type": "rectangle", "label": "car", "points": [0, 0, 10, 10]}]))
        }));
        let ctx = context(detector(), task(10), None, registry.clone(), store.clone());
        let request = CreateJobRequest::new("yolo", 1);

        let outcome = DetectionPipeline::new(&ctx, &request)
            .with_flush_every(3)
            .run(&|_: u8| !removed.load(Ordering::SeqCst))
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Canceled);
        assert_eq!(registry.call_count(), 3);
        assert!(store.commits().is_empty());
        assert!(store.snapshot(Scope::Task { task: 1 }).is_empty());
    }

    struct RejectSecondCommit {
        inner: MemoryStore,
        commits: AtomicUsize,
    }

    #[async_trait]
    impl AnnotationStore for RejectSecondCommit {
        async fn data(&self, scope: Scope) -> crate::CoreResult<LabeledData> {
            self.inner.data(scope).await
        }

        async fn commit(&self, scope: Scope, data: LabeledData, mode: CommitMode) -> crate::CoreResult<()> {
            if self.commits.fetch_add(1, Ordering::SeqCst) == 1 {
                return Err(CoreError::Store("label_id is invalid".into()));
            }
            self.inner.commit(scope, data, mode).await
        }

        async fn delete(&self, scope: Scope) -> crate::CoreResult<()> {
            self.inner.delete(scope).await
        }
    }

    #[tokio::test]
    async fn store_rejection_aborts_but_keeps_earlier_batches() {
        let store = Arc::new(RejectSecondCommit {
            inner: MemoryStore::new(),
            commits: AtomicUsize::new(0),
        });
        let registry = one_box_per_frame();
        let mut ctx = context(detector(), task(250), None, registry.clone(), Arc::new(MemoryStore::new()));
        let shared: Arc<dyn AnnotationStore> = store.clone();
        ctx.store = shared;
        let request = CreateJobRequest::new("yolo", 1);

        let err = DetectionPipeline::new(&ctx, &request)
            .run(&|_: u8| true)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Store(_)));
        assert_eq!(registry.call_count(), 200);
        assert_eq!(store.inner.snapshot(Scope::Task { task: 1 }).shapes.len(), 100);
    }

    #[tokio::test]
    async fn routes_tags_and_drops_unmapped_labels() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(StubRegistry::new(vec![detector()], |_| {
            Ok(json!([
                {"type": "tag", "label": "day"},
                {"type": "rectangle", "label": "boat", "points": [0, 0, 1, 1]},
                {"type": "ellipse", "label": "car", "points": [5, 5, 7, 7], "rotation": 15}
            ]))
        }));
        let mut task = task(3);
        task.deleted_frames.insert(1);
        let ctx = context(detector(), task, None, registry.clone(), store.clone());
        let request = CreateJobRequest::new("yolo", 1);

        DetectionPipeline::new(&ctx, &request)
            .run(&|_: u8| true)
            .await
            .unwrap();

        assert_eq!(registry.call_count(), 2);
        let data = store.snapshot(Scope::Task { task: 1 });
        assert_eq!(data.tags.len(), 2);
        assert!(data.tags.iter().all(|t| t.label_id == 11));
        assert_eq!(data.shapes.len(), 2);
        assert!(data.shapes.iter().all(|s| s.shape_type == ShapeType::Ellipse));
        assert_eq!(data.shapes[0].rotation, Some(15.0));
        assert_eq!(
            data.shapes.iter().map(|s| s.frame).collect::<Vec<_>>(),
            vec![0, 2]
        );
    }

    #[tokio::test]
    async fn job_scope_sweeps_segment_frames_only() {
        let store = Arc::new(MemoryStore::new());
        let registry = one_box_per_frame();
        let segment = SegmentMeta::range(5, 1, 4, 6);
        let ctx = context(detector(), task(10), Some(segment), registry.clone(), store.clone());
        let request = CreateJobRequest {
            job: Some(5),
            threshold: Some(0.7),
            ..CreateJobRequest::new("yolo", 1)
        };

        DetectionPipeline::new(&ctx, &request)
            .run(&|_: u8| true)
            .await
            .unwrap();

        let frames: Vec<u64> = store
            .snapshot(Scope::Job { task: 1, job: 5 })
            .shapes
            .iter()
            .map(|s| s.frame)
            .collect();
        assert_eq!(frames, vec![4, 5, 6]);

        let calls = registry.calls.lock().unwrap();
        assert!(calls.iter().all(|p| matches!(p, Payload::Detector { threshold: Some(t), .. } if *t == 0.7)));
    }
}
