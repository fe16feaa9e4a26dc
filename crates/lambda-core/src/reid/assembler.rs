use tracing::{debug, info, instrument};

use lambda_model::{CallRequest, CommitMode, CreateJobRequest, LabeledShape, ShapeType};

use crate::{
    error::CoreResult,
    invoke::{decode_matching, to_values},
    pipeline::{Progress, RunContext, RunOutcome, percent},
    reid::paths::PathTable,
};

/// Chains boxes of consecutive frames into tracks using a re-identification function.
///
/// Only rectangles on frames of the scope take part; every other shape is
/// written back untouched. Results replace the scope data in one commit,
/// and nothing is written when no track was produced or the job was removed.
pub struct TrackAssembler<'a> {
    ctx: &'a RunContext,
    request: &'a CreateJobRequest,
}

impl<'a> TrackAssembler<'a> {
    pub fn new(ctx: &'a RunContext, request: &'a CreateJobRequest) -> Self {
        Self { ctx, request }
    }

    #[instrument(level = "debug", skip_all, fields(function = %self.ctx.function.id, scope = %self.ctx.scope()))]
    pub async fn run(&self, progress: &dyn Progress) -> CoreResult<RunOutcome> {
        let ctx = self.ctx;
        let scope = ctx.scope();
        let frames = ctx.frame_set();
        let Some(&last_frame) = frames.last() else {
            debug!("scope has no frames");
            return Ok(RunOutcome::Completed);
        };

        let mut data = ctx.store.data(scope).await?;
        let (boxes, mut kept): (Vec<LabeledShape>, Vec<LabeledShape>) =
            std::mem::take(&mut data.shapes)
                .into_iter()
                .partition(|s| s.shape_type == ShapeType::Rectangle);
        debug!(boxes = boxes.len(), other = kept.len(), frames = frames.len(), "assembling tracks");

        let mut table = PathTable::new(&frames, boxes);
        let pairs = frames.len() - 1;

        for (i, pair) in frames.windows(2).enumerate() {
            let (frame0, frame1) = (pair[0], pair[1]);
            table.open_paths(frame0);

            let boxes0 = table.on_frame(frame0);
            let boxes1 = table.on_frame(frame1);
            if !boxes0.is_empty() && !boxes1.is_empty() {
                let args = CallRequest {
                    frame0: Some(frame0),
                    frame1: Some(frame1),
                    boxes0: Some(to_values(&table.shapes(boxes0))?),
                    boxes1: Some(to_values(&table.shapes(boxes1))?),
                    quality: self.request.quality.clone(),
                    threshold: self.request.threshold,
                    max_distance: self.request.max_distance,
                    ..ctx.base_args()
                };
                let matching = decode_matching(ctx.invoke(&args).await?)?;
                table.link(frame0, frame1, &matching);
            }

            if !progress.update(percent(i + 1, pairs)) {
                info!(frame0, frame1, "job removed; track assembly stopped");
                return Ok(RunOutcome::Canceled);
            }
        }
        table.open_paths(last_frame);

        if table.is_empty() {
            debug!("no boxes in scope; nothing to commit");
            return Ok(RunOutcome::Completed);
        }
        let (tracks, rest) = table.into_tracks(last_frame);
        let count = tracks.len();

        kept.extend(rest);
        data.shapes = kept;
        data.tracks.extend(tracks);

        ctx.store.commit(scope, data, CommitMode::Replace).await?;
        ctx.metrics.record_commit(ctx.function.kind.kind(), count);
        debug!(tracks = count, "tracks committed");
        Ok(RunOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;

    use super::*;
    use crate::{
        invoke::Payload,
        memory::MemoryStore,
        testing::{StubRegistry, context},
    };
    use lambda_model::{
        FunctionDescriptor, FunctionKind, LabeledData, LabeledTrack, Scope, TaskMeta,
    };

    const SCOPE: Scope = Scope::Task { task: 1 };

    fn matcher() -> FunctionDescriptor {
        FunctionDescriptor::new("reid", FunctionKind::Reid)
    }

    fn rect(frame: u64, label_id: u64) -> LabeledShape {
        let mut shape = LabeledShape::auto(frame, label_id, ShapeType::Rectangle, vec![0.0, 0.0, 8.0, 8.0]);
        shape.id = Some(100 + frame);
        shape
    }

    fn store_with(shapes: Vec<LabeledShape>) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new().with_data(
            SCOPE,
            LabeledData {
                shapes,
                ..LabeledData::default()
            },
        ))
    }

    async fn run(
        frames: u64,
        store: Arc<MemoryStore>,
        registry: Arc<StubRegistry>,
        request: CreateJobRequest,
    ) -> RunOutcome {
        let ctx = context(matcher(), TaskMeta::new(1, frames), None, registry, store);
        TrackAssembler::new(&ctx, &request)
            .run(&|_: u8| true)
            .await
            .unwrap()
    }

    fn tracks(store: &MemoryStore) -> Vec<LabeledTrack> {
        store.snapshot(SCOPE).tracks
    }

    #[tokio::test]
    async fn always_matching_gives_one_track() {
        let store = store_with(vec![rect(0, 1), rect(1, 1), rect(2, 1)]);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], |_| Ok(json!([0]))));

        run(3, store.clone(), registry.clone(), CreateJobRequest::new("reid", 1)).await;

        let tracks = tracks(&store);
        assert_eq!(tracks.len(), 1);
        let frames: Vec<u64> = tracks[0].shapes.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 1, 2]);
        assert!(tracks[0].shapes.iter().all(|s| !s.outside));
        assert_eq!(tracks[0].frame, 0);
        assert!(store.snapshot(SCOPE).shapes.is_empty());
        assert_eq!(registry.call_count(), 2);
        assert_eq!(store.commits()[0].mode, CommitMode::Replace);
    }

    #[tokio::test]
    async fn broken_match_closes_the_first_track() {
        let store = store_with(vec![rect(0, 1), rect(1, 1), rect(2, 1)]);
        let calls = AtomicUsize::new(0);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], move |_| {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(json!([0])),
                _ => Ok(json!([-1])),
            }
        }));

        run(3, store.clone(), registry, CreateJobRequest::new("reid", 1)).await;

        let tracks = tracks(&store);
        assert_eq!(tracks.len(), 2);

        let first: Vec<(u64, bool)> = tracks[0].shapes.iter().map(|s| (s.frame, s.outside)).collect();
        assert_eq!(first, vec![(0, false), (1, false), (2, true)]);

        let second: Vec<(u64, bool)> = tracks[1].shapes.iter().map(|s| (s.frame, s.outside)).collect();
        assert_eq!(second, vec![(2, false)]);
        assert_eq!(tracks[1].frame, 2);
    }

    #[tokio::test]
    async fn track_takes_label_group_and_attributes_from_first_box() {
        let mut first = rect(0, 7);
        first.group = Some(3);
        first.attributes.push(lambda_model::AttributeValue {
            spec_id: 70,
            value: "parked".into(),
        });
        let store = store_with(vec![first, rect(1, 9)]);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], |_| Ok(json!([0]))));

        run(2, store.clone(), registry, CreateJobRequest::new("reid", 1)).await;

        let track = &tracks(&store)[0];
        assert_eq!(track.label_id, 7);
        assert_eq!(track.group, Some(3));
        assert_eq!(track.attributes.len(), 1);
        assert!(track.shapes.iter().all(|s| s.attributes.is_empty()));
    }

    #[tokio::test]
    async fn other_shapes_pass_through() {
        let polygon = LabeledShape::auto(1, 1, ShapeType::Polygon, vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        let store = store_with(vec![rect(0, 1), polygon.clone()]);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], |_| Ok(json!([0]))));

        run(2, store.clone(), registry.clone(), CreateJobRequest::new("reid", 1)).await;

        let data = store.snapshot(SCOPE);
        assert_eq!(data.shapes, vec![polygon]);
        assert_eq!(data.tracks.len(), 1);
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test]
    async fn nothing_is_committed_without_boxes() {
        let store = store_with(vec![]);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], |_| Ok(json!([]))));

        let outcome = run(5, store.clone(), registry, CreateJobRequest::new("reid", 1)).await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert!(store.commits().is_empty());
    }

    #[tokio::test]
    async fn removal_stops_without_commit() {
        let store = store_with(vec![rect(0, 1), rect(1, 1), rect(2, 1), rect(3, 1)]);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], |_| Ok(json!([0]))));
        let ctx = context(matcher(), TaskMeta::new(1, 4), None, registry.clone(), store.clone());
        let request = CreateJobRequest::new("reid", 1);

        let outcome = TrackAssembler::new(&ctx, &request)
            .run(&|p: u8| p < 60)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Canceled);
        assert_eq!(registry.call_count(), 2);
        assert!(store.commits().is_empty());
    }

    #[tokio::test]
    async fn matcher_receives_boxes_and_max_distance() {
        let store = store_with(vec![rect(0, 1), rect(1, 1)]);
        let registry = Arc::new(StubRegistry::new(vec![matcher()], |_| Ok(json!([0]))));
        let request = CreateJobRequest {
            max_distance: Some(40.0),
            ..CreateJobRequest::new("reid", 1)
        };

        run(2, store, registry.clone(), request).await;

        let calls = registry.calls.lock().unwrap();
        match &calls[0] {
            Payload::Reid {
                boxes0,
                boxes1,
                max_distance,
                ..
            } => {
                assert_eq!(boxes0[0]["frame"], 0);
                assert_eq!(boxes1[0]["frame"], 1);
                assert_eq!(*max_distance, Some(40.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
