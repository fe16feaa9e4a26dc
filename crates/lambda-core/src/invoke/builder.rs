use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use tracing::trace;

use lambda_model::{
    CallRequest, FrameIndex, FunctionDescriptor, FunctionKind, Quality, SegmentMeta, TaskMeta,
};

use crate::{
    error::{CoreResult, ValidationError},
    invoke::Payload,
    ports::FrameSource,
};

/// Frame-bearing arguments checked against a job's frames, with their wording in errors.
const FRAME_FIELDS: [(&str, &str); 3] = [
    ("frame", "frame"),
    ("frame0", "start frame"),
    ("frame1", "end frame"),
];

/// Assembles per-kind payloads for one function against one task.
///
/// With a segment, every frame argument must fall inside the segment.
pub struct InvocationBuilder<'a> {
    function: &'a FunctionDescriptor,
    task: &'a TaskMeta,
    segment: Option<&'a SegmentMeta>,
    frames: &'a dyn FrameSource,
}

impl<'a> InvocationBuilder<'a> {
    pub fn new(
        function: &'a FunctionDescriptor,
        task: &'a TaskMeta,
        segment: Option<&'a SegmentMeta>,
        frames: &'a dyn FrameSource,
    ) -> Self {
        Self {
            function,
            task,
            segment,
            frames,
        }
    }

    /// Validate arguments and build the payload for the function's kind.
    pub async fn build(&self, args: &CallRequest) -> CoreResult<Payload> {
        self.check_bounds(args)?;
        let quality = self.quality(args.quality.as_deref())?;
        let threshold = args.threshold;

        let payload = match self.function.kind {
            FunctionKind::Detector => {
                let frame = self.required(args.frame, "frame")?;
                Payload::Detector {
                    image: self.image(frame, quality).await?,
                    data_path: self.task.data_path(frame),
                    threshold,
                }
            }
            FunctionKind::Interactor => {
                let frame = self.required(args.frame, "frame")?;
                let mut pos_points = self.required(args.pos_points.clone(), "pos_points")?;
                let neg_points = self.required(args.neg_points.clone(), "neg_points")?;
                let obj_bbox = if self.function.interactive.startswith_box {
                    let split = pos_points.len().min(2);
                    Some(pos_points.drain(..split).collect())
                } else {
                    None
                };
                Payload::Interactor {
                    image: self.image(frame, quality).await?,
                    pos_points,
                    neg_points,
                    obj_bbox,
                    threshold,
                }
            }
            FunctionKind::Reid => {
                let frame0 = self.required(args.frame0, "frame0")?;
                let frame1 = self.required(args.frame1, "frame1")?;
                let boxes0 = self.required(args.boxes0.clone(), "boxes0")?;
                let boxes1 = self.required(args.boxes1.clone(), "boxes1")?;
                Payload::Reid {
                    image0: self.image(frame0, quality).await?,
                    image1: self.image(frame1, quality).await?,
                    boxes0,
                    boxes1,
                    max_distance: args.max_distance,
                    threshold,
                }
            }
            FunctionKind::Tracker => {
                let frame = self.required(args.frame, "frame")?;
                Payload::Tracker {
                    image: self.image(frame, quality).await?,
                    shapes: args.shapes.clone().unwrap_or_default(),
                    states: args.states.clone().unwrap_or_default(),
                    threshold,
                }
            }
            FunctionKind::Unknown => {
                return Err(ValidationError::UnsupportedKind {
                    function: self.function.id.clone(),
                    kind: self.function.kind,
                }
                .into());
            }
        };

        trace!(function = %self.function.id, kind = payload.kind(), "payload built");
        Ok(payload)
    }

    fn check_bounds(&self, args: &CallRequest) -> Result<(), ValidationError> {
        let Some(segment) = self.segment else {
            return Ok(());
        };
        let values = [args.frame, args.frame0, args.frame1];

        for ((field, description), value) in FRAME_FIELDS.into_iter().zip(values) {
            let Some(frame) = value else {
                continue;
            };
            let inside = self
                .task
                .absolute(frame)
                .is_some_and(|absolute| segment.contains(absolute));
            if !inside {
                return Err(ValidationError::OutOfRange { field, description });
            }
        }
        Ok(())
    }

    fn quality(&self, value: Option<&str>) -> Result<Quality, ValidationError> {
        Quality::resolve(value).map_err(|_| ValidationError::InvalidQuality {
            function: self.function.id.clone(),
            quality: value.unwrap_or_default().to_string(),
        })
    }

    fn required<T>(&self, value: Option<T>, name: &'static str) -> Result<T, ValidationError> {
        value.ok_or_else(|| ValidationError::MissingArgument {
            function: self.function.id.clone(),
            name,
        })
    }

    async fn image(&self, frame: FrameIndex, quality: Quality) -> CoreResult<String> {
        let bytes = self.frames.frame(self.task.id, frame, quality).await?;
        Ok(STANDARD.encode(bytes))
    }
}

/// Serialize values for the `boxes0`/`boxes1`/`shapes` arguments.
pub fn to_values<T: serde::Serialize>(items: &[T]) -> CoreResult<Vec<Value>> {
    items
        .iter()
        .map(|item| {
            serde_json::to_value(item).map_err(|e| crate::CoreError::Internal(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::CoreError;
    use lambda_model::{DataLayout, InteractiveConfig, TaskId};

    #[derive(Default)]
    struct RecordingFrames {
        calls: Mutex<Vec<(FrameIndex, Quality)>>,
    }

    #[async_trait]
    impl FrameSource for RecordingFrames {
        async fn frame(&self, _: TaskId, frame: FrameIndex, quality: Quality) -> CoreResult<Vec<u8>> {
            self.calls.lock().unwrap().push((frame, quality));
            Ok(format!("frame-{frame}").into_bytes())
        }
    }

    fn task() -> TaskMeta {
        let mut task = TaskMeta::new(1, 20);
        task.data = DataLayout::Video {
            path: "/media/clip.mp4".into(),
        };
        task
    }

    fn validation(err: CoreError) -> ValidationError {
        match err {
            CoreError::Validation(v) => v,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn detector_payload_carries_image_and_path() {
        let function = FunctionDescriptor::new("yolo", FunctionKind::Detector);
        let task = task();
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, None, &frames);

        let mut args = CallRequest::for_task(1).with_frame(3);
        args.threshold = Some(0.4);
        args.quality = Some("compressed".into());

        let payload = builder.build(&args).await.unwrap();
        assert_eq!(
            payload,
            Payload::Detector {
                image: STANDARD.encode("frame-3"),
                data_path: "/media/clip.mp4".into(),
                threshold: Some(0.4),
            }
        );
        assert_eq!(*frames.calls.lock().unwrap(), vec![(3, Quality::Compressed)]);
    }

    #[tokio::test]
    async fn interactor_splits_box_points() {
        let function = FunctionDescriptor::new("sam", FunctionKind::Interactor).with_interactive(
            InteractiveConfig {
                startswith_box: true,
                ..InteractiveConfig::default()
            },
        );
        let task = task();
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, None, &frames);

        let mut args = CallRequest::for_task(1).with_frame(0);
        args.pos_points = Some(vec![json!([0, 0]), json!([9, 9]), json!([4, 5])]);
        args.neg_points = Some(vec![]);

        match builder.build(&args).await.unwrap() {
            Payload::Interactor {
                pos_points,
                obj_bbox,
                ..
            } => {
                assert_eq!(pos_points, vec![json!([4, 5])]);
                assert_eq!(obj_bbox, Some(vec![json!([0, 0]), json!([9, 9])]));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_argument_is_named() {
        let function = FunctionDescriptor::new("sam", FunctionKind::Interactor);
        let task = task();
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, None, &frames);

        let mut args = CallRequest::for_task(1).with_frame(0);
        args.pos_points = Some(vec![json!([1, 1])]);

        let err = validation(builder.build(&args).await.unwrap_err());
        assert!(matches!(err, ValidationError::MissingArgument { name: "neg_points", .. }));
        assert!(frames.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tracker_defaults_shapes_and_states() {
        let function = FunctionDescriptor::new("siam", FunctionKind::Tracker);
        let task = task();
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, None, &frames);

        match builder.build(&CallRequest::for_task(1).with_frame(2)).await.unwrap() {
            Payload::Tracker { shapes, states, .. } => {
                assert!(shapes.is_empty());
                assert!(states.is_empty());
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn reid_forwards_max_distance() {
        let function = FunctionDescriptor::new("reid", FunctionKind::Reid);
        let task = task();
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, None, &frames);

        let args = CallRequest {
            frame0: Some(1),
            frame1: Some(2),
            boxes0: Some(vec![json!({"points": [0, 0, 1, 1]})]),
            boxes1: Some(vec![]),
            max_distance: Some(50.0),
            ..CallRequest::for_task(1)
        };
        match builder.build(&args).await.unwrap() {
            Payload::Reid {
                image0,
                image1,
                max_distance,
                ..
            } => {
                assert_eq!(image0, STANDARD.encode("frame-1"));
                assert_eq!(image1, STANDARD.encode("frame-2"));
                assert_eq!(max_distance, Some(50.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn frames_outside_segment_are_rejected() {
        let function = FunctionDescriptor::new("reid", FunctionKind::Reid);
        let task = task();
        let segment = SegmentMeta::range(7, 1, 5, 9);
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, Some(&segment), &frames);

        let args = CallRequest {
            frame0: Some(5),
            frame1: Some(10),
            boxes0: Some(vec![]),
            boxes1: Some(vec![]),
            ..CallRequest::for_job(7)
        };
        let err = validation(builder.build(&args).await.unwrap_err());
        assert!(matches!(err, ValidationError::OutOfRange { field: "frame1", .. }));
        assert_eq!(err.to_string(), "the end frame is outside the job range");

        let args = CallRequest {
            frame0: Some(4),
            ..args
        };
        let err = validation(builder.build(&args).await.unwrap_err());
        assert!(matches!(err, ValidationError::OutOfRange { field: "frame0", .. }));
    }

    #[tokio::test]
    async fn single_frame_outside_segment_is_rejected() {
        let task = task();
        let segment = SegmentMeta::range(7, 1, 5, 9);
        let frames = RecordingFrames::default();

        for kind in [FunctionKind::Detector, FunctionKind::Interactor] {
            let function = FunctionDescriptor::new("f", kind);
            let builder = InvocationBuilder::new(&function, &task, Some(&segment), &frames);

            let args = CallRequest::for_job(7).with_frame(12);
            let err = validation(builder.build(&args).await.unwrap_err());
            assert!(matches!(err, ValidationError::OutOfRange { field: "frame", .. }));
            assert_eq!(err.to_string(), "the frame is outside the job range");
        }
    }

    #[tokio::test]
    async fn overflowing_frame_is_out_of_range() {
        let function = FunctionDescriptor::new("yolo", FunctionKind::Detector);
        let mut task = task();
        task.start_frame = 5;
        task.frame_step = 2;
        let segment = SegmentMeta::range(7, 1, 5, 19);
        let frames = RecordingFrames::default();
        let builder = InvocationBuilder::new(&function, &task, Some(&segment), &frames);

        let args = CallRequest::for_job(7).with_frame((1 << 63) + 5);
        let err = validation(builder.build(&args).await.unwrap_err());
        assert!(matches!(err, ValidationError::OutOfRange { field: "frame", .. }));
    }

    #[tokio::test]
    async fn bad_quality_and_unknown_kind() {
        let task = task();
        let frames = RecordingFrames::default();

        let function = FunctionDescriptor::new("yolo", FunctionKind::Detector);
        let builder = InvocationBuilder::new(&function, &task, None, &frames);
        let mut args = CallRequest::for_task(1).with_frame(0);
        args.quality = Some("ultra".into());
        let err = validation(builder.build(&args).await.unwrap_err());
        assert!(matches!(err, ValidationError::InvalidQuality { ref quality, .. } if quality == "ultra"));

        let function = FunctionDescriptor::new("mystery", FunctionKind::Unknown);
        let builder = InvocationBuilder::new(&function, &task, None, &frames);
        let err = builder
            .build(&CallRequest::for_task(1).with_frame(0))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
