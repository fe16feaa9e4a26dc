use std::collections::BTreeMap;

use tracing::warn;

use lambda_model::{FrameIndex, LabeledShape, LabeledTrack, Source, TrackedShape};

/// Boxes of a scope with path identities kept in a side table.
///
/// Identities never touch the shapes themselves, so nothing transient can
/// leak into the persisted tracks.
pub(super) struct PathTable {
    boxes: Vec<LabeledShape>,
    by_frame: BTreeMap<FrameIndex, Vec<usize>>,
    path_of: Vec<Option<usize>>,
    paths: Vec<Vec<usize>>,
}

impl PathTable {
    /// Bucket boxes by frame; `frames` lists every frame of the scope.
    pub(super) fn new(frames: &[FrameIndex], boxes: Vec<LabeledShape>) -> Self {
        let mut by_frame: BTreeMap<FrameIndex, Vec<usize>> =
            frames.iter().map(|f| (*f, Vec::new())).collect();
        for (i, b) in boxes.iter().enumerate() {
            if let Some(bucket) = by_frame.get_mut(&b.frame) {
                bucket.push(i);
            }
        }
        let path_of = vec![None; boxes.len()];
        Self {
            boxes,
            by_frame,
            path_of,
            paths: Vec::new(),
        }
    }

    /// Box indices on a frame.
    pub(super) fn on_frame(&self, frame: FrameIndex) -> &[usize] {
        self.by_frame.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(super) fn shapes(&self, indices: &[usize]) -> Vec<&LabeledShape> {
        indices.iter().map(|i| &self.boxes[*i]).collect()
    }

    /// Start a singleton path for every box on `frame` that has none.
    pub(super) fn open_paths(&mut self, frame: FrameIndex) {
        let Some(bucket) = self.by_frame.get(&frame) else {
            return;
        };
        for &b in bucket {
            if self.path_of[b].is_none() {
                self.path_of[b] = Some(self.paths.len());
                self.paths.push(vec![b]);
            }
        }
    }

    /// Apply a matcher result between two frames.
    ///
    /// `matching[i]` is the index in `frame1` matched by box `i` of `frame0`,
    /// or negative for no match. Out-of-range indices and second claims on
    /// the same `frame1` box are ignored.
    pub(super) fn link(&mut self, frame0: FrameIndex, frame1: FrameIndex, matching: &[i64]) {
        let boxes0 = self.on_frame(frame0).to_vec();
        let boxes1 = self.on_frame(frame1).to_vec();
        let mut claimed = vec![false; boxes1.len()];

        for (idx0, &idx1) in matching.iter().enumerate() {
            if idx1 < 0 {
                continue;
            }
            let Some(&b0) = boxes0.get(idx0) else {
                warn!(frame0, idx0, "matcher returned more entries than boxes");
                break;
            };
            let Some(&b1) = usize::try_from(idx1).ok().and_then(|i| boxes1.get(i)) else {
                warn!(frame1, idx1, "matcher index is out of range");
                continue;
            };
            let slot = idx1 as usize;
            if claimed[slot] {
                warn!(frame1, idx1, "box matched twice; keeping the first match");
                continue;
            }
            let Some(path) = self.path_of[b0] else {
                continue;
            };
            claimed[slot] = true;
            self.path_of[b1] = Some(path);
            self.paths[path].push(b1);
        }
    }

    pub(super) fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Turn paths into tracks, closing each one that ends before `last_frame`.
    ///
    /// Returns the tracks and the boxes that belong to none of them.
    pub(super) fn into_tracks(self, last_frame: FrameIndex) -> (Vec<LabeledTrack>, Vec<LabeledShape>) {
        let mut slots: Vec<Option<LabeledShape>> = self.boxes.into_iter().map(Some).collect();
        let mut tracks = Vec::with_capacity(self.paths.len());

        for path in &self.paths {
            let mut shapes: Vec<LabeledShape> =
                path.iter().filter_map(|i| slots[*i].take()).collect();
            if shapes.is_empty() {
                continue;
            }
            let first = &shapes[0];
            let mut track = LabeledTrack {
                id: None,
                frame: first.frame,
                label_id: first.label_id,
                group: first.group,
                attributes: first.attributes.clone(),
                source: Source::Auto,
                shapes: Vec::with_capacity(shapes.len() + 1),
            };
            track.shapes.extend(shapes.drain(..).map(TrackedShape::from));

            let terminal = track
                .shapes
                .last()
                .filter(|last| last.frame != last_frame)
                .map(|last| TrackedShape {
                    outside: true,
                    frame: last.frame + 1,
                    ..last.clone()
                });
            track.shapes.extend(terminal);
            tracks.push(track);
        }

        let rest = slots.into_iter().flatten().collect();
        (tracks, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_model::ShapeType;

    fn rect(frame: FrameIndex) -> LabeledShape {
        LabeledShape::auto(frame, 1, ShapeType::Rectangle, vec![0.0, 0.0, 1.0, 1.0])
    }

    #[test]
    fn duplicate_claims_keep_first_match() {
        let mut table = PathTable::new(&[0, 1], vec![rect(0), rect(0), rect(1)]);
        table.open_paths(0);
        table.link(0, 1, &[0, 0]);
        table.open_paths(1);

        let (tracks, rest) = table.into_tracks(1);
        assert!(rest.is_empty());
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].shapes.len(), 2);
        assert_eq!(tracks[1].shapes.len(), 2);
        assert!(tracks[1].shapes[1].outside);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut table = PathTable::new(&[0, 1], vec![rect(0), rect(1)]);
        table.open_paths(0);
        table.link(0, 1, &[5, 0, 0]);
        table.open_paths(1);

        let (tracks, _) = table.into_tracks(1);
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn boxes_outside_the_frame_set_are_left_over() {
        let table = PathTable::new(&[0], vec![rect(0), rect(9)]);
        let (tracks, rest) = {
            let mut table = table;
            table.open_paths(0);
            table.into_tracks(0)
        };
        assert_eq!(tracks.len(), 1);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].frame, 9);
    }
}
