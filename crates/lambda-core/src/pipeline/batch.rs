use tracing::debug;

use lambda_model::{CommitMode, LabeledData, LabeledShape, LabeledTag, Scope};

use crate::{error::CoreResult, pipeline::RunContext};

/// Accumulates results of a run and commits them every `flush_every` frames.
pub(crate) struct ResultsBatch {
    scope: Scope,
    data: LabeledData,
    flush_every: usize,
    frames: usize,
    commits: usize,
}

impl ResultsBatch {
    pub(crate) fn new(scope: Scope, flush_every: usize) -> Self {
        Self {
            scope,
            data: LabeledData::default(),
            flush_every: flush_every.max(1),
            frames: 0,
            commits: 0,
        }
    }

    pub(crate) fn push_shape(&mut self, shape: LabeledShape) {
        self.data.shapes.push(shape);
    }

    pub(crate) fn push_tag(&mut self, tag: LabeledTag) {
        self.data.tags.push(tag);
    }

    /// Count one processed frame and flush on the cadence boundary.
    pub(crate) async fn frame_done(&mut self, ctx: &RunContext) -> CoreResult<()> {
        self.frames += 1;
        if self.frames % self.flush_every == 0 {
            self.flush(ctx).await?;
        }
        Ok(())
    }

    /// Commit whatever is accumulated; an empty batch is not sent.
    pub(crate) async fn flush(&mut self, ctx: &RunContext) -> CoreResult<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        let data = std::mem::take(&mut self.data);
        let items = data.len();

        ctx.store.commit(self.scope, data, CommitMode::Create).await?;
        ctx.metrics.record_commit(ctx.function.kind.kind(), items);
        self.commits += 1;
        debug!(scope = %self.scope, batch = self.commits, items, frames = self.frames, "results committed");
        Ok(())
    }

    pub(crate) fn commits(&self) -> usize {
        self.commits
    }
}
