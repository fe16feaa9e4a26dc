use std::{sync::Arc, time::Duration};

use serde_json::json;
use tracing::{debug, info, warn};

use lambda_core::{
    memory::{MemoryCatalog, MemoryFrames, MemoryStore},
    metrics::MetricsHandle,
    ports::{AnnotationStore, FrameSource, FunctionRegistry, TaskCatalog},
    service::LambdaService,
};
use lambda_gateway::NuclioGateway;
use lambda_model::JobView;
use lambda_observe::{JobEventLogger, init_local_offset, init_logger};
use lambda_prometheus::PrometheusMetrics;

mod config;
mod fixture;

use config::AgentConfig;
use fixture::{DirFrames, TaskFixture};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    // must run while the process is still single-threaded
    init_local_offset();

    let cfg = AgentConfig::load()?;
    init_logger(&cfg.logger)?;
    info!("logger initialized");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(cfg))
}

async fn run(cfg: AgentConfig) -> anyhow::Result<()> {
    let metrics = PrometheusMetrics::new()?;
    let registry: Arc<dyn FunctionRegistry> = Arc::new(NuclioGateway::new(cfg.gateway.clone())?);
    info!(dashboard = %cfg.gateway.base_url(), invoke = %cfg.gateway.invoke, "gateway ready");

    let Some(path) = cfg.task_file.clone() else {
        return describe(&cfg, registry, metrics).await;
    };

    let (fixture, frames_dir) = TaskFixture::load(&path).await?;
    let request = fixture.request(cfg.function.as_deref())?;
    let scope = request.scope();
    let store = fixture.store();

    let catalog: Arc<dyn TaskCatalog> = Arc::new(fixture.catalog());
    let frames: Arc<dyn FrameSource> = Arc::new(DirFrames::new(frames_dir));
    let annotations: Arc<dyn AnnotationStore> = store.clone();
    let service = service(&cfg, registry, catalog, frames, annotations, &metrics);

    let job = service.create_job(request).await?;
    info!(request = %job.id, task = job.function.task, function = %job.function.id, "job created");

    let Some(done) = wait(&service, &job).await? else {
        warn!(request = %job.id, "interrupted, job canceled");
        return Ok(());
    };

    let result = json!({
        "job": done,
        "annotations": store.snapshot(scope),
    });
    emit(&cfg, &result).await?;

    debug!("metrics snapshot:\n{}", metrics.render()?);
    service.queue().shutdown();
    Ok(())
}

/// No task file: print the function list, or one function when configured.
async fn describe(
    cfg: &AgentConfig,
    registry: Arc<dyn FunctionRegistry>,
    metrics: PrometheusMetrics,
) -> anyhow::Result<()> {
    let service = service(
        cfg,
        registry,
        Arc::new(MemoryCatalog::new()),
        Arc::new(MemoryFrames::default()),
        Arc::new(MemoryStore::new()),
        &metrics,
    );

    let value = match &cfg.function {
        Some(id) => serde_json::to_value(service.get_function(id).await?)?,
        None => {
            let functions = service.list_functions().await?;
            info!(count = functions.len(), "functions listed");
            serde_json::to_value(functions)?
        }
    };
    emit(cfg, &value).await
}

fn service(
    cfg: &AgentConfig,
    registry: Arc<dyn FunctionRegistry>,
    catalog: Arc<dyn TaskCatalog>,
    frames: Arc<dyn FrameSource>,
    store: Arc<dyn AnnotationStore>,
    metrics: &PrometheusMetrics,
) -> LambdaService {
    let handle: MetricsHandle = Arc::new(metrics.clone());
    LambdaService::builder(registry, catalog, frames, store)
        .metrics(handle)
        .queue(cfg.queue.clone())
        .pipeline(cfg.pipeline.clone())
        .subscriber(Arc::new(JobEventLogger))
        .build()
}

/// Poll until the job ends; `None` when interrupted by ctrl-c.
async fn wait(service: &LambdaService, job: &JobView) -> anyhow::Result<Option<JobView>> {
    let id = job.id.to_string();
    let mut tick = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let view = service.get_job(&id)?;
                if view.status.is_terminal() {
                    return Ok(Some(view));
                }
                debug!(request = %id, progress = view.progress, "job running");
            }
            _ = tokio::signal::ctrl_c() => {
                service.cancel_job(&id)?;
                return Ok(None);
            }
        }
    }
}

async fn emit(cfg: &AgentConfig, value: &serde_json::Value) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match &cfg.output {
        Some(path) => {
            tokio::fs::write(path, text).await?;
            info!(path = %path.display(), "result written");
        }
        None => println!("{text}"),
    }
    Ok(())
}
