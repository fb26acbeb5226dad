// Multi-device wipe session
//
// Each device runs its orchestrator on its own blocking worker. A separate
// aggregator task polls every device's counters and publishes an
// `AggregateStatus` on a watch channel until all workers have returned.

use crate::context::WipeContext;
use crate::crypto::EntropySource;
use crate::error::WipeResult;
use crate::io::FileDevice;
use crate::logging::{EventLog, LogLevel};
use crate::report::{DeviceReport, SessionReport};
use crate::ui::progress::{AggregateStatus, ProgressAggregator, ProgressConfig};
use crate::wipe_orchestrator::run_method;
use crate::{CancelToken, WipeOptions};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};
use tokio::task;

pub struct WipeSession {
    /// Selected devices, indexed by slot
    contexts: Vec<WipeContext>,
    options: WipeOptions,
    progress_config: ProgressConfig,
    cancel: CancelToken,
    log: EventLog,
    status_tx: watch::Sender<AggregateStatus>,
}

impl WipeSession {
    pub fn new(options: WipeOptions, cancel: CancelToken, log: EventLog) -> WipeResult<Self> {
        let options = options.validate()?;
        let (status_tx, _) = watch::channel(AggregateStatus::default());
        Ok(Self {
            contexts: Vec::new(),
            options,
            progress_config: ProgressConfig::default(),
            cancel,
            log,
            status_tx,
        })
    }

    pub fn with_progress_config(mut self, config: ProgressConfig) -> Self {
        self.progress_config = config;
        self
    }

    pub fn options(&self) -> &WipeOptions {
        &self.options
    }

    /// Add a prepared device and return its slot
    pub fn add_device(&mut self, ctx: WipeContext) -> usize {
        let ctx = ctx.with_cancel(self.cancel.clone()).with_log(self.log.clone());
        self.contexts.push(ctx);
        self.contexts.len() - 1
    }

    /// Open a device file, size it and add it
    pub fn open_device(
        &mut self,
        path: impl AsRef<Path>,
        entropy: Arc<dyn EntropySource>,
    ) -> WipeResult<usize> {
        let device = FileDevice::open(path)?;
        let size = device.size();
        let block_size = self.options.block_size.unwrap_or_else(|| device.block_size());
        let ctx = WipeContext::new(Box::new(device), size, block_size, entropy, self.options.prng)?;
        Ok(self.add_device(ctx))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Receive aggregate progress while the session runs
    pub fn subscribe(&self) -> watch::Receiver<AggregateStatus> {
        self.status_tx.subscribe()
    }

    /// Wipe every device concurrently and wait for all of them
    pub async fn run(self) -> SessionReport {
        let started_at: DateTime<Utc> = Utc::now();
        let Self {
            contexts,
            options,
            progress_config,
            log,
            status_tx,
            ..
        } = self;

        log.log(
            LogLevel::Notice,
            format!("Starting session: {} devices, method {}", contexts.len(), options.method),
        );

        let names: Vec<String> = contexts.iter().map(|c| c.name().to_string()).collect();
        let sources = contexts
            .iter()
            .map(|c| (c.name().to_string(), c.progress()))
            .collect();
        let aggregator = ProgressAggregator::new(sources, progress_config);

        let (stop_tx, stop_rx) = oneshot::channel();
        let aggregator_task = tokio::spawn(run_aggregator(aggregator, status_tx, stop_rx));

        let workers = contexts.into_iter().map(|mut ctx| {
            let options = options.clone();
            task::spawn_blocking(move || {
                let outcome = run_method(&mut ctx, &options);
                DeviceReport::from_outcome(&outcome, &options)
            })
        });
        let joined = join_all(workers).await;

        let _ = stop_tx.send(());
        if let Err(e) = aggregator_task.await {
            tracing::warn!("Progress aggregator ended abnormally: {}", e);
        }

        let devices: Vec<DeviceReport> = joined
            .into_iter()
            .zip(names.iter())
            .map(|(result, name)| match result {
                Ok(report) => report,
                Err(e) => {
                    log.device(LogLevel::Fatal, name, format!("Worker failed: {}", e));
                    DeviceReport::worker_failed(name, &options, format!("worker failed: {}", e))
                }
            })
            .collect();

        for report in &devices {
            let level = if report.aborted() {
                LogLevel::Error
            } else {
                LogLevel::Notice
            };
            log.device(level, &report.device, report.summary_line());
        }

        SessionReport {
            started_at,
            finished_at: Utc::now(),
            devices,
            log: log.entries(),
        }
    }
}

async fn run_aggregator(
    mut aggregator: ProgressAggregator,
    status_tx: watch::Sender<AggregateStatus>,
    mut stop: oneshot::Receiver<()>,
) {
    let period = aggregator.config().poll_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                status_tx.send_replace(aggregator.sample(Instant::now()));
            }
            _ = &mut stop => break,
        }
    }
    status_tx.send_replace(aggregator.sample(Instant::now()));
}
