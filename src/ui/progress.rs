// Throughput smoothing and progress aggregation
//
// The aggregator only loads counters from each device's `WipeProgress`; it never
// writes them. Each device gets a `SpeedRing` that turns periodic byte counts into
// a smoothed bytes/second figure.

use crate::context::{ProgressSnapshot, WipeProgress};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// How often the aggregator samples every device
    pub poll_interval: Duration,
    /// Samples closer together than this are dropped
    pub granularity: Duration,
    /// Samples kept per device
    pub ring_capacity: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            granularity: Duration::from_secs(1),
            ring_capacity: 30,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    bytes: u64,
    elapsed: Duration,
}

/// Fixed-capacity window of (bytes, elapsed) samples with running sums
#[derive(Debug, Clone)]
pub struct SpeedRing {
    samples: VecDeque<Sample>,
    capacity: usize,
    granularity: Duration,
    bytes_total: u64,
    time_total: Duration,
    /// Time and byte count of the last accepted sample
    last: Option<(Instant, u64)>,
}

impl SpeedRing {
    pub fn new(capacity: usize, granularity: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            granularity,
            bytes_total: 0,
            time_total: Duration::ZERO,
            last: None,
        }
    }

    /// Feed the cumulative byte count observed at `now`.
    ///
    /// The first call only sets the baseline.
    pub fn record(&mut self, now: Instant, done: u64) {
        let Some((last_at, last_done)) = self.last else {
            self.last = Some((now, done));
            return;
        };

        let elapsed = now.saturating_duration_since(last_at);
        if elapsed < self.granularity {
            return;
        }

        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.bytes_total -= oldest.bytes;
                self.time_total -= oldest.elapsed;
            }
        }

        let sample = Sample {
            bytes: done.saturating_sub(last_done),
            elapsed,
        };
        self.bytes_total += sample.bytes;
        self.time_total += sample.elapsed;
        self.samples.push_back(sample);
        self.last = Some((now, done));
    }

    /// Smoothed bytes per second, never below 1
    pub fn throughput(&self) -> u64 {
        let secs = self.time_total.as_secs_f64();
        if secs <= 0.0 {
            return 1;
        }
        ((self.bytes_total as f64 / secs) as u64).max(1)
    }

    /// Time to move `remaining` bytes at the current throughput
    pub fn eta(&self, remaining: u64) -> Duration {
        Duration::from_secs(remaining / self.throughput())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One device as seen by the aggregator
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub progress: ProgressSnapshot,
    pub throughput: u64,
    pub eta: Duration,
}

impl DeviceStatus {
    pub fn is_finished(&self) -> bool {
        self.progress.result != crate::ResultCode::Pending
    }
}

/// Whole-session view: summed throughput and errors, longest ETA
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateStatus {
    pub devices: Vec<DeviceStatus>,
    pub throughput: u64,
    pub errors: u64,
    pub eta: Duration,
    pub active: usize,
}

impl AggregateStatus {
    pub fn all_finished(&self) -> bool {
        self.active == 0
    }

    /// One status line for logs
    pub fn summary_line(&self) -> String {
        format!(
            "{} active, {} of {} done @ {}/s, {} errors, ETA {}",
            self.active,
            self.devices.len() - self.active,
            self.devices.len(),
            human_bytes(self.throughput as f64),
            self.errors,
            format_duration(self.eta.as_secs())
        )
    }
}

/// Samples every device's counters into smoothed throughput and ETA
pub struct ProgressAggregator {
    devices: Vec<(String, Arc<WipeProgress>)>,
    rings: Vec<SpeedRing>,
    config: ProgressConfig,
}

impl ProgressAggregator {
    pub fn new(devices: Vec<(String, Arc<WipeProgress>)>, config: ProgressConfig) -> Self {
        let rings = devices
            .iter()
            .map(|_| SpeedRing::new(config.ring_capacity, config.granularity))
            .collect();
        Self {
            devices,
            rings,
            config,
        }
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Take one reading of every device at `now`
    pub fn sample(&mut self, now: Instant) -> AggregateStatus {
        let mut status = AggregateStatus::default();

        for ((name, progress), ring) in self.devices.iter().zip(self.rings.iter_mut()) {
            let snapshot = progress.snapshot();
            let finished = snapshot.result != crate::ResultCode::Pending;

            let (throughput, eta) = if finished {
                (0, Duration::ZERO)
            } else {
                ring.record(now, snapshot.round_done);
                let remaining = snapshot.round_size.saturating_sub(snapshot.round_done);
                (ring.throughput(), ring.eta(remaining))
            };

            status.throughput += throughput;
            status.errors += snapshot.total_errors();
            status.eta = status.eta.max(eta);
            if !finished {
                status.active += 1;
            }
            status.devices.push(DeviceStatus {
                name: name.clone(),
                progress: snapshot,
                throughput,
                eta,
            });
        }

        status
    }
}

/// Convert bytes/sec to readable string
pub fn human_bytes(bps: f64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    if bps <= 0.0 {
        return "0B".to_string();
    }
    let mut val = bps;
    let mut i = 0usize;
    while val >= 1024.0 && i + 1 < units.len() {
        val /= 1024.0;
        i += 1;
    }
    format!("{:.2}{}", val, units[i])
}

/// Format seconds to H:MM:SS or M:SS
pub fn format_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
