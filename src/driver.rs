use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::admission;
use crate::cache::Cache;
use crate::config::{PolicyKind, SimulatorConfig};
use crate::error::{Result, SimError};
use crate::metrics::{human_size, SimMetrics};
use crate::policy::{EvictionPolicy, FrequencyLfuPolicy, LruPolicy, ScaffoldedPolicy};
use crate::reader::{self, Reader};

/// Ties reader, cache, and reporting together: warmup rebasing, per-request
/// counting, interval reports at wall-clock-independent trace-time
/// boundaries, and a final summary line.
pub struct SimulationDriver {
    config: SimulatorConfig,
    reader: Reader,
    cache: Cache,
    metrics: SimMetrics,
}

/// Outcome of a completed run, returned for callers (tests, the CLI) that
/// want the numbers without re-parsing the printed report lines.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub req_count: u64,
    pub miss_count: u64,
    pub miss_ratio: f64,
    pub throughput_mqps: f64,
}

impl SimulationDriver {
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        let reader = reader::open(&config)?;
        let rng = seed_rng();
        let policy = build_policy(&config);
        let admission = admission::build(config.admission, config.cache_capacity_bytes, rng);
        let cache = Cache::new(config.cache_capacity_bytes, policy, admission);
        Ok(Self {
            config,
            reader,
            cache,
            metrics: SimMetrics::new(),
        })
    }

    pub fn run(mut self) -> Result<RunSummary> {
        info!(trace = %self.config.trace_path.display(), "opening trace");

        let first = match self.reader.read_one() {
            Ok(req) => req,
            Err(SimError::EndOfStream) => {
                return Ok(RunSummary {
                    req_count: 0,
                    miss_count: 0,
                    miss_ratio: 0.0,
                    throughput_mqps: 0.0,
                })
            }
            Err(e) => return Err(e),
        };
        let start_ts = first.clock_time;

        let mut warmed_up = false;
        let mut start_time: Option<Instant> = None;
        let mut next_report_hour: f64 = 0.0;
        let interval_hours = (self.config.report_interval_seconds.max(1) as f64) / 3600.0;
        let mut interval_metrics = SimMetrics::new();

        let mut pending = Some(first);
        loop {
            let mut req = match pending.take() {
                Some(req) => req,
                None => match self.reader.read_one() {
                    Ok(req) => req,
                    Err(SimError::EndOfStream) => break,
                    Err(e) => return Err(e),
                },
            };
            req.clock_time = req.clock_time.saturating_sub(start_ts);
            let elapsed_hours = req.clock_time as f64 / 3600.0;

            if (req.clock_time as u64) <= self.config.warmup_seconds {
                self.cache.get(&req)?;
                continue;
            }
            if !warmed_up {
                warmed_up = true;
                start_time = Some(Instant::now());
                debug!("warmup complete");
            }

            let hit = self.cache.get(&req)?;
            self.metrics.record(req.obj_size as u64, hit);
            interval_metrics.record(req.obj_size as u64, hit);

            if elapsed_hours >= next_report_hour + interval_hours {
                self.emit_interval_report(elapsed_hours, &interval_metrics);
                interval_metrics.reset();
                next_report_hour = elapsed_hours;
            }
        }

        let elapsed = start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
            .max(f64::EPSILON);
        let throughput_mqps = (self.metrics.req_count as f64 / elapsed) / 1_000_000.0;

        self.emit_summary(throughput_mqps)?;

        Ok(RunSummary {
            req_count: self.metrics.req_count,
            miss_count: self.metrics.miss_count,
            miss_ratio: self.metrics.miss_ratio(),
            throughput_mqps,
        })
    }

    fn emit_interval_report(&self, hours: f64, interval: &SimMetrics) {
        let line = format!(
            "{} {} {:.2} hour: {} requests, miss ratio {:.4}, interval miss ratio {:.4}",
            basename(&self.config.trace_path),
            self.cache.cache_name(),
            hours,
            self.metrics.req_count,
            self.metrics.miss_ratio(),
            interval.miss_ratio(),
        );
        println!("{line}");
        info!(%line, "interval report");
    }

    fn emit_summary(&self, throughput_mqps: f64) -> Result<()> {
        let line = format!(
            "{} {} cache size {}, {:16} req, miss ratio {:.4}, throughput {:.2} MQPS",
            self.config.trace_path.display(),
            self.cache.cache_name(),
            human_size(self.config.cache_capacity_bytes),
            self.metrics.req_count,
            self.metrics.miss_ratio(),
            throughput_mqps,
        );
        println!("{line}");
        info!(%line, "run complete");

        if let Some(output_path) = &self.config.output_path {
            append_line(output_path, &line)?;
        }
        Ok(())
    }
}

fn build_policy(config: &SimulatorConfig) -> Box<dyn EvictionPolicy> {
    match config.policy {
        PolicyKind::Lru => Box::new(LruPolicy::new()),
        PolicyKind::FrequencyLfu => Box::new(FrequencyLfuPolicy::new()),
        PolicyKind::Scaffolded(default) => Box::new(ScaffoldedPolicy::with_default_decision(
            default,
            config.candidate_window,
            config.history_capacity,
            config.delta_capacity,
        )),
    }
}

fn seed_rng() -> ChaCha8Rng {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    ChaCha8Rng::seed_from_u64(seed)
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(SimError::from)?;
        }
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(SimError::from)?;
    writeln!(file, "{line}").map_err(SimError::from)?;
    Ok(())
}
