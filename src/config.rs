use std::path::{Path, PathBuf};

use crate::error::{Result, SimError};

/// The on-disk shape a trace reader must parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    Csv,
    PlainText,
    Binary,
    Vscsi,
    TwitterCache,
    TwitterCacheNs,
    OracleGeneral,
    OracleSysTwrNs,
    Valpin,
    Lcs,
}

impl TraceFormat {
    /// Suffix-based auto-detection, mirroring the original reader's
    /// `detect_trace_type`: `.oracleGeneral`, `.lcs`, `.vscsi`, `.twr.`,
    /// `.twrNS.`, and a `oracleSysTwrNS` substring each select one format.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let name = name.strip_suffix(".snappy").unwrap_or(name);
        if name.contains("oracleSysTwrNS") {
            return Some(Self::OracleSysTwrNs);
        }
        if name.ends_with(".oracleGeneral") {
            return Some(Self::OracleGeneral);
        }
        if name.ends_with(".lcs") {
            return Some(Self::Lcs);
        }
        if name.ends_with(".vscsi") {
            return Some(Self::Vscsi);
        }
        if name.contains(".twrNS.") {
            return Some(Self::TwitterCacheNs);
        }
        if name.contains(".twr.") {
            return Some(Self::TwitterCache);
        }
        if name.ends_with(".valpin") {
            return Some(Self::Valpin);
        }
        if name.ends_with(".csv") {
            return Some(Self::Csv);
        }
        None
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "csv" => Ok(Self::Csv),
            "txt" | "plain" | "plaintext" => Ok(Self::PlainText),
            "binary" => Ok(Self::Binary),
            "vscsi" => Ok(Self::Vscsi),
            "twitter" | "twr" => Ok(Self::TwitterCache),
            "twitter-ns" | "twrns" | "twr-ns" => Ok(Self::TwitterCacheNs),
            "oracle-general" | "oraclegeneral" => Ok(Self::OracleGeneral),
            "oracle-sys-twrns" | "oraclesystwrns" => Ok(Self::OracleSysTwrNs),
            "valpin" => Ok(Self::Valpin),
            "lcs" => Ok(Self::Lcs),
            other => Err(SimError::ConfigInvalid(format!(
                "unknown trace format '{other}'"
            ))),
        }
    }

    pub fn is_binary(self) -> bool {
        !matches!(self, Self::Csv | Self::PlainText)
    }
}

/// Column/behavior configuration for a trace reader, parsed from the
/// `key=value,key=value` CLI grammar documented for reader params.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub time_col: Option<usize>,
    pub obj_id_col: Option<usize>,
    pub obj_size_col: Option<usize>,
    pub cnt_col: Option<usize>,
    pub op_col: Option<usize>,
    pub tenant_col: Option<usize>,
    pub feature_cols: Vec<usize>,
    pub ttl_col: Option<usize>,
    pub obj_id_is_num: bool,
    pub block_size: Option<u64>,
    pub has_header: bool,
    pub delimiter: u8,
    pub binary_format: Option<String>,
    pub ignore_obj_size: bool,
    pub ignore_size_zero_requests: bool,
    pub cap_at_n_req: Option<u64>,
    pub trace_start_offset: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            time_col: None,
            obj_id_col: Some(1),
            obj_size_col: None,
            cnt_col: None,
            op_col: None,
            tenant_col: None,
            feature_cols: Vec::new(),
            ttl_col: None,
            obj_id_is_num: true,
            block_size: None,
            has_header: false,
            delimiter: b',',
            binary_format: None,
            ignore_obj_size: false,
            ignore_size_zero_requests: false,
            cap_at_n_req: None,
            trace_start_offset: 0,
        }
    }
}

/// Parses the reader-params grammar: `key=value(,key=value)*`, with `_` and
/// `-` interchangeable in keys. Any key outside the recognized set is a fatal
/// `ConfigInvalid`, matching the original `parse_reader_params`'s strictness.
pub fn parse_reader_params(spec: &str) -> Result<ReaderConfig> {
    let mut cfg = ReaderConfig::default();
    if spec.trim().is_empty() {
        return Ok(cfg);
    }
    for pair in spec.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = pair.split_once('=').ok_or_else(|| {
            SimError::ConfigInvalid(format!("reader param '{pair}' is missing '='"))
        })?;
        let key = raw_key.trim().replace('_', "-");
        let value = raw_value.trim();
        match key.as_str() {
            "time-col" => cfg.time_col = parse_col(value)?,
            "obj-id-col" => cfg.obj_id_col = parse_col(value)?,
            "obj-size-col" | "size-col" => cfg.obj_size_col = parse_col(value)?,
            "cnt-col" => cfg.cnt_col = parse_col(value)?,
            "op-col" => cfg.op_col = parse_col(value)?,
            "tenant-col" => cfg.tenant_col = parse_col(value)?,
            "feature-cols" => {
                cfg.feature_cols = value
                    .split('|')
                    .filter(|s| !s.is_empty())
                    .map(parse_col)
                    .collect::<Result<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect();
            }
            "ttl-col" => cfg.ttl_col = parse_col(value)?,
            "obj-id-is-num" => cfg.obj_id_is_num = parse_bool(value)?,
            "block-size" => {
                cfg.block_size = Some(value.parse::<u64>().map_err(|_| {
                    SimError::ConfigInvalid(format!("invalid block-size '{value}'"))
                })?)
            }
            "header" | "has-header" => cfg.has_header = parse_bool(value)?,
            "format" => cfg.binary_format = Some(value.to_string()),
            "delimiter" => cfg.delimiter = parse_delimiter(value)?,
            other => {
                return Err(SimError::ConfigInvalid(format!(
                    "unrecognized reader param key '{other}'"
                )))
            }
        }
    }
    Ok(cfg)
}

/// Parses a 1-based column index. `0` means "disabled" per §6's grammar
/// table, so it parses to `None` rather than the nonsensical 0th column.
fn parse_col(value: &str) -> Result<Option<usize>> {
    let col = value
        .parse::<usize>()
        .map_err(|_| SimError::ConfigInvalid(format!("invalid column index '{value}'")))?;
    Ok((col != 0).then_some(col))
}

/// `true/1/yes/y` vs `false/0/no/n`, case-insensitive — matches `is_true`/
/// `is_false` in the original CLI reader utilities.
fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(SimError::ConfigInvalid(format!(
            "invalid boolean value '{other}'"
        ))),
    }
}

/// Empty or a single escaped char maps to comma; `\t` maps to tab; `\,` maps
/// to comma; anything else that doesn't decode to exactly one character is
/// an error.
fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "" => Ok(b','),
        "\\t" => Ok(b'\t'),
        "\\," => Ok(b','),
        other if other.len() == 1 => Ok(other.as_bytes()[0]),
        other if other.starts_with('\\') && other.len() == 2 => Ok(b','),
        other => Err(SimError::ConfigInvalid(format!(
            "invalid delimiter '{other}'"
        ))),
    }
}

/// Eviction policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Lru,
    FrequencyLfu,
    Scaffolded(ScaffoldedDecision),
}

/// The default decision function a scaffolded policy uses when no externally
/// supplied decision closure is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldedDecision {
    Lru,
    Fifo,
    Lfu,
}

/// Admission gate selection (declarative only — see crate::admission).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionKind {
    None,
    BloomFilter,
    Probabilistic,
    Size,
    SizeProbabilistic,
    AdaptSize,
}

impl AdmissionKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "bloomfilter" | "bloom-filter" => Ok(Self::BloomFilter),
            "prob" | "probabilistic" => Ok(Self::Probabilistic),
            "size" => Ok(Self::Size),
            "sizeprob" | "size-prob" | "sizeprobabilistic" => Ok(Self::SizeProbabilistic),
            "adaptsize" | "adapt-size" => Ok(Self::AdaptSize),
            other => Err(SimError::ConfigInvalid(format!(
                "unknown admission algorithm '{other}'"
            ))),
        }
    }
}

/// Top-level configuration for one simulation run, in the spirit of
/// `sombra::db::Config`'s named presets over a flat list of positional
/// constructor arguments.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub trace_path: PathBuf,
    pub trace_format: TraceFormat,
    pub reader: ReaderConfig,
    pub cache_capacity_bytes: u64,
    pub policy: PolicyKind,
    pub admission: AdmissionKind,
    pub warmup_seconds: u64,
    pub report_interval_seconds: u64,
    pub sampler_ratio: Option<f64>,
    pub output_path: Option<PathBuf>,
    pub history_capacity: usize,
    pub delta_capacity: usize,
    pub candidate_window: usize,
}

impl SimulatorConfig {
    pub fn new(trace_path: impl Into<PathBuf>, cache_capacity_bytes: u64) -> Self {
        let trace_path = trace_path.into();
        let trace_format = TraceFormat::detect(&trace_path).unwrap_or(TraceFormat::Csv);
        Self {
            trace_path,
            trace_format,
            reader: ReaderConfig::default(),
            cache_capacity_bytes,
            policy: PolicyKind::Lru,
            admission: AdmissionKind::None,
            warmup_seconds: 0,
            report_interval_seconds: 3600,
            sampler_ratio: None,
            output_path: None,
            history_capacity: 100,
            delta_capacity: 20,
            candidate_window: 100,
        }
    }

    /// Short warmup, frequent interval reports — convenient for interactive
    /// exploration of a small trace.
    pub fn quick() -> Self {
        let mut cfg = Self::new("trace.csv", 64 * 1024 * 1024);
        cfg.warmup_seconds = 0;
        cfg.report_interval_seconds = 60;
        cfg
    }

    /// Long warmup, coarse reporting — suited to multi-day production
    /// traces replayed end to end.
    pub fn benchmark() -> Self {
        let mut cfg = Self::new("trace.oracleGeneral", 1024 * 1024 * 1024);
        cfg.trace_format = TraceFormat::OracleGeneral;
        cfg.warmup_seconds = 86_400;
        cfg.report_interval_seconds = 3_600;
        cfg
    }
}
