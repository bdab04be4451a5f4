/// Running counters for one simulation, accumulated after warmup ends.
///
/// Mirrors the shape of a plain hit/miss counter struct rather than a
/// histogram — the driver is responsible for deciding when to snapshot these
/// into an interval report.
#[derive(Debug, Clone, Default)]
pub struct SimMetrics {
    pub req_count: u64,
    pub miss_count: u64,
    pub req_bytes: u64,
    pub miss_bytes: u64,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, obj_size: u64, hit: bool) {
        self.req_count += 1;
        self.req_bytes += obj_size;
        if !hit {
            self.miss_count += 1;
            self.miss_bytes += obj_size;
        }
    }

    pub fn miss_ratio(&self) -> f64 {
        if self.req_count == 0 {
            0.0
        } else {
            self.miss_count as f64 / self.req_count as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn print_report(&self) {
        println!("\n=== Simulation Metrics ===");
        println!("Requests:     {}", self.req_count);
        println!("Misses:       {}", self.miss_count);
        println!("Miss ratio:   {:.4}", self.miss_ratio());
        println!("Request bytes: {}", self.req_bytes);
        println!("Miss bytes:    {}", self.miss_bytes);
    }
}

/// Formats a byte count as a short human-readable size, e.g. `1.0GB`,
/// matching the summary line's `%8s` cache-size field.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}
