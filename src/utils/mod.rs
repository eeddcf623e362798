use std::time::{Duration, Instant};

/// Wall-clock span of one gathering run. Reporting is left to the caller so
/// the summary line carries the duration exactly once.
pub struct RunClock {
    started: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Consume the clock and return how long the run took.
    pub fn stop(self) -> Duration {
        self.started.elapsed()
    }
}

/// Format a row count with thousands separators.
pub fn fmt_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
