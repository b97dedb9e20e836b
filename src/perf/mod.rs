//! Telemetry table engine
//!
//! Holds one immutable snapshot of per-service response-time aggregates and
//! derives a view from it: case-insensitive substring filter on the service
//! name, then a 3-key sortable ordering. A refresh replaces the snapshot
//! wholesale; readers see either the old set or the new one, never a mix.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

/// Response-time aggregate for one service over the collection window.
///
/// Timing fields are `None` when the window holds no observations for the
/// service; that is distinct from a measured zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePerformance {
    pub service_name: String,
    pub avg_time: Option<f64>,
    pub min_time: Option<f64>,
    pub max_time: Option<f64>,
    pub count: Option<u64>,
}

/// Sortable columns of the response-time table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    AvgTime,
    MaxTime,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Current sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::AvgTime,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Selecting the active key flips direction; selecting a new key
    /// resets to descending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.key = key;
            self.direction = SortDirection::Desc;
        }
    }
}

/// Threshold band for the average response time. Boundaries are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Good,
    Warning,
    Critical,
    NoData,
}

impl Band {
    pub fn label(self) -> &'static str {
        match self {
            Band::Good => "good",
            Band::Warning => "warning",
            Band::Critical => "critical",
            Band::NoData => "no data",
        }
    }
}

/// Band for an average time in milliseconds.
pub fn band(avg_time: Option<f64>) -> Band {
    match avg_time {
        None => Band::NoData,
        Some(avg) if avg < 100.0 => Band::Good,
        Some(avg) if avg < 500.0 => Band::Warning,
        Some(_) => Band::Critical,
    }
}

/// Why the derived view is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The snapshot itself has no rows.
    NoData,
    /// Rows exist, but none match the current filter.
    NoMatch,
}

/// Summary figures over the whole snapshot (ignoring the filter).
#[derive(Debug, Clone, PartialEq)]
pub struct PerfTotals {
    pub services: usize,
    pub overall_avg: Option<f64>,
    pub total_count: u64,
}

/// Snapshot holder plus the derived filter/sort view.
#[derive(Debug, Default)]
pub struct PerfTable {
    snapshot: Vec<ServicePerformance>,
    filter: String,
    sort: SortSpec,
}

impl PerfTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot atomically. Filter and sort are preserved.
    pub fn replace_snapshot(&mut self, snapshot: Vec<ServicePerformance>) {
        self.snapshot = snapshot;
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
    }

    /// Filter first, then sort. `None` timings order as 0 but still render
    /// as "no data". Stable sort keeps backend order among ties.
    pub fn view(&self) -> Vec<&ServicePerformance> {
        let needle = self.filter.to_lowercase();
        let mut rows: Vec<&ServicePerformance> = self
            .snapshot
            .iter()
            .filter(|row| needle.is_empty() || row.service_name.to_lowercase().contains(&needle))
            .collect();

        let key = self.sort.key;
        let direction = self.sort.direction;
        rows.sort_by(|a, b| {
            let av = sort_value(a, key);
            let bv = sort_value(b, key);
            let ordering = av.total_cmp(&bv);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }

    /// Reason the current view is empty, if it is.
    pub fn empty_reason(&self) -> Option<EmptyReason> {
        if self.snapshot.is_empty() {
            Some(EmptyReason::NoData)
        } else if self.view().is_empty() {
            Some(EmptyReason::NoMatch)
        } else {
            None
        }
    }

    /// Summary cards over the full snapshot.
    pub fn totals(&self) -> PerfTotals {
        let services = self.snapshot.len();
        let overall_avg = if services == 0 {
            None
        } else {
            let sum: f64 = self
                .snapshot
                .iter()
                .map(|row| row.avg_time.unwrap_or(0.0))
                .sum();
            Some(sum / services as f64)
        };
        let total_count = self
            .snapshot
            .iter()
            .map(|row| row.count.unwrap_or(0))
            .sum();
        PerfTotals {
            services,
            overall_avg,
            total_count,
        }
    }
}

fn sort_value(row: &ServicePerformance, key: SortKey) -> f64 {
    match key {
        SortKey::AvgTime => row.avg_time.unwrap_or(0.0),
        SortKey::MaxTime => row.max_time.unwrap_or(0.0),
        SortKey::Count => row.count.map(|c| c as f64).unwrap_or(0.0),
    }
}

/// Render a millisecond duration the way operators expect: sub-millisecond
/// values in microseconds, sub-second in milliseconds, the rest in seconds.
/// `None` renders as "no data", never as a zero.
pub fn format_duration(ms: Option<f64>) -> String {
    match ms {
        None => "no data".to_string(),
        Some(ms) if ms < 1.0 => format!("{:.0}\u{b5}s", ms * 1000.0),
        Some(ms) if ms < 1000.0 => format!("{:.2}ms", ms),
        Some(ms) => format!("{:.2}s", ms / 1000.0),
    }
}
