//! Report module: per-worker output blocks, run footer and run history.

use crate::orchestrator::RunSummary;
use crate::schema::SELECT_RUNS;
use crate::store::Store;
use crate::worker::{QueryType, RunRecord};
use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Render the report exactly as it is printed.
pub fn render_report(summary: &RunSummary) -> String {
    let mut out = String::new();

    for (i, output) in summary.outputs.iter().enumerate() {
        let _ = writeln!(out, "Process {i} output:");
        for line in &output.lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out, "\n");
    }

    let _ = writeln!(out, "{}", summary.description);
    let _ = writeln!(
        out,
        "Total elapsed time: {} seconds",
        summary.elapsed.as_secs_f64()
    );

    if let Some(history) = &summary.history {
        out.push_str(&render_history(history));
    }

    out
}

/// Print the report to stdout.
pub fn print_report(summary: &RunSummary) {
    print!("{}", render_report(summary));
}

/// Aggregated durations of every stored run of one (driver, query type).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub driver: String,
    pub query_type: QueryType,
    pub durations: Vec<f64>,
    pub total_rows: usize,
}

impl HistoryStats {
    pub fn count(&self) -> usize {
        self.durations.len()
    }

    pub fn mean(&self) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        self.durations.iter().sum::<f64>() / self.durations.len() as f64
    }

    /// Percentile of the recorded durations: the sample at the linear
    /// index `pct / 100 * (n - 1)`, rounded to the nearest position.
    pub fn percentile(&self, pct: f64) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        let mut sorted = self.durations.clone();
        sorted.sort_by(f64::total_cmp);
        let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn max(&self) -> f64 {
        self.durations.iter().copied().fold(0.0, f64::max)
    }

    pub fn rows_per_sec(&self) -> f64 {
        let total: f64 = self.durations.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.total_rows as f64 / total
    }
}

/// Group run records by driver and query type.
pub fn aggregate(records: &[RunRecord]) -> Vec<HistoryStats> {
    let mut groups: BTreeMap<(String, QueryType), HistoryStats> = BTreeMap::new();
    for r in records {
        let entry = groups
            .entry((r.driver.clone(), r.query_type))
            .or_insert_with(|| HistoryStats {
                driver: r.driver.clone(),
                query_type: r.query_type,
                durations: Vec::new(),
                total_rows: 0,
            });
        entry.durations.push(r.duration);
        entry.total_rows += r.num_rows;
    }
    groups.into_values().collect()
}

/// Read the full `runs` table and aggregate it.
pub fn load_history(store: &mut dyn Store) -> Result<Vec<HistoryStats>> {
    let rs = store.execute(SELECT_RUNS, &[])?;
    let records = (0..rs.rows.len())
        .map(|i| RunRecord::from_row(&rs, i))
        .collect::<Result<Vec<_>>>()?;
    Ok(aggregate(&records))
}

fn render_history(stats: &[HistoryStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n  Run history:");
    let _ = writeln!(
        out,
        "  {:22} {:>6} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Driver", "Query", "Runs", "Mean (s)", "p50 (s)", "p95 (s)", "Max (s)", "Rows/s"
    );
    let _ = writeln!(out, "  {}", "-".repeat(100));
    for s in stats {
        let _ = writeln!(
            out,
            "  {:22} {:>6} {:>6} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.1}",
            s.driver,
            s.query_type.as_str(),
            s.count(),
            s.mean(),
            s.percentile(50.0),
            s.percentile(95.0),
            s.max(),
            s.rows_per_sec(),
        );
    }
    out
}
