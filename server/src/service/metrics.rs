//! Process-local request and update counters in the Prometheus text format.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::update::UpdateSummary;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RequestKey {
    method: String,
    path: String,
    status: u16,
}

#[derive(Debug, Default)]
pub struct Metrics {
    requests: Mutex<BTreeMap<RequestKey, u64>>,
    updates: AtomicU64,
    games_stored: AtomicU64,
    players_stored: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished request. `path` is the route template, so
    /// `/update/:count` is one series regardless of the count.
    pub fn record_request(&self, method: &str, path: &str, status: u16) {
        let key = RequestKey {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        *requests.entry(key).or_default() += 1;
    }

    pub fn record_update(&self, summary: &UpdateSummary) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        self.games_stored
            .fetch_add(summary.games as u64, Ordering::Relaxed);
        self.players_stored
            .fetch_add(summary.players as u64, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# HELP nhltop_http_requests_total Total number of HTTP requests.\n");
        out.push_str("# TYPE nhltop_http_requests_total counter\n");
        {
            let requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            for (key, count) in requests.iter() {
                let _ = writeln!(
                    out,
                    "nhltop_http_requests_total{{method=\"{}\",path=\"{}\",status=\"{}\"}} {}",
                    label_value(&key.method),
                    label_value(&key.path),
                    key.status,
                    count
                );
            }
        }

        for (name, help, counter) in [
            ("nhltop_updates_total", "Completed database updates.", &self.updates),
            ("nhltop_games_stored_total", "Games stored by updates.", &self.games_stored),
            ("nhltop_players_stored_total", "Player stat lines stored by updates.", &self.players_stored),
        ] {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {}", counter.load(Ordering::Relaxed));
        }
        out
    }
}

fn label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_counts() {
        let metrics = Metrics::new();
        metrics.record_request("GET", "/", 200);
        metrics.record_request("GET", "/", 200);
        metrics.record_request("GET", "/update/:count", 400);
        metrics.record_update(&UpdateSummary {
            seasons: vec![],
            games: 2,
            players: 44,
        });

        let text = metrics.render();
        assert!(text.contains("nhltop_http_requests_total{method=\"GET\",path=\"/\",status=\"200\"} 2\n"));
        assert!(text.contains("path=\"/update/:count\",status=\"400\"} 1\n"));
        assert!(text.contains("nhltop_updates_total 1\n"));
        assert!(text.contains("nhltop_games_stored_total 2\n"));
        assert!(text.contains("nhltop_players_stored_total 44\n"));
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(label_value("a\"b\\c"), "a\\\"b\\\\c");
    }
}
