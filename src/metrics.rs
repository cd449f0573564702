//! Hall metrics
//!
//! Atomic counters rendered in the Prometheus text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared by the services and the HTTP layer
#[derive(Debug)]
pub struct MetricsRegistry {
    started: Instant,
    pub http_requests_total: AtomicU64,
    pub http_errors_total: AtomicU64,
    pub cards_checked_total: AtomicU64,
    pub winners_total: AtomicU64,
    pub top_ups_total: AtomicU64,
    pub settlements_total: AtomicU64,
    pub settlements_blocked_total: AtomicU64,
    pub settlements_debt_grown_total: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            http_requests_total: AtomicU64::new(0),
            http_errors_total: AtomicU64::new(0),
            cards_checked_total: AtomicU64::new(0),
            winners_total: AtomicU64::new(0),
            top_ups_total: AtomicU64::new(0),
            settlements_total: AtomicU64::new(0),
            settlements_blocked_total: AtomicU64::new(0),
            settlements_debt_grown_total: AtomicU64::new(0),
        }
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_card_check(&self, winner: bool) {
        Self::incr(&self.cards_checked_total);
        if winner {
            Self::incr(&self.winners_total);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn to_prometheus_format(&self) -> String {
        let counters: [(&str, &str, &AtomicU64); 8] = [
            ("http_requests_total", "Total number of HTTP requests", &self.http_requests_total),
            ("http_errors_total", "HTTP requests answered with an error", &self.http_errors_total),
            ("cards_checked_total", "Card checks evaluated", &self.cards_checked_total),
            ("winners_total", "Card checks that found a winner", &self.winners_total),
            ("top_ups_total", "Wallet top-ups applied", &self.top_ups_total),
            ("settlements_total", "Rounds settled", &self.settlements_total),
            (
                "settlements_blocked_total",
                "Settlements refused by auto-lock",
                &self.settlements_blocked_total,
            ),
            (
                "settlements_debt_grown_total",
                "Settlements that pushed a balance into debt",
                &self.settlements_debt_grown_total,
            ),
        ];

        let mut output = String::new();
        for (name, help, counter) in counters {
            let _ = write!(
                output,
                "# HELP bingohall_{name} {help}\n# TYPE bingohall_{name} counter\nbingohall_{name} {}\n\n",
                counter.load(Ordering::Relaxed)
            );
        }
        let _ = write!(
            output,
            "# HELP bingohall_uptime_seconds Seconds since start\n# TYPE bingohall_uptime_seconds gauge\nbingohall_uptime_seconds {}\n",
            self.uptime_seconds()
        );
        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_check_counters() {
        let metrics = MetricsRegistry::new();
        metrics.record_card_check(true);
        metrics.record_card_check(false);
        assert_eq!(metrics.cards_checked_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.winners_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = MetricsRegistry::new();
        MetricsRegistry::incr(&metrics.settlements_total);
        let text = metrics.to_prometheus_format();
        assert!(text.contains("# TYPE bingohall_settlements_total counter"));
        assert!(text.contains("bingohall_settlements_total 1"));
        assert!(text.contains("bingohall_uptime_seconds"));
    }
}
