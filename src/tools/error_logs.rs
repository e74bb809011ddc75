//! Simulated device error log retrieval

use crate::error::Result;
use crate::tools::{device_id_arg, ToolExecutor, ToolResult};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Entries returned when the model does not pass a limit
pub const DEFAULT_LOG_LIMIT: usize = 10;

/// Hard cap on entries per request
pub const MAX_LOG_ENTRIES: usize = 15;

/// One catalogued device event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogTemplate {
    /// Error code, e.g. `E-401`
    pub code: &'static str,
    /// Severity label
    pub severity: &'static str,
    /// Human readable message
    pub message: &'static str,
}

/// Events the simulated devices can report
pub const LOG_CATALOGUE: [LogTemplate; 8] = [
    LogTemplate {
        code: "E-101",
        severity: "WARNING",
        message: "WiFi connection unstable",
    },
    LogTemplate {
        code: "E-205",
        severity: "ERROR",
        message: "Brush motor stall detected",
    },
    LogTemplate {
        code: "E-300",
        severity: "CRITICAL",
        message: "Battery voltage low (3.2V)",
    },
    LogTemplate {
        code: "E-401",
        severity: "WARNING",
        message: "Suction power reduced",
    },
    LogTemplate {
        code: "E-501",
        severity: "ERROR",
        message: "Water inlet valve timeout",
    },
    LogTemplate {
        code: "E-601",
        severity: "WARNING",
        message: "Temperature sensor anomaly",
    },
    LogTemplate {
        code: "INFO-001",
        severity: "INFO",
        message: "Device boot completed successfully",
    },
    LogTemplate {
        code: "INFO-002",
        severity: "INFO",
        message: "Firmware update check performed",
    },
];

/// Render `count` synthetic log entries for `device_id`
///
/// Entry `i` is stamped `random(1..=60) * i` minutes before `now`, so the
/// first entry is always the newest but the rest are not strictly ordered.
pub fn render_logs<R: Rng>(rng: &mut R, device_id: &str, count: usize, now: DateTime<Local>) -> String {
    let rule = "-".repeat(80);
    let mut report = format!(
        "Device Error Logs for {} (Last {} entries):\n\n{}\n",
        device_id, count, rule
    );

    for i in 0..count {
        let minutes_back = rng.random_range(1..=60i64) * i as i64;
        let at = now - Duration::minutes(minutes_back);
        let entry = LOG_CATALOGUE[rng.random_range(0..LOG_CATALOGUE.len())];
        report.push_str(&format!(
            "[{}] {:<8} | {:<8} | {}\n",
            at.format("%Y-%m-%d %H:%M:%S"),
            entry.severity,
            entry.code,
            entry.message
        ));
    }

    report.push_str(&rule);
    report.push('\n');
    report.push_str(&format!("\nTotal Entries: {}\nDevice ID: {}\n", count, device_id));
    report
}

/// `get_device_error_logs` tool
#[derive(Debug, Clone)]
pub struct ErrorLogsTool {
    max_log_entries: usize,
    seed: Option<u64>,
}

impl ErrorLogsTool {
    /// Create the tool, capping every request at `max_log_entries`
    /// (never more than [`MAX_LOG_ENTRIES`])
    pub fn new(max_log_entries: usize) -> Self {
        Self {
            max_log_entries: max_log_entries.min(MAX_LOG_ENTRIES),
            seed: None,
        }
    }

    /// Use a fixed random seed for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[async_trait]
impl ToolExecutor for ErrorLogsTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "get_device_error_logs",
            "description": "Retrieves recent error logs from a specific IoT device. \
                Returns timestamp, error code, severity, and error message.",
            "parameters": {
                "type": "object",
                "properties": {
                    "device_id": {
                        "type": "string",
                        "description": "The unique identifier of the IoT device (e.g., \"AURA-12345\")"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of log entries to return (default: 10)"
                    }
                },
                "required": ["device_id"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let device_id = match device_id_arg(&args) {
            Ok(id) => id,
            Err(result) => return Ok(result),
        };

        // Models sometimes send numbers as strings
        let limit = match args.get("limit") {
            Some(serde_json::Value::Number(n)) => n.as_u64().map(|n| n as usize),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_LOG_LIMIT);
        let count = limit.min(self.max_log_entries);

        tracing::info!(device_id = %device_id, limit, count, "Fetching device error logs");
        let report = render_logs(&mut self.rng(), &device_id, count, Local::now());
        Ok(ToolResult::success(report))
    }
}
