//! Simulated device connectivity check
//!
//! There is no device fleet behind this tool. Each device id is hashed with
//! SHA-256; the digest picks one of three connectivity scenarios and seeds
//! every derived value, so the same device always reports the same status.

use crate::error::Result;
use crate::tools::{device_id_arg, ToolExecutor, ToolResult};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::fmt;

/// Connectivity scenario reported for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    /// Connected with good signal
    Online,
    /// Not reachable
    Offline,
    /// Connected with weak, dropping signal
    Intermittent,
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Intermittent => "INTERMITTENT",
        };
        f.write_str(label)
    }
}

/// Snapshot of a device's network state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Device identifier
    pub device_id: String,
    /// Connectivity scenario
    pub status: ConnectivityStatus,
    /// Signal strength in percent
    pub signal_strength: u8,
    /// Human readable last-seen time
    pub last_seen: String,
    /// IP address or `N/A`
    pub ip_address: String,
    /// Uptime or `N/A`
    pub uptime: String,
    /// MAC address
    pub mac_address: String,
}

impl DeviceStatus {
    /// Derive the status of `device_id` from its SHA-256 digest
    pub fn simulate(device_id: &str) -> Self {
        let digest = Sha256::digest(device_id.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(seed));

        let status = match digest[8] % 3 {
            0 => ConnectivityStatus::Online,
            1 => ConnectivityStatus::Offline,
            _ => ConnectivityStatus::Intermittent,
        };

        let (signal_strength, last_seen, ip_address, uptime) = match status {
            ConnectivityStatus::Online => (
                rng.random_range(70..=100),
                "Just now".to_string(),
                format!("192.168.1.{}", rng.random_range(10..=200)),
                format!("{} hours", rng.random_range(1..=48)),
            ),
            ConnectivityStatus::Offline => (
                0,
                format!("{} minutes ago", rng.random_range(5..=120)),
                "N/A".to_string(),
                "N/A".to_string(),
            ),
            ConnectivityStatus::Intermittent => (
                rng.random_range(20..=50),
                format!("{} seconds ago", rng.random_range(1..=5)),
                format!("192.168.1.{}", rng.random_range(10..=200)),
                format!("{} hours", rng.random_range(1..=12)),
            ),
        };

        let mac_address = (0..6)
            .map(|_| format!("{:02x}", rng.random::<u8>()))
            .collect::<Vec<_>>()
            .join(":");

        Self {
            device_id: device_id.to_string(),
            status,
            signal_strength,
            last_seen,
            ip_address,
            uptime,
            mac_address,
        }
    }

    /// Render the report handed to the model
    pub fn render(&self) -> String {
        format!(
            "Device Connectivity Status for {}:\n\n\
             Status: {}\n\
             Signal Strength: {}%\n\
             Last Seen: {}\n\
             IP Address: {}\n\
             Uptime: {}\n\n\
             Network Details:\n\
             - Connection Type: WiFi 2.4GHz\n\
             - MAC Address: {}\n\
             - Firmware Version: v2.3.1\n",
            self.device_id,
            self.status,
            self.signal_strength,
            self.last_seen,
            self.ip_address,
            self.uptime,
            self.mac_address
        )
    }
}

/// `check_device_connectivity` tool
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectivityTool;

#[async_trait]
impl ToolExecutor for ConnectivityTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "check_device_connectivity",
            "description": "Checks if a specific IoT device is online and connected to the network. \
                Returns the device's connectivity status, signal strength, and last seen time.",
            "parameters": {
                "type": "object",
                "properties": {
                    "device_id": {
                        "type": "string",
                        "description": "The unique identifier of the IoT device (e.g., \"AURA-12345\")"
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

        tracing::info!(device_id = %device_id, "Checking device connectivity");
        Ok(ToolResult::success(DeviceStatus::simulate(&device_id).render()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_is_deterministic() {
        assert_eq!(DeviceStatus::simulate("AURA-1"), DeviceStatus::simulate("AURA-1"));
    }

    #[test]
    fn test_scenario_value_ranges() {
        for i in 0..60 {
            let status = DeviceStatus::simulate(&format!("AURA-{}", i));
            match status.status {
                ConnectivityStatus::Online => {
                    assert!((70..=100).contains(&status.signal_strength));
                    assert_eq!(status.last_seen, "Just now");
                    assert!(status.ip_address.starts_with("192.168.1."));
                }
                ConnectivityStatus::Offline => {
                    assert_eq!(status.signal_strength, 0);
                    assert_eq!(status.ip_address, "N/A");
                    assert_eq!(status.uptime, "N/A");
                    assert!(status.last_seen.ends_with("minutes ago"));
                }
                ConnectivityStatus::Intermittent => {
                    assert!((20..=50).contains(&status.signal_strength));
                    assert!(status.last_seen.ends_with("seconds ago"));
                }
            }
            assert_eq!(status.mac_address.split(':').count(), 6);
        }
    }

    #[test]
    fn test_all_scenarios_occur() {
        let statuses: Vec<ConnectivityStatus> = (0..60)
            .map(|i| DeviceStatus::simulate(&format!("DEV-{}", i)).status)
            .collect();
        assert!(statuses.contains(&ConnectivityStatus::Online));
        assert!(statuses.contains(&ConnectivityStatus::Offline));
        assert!(statuses.contains(&ConnectivityStatus::Intermittent));
    }

    #[test]
    fn test_render_layout() {
        let report = DeviceStatus::simulate("AURA-42").render();
        assert!(report.starts_with("Device Connectivity Status for AURA-42:\n\nStatus: "));
        assert!(report.contains("\nSignal Strength: "));
        assert!(report.contains("- Connection Type: WiFi 2.4GHz\n"));
        assert!(report.ends_with("- Firmware Version: v2.3.1\n"));
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_id() {
        let result = ConnectivityTool
            .execute(serde_json::json!({"device_id": "   "}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_message().starts_with("Error: Device not found"));
    }

    #[tokio::test]
    async fn test_execute_reports_status() {
        let result = ConnectivityTool
            .execute(serde_json::json!({"device_id": "AURA-12345"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("AURA-12345"));
    }
}
