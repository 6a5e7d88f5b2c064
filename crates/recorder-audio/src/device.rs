//! Loopback device discovery.
//!
//! Desktop audio stacks expose "what the system is playing" as a virtual
//! input device whose name follows driver conventions rather than any API
//! contract, so discovery is a matter of name heuristics: an exact-intent
//! first tier, a looser second tier, and an exclusion list that keeps real
//! microphones out of both.

use cpal::traits::{DeviceTrait, HostTrait};
use recorder_ipc::AudioDeviceInfo;
use tracing::{debug, instrument, warn};

/// Names that directly identify the driver's system-mix endpoint.
const PRIMARY_LOOPBACK_NAMES: &[&str] = &["stereo mix"];

/// Looser fragments that usually indicate a loopback endpoint.
const SECONDARY_LOOPBACK_NAMES: &[&str] = &["what u hear", "wave out mix", "loopback"];

/// Fragments that identify real capture hardware, never a loopback.
const EXCLUDED_NAMES: &[&str] = &["microphone", "mic", "line in", "aux"];

/// True if `name` is a first-tier loopback device name.
pub(crate) fn is_primary_loopback(name: &str) -> bool {
    let lower = name.to_lowercase();
    PRIMARY_LOOPBACK_NAMES.iter().any(|n| lower.contains(n))
        && !EXCLUDED_NAMES.iter().any(|n| lower.contains(n))
}

/// True if `name` is a second-tier loopback device name. The second tier
/// additionally rejects anything labelled as an input, since "loopback
/// input" style names are capture ports on external interfaces.
pub(crate) fn is_secondary_loopback(name: &str) -> bool {
    let lower = name.to_lowercase();
    SECONDARY_LOOPBACK_NAMES.iter().any(|n| lower.contains(n))
        && !EXCLUDED_NAMES.iter().any(|n| lower.contains(n))
        && !lower.contains("input")
}

fn input_channels(device: &cpal::Device) -> u16 {
    device
        .default_input_config()
        .map(|config| config.channels())
        .unwrap_or(0)
}

fn scan_devices(matches: fn(&str) -> bool) -> Option<(cpal::Device, String)> {
    let host = cpal::default_host();
    let devices = match host.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate audio input devices: {}", e);
            return None;
        }
    };

    for device in devices {
        let name = match device.name() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if matches(&name) && input_channels(&device) > 0 {
            return Some((device, name));
        }
    }
    None
}

/// Locate the device that captures system playback, preferring first-tier
/// names over second-tier ones. Returns the device and its reported name.
#[instrument(name = "find_loopback_device")]
pub fn find_loopback_device() -> Option<(cpal::Device, String)> {
    if let Some((device, name)) = scan_devices(is_primary_loopback) {
        debug!(device = %name, "Loopback device selected (primary match)");
        return Some((device, name));
    }
    if let Some((device, name)) = scan_devices(is_secondary_loopback) {
        debug!(device = %name, "Loopback device selected (secondary match)");
        return Some((device, name));
    }
    debug!("No loopback device found");
    None
}

/// Whether a usable loopback device exists on this machine.
pub fn is_available() -> bool {
    find_loopback_device().is_some()
}

/// Enumerate every input device that looks like a loopback endpoint.
#[instrument(name = "list_loopback_devices")]
pub fn list_loopback_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let devices = match host.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate audio input devices: {}", e);
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for device in devices {
        let name = match device.name() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if !is_primary_loopback(&name) && !is_secondary_loopback(&name) {
            continue;
        }
        let config = match device.default_input_config() {
            Ok(config) => config,
            Err(_) => continue,
        };
        if config.channels() == 0 {
            continue;
        }
        found.push(AudioDeviceInfo {
            name,
            channels: config.channels(),
            sample_rate: config.sample_rate().0,
        });
    }

    debug!(count = found.len(), "Enumerated loopback devices");
    found
}
