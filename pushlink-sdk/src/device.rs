//! Device identity for registration requests.
//!
//! Gathers the identity fields the backend expects: a stable hardware id,
//! OS version, device model, language and timezone offset. Services take a
//! `DeviceInfo` by value so tests can inject fixed values.

use chrono::{Local, Offset};
use sha2::{Digest, Sha256};
use std::env;

/// Identity of the current device, as reported to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Stable unique hardware id (uppercase hex).
    pub hwid: String,
    /// Operating system version.
    pub os_version: String,
    /// Device model.
    pub device_model: String,
    /// ISO-639-1 language code.
    pub language: String,
    /// Local UTC offset in seconds.
    pub timezone_offset_secs: f64,
}

impl DeviceInfo {
    /// Collects identity information for the current device.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            hwid: hardware_id(),
            os_version: os_version(),
            device_model: device_model(),
            language: language(),
            timezone_offset_secs: timezone_offset_secs(),
        }
    }
}

/// Derives a stable hardware id from machine identifiers.
///
/// Hashes the machine id (when available), hostname, OS and architecture;
/// the first 16 bytes of the SHA-256 digest become an uppercase hex string.
/// Survives reboots; changes only if the hardware identity changes.
fn hardware_id() -> String {
    let mut components = vec![env::consts::OS.to_string(), env::consts::ARCH.to_string()];
    components.push(hostname_string());
    if let Some(machine_id) = machine_id() {
        components.push(machine_id);
    }

    let mut hasher = Sha256::new();
    hasher.update(components.join("|").as_bytes());
    let hash = hasher.finalize();

    hex::encode_upper(&hash[..16])
}

fn hostname_string() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn device_model() -> String {
    hostname_string()
}

fn language() -> String {
    // LANG is e.g. "en_US.UTF-8"; the ISO-639-1 code is the leading pair.
    env::var("LANG")
        .ok()
        .and_then(|lang| lang.get(..2).map(str::to_lowercase))
        .filter(|code| code.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or_else(|| "en".to_string())
}

fn timezone_offset_secs() -> f64 {
    f64::from(Local::now().offset().fix().local_minus_utc())
}

fn os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("VERSION_ID="))
                    .map(|l| {
                        l.trim_start_matches("VERSION_ID=")
                            .trim_matches('"')
                            .to_string()
                    })
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(target_os = "windows")]
    {
        "windows".to_string()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "unknown".to_string()
    }
}

/// Platform-specific stable machine identifier, when one exists.
fn machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
