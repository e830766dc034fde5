//! Radio adapter boundary
//!
//! The engine talks to the wireless subsystem only through the [`Radio`]
//! trait. Every call is blocking and goes through [`SharedRadio`], which
//! serializes access to the one physical adapter.

mod shared;
mod types;
#[cfg(windows)]
pub mod wlan;

use crate::error::{EngineError, WifiError, WifiResult};
use secrecy::{ExposeSecret, SecretString};
use std::net::{IpAddr, UdpSocket};
use std::time::Duration;

pub use shared::SharedRadio;
pub use types::{LinkStatus, NetworkObservation, format_bssid};

/// Blocking operations the engine needs from the OS wireless subsystem
pub trait Radio: Send {
    /// Ask the driver to start a fresh scan
    fn trigger_scan(&mut self) -> WifiResult<()>;

    /// Read what the last scan found, one entry per access point
    fn scan_results(&mut self) -> WifiResult<Vec<NetworkObservation>>;

    /// Register what the OS needs before `request_connect` can target `identity`
    ///
    /// Returns how long to wait before the request is issued. The wait
    /// happens outside the adapter lock.
    fn install_profile(
        &mut self,
        _identity: &str,
        _credential: Option<&SecretString>,
    ) -> WifiResult<Duration> {
        Ok(Duration::ZERO)
    }

    /// Request association with `identity`
    ///
    /// An `Err` is an immediate rejection. `Ok` only means the request was
    /// accepted; the link status tells whether it succeeded.
    fn request_connect(
        &mut self,
        identity: &str,
        credential: Option<&SecretString>,
    ) -> WifiResult<()>;

    fn disconnect(&mut self) -> WifiResult<()>;

    fn status(&mut self) -> WifiResult<LinkStatus>;

    /// Remove every saved network profile on the interface
    fn clear_saved_profiles(&mut self) -> WifiResult<()>;

    /// Local address assigned to the primary interface, if any
    fn local_address(&mut self) -> Option<IpAddr> {
        primary_local_address()
    }
}

/// Longest SSID 802.11 allows, in bytes
pub const MAX_SSID_LEN: usize = 32;

/// Reject connect requests the driver would refuse anyway
///
/// A WPA2 passphrase is 8 to 63 characters, or exactly 64 hex digits.
pub fn check_connect_request(identity: &str, credential: Option<&SecretString>) -> WifiResult<()> {
    if identity.is_empty() {
        return Err(WifiError::ConnectRejected("network name is empty".to_string()));
    }
    if identity.len() > MAX_SSID_LEN {
        return Err(WifiError::ConnectRejected(format!(
            "network name is longer than {MAX_SSID_LEN} bytes"
        )));
    }
    if let Some(key) = credential {
        let key = key.expose_secret();
        let passphrase = (8..=63).contains(&key.len()) && key.is_ascii();
        let raw_key = key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit());
        if !passphrase && !raw_key {
            return Err(WifiError::ConnectRejected(
                "WPA2 key must be 8-63 characters or 64 hex digits".to_string(),
            ));
        }
    }
    Ok(())
}

/// Best-effort lookup of the address the OS routes outbound traffic from
///
/// Connecting a UDP socket sends nothing; it only selects the interface.
pub fn primary_local_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() { None } else { Some(ip) }
}

/// Open the platform radio adapter
#[cfg(windows)]
pub fn open_default() -> Result<Box<dyn Radio>, EngineError> {
    let radio = wlan::WlanRadio::open().map_err(EngineError::AdapterUnavailable)?;
    Ok(Box::new(radio))
}

/// Open the platform radio adapter
#[cfg(not(windows))]
pub fn open_default() -> Result<Box<dyn Radio>, EngineError> {
    Err(EngineError::AdapterUnavailable(WifiError::NoInterface))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_connect_request_checks() {
        assert!(check_connect_request("Cafe", None).is_ok());
        assert!(check_connect_request("Cafe", Some(&key("correct horse"))).is_ok());
        assert!(check_connect_request("Cafe", Some(&key(&"ab12".repeat(16)))).is_ok());

        let long_name = "x".repeat(MAX_SSID_LEN + 1);
        let rejected = [
            ("", None),
            (long_name.as_str(), None),
            ("Cafe", Some(key("short"))),
            ("Cafe", Some(key(&"z".repeat(64)))),
            ("Cafe", Some(key(&"p".repeat(70)))),
        ];
        for (identity, credential) in &rejected {
            assert!(matches!(
                check_connect_request(identity, credential.as_ref()),
                Err(WifiError::ConnectRejected(_))
            ));
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn test_open_default_unavailable_off_windows() {
        assert!(matches!(
            open_default(),
            Err(EngineError::AdapterUnavailable(WifiError::NoInterface))
        ));
    }
}
