/// One access point seen during a scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NetworkObservation {
    /// SSID, empty for hidden networks
    pub identity: String,
    pub bssid: String,
    /// Received signal strength in dBm (<= 0)
    pub signal_dbm: i32,
}

impl NetworkObservation {
    pub fn new(identity: impl Into<String>, bssid: impl Into<String>, signal_dbm: i32) -> Self {
        Self {
            identity: identity.into(),
            bssid: bssid.into(),
            signal_dbm,
        }
    }
}

/// Link state reported by the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    Disconnected,
    /// Associating, authenticating, or any other transitional state
    Other,
}

/// Format a raw 6-byte hardware address as `aa:bb:cc:dd:ee:ff`
pub fn format_bssid(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
