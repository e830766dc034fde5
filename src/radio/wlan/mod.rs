//! Windows WLAN API radio adapter

mod profile;

use crate::error::{WifiError, WifiResult, wlan_reason_to_string};
use crate::radio::{
    LinkStatus, NetworkObservation, Radio, check_connect_request, format_bssid,
};
use profile::create_profile_xml;
use secrecy::SecretString;
use std::time::Duration;
use tracing::{debug, warn};
use windows::{
    Win32::{
        Foundation::{ERROR_SUCCESS, HANDLE},
        NetworkManagement::WiFi::*,
    },
    core::{GUID, PCWSTR},
};

/// Time the WLAN service needs to register a freshly written profile
const PROFILE_REGISTRATION_DELAY_MS: u64 = 1500;

/// ERROR_NOT_FOUND: deleting a profile that is already gone
const ERROR_NOT_FOUND: u32 = 1168;

/// Radio bound to the first WLAN interface; the client handle closes on drop
#[derive(Debug)]
pub struct WlanRadio {
    handle: HANDLE,
    guid: GUID,
}

// WLAN client handles may be used from any thread; SharedRadio serializes calls.
unsafe impl Send for WlanRadio {}

/// Null-terminated UTF-16 copy of `s` for PCWSTR arguments
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn first_interface(handle: HANDLE) -> WifiResult<GUID> {
    unsafe {
        let mut interface_list: *mut WLAN_INTERFACE_INFO_LIST = std::ptr::null_mut();
        let result = WlanEnumInterfaces(handle, None, &mut interface_list);
        if result != ERROR_SUCCESS.0 {
            return Err(WifiError::InterfaceEnumFailed { code: result });
        }

        let count = (*interface_list).dwNumberOfItems;
        let guid = (count > 0).then(|| (*interface_list).InterfaceInfo[0].InterfaceGuid);
        WlanFreeMemory(interface_list as *mut _);
        guid.ok_or(WifiError::NoInterface)
    }
}

impl WlanRadio {
    /// Open the WLAN service and bind to the first interface
    pub fn open() -> WifiResult<Self> {
        let mut negotiated_version = 0;
        let mut handle = HANDLE::default();
        let result = unsafe { WlanOpenHandle(2, None, &mut negotiated_version, &mut handle) };
        if result != ERROR_SUCCESS.0 {
            return Err(WifiError::HandleOpenFailed { code: result });
        }

        match first_interface(handle) {
            Ok(guid) => {
                debug!(version = negotiated_version, "WLAN client opened");
                Ok(Self { handle, guid })
            }
            Err(e) => {
                unsafe {
                    let _ = WlanCloseHandle(handle, None);
                }
                Err(e)
            }
        }
    }

    fn set_profile(&self, xml: &str) -> WifiResult<()> {
        unsafe {
            let xml_wide = wide(xml);
            let mut reason_code = 0;
            let result = WlanSetProfile(
                self.handle,
                &self.guid,
                0,
                PCWSTR(xml_wide.as_ptr()),
                None,
                true,
                None,
                &mut reason_code,
            );

            if result != ERROR_SUCCESS.0 {
                warn!(
                    code = result,
                    reason = %wlan_reason_to_string(reason_code),
                    "profile rejected"
                );
                return Err(WifiError::ProfileAddFailed {
                    code: result,
                    reason: reason_code,
                });
            }
        }
        Ok(())
    }

    fn connect_profile(&self, name: &str) -> WifiResult<()> {
        unsafe {
            let name_wide = wide(name);
            let connection_params = WLAN_CONNECTION_PARAMETERS {
                wlanConnectionMode: wlan_connection_mode_profile,
                strProfile: PCWSTR(name_wide.as_ptr()),
                pDot11Ssid: std::ptr::null_mut(),
                pDesiredBssidList: std::ptr::null_mut(),
                dot11BssType: dot11_BSS_type_infrastructure,
                dwFlags: 0,
            };

            let result = WlanConnect(self.handle, &self.guid, &connection_params, None);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::ConnectionFailed { code: result });
            }
        }
        Ok(())
    }

    fn saved_profiles(&self) -> WifiResult<Vec<String>> {
        let mut profiles = Vec::new();

        unsafe {
            let mut profile_list: *mut WLAN_PROFILE_INFO_LIST = std::ptr::null_mut();
            let result =
                WlanGetProfileList(self.handle, &self.guid, None, &mut profile_list);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::ProfileListFailed { code: result });
            }

            let items = std::slice::from_raw_parts(
                (*profile_list).ProfileInfo.as_ptr(),
                (*profile_list).dwNumberOfItems as usize,
            );
            for item in items {
                let name = String::from_utf16_lossy(&item.strProfileName);
                let name = name.trim_matches(char::from(0)).to_string();
                if !name.is_empty() {
                    profiles.push(name);
                }
            }
            WlanFreeMemory(profile_list as *mut _);
        }

        Ok(profiles)
    }
}

impl Radio for WlanRadio {
    fn trigger_scan(&mut self) -> WifiResult<()> {
        unsafe {
            let result = WlanScan(self.handle, &self.guid, None, None, None);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::ScanFailed { code: result });
            }
        }
        Ok(())
    }

    fn scan_results(&mut self) -> WifiResult<Vec<NetworkObservation>> {
        let mut observations = Vec::new();

        unsafe {
            let mut bss_list: *mut WLAN_BSS_LIST = std::ptr::null_mut();
            let result = WlanGetNetworkBssList(
                self.handle,
                &self.guid,
                None,
                dot11_BSS_type_any,
                false,
                None,
                &mut bss_list,
            );
            if result != ERROR_SUCCESS.0 || bss_list.is_null() {
                return Err(WifiError::ScanResultsFailed { code: result });
            }

            let entries = std::slice::from_raw_parts(
                (*bss_list).wlanBssEntries.as_ptr(),
                (*bss_list).dwNumberOfItems as usize,
            );
            for bss in entries {
                let ssid_len = (bss.dot11Ssid.uSSIDLength as usize).min(bss.dot11Ssid.ucSSID.len());
                let ssid_bytes = &bss.dot11Ssid.ucSSID[..ssid_len];
                observations.push(NetworkObservation {
                    identity: String::from_utf8_lossy(ssid_bytes).to_string(),
                    bssid: format_bssid(&bss.dot11Bssid),
                    signal_dbm: bss.lRssi.min(0),
                });
            }
            WlanFreeMemory(bss_list as *mut _);
        }

        debug!(count = observations.len(), "read BSS list");
        Ok(observations)
    }

    fn install_profile(
        &mut self,
        identity: &str,
        credential: Option<&SecretString>,
    ) -> WifiResult<Duration> {
        check_connect_request(identity, credential)?;
        self.set_profile(&create_profile_xml(identity, credential))?;
        Ok(Duration::from_millis(PROFILE_REGISTRATION_DELAY_MS))
    }

    /// Connect using the profile `install_profile` wrote
    fn request_connect(
        &mut self,
        identity: &str,
        _credential: Option<&SecretString>,
    ) -> WifiResult<()> {
        self.connect_profile(identity)
    }

    fn disconnect(&mut self) -> WifiResult<()> {
        unsafe {
            let result = WlanDisconnect(self.handle, &self.guid, None);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::DisconnectFailed { code: result });
            }
        }
        Ok(())
    }

    #[allow(non_upper_case_globals)]
    fn status(&mut self) -> WifiResult<LinkStatus> {
        unsafe {
            let mut data_size = 0;
            let mut data_ptr: *mut std::ffi::c_void = std::ptr::null_mut();
            let mut opcode_value_type = wlan_opcode_value_type_invalid;

            let result = WlanQueryInterface(
                self.handle,
                &self.guid,
                wlan_intf_opcode_interface_state,
                None,
                &mut data_size,
                &mut data_ptr,
                Some(&mut opcode_value_type),
            );
            if result != ERROR_SUCCESS.0 || data_ptr.is_null() {
                return Err(WifiError::StatusQueryFailed { code: result });
            }

            let state = *(data_ptr as *const WLAN_INTERFACE_STATE);
            WlanFreeMemory(data_ptr);

            Ok(match state {
                wlan_interface_state_connected => LinkStatus::Connected,
                wlan_interface_state_disconnected => LinkStatus::Disconnected,
                _ => LinkStatus::Other,
            })
        }
    }

    fn clear_saved_profiles(&mut self) -> WifiResult<()> {
        for name in self.saved_profiles()? {
            unsafe {
                let name_wide = wide(&name);
                let result = WlanDeleteProfile(
                    self.handle,
                    &self.guid,
                    PCWSTR(name_wide.as_ptr()),
                    None,
                );
                if result != ERROR_SUCCESS.0 && result != ERROR_NOT_FOUND {
                    return Err(WifiError::ProfileDeleteFailed { code: result });
                }
            }
            debug!(profile = %name, "deleted saved profile");
        }
        Ok(())
    }
}

impl Drop for WlanRadio {
    fn drop(&mut self) {
        unsafe {
            let _ = WlanCloseHandle(self.handle, None);
        }
    }
}
