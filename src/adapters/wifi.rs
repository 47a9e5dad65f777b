//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the network layer below the MQTT session.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: simulation state for host-side tests.
//!
//! ## Reconnection policy
//!
//! None here. [`ConnectivityManager`](crate::comms::connectivity::ConnectivityManager)
//! calls [`LinkPort::connect`] from its 5 s tick while the link is down.

use log::{info, warn};

use crate::app::ports::{LinkError, LinkPort};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() {
        return Err(LinkError::NoCredentials);
    }
    // At most 32 octets, printable ASCII only.
    if ssid.len() > 32 || !ssid.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        return Err(LinkError::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidCredentials);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiLink {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(target_os = "espidf")]
    configured: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    /// Simulation: connect() attempts so far.
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
    /// Simulation: fail this many upcoming connect() calls.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next: u32,
}

impl WifiLink {
    /// Unconfigured link; [`connect`](LinkPort::connect) reports
    /// `NoCredentials` until [`set_credentials`](Self::set_credentials)
    /// succeeds.
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
            configured: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_up: false,
            sim_attempts: 0,
            sim_fail_next: 0,
        }
    }

    /// Validate and store station credentials. On error the previous
    /// credentials are kept.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| LinkError::InvalidCredentials)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| LinkError::InvalidCredentials)?;
        #[cfg(target_os = "espidf")]
        {
            self.configured = false;
        }
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        if !self.configured {
            let auth_method = if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let cfg = Configuration::Client(ClientConfiguration {
                ssid: self.ssid.clone(),
                password: self.password.clone(),
                auth_method,
                ..Default::default()
            });
            self.wifi.set_configuration(&cfg).map_err(|e| {
                warn!("WiFi: set_configuration failed: {:?}", e);
                LinkError::ConnectionFailed
            })?;
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {:?}", e);
                LinkError::ConnectionFailed
            })?;
            self.configured = true;
        }
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect failed: {:?}", e);
            LinkError::ConnectionFailed
        })?;
        self.wifi.wait_netif_up().map_err(|e| {
            warn!("WiFi: netif not up: {:?}", e);
            LinkError::ConnectionFailed
        })?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        self.sim_attempts = self.sim_attempts.wrapping_add(1);
        if self.sim_fail_next > 0 {
            self.sim_fail_next -= 1;
            warn!("WiFi(sim): simulated failure (attempt {})", self.sim_attempts);
            return Err(LinkError::ConnectionFailed);
        }
        self.sim_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_up
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiLink {
    /// Simulate the AP going away.
    pub fn sim_drop(&mut self) {
        self.sim_up = false;
    }

    pub fn sim_fail_next(&mut self, attempts: u32) {
        self.sim_fail_next = attempts;
    }

    pub fn sim_attempts(&self) -> u32 {
        self.sim_attempts
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiLink {
    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()?;
        info!("WiFi: connected");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
