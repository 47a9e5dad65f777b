//! One-shot hardware peripheral initialization and raw register access.
//!
//! Configures the pressure ADC channel and the relay GPIO using raw
//! ESP-IDF sys calls. Called once from `main()` before the scheduler
//! starts. On the host the same entry points read and write simulated
//! values so the drivers above stay target-agnostic.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::error::{ActuatorError, SensorError};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the scheduler; single-threaded.
    unsafe {
        init_adc()?;
        init_relay_output()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path. `init_adc()` completes before the scheduler
/// starts polling.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 10-bit keeps the counts-to-volts factor at 5 V / 1023.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_10,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::PRESSURE_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 CH{} configured (pressure)", pins::PRESSURE_ADC_CHANNEL);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed(ret));
    }
    Ok(raw.max(0) as u16)
}

// ── GPIO output (relay) ───────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_relay_output() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::PUMP_RELAY_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    // Boot with the pump released.
    unsafe { gpio_set_level(pins::PUMP_RELAY_GPIO, 0) };

    info!("hw_init: relay GPIO{} configured", pins::PUMP_RELAY_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), ActuatorError> {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_relay_output(). Main-loop only.
    let ret = unsafe { gpio_set_level(pin, if high { 1 } else { 0 }) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::GpioWriteFailed(ret));
    }
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU16, Ordering};

    use crate::error::{ActuatorError, SensorError};

    static SIM_ADC_RAW: AtomicU16 = AtomicU16::new(300);
    static SIM_RELAY: AtomicBool = AtomicBool::new(false);
    /// Non-zero makes the next ADC read fail with this code.
    static SIM_ADC_FAIL: AtomicI32 = AtomicI32::new(0);

    pub fn set_adc_raw(raw: u16) {
        SIM_ADC_RAW.store(raw, Ordering::Relaxed);
    }

    pub fn fail_next_adc_read(rc: i32) {
        SIM_ADC_FAIL.store(rc, Ordering::Relaxed);
    }

    pub fn relay_level() -> bool {
        SIM_RELAY.load(Ordering::Relaxed)
    }

    pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
        match SIM_ADC_FAIL.swap(0, Ordering::Relaxed) {
            0 => Ok(SIM_ADC_RAW.load(Ordering::Relaxed)),
            rc => Err(SensorError::AdcReadFailed(rc)),
        }
    }

    pub fn gpio_write(_pin: i32, high: bool) -> Result<(), ActuatorError> {
        SIM_RELAY.store(high, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
pub use sim::{adc1_read, fail_next_adc_read, gpio_write, relay_level, set_adc_raw};
