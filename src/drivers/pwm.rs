//! PWM channel driver.
//!
//! Maps a duty value (counts against `1 << resolution_bits`) onto a
//! hardware signal generator.  No timing behaviour of its own: a write is
//! committed immediately and a failure is returned to the caller, who
//! decides whether to retry.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`LedcChannel`] programs one LEDC timer + channel pair via
//! raw sys calls.
//! On host/test: [`LedcChannel`] tracks configuration and duty in memory,
//! still enforcing configure-before-write.
//!
//! [`HalChannel`] is the board-integration hook for outputs not on LEDC:
//! it adapts any `embedded-hal` 1.0 PWM output whose HAL already owns the
//! timer setup.  The stock firmware image builds only [`LedcChannel`]s.

use embedded_hal::pwm::SetDutyCycle;
use log::{debug, info, warn};

use crate::error::{Error, Result, RC_SOFTWARE};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Hardware parameters of one PWM output.  Immutable once configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmChannelConfig {
    pub gpio: i32,
    pub channel: u32,
    pub timer: u32,
    pub frequency_hz: u32,
    pub resolution_bits: u32,
}

impl PwmChannelConfig {
    /// Duty count equal to 100 %.  0 when the resolution does not fit.
    pub const fn full_scale(&self) -> u32 {
        match 1u32.checked_shl(self.resolution_bits) {
            Some(fs) => fs,
            None => 0,
        }
    }

    /// Length of one PWM period in microseconds.  0 for a 0 Hz config.
    pub const fn period_us(&self) -> u32 {
        match 1_000_000u32.checked_div(self.frequency_hz) {
            Some(p) => p,
            None => 0,
        }
    }
}

/// One PWM output owned exclusively by the driver that configured it.
pub trait PwmChannel: Send {
    /// One-time timer/channel setup.  Calling again after success returns
    /// `Ok` without reprogramming the hardware.
    fn configure(&mut self, config: &PwmChannelConfig) -> Result<()>;

    /// Set and commit a duty value.  Fails with [`Error::HardwareWrite`]
    /// when the channel has not been configured.
    fn write_duty(&mut self, duty: u32) -> Result<()>;

    /// Stop the output and hold it low.  No-op if never configured.
    fn release(&mut self);

    fn is_configured(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// LEDC
// ───────────────────────────────────────────────────────────────

/// ESP32 LEDC-backed PWM output.
#[derive(Debug, Default)]
pub struct LedcChannel {
    config: Option<PwmChannelConfig>,
    duty: u32,
}

impl LedcChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last duty committed to the hardware.
    pub fn duty(&self) -> u32 {
        self.duty
    }

    pub fn config(&self) -> Option<&PwmChannelConfig> {
        self.config.as_ref()
    }
}

#[cfg(target_os = "espidf")]
impl LedcChannel {
    fn program(cfg: &PwmChannelConfig) -> Result<()> {
        let timer = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: cfg.timer,
            duty_resolution: cfg.resolution_bits,
            freq_hz: cfg.frequency_hz,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        // SAFETY: configuration structs live on the stack for the duration
        // of the call; LEDC copies them into its own registers.
        let ret = unsafe { ledc_timer_config(&timer) };
        if ret != ESP_OK as i32 {
            return Err(Error::HardwareConfig(ret));
        }

        let channel = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: cfg.channel,
            timer_sel: cfg.timer,
            gpio_num: cfg.gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        let ret = unsafe { ledc_channel_config(&channel) };
        if ret != ESP_OK as i32 {
            return Err(Error::HardwareConfig(ret));
        }
        Ok(())
    }

    fn commit(cfg: &PwmChannelConfig, duty: u32) -> Result<()> {
        // SAFETY: channel was configured in `program()`; the owning driver
        // serialises writes, so set/update pairs never interleave.
        let ret = unsafe { ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, cfg.channel, duty) };
        if ret != ESP_OK as i32 {
            log::error!("ledc ch{}: set_duty failed (rc={})", cfg.channel, ret);
            return Err(Error::HardwareWrite(ret));
        }
        let ret = unsafe { ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, cfg.channel) };
        if ret != ESP_OK as i32 {
            log::error!("ledc ch{}: update_duty failed (rc={})", cfg.channel, ret);
            return Err(Error::HardwareWrite(ret));
        }
        Ok(())
    }

    fn stop(cfg: &PwmChannelConfig) {
        // SAFETY: stopping a configured channel with idle level 0.
        let ret = unsafe { ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, cfg.channel, 0) };
        if ret != ESP_OK as i32 {
            log::warn!("ledc ch{}: stop failed (rc={})", cfg.channel, ret);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl LedcChannel {
    fn program(_cfg: &PwmChannelConfig) -> Result<()> {
        Ok(())
    }

    fn commit(_cfg: &PwmChannelConfig, _duty: u32) -> Result<()> {
        Ok(())
    }

    fn stop(_cfg: &PwmChannelConfig) {}
}

impl PwmChannel for LedcChannel {
    fn configure(&mut self, config: &PwmChannelConfig) -> Result<()> {
        if self.config.is_some() {
            return Ok(());
        }
        if config.frequency_hz == 0 || !(1..=20).contains(&config.resolution_bits) {
            return Err(Error::HardwareConfig(RC_SOFTWARE));
        }
        Self::program(config)?;
        self.config = Some(*config);
        info!(
            "ledc: gpio {} on ch{} / timer{} ({} Hz, {}-bit)",
            config.gpio, config.channel, config.timer, config.frequency_hz, config.resolution_bits
        );
        Ok(())
    }

    fn write_duty(&mut self, duty: u32) -> Result<()> {
        let Some(cfg) = self.config else {
            return Err(Error::HardwareWrite(RC_SOFTWARE));
        };
        let duty = duty.min(cfg.full_scale());
        Self::commit(&cfg, duty)?;
        self.duty = duty;
        debug!("ledc ch{}: duty={}", cfg.channel, duty);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(cfg) = self.config.take() {
            Self::stop(&cfg);
            self.duty = 0;
            info!("ledc ch{}: released", cfg.channel);
        }
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// embedded-hal bridge
// ───────────────────────────────────────────────────────────────

/// Wraps an `embedded-hal` PWM output whose frequency is fixed by the HAL.
///
/// Duty values are given against the configured `full_scale()` and are
/// rescaled to the HAL's `max_duty_cycle()` on every write.
pub struct HalChannel<P> {
    pwm: P,
    full_scale: Option<u32>,
}

impl<P: SetDutyCycle> HalChannel<P> {
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            full_scale: None,
        }
    }

    pub fn inner(&self) -> &P {
        &self.pwm
    }
}

impl<P: SetDutyCycle + Send> PwmChannel for HalChannel<P> {
    fn configure(&mut self, config: &PwmChannelConfig) -> Result<()> {
        if self.full_scale.is_some() {
            return Ok(());
        }
        if self.pwm.max_duty_cycle() == 0 || !(1..=20).contains(&config.resolution_bits) {
            return Err(Error::HardwareConfig(RC_SOFTWARE));
        }
        self.full_scale = Some(config.full_scale());
        info!(
            "hal pwm: gpio {} bound (max duty {}, {}-bit requested)",
            config.gpio,
            self.pwm.max_duty_cycle(),
            config.resolution_bits
        );
        Ok(())
    }

    fn write_duty(&mut self, duty: u32) -> Result<()> {
        let Some(full_scale) = self.full_scale else {
            return Err(Error::HardwareWrite(RC_SOFTWARE));
        };
        let max = u64::from(self.pwm.max_duty_cycle());
        let scaled = u64::from(duty.min(full_scale)) * max / u64::from(full_scale);
        self.pwm
            .set_duty_cycle(scaled as u16)
            .map_err(|_| Error::HardwareWrite(RC_SOFTWARE))
    }

    fn release(&mut self) {
        if self.full_scale.take().is_some() && self.pwm.set_duty_cycle_fully_off().is_err() {
            warn!("hal pwm: release failed to drive output low");
        }
    }

    fn is_configured(&self) -> bool {
        self.full_scale.is_some()
    }
}
