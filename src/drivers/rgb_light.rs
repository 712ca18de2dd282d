//! RGB indicator light driver.
//!
//! Three PWM channels drive a discrete common-cathode RGB LED, one channel
//! per colour at 8-bit resolution so a colour byte maps straight to duty.
//!
//! The stored colour and the physical output are decoupled by the `on`
//! flag: colour may be changed while off and is only applied on the next
//! [`IndicatorLight::turn_on`].  While off, all three channels are held
//! at zero duty.
//!
//! Writes across the three channels are not atomic.  Red is committed
//! before green, green before blue; the first failing channel is reported
//! and channels already written keep their new duty.

use log::{debug, info};

use crate::config::LightConfig;
use crate::drivers::pwm::PwmChannel;
use crate::error::Result;

const RED: usize = 0;
const GREEN: usize = 1;
const BLUE: usize = 2;

pub struct IndicatorLight<P: PwmChannel> {
    channels: [P; 3],
    config: LightConfig,
    on: bool,
    color: (u8, u8, u8),
}

impl<P: PwmChannel> IndicatorLight<P> {
    /// Channels in red, green, blue order.  Starts off and black.
    pub fn new(channels: [P; 3], config: LightConfig) -> Self {
        Self {
            channels,
            config,
            on: false,
            color: (0, 0, 0),
        }
    }

    /// Configure all three channels, then force the output dark.
    pub fn initialize(&mut self) -> Result<()> {
        for (ch, cfg) in self.channels.iter_mut().zip(self.config.pwm_channels()) {
            ch.configure(&cfg)?;
        }
        info!(
            "rgb: initialized on gpio {}/{}/{}",
            self.config.gpio[RED], self.config.gpio[GREEN], self.config.gpio[BLUE]
        );
        self.turn_off()
    }

    /// Store the colour; apply it immediately only while on.
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) -> Result<()> {
        self.color = (r, g, b);
        if self.on {
            self.write(r, g, b)?;
        }
        debug!("rgb: colour ({}, {}, {}) on={}", r, g, b, self.on);
        Ok(())
    }

    pub fn turn_on(&mut self) -> Result<()> {
        self.on = true;
        let (r, g, b) = self.color;
        self.write(r, g, b)
    }

    /// Drive every channel to zero.  All three are attempted even if one
    /// fails; the first failure is returned.
    pub fn turn_off(&mut self) -> Result<()> {
        self.on = false;
        let mut first_err = None;
        for ch in self.channels.iter_mut() {
            if let Err(e) = ch.write_duty(0) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Stored colour, whether or not it is currently shown.
    pub fn color(&self) -> (u8, u8, u8) {
        self.color
    }

    fn write(&mut self, r: u8, g: u8, b: u8) -> Result<()> {
        self.channels[RED].write_duty(u32::from(r))?;
        self.channels[GREEN].write_duty(u32::from(g))?;
        self.channels[BLUE].write_duty(u32::from(b))
    }
}

impl<P: PwmChannel> Drop for IndicatorLight<P> {
    fn drop(&mut self) {
        for ch in self.channels.iter_mut() {
            ch.release();
        }
    }
}
