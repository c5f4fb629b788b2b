//! A device abstraction for hobby servo motors on a PWM controller channel.
//!
//! This module provides a simple interface for positional servos like the SG90
//! wired to one channel of a [`PwmController`]. See [`Servo`] for usage examples.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::pwm_controller::check_channel;
use crate::{Error, PwmController, Result};

/// Default minimum pulse width for hobby servos (microseconds).
pub const SERVO_MIN_US_DEFAULT: u16 = 500;

/// Default maximum pulse width for hobby servos (microseconds).
pub const SERVO_MAX_US_DEFAULT: u16 = 2_500;

const MAX_DEGREES: u16 = 180;

/// A device abstraction for a positional servo on one controller channel.
///
/// The servo borrows the controller, so pulses go out through the controller's
/// calibration and current frequency (50 Hz after construction).
///
/// # Examples
/// ```rust,no_run
/// use embedded_hal::{delay::DelayNs, i2c::I2c};
/// use pwm_shield::{PwmController, Result, servo::Servo};
///
/// fn example<I2C: I2c, D: DelayNs>(i2c: I2C, delay: D) -> Result<(), I2C::Error> {
///     let mut pwm = PwmController::new(i2c, delay)?;
///     let mut servo = Servo::new(&mut pwm, 15)?;
///
///     servo.set_degrees(45)?; // Move to 45 degrees
///     servo.center()?;        // Move to center position
///     servo.disable()?;       // Let the servo relax
///     Ok(())
/// }
/// ```
pub struct Servo<'a, I2C, D> {
    controller: &'a mut PwmController<I2C, D>,
    channel: u8,
    min_us: u16,
    max_us: u16,
}

impl<'a, I2C: I2c, D: DelayNs> Servo<'a, I2C, D> {
    /// Create a servo with the default pulse range.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] for channels above 15.
    pub fn new(controller: &'a mut PwmController<I2C, D>, channel: u8) -> Result<Self, I2C::Error> {
        Self::with_range(controller, channel, SERVO_MIN_US_DEFAULT, SERVO_MAX_US_DEFAULT)
    }

    /// Create a servo whose 0..=180 degree travel maps to `[min_us, max_us]`.
    ///
    /// Nothing is written until the first move.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] for channels above 15.
    ///
    /// # Panics
    ///
    /// Panics if `min_us >= max_us`.
    pub fn with_range(
        controller: &'a mut PwmController<I2C, D>,
        channel: u8,
        min_us: u16,
        max_us: u16,
    ) -> Result<Self, I2C::Error> {
        assert!(min_us < max_us, "min_us must be less than max_us");
        check_channel(channel)?;
        Ok(Self {
            controller,
            channel,
            min_us,
            max_us,
        })
    }

    /// Center (~midpoint of min/max).
    ///
    /// # Errors
    ///
    /// Returns [`Error::I2c`] if a register write fails.
    pub fn center(&mut self) -> Result<(), I2C::Error> {
        self.set_pulse_us(self.min_us + (self.max_us - self.min_us) / 2)
    }

    /// Set position in degrees 0..=180 mapped into [min_us, max_us].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAngle`] above 180 degrees, or [`Error::I2c`] if a
    /// register write fails.
    pub fn set_degrees(&mut self, degrees: u16) -> Result<(), I2C::Error> {
        if degrees > MAX_DEGREES {
            return Err(Error::InvalidAngle(degrees));
        }
        let span = u32::from(self.max_us - self.min_us);
        let us = u32::from(self.min_us) + u32::from(degrees) * span / u32::from(MAX_DEGREES);
        debug!("Servo set_degrees({}) -> {}us", degrees, us);
        self.controller.set_pulse_width_us(self.channel, f64::from(us))
    }

    /// Set raw pulse width in microseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::I2c`] if a register write fails.
    pub fn set_pulse_us(&mut self, us: u16) -> Result<(), I2C::Error> {
        self.controller.set_pulse_width_us(self.channel, f64::from(us))
    }

    /// Stop sending control pulses; the output is held low and the servo can move freely.
    ///
    /// The next move resumes control.
    ///
    /// # Errors
    ///
    /// Returns [`Error::I2c`] if a register write fails.
    pub fn disable(&mut self) -> Result<(), I2C::Error> {
        self.controller.set_pwm(self.channel, 0, 0)
    }

    /// Controller channel driving this servo.
    #[must_use]
    pub fn channel(&self) -> u8 {
        self.channel
    }
}
