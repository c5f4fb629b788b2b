//! A device abstraction for PCA9685-class 16-channel PWM controllers.
//!
//! The controller talks to the chip through any [`embedded_hal::i2c::I2c`] bus and waits
//! for the oscillator through any [`embedded_hal::delay::DelayNs`]. See [`PwmController`]
//! for usage examples.

pub mod register;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{Error, Result};

/// Default 7-bit I2C address of the chip (all address pins low).
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Frequency programmed during initialization (Hz).
pub const DEFAULT_FREQUENCY_HZ: f64 = 50.0;

const OSCILLATOR_HZ: f64 = 25_000_000.0; // 25 MHz
const COUNTS_PER_PERIOD: f64 = 4096.0; // 12-bit
const MAX_COUNT: u16 = 4095;
const CHANNEL_COUNT: u8 = 16;
const PRESCALE_MIN: u8 = 3;
const MICROS_PER_SECOND: f64 = 1_000_000.0;
const OSCILLATOR_SETTLE_MS: u32 = 5;

/// Empirical corrections for oscillator drift on common PCA9685 boards.
///
/// The requested frequency is mapped to `hz * frequency_scale + frequency_offset`
/// before the prescale is computed, and pulse widths are multiplied by
/// `pulse_width_scale` before they are turned into counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Multiplier applied to a requested frequency.
    pub frequency_scale: f64,
    /// Offset (Hz) added after scaling.
    pub frequency_offset: f64,
    /// Multiplier applied to a requested pulse width.
    pub pulse_width_scale: f64,
}

impl Calibration {
    /// Constants measured on the reference shield.
    pub const DEFAULT: Self = Self {
        frequency_scale: 0.895,
        frequency_offset: 0.325,
        pulse_width_scale: 1.113,
    };

    /// No correction: requested values go to the chip as-is.
    pub const IDENTITY: Self = Self {
        frequency_scale: 1.0,
        frequency_offset: 0.0,
        pulse_width_scale: 1.0,
    };

    /// The frequency the controller programs (and remembers) for a request of `hz`.
    #[must_use]
    pub fn effective_frequency(&self, hz: f64) -> f64 {
        hz * self.frequency_scale + self.frequency_offset
    }

    /// All constants finite and both scales positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.frequency_scale.is_finite()
            && self.frequency_scale > 0.0
            && self.frequency_offset.is_finite()
            && self.pulse_width_scale.is_finite()
            && self.pulse_width_scale > 0.0
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Construction-time settings for a [`PwmController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmControllerConfig {
    /// 7-bit I2C address, [`DEFAULT_ADDRESS`] unless the address pins are strapped.
    pub address: u8,
    /// Log every channel write and pulse-width request at `info` level.
    ///
    /// Output needs the `log` or `defmt` feature; without either the flag has no effect.
    pub debug: bool,
    /// Oscillator and pulse-width corrections.
    pub calibration: Calibration,
}

impl Default for PwmControllerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            debug: false,
            calibration: Calibration::DEFAULT,
        }
    }
}

/// Prescale register value for an (already calibrated) output frequency.
///
/// Computes `round(25 MHz / (4096 * effective_hz) - 1)`. Returns `None` when the
/// frequency is not positive or the result falls outside the chip's `3..=255` range.
#[must_use]
pub fn prescale_for_frequency(effective_hz: f64) -> Option<u8> {
    if !(effective_hz.is_finite() && effective_hz > 0.0) {
        return None;
    }
    let prescale = libm::round(OSCILLATOR_HZ / (COUNTS_PER_PERIOD * effective_hz) - 1.0);
    if prescale < f64::from(PRESCALE_MIN) || prescale > f64::from(u8::MAX) {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "range checked above"
    )]
    let prescale = prescale as u8;
    Some(prescale)
}

/// A device abstraction for a PCA9685-class PWM controller.
///
/// Construction resets every channel, wakes the oscillator and programs
/// [`DEFAULT_FREQUENCY_HZ`]. All operations block on the bus; a failed transaction
/// is returned as [`Error::I2c`] and never retried. Inputs are validated before any
/// bus traffic.
///
/// Several controllers can share one bus through `embedded-hal-bus` devices.
///
/// # Examples
/// ```rust,no_run
/// use embedded_hal::{delay::DelayNs, i2c::I2c};
/// use pwm_shield::{PwmController, Result};
///
/// fn example<I2C: I2c, D: DelayNs>(i2c: I2C, delay: D) -> Result<(), I2C::Error> {
///     let mut pwm = PwmController::new(i2c, delay)?;
///
///     pwm.set_frequency(60.0)?;            // Reprogram the prescaler
///     pwm.set_duty_cycle(0, 25.0)?;        // Channel 0 high for a quarter period
///     pwm.set_pulse_width_us(1, 1_500.0)?; // Channel 1: 1.5 ms servo pulse
///     pwm.set_pwm(2, 0, 2048)?;            // Channel 2: raw on/off counts
///     pwm.reset()?;                        // Every channel back to (0, 0)
///     Ok(())
/// }
/// ```
pub struct PwmController<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    debug: bool,
    calibration: Calibration,
    frequency: f64, // effective Hz, calibration applied
}

impl<I2C: I2c, D: DelayNs> PwmController<I2C, D> {
    /// Initialize the chip at [`DEFAULT_ADDRESS`] with default calibration.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::I2c`] if the chip does not acknowledge a transaction.
    pub fn new(i2c: I2C, delay: D) -> Result<Self, I2C::Error> {
        Self::with_config(i2c, delay, PwmControllerConfig::default())
    }

    /// Initialize the chip with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCalibration`] (before any bus traffic) if the calibration
    /// has a non-finite constant or a non-positive scale, or [`Error::I2c`] if the chip
    /// does not acknowledge a transaction.
    pub fn with_config(i2c: I2C, delay: D, config: PwmControllerConfig) -> Result<Self, I2C::Error> {
        if !config.calibration.is_valid() {
            return Err(Error::InvalidCalibration);
        }
        let mut controller = Self {
            i2c,
            delay,
            address: config.address,
            debug: config.debug,
            calibration: config.calibration,
            frequency: DEFAULT_FREQUENCY_HZ,
        };
        controller.init()?;
        Ok(controller)
    }

    fn init(&mut self) -> Result<(), I2C::Error> {
        self.reset()?;
        self.write_register(register::MODE2, register::OUTDRV)?;
        self.write_register(register::MODE1, register::ALLCALL)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS);

        // Wake up: clear SLEEP.
        let mode1 = self.read_register(register::MODE1)? & !register::SLEEP;
        self.write_register(register::MODE1, mode1)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS);

        info!("pca9685 at {} awake", self.address);
        self.set_frequency(DEFAULT_FREQUENCY_HZ)
    }

    /// Set every channel's on and off counts to zero in one operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::I2c`] if a register write fails.
    pub fn reset(&mut self) -> Result<(), I2C::Error> {
        self.set_all_pwm(0, 0)
    }

    /// Write the same on/off counts to all 16 channels through the ALL_LED registers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCount`] if a count exceeds 4095, or [`Error::I2c`] if a
    /// register write fails.
    pub fn set_all_pwm(&mut self, on: u16, off: u16) -> Result<(), I2C::Error> {
        check_count(on)?;
        check_count(off)?;
        self.write_counts(register::ALL_LED_ON_L, on, off)
    }

    /// Reprogram the oscillator prescaler for a requested frequency.
    ///
    /// The request is calibrated first and the calibrated value becomes
    /// [`frequency`](Self::frequency). The chip sleeps while the prescaler is written
    /// and is restarted afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrequency`] if `hz` is not positive or needs a prescale
    /// outside `3..=255`, or [`Error::I2c`] if a transaction fails.
    pub fn set_frequency(&mut self, hz: f64) -> Result<(), I2C::Error> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(Error::InvalidFrequency(hz));
        }
        let effective_hz = self.calibration.effective_frequency(hz);
        let prescale = prescale_for_frequency(effective_hz).ok_or(Error::InvalidFrequency(hz))?;
        debug!(
            "pca9685 set_frequency({}) -> {} Hz, prescale {}",
            hz, effective_hz, prescale
        );

        let old_mode = self.read_register(register::MODE1)?;
        let sleep_mode = (old_mode & !register::RESTART) | register::SLEEP;
        self.write_register(register::MODE1, sleep_mode)?;
        self.write_register(register::PRESCALE, prescale)?;
        // The chip holds the new prescale from here on.
        self.frequency = effective_hz;
        self.write_register(register::MODE1, old_mode)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS);
        self.write_register(register::MODE1, old_mode | register::RESTART)
    }

    /// Set the PWM period in microseconds. Same as `set_frequency(1_000_000 / period_us)`.
    ///
    /// # Errors
    ///
    /// See [`set_frequency`](Self::set_frequency).
    pub fn set_period(&mut self, period_us: f64) -> Result<(), I2C::Error> {
        self.set_frequency(MICROS_PER_SECOND / period_us)
    }

    /// Write raw on/off counts for one channel.
    ///
    /// The output rises at count `on` and falls at count `off` within each period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] for channels above 15, [`Error::InvalidCount`]
    /// for counts above 4095, or [`Error::I2c`] if a register write fails.
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), I2C::Error> {
        check_channel(channel)?;
        check_count(on)?;
        check_count(off)?;
        if self.debug {
            info!("On: {} Off: {} Channel: {}", on, off, channel);
        }
        self.write_counts(register::channel_base(channel), on, off)
    }

    /// Drive `channel` high for `length_us` microseconds at the start of every period.
    ///
    /// The off count saturates at 4095 when the pulse is longer than the period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPulseWidth`] for negative or non-finite lengths,
    /// [`Error::InvalidChannel`] for channels above 15, or [`Error::I2c`] if a register
    /// write fails.
    pub fn set_pulse_width_us(&mut self, channel: u8, length_us: f64) -> Result<(), I2C::Error> {
        check_channel(channel)?;
        if !(length_us.is_finite() && length_us >= 0.0) {
            return Err(Error::InvalidPulseWidth(length_us));
        }
        if self.debug {
            info!("PWM pulse length: {} us", length_us);
        }
        let off = self.off_count(length_us);
        self.set_pwm(channel, 0, off)
    }

    /// Drive `channel` high for `percent` of every period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDutyCycle`] if `percent` is outside `0..=100`,
    /// [`Error::InvalidChannel`] for channels above 15, or [`Error::I2c`] if a register
    /// write fails.
    pub fn set_duty_cycle(&mut self, channel: u8, percent: f64) -> Result<(), I2C::Error> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(Error::InvalidDutyCycle(percent));
        }
        let pulse_us = percent * 10_000.0 / self.frequency;
        self.set_pulse_width_us(channel, pulse_us)
    }

    /// Current operating frequency in Hz, calibration applied.
    #[must_use]
    pub const fn frequency(&self) -> f64 {
        self.frequency
    }

    /// 7-bit I2C address of the chip.
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Calibration in use.
    #[must_use]
    pub const fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Whether per-call diagnostic logging is on.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// Give back the bus and delay. The chip keeps running with its last settings.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn off_count(&self, length_us: f64) -> u16 {
        let scaled_us = length_us * self.calibration.pulse_width_scale;
        let counts = libm::floor(COUNTS_PER_PERIOD * scaled_us * self.frequency / MICROS_PER_SECOND);
        // 4096 and up would set the full-off bit in OFF_H.
        if counts >= f64::from(MAX_COUNT) {
            return MAX_COUNT;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "below MAX_COUNT; negatives saturate to 0"
        )]
        let counts = counts as u16;
        counts
    }

    fn write_counts(&mut self, base: u8, on: u16, off: u16) -> Result<(), I2C::Error> {
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        self.write_register(base, on_l)?;
        self.write_register(base + 1, on_h)?;
        self.write_register(base + 2, off_l)?;
        self.write_register(base + 3, off_h)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut buffer = [0_u8];
        self.i2c
            .write_read(self.address, &[register], &mut buffer)
            .map_err(Error::I2c)?;
        let [value] = buffer;
        trace!("pca9685 read {} -> {}", register, value);
        Ok(value)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        trace!("pca9685 write {} <- {}", register, value);
        self.i2c
            .write(self.address, &[register, value])
            .map_err(Error::I2c)
    }
}

pub(crate) fn check_channel<E>(channel: u8) -> Result<(), E> {
    if channel < CHANNEL_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidChannel(channel))
    }
}

fn check_count<E>(count: u16) -> Result<(), E> {
    if count <= MAX_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidCount(count))
    }
}
