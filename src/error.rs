use derive_more::Display;

/// A specialized [`Result`](core::result::Result) where the error is this crate's [`Error`].
///
/// `E` is the error type of the I2C bus.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Errors returned by the controller and the devices built on it.
///
/// Only [`Error::I2c`] comes from the hardware. Every other variant is raised
/// before any bus traffic, so a rejected call leaves the chip untouched.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum Error<E> {
    /// An I2C transaction failed (device absent, NACK, or a transport fault).
    #[display("I2C transaction failed: {_0:?}")]
    I2c(E),
    /// Channel number outside `0..=15`.
    #[display("channel {_0} is out of range (0..=15)")]
    InvalidChannel(u8),
    /// On or off count above the 12-bit maximum of 4095.
    #[display("count {_0} exceeds 4095")]
    InvalidCount(u16),
    /// Requested frequency (Hz) is not positive or has no prescale in `3..=255`.
    #[display("frequency {_0} Hz cannot be produced by the prescaler")]
    InvalidFrequency(f64),
    /// Pulse width (µs) is negative or not finite.
    #[display("pulse width {_0} us is invalid")]
    InvalidPulseWidth(f64),
    /// Duty cycle outside `0..=100` percent.
    #[display("duty cycle {_0}% is out of range (0..=100)")]
    InvalidDutyCycle(f64),
    /// Calibration constant not finite, or a scale not positive.
    #[display("calibration constants must be finite with positive scales")]
    InvalidCalibration,
    /// Servo angle above 180 degrees.
    #[display("angle {_0} degrees is out of range (0..=180)")]
    InvalidAngle(u16),
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}
