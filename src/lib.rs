//! Driver for PCA9685-class 16-channel PWM controllers on an I2C bus.
//!
//! The chip is found on most "servo shields" and "PWM hats" for single-board
//! computers. See [`PwmController`] for usage and [`servo::Servo`] for
//! positional hobby servos.
//!
//! # Glossary
//!
//! - **Prescale:** divisor applied to the chip's 25 MHz internal oscillator to produce the
//!   PWM frequency.
//! - **On/Off count:** 12-bit tick values (0..=4095) within one PWM period marking when the
//!   output rises and falls.
//! - **Duty cycle:** fraction of the PWM period during which the output is high, as a
//!   percentage.
#![cfg_attr(not(test), no_std)]

// Logging macros; must come first so the other modules see them.
#[macro_use]
mod fmt;

mod error;
pub mod pwm_controller;
pub mod servo;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
pub use crate::pwm_controller::{
    Calibration, DEFAULT_ADDRESS, DEFAULT_FREQUENCY_HZ, PwmController, PwmControllerConfig,
    prescale_for_frequency, register,
};
