//! PCA9685 register map and mode bits.
//!
//! Each channel `n` owns the four registers starting at [`LED0_ON_L`]` + 4 * n`.

/// Mode register 1.
pub const MODE1: u8 = 0x00;
/// Mode register 2.
pub const MODE2: u8 = 0x01;
/// I2C-bus subaddress 1.
pub const SUBADR1: u8 = 0x02;
/// I2C-bus subaddress 2.
pub const SUBADR2: u8 = 0x03;
/// I2C-bus subaddress 3.
pub const SUBADR3: u8 = 0x04;
/// LED All Call I2C-bus address.
pub const ALLCALLADR: u8 = 0x05;

/// Channel 0 on count, low byte.
pub const LED0_ON_L: u8 = 0x06;
/// Channel 0 on count, high nibble.
pub const LED0_ON_H: u8 = 0x07;
/// Channel 0 off count, low byte.
pub const LED0_OFF_L: u8 = 0x08;
/// Channel 0 off count, high nibble.
pub const LED0_OFF_H: u8 = 0x09;

/// All channels on count, low byte.
pub const ALL_LED_ON_L: u8 = 0xFA;
/// All channels on count, high nibble.
pub const ALL_LED_ON_H: u8 = 0xFB;
/// All channels off count, low byte.
pub const ALL_LED_OFF_L: u8 = 0xFC;
/// All channels off count, high nibble.
pub const ALL_LED_OFF_H: u8 = 0xFD;

/// Oscillator prescaler. Writable only while MODE1 has [`SLEEP`] set.
pub const PRESCALE: u8 = 0xFE;

/// Registers per channel.
pub const REGISTERS_PER_CHANNEL: u8 = 4;

// MODE1 bits
/// MODE1: restart PWM channels after sleep.
pub const RESTART: u8 = 0x80;
/// MODE1: low-power mode, oscillator off.
pub const SLEEP: u8 = 0x10;
/// MODE1: respond to the LED All Call address.
pub const ALLCALL: u8 = 0x01;

// MODE2 bits
/// MODE2: invert output logic.
pub const INVRT: u8 = 0x10;
/// MODE2: totem-pole outputs instead of open-drain.
pub const OUTDRV: u8 = 0x04;

/// First of the four registers for `channel`. The caller guarantees `channel < 16`.
#[must_use]
pub const fn channel_base(channel: u8) -> u8 {
    LED0_ON_L + REGISTERS_PER_CHANNEL * channel
}
