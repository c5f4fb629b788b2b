//! Sweep a servo on channel 0 of a PWM shield attached to `/dev/i2c-1`.
//!
//! Run on the board with `cargo run --features linux --bin demo_servo_sweep`.

use std::error::Error;
use std::thread::sleep;
use std::time::Duration;

use linux_embedded_hal::{Delay, I2cdev};
use pwm_shield::{PwmController, PwmControllerConfig, servo::Servo};

const I2C_BUS: &str = "/dev/i2c-1";
const SERVO_CHANNEL: u8 = 0;
const LED_CHANNEL: u8 = 15;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_module("pwm_shield", log::LevelFilter::Info)
        .init();

    let i2c = I2cdev::new(I2C_BUS)?;
    let config = PwmControllerConfig {
        debug: true,
        ..PwmControllerConfig::default()
    };
    let mut pwm = PwmController::with_config(i2c, Delay, config)?;
    println!("PWM shield ready at {:#04x}, {:.3} Hz", pwm.address(), pwm.frequency());

    // An LED on the last channel at a quarter brightness.
    pwm.set_duty_cycle(LED_CHANNEL, 25.0)?;

    let mut servo = Servo::new(&mut pwm, SERVO_CHANNEL)?;
    servo.set_degrees(0)?;
    sleep(Duration::from_millis(400));
    servo.set_degrees(180)?;
    sleep(Duration::from_millis(400));
    servo.center()?;

    // Loop by 10 degrees. Include 180 degrees.
    for degrees in (0..=180).step_by(10).chain((0..=180).rev().step_by(10)) {
        servo.set_degrees(degrees)?;
        sleep(Duration::from_millis(100));
    }
    servo.disable()?;

    pwm.reset()?;
    Ok(())
}
