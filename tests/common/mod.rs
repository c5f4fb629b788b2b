//! Recording fakes for host-level tests.
//!
//! [`FakeBus`] emulates the chip's register file per address and [`FakeDelay`] records
//! waits. Both append to one shared [`Log`] so tests can assert the literal order of
//! register traffic and oscillator waits.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use pwm_shield::{DEFAULT_ADDRESS, PwmController, register};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write { address: u8, register: u8, value: u8 },
    Read { address: u8, register: u8 },
    Delay { ns: u32 },
}

pub type Log = Rc<RefCell<Vec<Event>>>;

// MODE1 after power-on: SLEEP | ALLCALL.
const MODE1_POWER_ON: u8 = 0x11;

pub struct FakeBus {
    log: Log,
    chips: HashMap<u8, [u8; 256]>,
    fail_after: Option<usize>,
    transactions: usize,
}

impl FakeBus {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            chips: HashMap::new(),
            fail_after: None,
            transactions: 0,
        }
    }

    /// NACK every transaction after the first `count`.
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.chips
            .get(&address)
            .map_or(0, |registers| registers[usize::from(register)])
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail_after.is_some_and(|limit| self.transactions >= limit) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        self.transactions += 1;

        let registers = self.chips.entry(address).or_insert_with(|| {
            let mut registers = [0_u8; 256];
            registers[usize::from(register::MODE1)] = MODE1_POWER_ON;
            registers
        });
        let mut pointer = 0_u8;
        let mut log = self.log.borrow_mut();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&first, values)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = first;
                    for &value in values {
                        registers[usize::from(pointer)] = value;
                        log.push(Event::Write {
                            address,
                            register: pointer,
                            value,
                        });
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = registers[usize::from(pointer)];
                        log.push(Event::Read {
                            address,
                            register: pointer,
                        });
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeDelay {
    log: Log,
}

impl FakeDelay {
    pub fn new(log: Log) -> Self {
        Self { log }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Event::Delay { ns });
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms * 1_000_000);
    }
}

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// A controller on a fresh fake bus, with the initialization traffic cleared from the log.
pub fn initialized() -> (PwmController<FakeBus, FakeDelay>, Log) {
    let log = new_log();
    let controller = PwmController::new(FakeBus::new(log.clone()), FakeDelay::new(log.clone()))
        .expect("fake bus always acknowledges");
    log.borrow_mut().clear();
    (controller, log)
}

pub fn take(log: &Log) -> Vec<Event> {
    std::mem::take(&mut *log.borrow_mut())
}

pub const fn write(register: u8, value: u8) -> Event {
    Event::Write {
        address: DEFAULT_ADDRESS,
        register,
        value,
    }
}

pub const fn read(register: u8) -> Event {
    Event::Read {
        address: DEFAULT_ADDRESS,
        register,
    }
}

pub const OSCILLATOR_WAIT: Event = Event::Delay { ns: 5_000_000 };

/// The four writes `set_pwm(channel, on, off)` must produce.
pub fn channel_writes(channel: u8, on: u16, off: u16) -> Vec<Event> {
    let base = register::LED0_ON_L + 4 * channel;
    vec![
        write(base, (on & 0xFF) as u8),
        write(base + 1, (on >> 8) as u8),
        write(base + 2, (off & 0xFF) as u8),
        write(base + 3, (off >> 8) as u8),
    ]
}

/// Prescale byte for a requested frequency under the default calibration.
pub fn expected_prescale(hz: f64) -> u8 {
    (25_000_000.0 / (4096.0 * (hz * 0.895 + 0.325)) - 1.0).round() as u8
}

/// Off count for a pulse under the default calibration at `frequency` (effective Hz).
pub fn expected_off_count(length_us: f64, frequency: f64) -> u16 {
    (4096.0 * (length_us * 1.113) * frequency / 1_000_000.0).floor() as u16
}

/// The full `set_frequency` sequence starting from MODE1 = `old_mode`.
pub fn frequency_writes(old_mode: u8, prescale: u8) -> Vec<Event> {
    vec![
        read(register::MODE1),
        write(register::MODE1, (old_mode & 0x7F) | register::SLEEP),
        write(register::PRESCALE, prescale),
        write(register::MODE1, old_mode),
        OSCILLATOR_WAIT,
        write(register::MODE1, old_mode | register::RESTART),
    ]
}
