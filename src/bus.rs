//! Bus access for the compensation driver.
//!
//! [`BusTransport`] is the only place the crate touches physical I/O.
//! [`I2cTransport`] implements it on top of `embedded-hal`; tests and
//! simulators can supply their own implementation instead.

use core::fmt::Debug;

use embedded_hal::{delay::DelayNs, i2c};
use log::trace;

/// Largest payload accepted by a single [`I2cTransport::write`].
pub const MAX_WRITE_LEN: usize = 40;

/// Register read/write and delay primitives used by the compensation driver.
pub trait BusTransport {
    type Error: Debug;

    /// Writes `register`, then reads `buffer.len()` bytes from `address`.
    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `register` followed by `data` to `address` in a single transaction.
    fn write(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Blocks for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// A transport bound to one device address.
///
/// This is what the compensation driver sees: register reads and writes on
/// the sensor, without caring which address it lives at.
#[derive(Debug)]
pub struct Device<B> {
    bus: B,
    address: u8,
}

impl<B: BusTransport> Device<B> {
    pub fn new(bus: B, address: u8) -> Self {
        Device { bus, address }
    }

    /// 7-bit I2C address of the sensor.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Reads data from a starting register address into `buffer`.
    pub fn read_regs(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), B::Error> {
        self.bus.read(self.address, register, buffer)
    }

    /// Writes `data` starting at `register`.
    pub fn write_regs(&mut self, register: u8, data: &[u8]) -> Result<(), B::Error> {
        self.bus.write(self.address, register, data)
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.bus.delay_ms(ms);
    }

    /// Hands back the transport.
    pub fn release(self) -> B {
        self.bus
    }
}

/// Errors raised by [`I2cTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError<E> {
    /// I2C bus error.
    I2c(E),
    /// Write payload exceeds [`MAX_WRITE_LEN`].
    PayloadTooLong,
}

/// [`BusTransport`] over an `embedded-hal` I2C bus and delay provider.
#[derive(Debug)]
pub struct I2cTransport<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D> I2cTransport<I2C, D>
where
    I2C: i2c::I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        I2cTransport { i2c, delay }
    }

    /// Hands back the I2C bus and the delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> BusTransport for I2cTransport<I2C, D>
where
    I2C: i2c::I2c,
    D: DelayNs,
{
    type Error = TransportError<I2C::Error>;

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let result = self
            .i2c
            .write_read(address, &[register], buffer)
            .map_err(TransportError::I2c);

        trace!(
            "[{:#04x}] I2C ${:02X} => {:02X?} [ok: {}, len: {}]",
            address,
            register,
            buffer,
            result.is_ok(),
            buffer.len()
        );

        result
    }

    fn write(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        if data.len() > MAX_WRITE_LEN {
            return Err(TransportError::PayloadTooLong);
        }

        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        frame[0] = register;
        frame[1..=data.len()].copy_from_slice(data);

        let result = self
            .i2c
            .write(address, &frame[..=data.len()])
            .map_err(TransportError::I2c);

        trace!(
            "[{:#04x}] I2C ${:02X} <= {:02X?} [ok: {}, len: {}]",
            address,
            register,
            data,
            result.is_ok(),
            data.len()
        );

        result
    }

    fn delay_ms(&mut self, ms: u32) {
        trace!(" * wait {} ms", ms);
        self.delay.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = 0x77;

    #[test]
    fn read_writes_register_then_reads() {
        let expectations = [Transaction::write_read(ADDR, vec![0xD0], vec![0x61])];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), NoopDelay::new());

        let mut buffer = [0u8; 1];
        transport.read(ADDR, 0xD0, &mut buffer).unwrap();
        assert_eq!(buffer, [0x61]);

        let (mut i2c, _) = transport.release();
        i2c.done();
    }

    #[test]
    fn write_prefixes_register_in_one_transaction() {
        let expectations = [Transaction::write(ADDR, vec![0x72, 0x02])];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), NoopDelay::new());

        transport.write(ADDR, 0x72, &[0x02]).unwrap();

        let (mut i2c, _) = transport.release();
        i2c.done();
    }

    #[test]
    fn bus_errors_are_reported() {
        let expectations =
            [Transaction::write(ADDR, vec![0x74, 0x01]).with_error(ErrorKind::Other)];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), NoopDelay::new());

        assert_eq!(
            transport.write(ADDR, 0x74, &[0x01]),
            Err(TransportError::I2c(ErrorKind::Other))
        );

        let (mut i2c, _) = transport.release();
        i2c.done();
    }

    #[test]
    fn oversized_write_never_reaches_the_bus() {
        let mut transport = I2cTransport::new(I2cMock::new(&[]), NoopDelay::new());

        let payload = [0u8; MAX_WRITE_LEN + 1];
        assert_eq!(
            transport.write(ADDR, 0x50, &payload),
            Err(TransportError::PayloadTooLong)
        );

        let (mut i2c, _) = transport.release();
        i2c.done();
    }

    #[test]
    fn device_binds_its_address() {
        let expectations = [
            Transaction::write_read(0x76, vec![0x1D], vec![0x80, 0x00]),
            Transaction::write(0x76, vec![0x71, 0x10]),
        ];
        let transport = I2cTransport::new(I2cMock::new(&expectations), NoopDelay::new());
        let mut device = Device::new(transport, 0x76);

        let mut status = [0u8; 2];
        device.read_regs(0x1D, &mut status).unwrap();
        device.write_regs(0x71, &[0x10]).unwrap();
        device.delay_ms(5);
        assert_eq!(device.address(), 0x76);

        let (mut i2c, _) = device.release().release();
        i2c.done();
    }
}
