//! Interface to the register-level compensation driver.
//!
//! The driver turns raw register contents into compensated values. It owns
//! calibration data and heater math. The session only tells it what to do
//! and when, and talks to the bus through the [`Device`] it hands over.

use core::fmt::Debug;

use crate::bus::{BusTransport, Device};
use crate::settings::{ChannelConfig, Milliseconds, SettingsSelect};

/// Status bits in [`FieldData::status`].
pub mod status {
    /// New data is available.
    pub const NEW_DATA: u8 = 0x80;
    /// The gas conversion produced a valid reading.
    pub const GAS_VALID: u8 = 0x20;
    /// The heater plate reached its target temperature.
    pub const HEAT_STAB: u8 = 0x10;
}

/// Operating mode of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerMode {
    /// Single-shot measurement. The sensor returns to sleep afterwards.
    Forced = 1,
}

/// Compensated measurement as produced by the driver.
///
/// - **Temperature**: Centigrade (°C * 100), 2350 = 23.50 °C
/// - **Pressure**: Pascal
/// - **Humidity**: Milli-percent (%RH * 1000), 45123 = 45.123 %
/// - **Gas Resistance**: Ohms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldData {
    pub temperature: i16,
    pub pressure: u32,
    pub humidity: u32,
    pub gas_resistance: u32,
    /// Bitmask of [`status`] flags.
    pub status: u8,
}

impl FieldData {
    /// Whether the heater plate was stable during the gas conversion.
    pub fn heater_stable(&self) -> bool {
        self.status & status::HEAT_STAB != 0
    }
}

/// A register-level BME680 driver that performs the compensation.
///
/// Any `Err` is treated as a failed step; the session does not look
/// inside it beyond logging.
pub trait CompensationDriver {
    type Error: Debug;

    /// Resets the sensor, checks the chip id and loads calibration data.
    fn init<B: BusTransport>(&mut self, dev: &mut Device<B>) -> Result<(), Self::Error>;

    /// Writes the settings groups named in `select` from `config`.
    ///
    /// `mode` is the power mode that will be triggered next; some settings
    /// depend on it.
    fn set_sensor_settings<B: BusTransport>(
        &mut self,
        dev: &mut Device<B>,
        select: SettingsSelect,
        config: &ChannelConfig,
        mode: PowerMode,
    ) -> Result<(), Self::Error>;

    /// Writes the power mode, which starts a conversion in forced mode.
    fn set_sensor_mode<B: BusTransport>(
        &mut self,
        dev: &mut Device<B>,
        mode: PowerMode,
    ) -> Result<(), Self::Error>;

    /// Total duration of one measurement cycle for `config`, heater time included.
    fn profile_duration(&self, config: &ChannelConfig) -> Milliseconds;

    /// Reads and compensates the latest measurement.
    fn get_sensor_data<B: BusTransport>(
        &mut self,
        dev: &mut Device<B>,
    ) -> Result<FieldData, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heater_stable_reads_status_bit() {
        let mut data = FieldData::default();
        assert!(!data.heater_stable());

        data.status = status::NEW_DATA | status::GAS_VALID;
        assert!(!data.heater_stable());

        data.status |= status::HEAT_STAB;
        assert!(data.heater_stable());
    }
}
