//! Measurement settings: oversampling, IIR filter and gas heater.

use core::ops::{BitOr, BitOrAssign};

use crate::error::Error;

/// Oversampling setting for temperature, pressure and humidity.
///
/// Higher oversampling rates reduce noise by averaging in hardware, at the
/// cost of a longer conversion and more power per measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement. Disables the channel entirely.
    #[default]
    Skipped = 0,
    /// 1x oversampling.
    X1 = 1,
    /// 2x oversampling.
    X2 = 2,
    /// 4x oversampling.
    X4 = 3,
    /// 8x oversampling.
    X8 = 4,
    /// 16x oversampling. Best precision, longest conversion.
    X16 = 5,
}

impl Oversampling {
    /// Whether a channel with this setting is measured at all.
    pub fn is_enabled(self) -> bool {
        self != Oversampling::Skipped
    }
}

impl TryFrom<u8> for Oversampling {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Oversampling::Skipped),
            1 => Ok(Oversampling::X1),
            2 => Ok(Oversampling::X2),
            3 => Ok(Oversampling::X4),
            4 => Ok(Oversampling::X8),
            5 => Ok(Oversampling::X16),
            _ => Err(Error::InvalidSetting),
        }
    }
}

/// Grouped oversampling settings for the three environmental channels.
///
/// Use `Oversampling::Skipped` to switch off channels the application
/// does not need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OversamplingConfig {
    /// Temperature oversampling.
    pub temp_osrs: Oversampling,
    /// Humidity oversampling.
    pub hum_osrs: Oversampling,
    /// Pressure oversampling.
    pub pres_osrs: Oversampling,
}

/// Infinite Impulse Response (IIR) filter coefficient.
///
/// Smooths short-term disturbances in pressure and temperature (a door
/// slamming, a draught). Humidity and gas are not filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IIRFilter {
    /// Filter off.
    #[default]
    IIR0 = 0,
    IIR1 = 1,
    IIR3 = 2,
    IIR7 = 3,
    IIR15 = 4,
    IIR31 = 5,
    IIR63 = 6,
    IIR127 = 7,
}

impl IIRFilter {
    pub fn is_enabled(self) -> bool {
        self != IIRFilter::IIR0
    }
}

impl TryFrom<u8> for IIRFilter {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IIRFilter::IIR0),
            1 => Ok(IIRFilter::IIR1),
            2 => Ok(IIRFilter::IIR3),
            3 => Ok(IIRFilter::IIR7),
            4 => Ok(IIRFilter::IIR15),
            5 => Ok(IIRFilter::IIR31),
            6 => Ok(IIRFilter::IIR63),
            7 => Ok(IIRFilter::IIR127),
            _ => Err(Error::InvalidSetting),
        }
    }
}

/// Heater plate temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Celsius(pub u16);

/// Duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milliseconds(pub u16);

/// Target for the gas sensor heater plate.
///
/// Gas measurement runs only when both the temperature and the duration
/// are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasHeater {
    /// Target temperature of the heater plate (typically 200 to 400 °C).
    pub target_temp: Celsius,
    /// How long the temperature is held before the gas conversion.
    pub heat_time: Milliseconds,
}

impl GasHeater {
    pub const fn new(target_temp: u16, heat_time: u16) -> Self {
        GasHeater {
            target_temp: Celsius(target_temp),
            heat_time: Milliseconds(heat_time),
        }
    }

    /// Heater switched off. Disables gas measurement.
    pub const fn off() -> Self {
        GasHeater::new(0, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.target_temp.0 != 0 && self.heat_time.0 != 0
    }
}

/// Complete measurement configuration of the sensor.
///
/// Every channel's enabled state is derived from its setting, so the
/// configuration can never disagree with what gets measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Oversampling for temperature, humidity and pressure.
    pub osrs_config: OversamplingConfig,
    /// IIR filter coefficient.
    pub iir_filter: IIRFilter,
    /// Gas heater target.
    pub gas_heater: GasHeater,
}

impl Default for ChannelConfig {
    /// Humidity 2x, pressure 4x, temperature 8x, filter size 3 and the
    /// heater at 320 °C for 150 ms.
    fn default() -> Self {
        ChannelConfig {
            osrs_config: OversamplingConfig {
                temp_osrs: Oversampling::X8,
                hum_osrs: Oversampling::X2,
                pres_osrs: Oversampling::X4,
            },
            iir_filter: IIRFilter::IIR3,
            gas_heater: GasHeater::new(320, 150),
        }
    }
}

impl ChannelConfig {
    /// Everything switched off. This is the state of a freshly created session.
    pub const fn disabled() -> Self {
        ChannelConfig {
            osrs_config: OversamplingConfig {
                temp_osrs: Oversampling::Skipped,
                hum_osrs: Oversampling::Skipped,
                pres_osrs: Oversampling::Skipped,
            },
            iir_filter: IIRFilter::IIR0,
            gas_heater: GasHeater::off(),
        }
    }

    /// Starts a builder from the default configuration.
    pub fn builder() -> ChannelConfigBuilder {
        ChannelConfigBuilder::new()
    }

    pub fn temperature_enabled(&self) -> bool {
        self.osrs_config.temp_osrs.is_enabled()
    }

    pub fn humidity_enabled(&self) -> bool {
        self.osrs_config.hum_osrs.is_enabled()
    }

    pub fn pressure_enabled(&self) -> bool {
        self.osrs_config.pres_osrs.is_enabled()
    }

    pub fn filter_enabled(&self) -> bool {
        self.iir_filter.is_enabled()
    }

    pub fn gas_enabled(&self) -> bool {
        self.gas_heater.is_enabled()
    }
}

/// Builder for a [`ChannelConfig`], starting from the defaults.
#[derive(Debug, Default)]
pub struct ChannelConfigBuilder {
    config: ChannelConfig,
}

impl ChannelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the temperature oversampling.
    pub fn temp_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.temp_osrs = os;
        self
    }

    /// Sets the humidity oversampling.
    pub fn hum_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.hum_osrs = os;
        self
    }

    /// Sets the pressure oversampling.
    pub fn pres_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.pres_osrs = os;
        self
    }

    /// Sets the IIR filter coefficient.
    pub fn iir_filter(mut self, filter: IIRFilter) -> Self {
        self.config.iir_filter = filter;
        self
    }

    /// Sets the gas heater target. `GasHeater::off()` disables gas measurement.
    pub fn gas_heater(mut self, heater: GasHeater) -> Self {
        self.config.gas_heater = heater;
        self
    }

    pub fn build(self) -> ChannelConfig {
        self.config
    }
}

/// Selection of the settings groups pushed to the compensation driver.
///
/// Bit values match the Bosch reference driver's `*_SEL` masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettingsSelect(u8);

impl SettingsSelect {
    pub const NONE: SettingsSelect = SettingsSelect(0);
    /// Temperature oversampling.
    pub const OST: SettingsSelect = SettingsSelect(1);
    /// Pressure oversampling.
    pub const OSP: SettingsSelect = SettingsSelect(2);
    /// Humidity oversampling.
    pub const OSH: SettingsSelect = SettingsSelect(4);
    pub const GAS_MEAS: SettingsSelect = SettingsSelect(8);
    pub const FILTER: SettingsSelect = SettingsSelect(16);
    pub const RUN_GAS: SettingsSelect = SettingsSelect(64);
    pub const NBCONV: SettingsSelect = SettingsSelect(128);
    /// Everything the gas heater needs: heater profile, run-gas bit and profile index.
    pub const GAS_SENSOR: SettingsSelect = SettingsSelect(8 | 64 | 128);

    /// Groups to push for the channels enabled in `config`.
    pub fn from_config(config: &ChannelConfig) -> Self {
        let mut select = SettingsSelect::NONE;

        if config.temperature_enabled() {
            select |= SettingsSelect::OST;
        }
        if config.humidity_enabled() {
            select |= SettingsSelect::OSH;
        }
        if config.pressure_enabled() {
            select |= SettingsSelect::OSP;
        }
        if config.filter_enabled() {
            select |= SettingsSelect::FILTER;
        }
        if config.gas_enabled() {
            select |= SettingsSelect::GAS_SENSOR;
        }

        select
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: SettingsSelect) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SettingsSelect {
    type Output = SettingsSelect;

    fn bitor(self, rhs: Self) -> Self::Output {
        SettingsSelect(self.0 | rhs.0)
    }
}

impl BitOrAssign for SettingsSelect {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
