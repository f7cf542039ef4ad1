#![cfg_attr(not(test), no_std)]

//! # BME680 Measurement Session
//!
//! A `no_std` forced-mode session for the Bosch BME680 environmental sensor.
//!
//! The session keeps the channel configuration and the last measurement.
//! Register access and compensation math belong to a [`CompensationDriver`];
//! bus access goes through a [`BusTransport`] such as [`I2cTransport`].
//!
//! ## Features
//! - **Per-channel configuration**: individually enable/disable temperature,
//!   humidity, pressure, or gas measurements.
//! - **Forced mode**: every reading is a single-shot measurement, after which
//!   the sensor goes back to sleep on its own.
//! - **Typestate pattern**: a reading cannot be triggered before `begin()`.
//!
//! ## Units
//! - **Temperature**: °C, from centigrade (C * 100)
//! - **Humidity**: %RH, from milli-percent (RH % * 1000)
//! - **Pressure**: Pascal (Pa), unscaled
//! - **Gas Resistance**: Ohms (Ω), unscaled

pub mod bus;
pub mod driver;
pub mod error;
pub mod settings;

use core::marker::PhantomData;

use log::{debug, warn};

pub use bus::{BusTransport, Device, I2cTransport, TransportError};
pub use driver::{CompensationDriver, FieldData, PowerMode};
pub use error::{Error, Result};
pub use settings::{
    Celsius, ChannelConfig, ChannelConfigBuilder, GasHeater, IIRFilter, Milliseconds,
    Oversampling, OversamplingConfig, SettingsSelect,
};

/// Default 7-bit I2C address (SDO pulled high).
pub const DEFAULT_ADDRESS: u8 = 0x77;
/// Alternative 7-bit I2C address (SDO pulled low).
pub const SECONDARY_ADDRESS: u8 = 0x76;

// --- Typestates ---

/// Session has been created but the driver is not initialized yet.
#[derive(Debug)]
pub struct Uninitialized;
/// Driver is initialized; readings can be taken.
#[derive(Debug)]
pub struct Ready;

/// Returned by a failed [`SensorSession::begin`].
///
/// Hands the uninitialized session back so the bus and driver are not lost
/// and `begin()` can be called again.
#[derive(Debug)]
pub struct BeginError<B, D> {
    pub error: Error,
    pub session: SensorSession<B, D, Uninitialized>,
}

/// A measurement session with one BME680.
///
/// Start with [`SensorSession::new`] and call [`begin`](SensorSession::begin)
/// to get a `Ready` session. Configuration setters work in either state.
#[derive(Debug)]
pub struct SensorSession<B, D, STATE> {
    device: Device<B>,
    driver: D,
    config: ChannelConfig,
    data: FieldData,
    _state: PhantomData<STATE>,
}

impl<B, D> SensorSession<B, D, Uninitialized>
where
    B: BusTransport,
    D: CompensationDriver,
{
    /// Creates a session at [`DEFAULT_ADDRESS`].
    ///
    /// This does not communicate with the sensor yet. All channels start disabled.
    pub fn new(bus: B, driver: D) -> Self {
        Self::with_address(bus, driver, DEFAULT_ADDRESS)
    }

    /// Creates a session at an explicit 7-bit address (typically `0x76` or `0x77`).
    pub fn with_address(bus: B, driver: D, address: u8) -> Self {
        SensorSession {
            device: Device::new(bus, address),
            driver,
            config: ChannelConfig::disabled(),
            data: FieldData::default(),
            _state: PhantomData,
        }
    }

    /// Applies the default configuration and initializes the driver.
    ///
    /// Defaults are humidity 2x, pressure 4x, temperature 8x, IIR filter
    /// size 3 and the gas heater at 320 °C for 150 ms.
    ///
    /// # Errors
    /// Returns a [`BeginError`] carrying [`Error::Driver`] and the session
    /// itself if the driver fails to initialize. There is no retry.
    pub fn begin(
        mut self,
    ) -> core::result::Result<SensorSession<B, D, Ready>, BeginError<B, D>> {
        self.config = ChannelConfig::default();

        if let Err(e) = self.driver.init(&mut self.device) {
            warn!("BME680 init failed: {:?}", e);
            return Err(BeginError {
                error: Error::Driver,
                session: self,
            });
        }
        debug!("BME680 initialized at {:#04x}", self.device.address());

        Ok(SensorSession {
            device: self.device,
            driver: self.driver,
            config: self.config,
            data: self.data,
            _state: PhantomData,
        })
    }
}

impl<B, D, STATE> SensorSession<B, D, STATE>
where
    B: BusTransport,
    D: CompensationDriver,
{
    /// 7-bit I2C address of the sensor.
    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// Current channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Sets temperature oversampling. `Oversampling::Skipped` turns the channel off.
    ///
    /// Accepts an [`Oversampling`] or a raw `u8` level; a raw level above
    /// 5 (16x) is rejected with [`Error::InvalidSetting`] and nothing changes.
    pub fn set_temperature_oversampling<O>(&mut self, os: O) -> Result<()>
    where
        O: TryInto<Oversampling>,
        Error: From<O::Error>,
    {
        self.config.osrs_config.temp_osrs = os.try_into()?;
        Ok(())
    }

    /// Sets humidity oversampling. Validation as for temperature.
    pub fn set_humidity_oversampling<O>(&mut self, os: O) -> Result<()>
    where
        O: TryInto<Oversampling>,
        Error: From<O::Error>,
    {
        self.config.osrs_config.hum_osrs = os.try_into()?;
        Ok(())
    }

    /// Sets pressure oversampling. Validation as for temperature.
    pub fn set_pressure_oversampling<O>(&mut self, os: O) -> Result<()>
    where
        O: TryInto<Oversampling>,
        Error: From<O::Error>,
    {
        self.config.osrs_config.pres_osrs = os.try_into()?;
        Ok(())
    }

    /// Sets the IIR filter size. `IIRFilter::IIR0` turns filtering off.
    ///
    /// A raw level above 7 (size 127) is rejected with [`Error::InvalidSetting`].
    pub fn set_iir_filter_size<F>(&mut self, filter: F) -> Result<()>
    where
        F: TryInto<IIRFilter>,
        Error: From<F::Error>,
    {
        self.config.iir_filter = filter.try_into()?;
        Ok(())
    }

    /// Enables and configures the gas heater.
    ///
    /// A zero temperature or a zero duration disables gas measurement.
    pub fn set_gas_heater(&mut self, temperature_c: u16, duration_ms: u16) {
        self.config.gas_heater = GasHeater::new(temperature_c, duration_ms);
    }

    /// Replaces the whole configuration, e.g. with one from [`ChannelConfig::builder`].
    ///
    /// A typed `ChannelConfig` is always valid, so nothing is checked.
    pub fn configure(&mut self, config: ChannelConfig) {
        self.config = config;
    }

    pub fn is_temperature_enabled(&self) -> bool {
        self.config.temperature_enabled()
    }

    pub fn is_humidity_enabled(&self) -> bool {
        self.config.humidity_enabled()
    }

    pub fn is_pressure_enabled(&self) -> bool {
        self.config.pressure_enabled()
    }

    pub fn is_filter_enabled(&self) -> bool {
        self.config.filter_enabled()
    }

    pub fn is_gas_enabled(&self) -> bool {
        self.config.gas_enabled()
    }

    /// The last successful measurement, zeroed if there was none.
    pub fn snapshot(&self) -> &FieldData {
        &self.data
    }

    /// Whether the heater was stable during the last gas conversion.
    pub fn is_gas_heating_setup_stable(&self) -> bool {
        self.data.heater_stable()
    }

    /// Last temperature in °C, or NaN if temperature is disabled.
    pub fn temperature(&self) -> f32 {
        if !self.config.temperature_enabled() {
            return f32::NAN;
        }
        self.data.temperature as f32 / 100.0
    }

    /// Last relative humidity in %, or NaN if humidity is disabled.
    pub fn humidity(&self) -> f32 {
        if !self.config.humidity_enabled() {
            return f32::NAN;
        }
        self.data.humidity as f32 / 1000.0
    }

    /// Last pressure in Pa, or NaN if pressure is disabled.
    pub fn pressure(&self) -> f32 {
        if !self.config.pressure_enabled() {
            return f32::NAN;
        }
        self.data.pressure as f32
    }

    /// Last gas resistance in Ω.
    ///
    /// Returns 0 if gas is disabled, and also 0 if the heater was not
    /// stable. A zero here means "no trustworthy value", not "no channel".
    pub fn gas_resistance(&self) -> f32 {
        if !self.config.gas_enabled() {
            return 0.0;
        }
        if !self.is_gas_heating_setup_stable() {
            debug!("gas reading unstable");
            return 0.0;
        }
        self.data.gas_resistance as f32
    }

    /// Cached temperature in centigrade, whatever the configuration.
    pub fn raw_temperature(&self) -> i16 {
        self.data.temperature
    }

    /// Cached pressure in Pa, whatever the configuration.
    pub fn raw_pressure(&self) -> u32 {
        self.data.pressure
    }

    /// Cached humidity in milli-percent, whatever the configuration.
    pub fn raw_humidity(&self) -> u32 {
        self.data.humidity
    }

    /// Cached gas resistance in Ω, whatever the configuration or heater state.
    pub fn raw_gas_resistance(&self) -> u32 {
        self.data.gas_resistance
    }

    /// Hands back the bus transport and the driver.
    pub fn release(self) -> (B, D) {
        (self.device.release(), self.driver)
    }
}

impl<B, D> SensorSession<B, D, Ready>
where
    B: BusTransport,
    D: CompensationDriver,
{
    /// Re-applies the default configuration, as `begin()` does.
    pub fn reset_defaults(&mut self) {
        self.config = ChannelConfig::default();
    }

    /// Triggers a forced-mode measurement, waits for it and caches the result.
    ///
    /// Blocks for the conversion time the driver computes for the current
    /// configuration. On any driver failure the previous measurement stays
    /// cached.
    ///
    /// # Errors
    /// Returns [`Error::Driver`] if pushing the settings, triggering the
    /// measurement or reading the data fails.
    pub fn perform_reading(&mut self) -> Result<()> {
        // Must be chosen before the settings are written
        let mode = PowerMode::Forced;
        let select = SettingsSelect::from_config(&self.config);

        let result = self
            .driver
            .set_sensor_settings(&mut self.device, select, &self.config, mode);
        debug!("set settings {:#04x}: ok = {}", select.bits(), result.is_ok());
        if let Err(e) = result {
            warn!("BME680 settings rejected: {:?}", e);
            return Err(Error::Driver);
        }

        let result = self.driver.set_sensor_mode(&mut self.device, mode);
        debug!("set power mode {:?}: ok = {}", mode, result.is_ok());
        if let Err(e) = result {
            warn!("BME680 mode change failed: {:?}", e);
            return Err(Error::Driver);
        }

        let Milliseconds(duration) = self.driver.profile_duration(&self.config);
        self.device.delay_ms(u32::from(duration));

        match self.driver.get_sensor_data(&mut self.device) {
            Ok(data) => {
                debug!("get sensor data: {:?}", data);
                self.data = data;
                Ok(())
            }
            Err(e) => {
                warn!("BME680 data read failed: {:?}", e);
                Err(Error::Driver)
            }
        }
    }
}
