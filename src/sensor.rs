// sensor.rs

/// One temperature/humidity sample. `None` marks a value the driver could
/// not read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

impl Reading {
    pub fn new(temperature: Option<f32>, humidity: Option<f32>) -> Self {
        Self {
            temperature: temperature.filter(|v| !v.is_nan()),
            humidity: humidity.filter(|v| !v.is_nan()),
        }
    }

    /// Drivers that signal failure with NaN.
    pub fn from_raw(temperature: f32, humidity: f32) -> Self {
        Self::new(Some(temperature), Some(humidity))
    }

    pub fn failed() -> Self {
        Self::default()
    }

    /// Both values, or nothing.
    pub fn complete(&self) -> Option<(f32, f32)> {
        Some((self.temperature?, self.humidity?))
    }

    pub fn payload(&self) -> Option<String> {
        self.complete().map(|(t, h)| format_reading(t, h))
    }
}

pub fn format_reading(temperature: f32, humidity: f32) -> String {
    format!("Temperature: {temperature:.2}C, Humidity: {humidity:.2}%")
}

pub trait Sensor {
    fn read(&mut self) -> Reading;
}

impl<F: FnMut() -> Reading> Sensor for F {
    fn read(&mut self) -> Reading {
        self()
    }
}

#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod esp {
    use dht_sensor::dht11;
    use esp_idf_hal::{
        delay::Ets,
        gpio::{AnyIOPin, InputOutput, PinDriver, Pull},
    };
    use log::*;

    use super::{Reading, Sensor};

    pub struct Dht11Sensor {
        pin: PinDriver<'static, AnyIOPin, InputOutput>,
        name: String,
    }

    impl Dht11Sensor {
        pub fn new(pin: AnyIOPin, name: impl Into<String>) -> anyhow::Result<Self> {
            let mut pin = PinDriver::input_output_od(pin)?;
            pin.set_pull(Pull::Up)?;
            pin.set_high()?;
            Ok(Self {
                pin,
                name: name.into(),
            })
        }
    }

    impl Sensor for Dht11Sensor {
        fn read(&mut self) -> Reading {
            if let Err(e) = self.pin.set_high() {
                warn!("DHT11 on {}: cannot release line: {e:?}", self.name);
                return Reading::failed();
            }

            match dht11::blocking::read(&mut Ets, &mut self.pin) {
                Ok(r) => {
                    debug!("DHT11 on {}: {r:?}", self.name);
                    Reading::new(Some(r.temperature as f32), Some(r.relative_humidity as f32))
                }
                Err(e) => {
                    debug!("DHT11 on {}: read error {e:?}", self.name);
                    Reading::failed()
                }
            }
        }
    }
}


// EOF
