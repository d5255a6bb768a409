//! Sysfs device paths.

use std::path::PathBuf;

use serde::Deserialize;

/// Where the node's peripherals are exposed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SysfsConfig {
    /// IIO device directory of the DHT transducer (`dht11` kernel driver).
    pub iio_device: PathBuf,
    /// `value` attribute of the exported occupancy GPIO.
    pub gpio_value: PathBuf,
    /// `brightness` attribute of the status LED.
    pub led_brightness: PathBuf,
    /// How long the LED stays lit per flash, in milliseconds.
    pub led_pulse_ms: u64,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            iio_device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            gpio_value: PathBuf::from("/sys/class/gpio/gpio17/value"),
            led_brightness: PathBuf::from("/sys/class/leds/led0/brightness"),
            led_pulse_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_first_iio_device() {
        let config = SysfsConfig::default();
        assert_eq!(
            config.iio_device,
            PathBuf::from("/sys/bus/iio/devices/iio:device0")
        );
        assert_eq!(config.led_pulse_ms, 100);
    }

    #[test]
    fn should_deserialize_partial_toml() {
        let raw = "gpio_value = '/sys/class/gpio/gpio4/value'";
        let config: SysfsConfig = toml::from_str(raw).unwrap();
        assert_eq!(
            config.gpio_value,
            PathBuf::from("/sys/class/gpio/gpio4/value")
        );
        assert_eq!(
            config.led_brightness,
            PathBuf::from("/sys/class/leds/led0/brightness")
        );
    }
}
