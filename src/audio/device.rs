// Audio output device lookup (CPAL)

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use crate::audio::tone::AudioError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

pub struct AudioDeviceManager {
    host: Host,
}

impl AudioDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List every output device the host reports
    pub fn list_output_devices(&self) -> Vec<AudioDeviceInfo> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let Ok(devices) = self.host.output_devices() else {
            return Vec::new();
        };

        devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDeviceInfo {
                is_default: name == default_name,
                name,
            })
            .collect()
    }

    /// Resolve the device to open: the named one, or the host default
    pub fn resolve_output_device(&self, name: Option<&str>) -> Result<Device, AudioError> {
        match name {
            Some(wanted) => self
                .host
                .output_devices()
                .map_err(|e| AudioError::Config(e.to_string()))?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| AudioError::DeviceNotFound(wanted.to_string())),
            None => self.host.default_output_device().ok_or(AudioError::NoDevice),
        }
    }
}

impl Default for AudioDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
