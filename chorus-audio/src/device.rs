use cpal::traits::{DeviceTrait, HostTrait};

/// Display name the synthetic default entry uses.
pub const SYSTEM_DEFAULT_DEVICE_NAME: &str = "System Default";

/// One enumerable audio device, input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

impl AudioDeviceInfo {
    pub fn new(name: impl Into<String>, is_default: bool) -> Self {
        Self {
            name: name.into(),
            is_default,
        }
    }

    pub fn system_default() -> Self {
        Self::new(SYSTEM_DEFAULT_DEVICE_NAME, true)
    }
}

impl std::fmt::Display for AudioDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// List available input devices, "System Default" first.
pub fn list_input_devices() -> Vec<AudioDeviceInfo> {
    let mut devices = vec![AudioDeviceInfo::system_default()];
    let host = cpal::default_host();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device.name() {
                if !devices.iter().any(|d| d.name == name) {
                    devices.push(AudioDeviceInfo::new(name, false));
                }
            }
        }
    }

    devices
}

/// List available output devices, "System Default" first.
pub fn list_output_devices() -> Vec<AudioDeviceInfo> {
    let mut devices = vec![AudioDeviceInfo::system_default()];
    let host = cpal::default_host();

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device.name() {
                if !devices.iter().any(|d| d.name == name) {
                    devices.push(AudioDeviceInfo::new(name, false));
                }
            }
        }
    }

    devices
}
