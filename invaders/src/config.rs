//! Board configuration. Everything has a default matching the original cabinet, so an empty
//! document is a valid config.

use serde::{Deserialize, Serialize};

/// The default CPU clock of the cabinet, 2 MHz.
pub const DEFAULT_CLOCK_HZ: u32 = 2_000_000;
/// The default video refresh rate.
pub const DEFAULT_REFRESH_HZ: u32 = 60;
/// The default contents of the three input latches. Port 0 and port 1 have bits that are always
/// set in hardware; port 2 carries the DIP switch settings.
pub const DEFAULT_DIP_SWITCHES: [u8; 3] = [0x0D, 0x08, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// The emulated CPU clock, in cycles per second.
    pub cpu_clock_hz: u32,
    /// The number of frames per second. Each frame raises two interrupts.
    pub refresh_hz: u32,
    /// The initial contents of input ports 0, 1 and 2.
    pub dip_switches: [u8; 3],
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cpu_clock_hz: DEFAULT_CLOCK_HZ,
            refresh_hz: DEFAULT_REFRESH_HZ,
            dip_switches: DEFAULT_DIP_SWITCHES,
        }
    }
}

impl MachineConfig {
    /// The cycle budget of one frame. A zero refresh rate is treated as one frame per second.
    pub fn cycles_per_frame(&self) -> u32 {
        self.cpu_clock_hz / self.refresh_hz.max(1)
    }

    pub fn from_toml(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
