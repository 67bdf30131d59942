// flags.rs
//
// Boolean settings packed into the 32-bit Flags field. Bit positions are part
// of the stored format: new flags take an unused bit, existing ones never move.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConfigFlags(u32);

impl ConfigFlags {
    /// Record has been bootstrapped with defaults at least once.
    pub const INITIALIZED: u32 = 0x0000_0001;
    pub const TEMP_PROBE_CONNECTED: u32 = 0x0000_0002;
    pub const DEVICE_RELAY_CONNECTED: u32 = 0x0000_0004;
    pub const DEBUG_MESSAGES: u32 = 0x0000_0008;
    pub const TEMP_DISPLAY_FAHRENHEIT: u32 = 0x0000_0010;
    /// A WiFi station connection is *desired*; access point mode otherwise.
    pub const WIFI_STATION_ENABLED: u32 = 0x0000_0020;

    /// Every documented bit, in ascending order, with its display name.
    pub const NAMED: [(u32, &'static str); 6] = [
        (Self::INITIALIZED, "Initialized"),
        (Self::TEMP_PROBE_CONNECTED, "Probe connected"),
        (Self::DEVICE_RELAY_CONNECTED, "Relay connected"),
        (Self::DEBUG_MESSAGES, "Debug messages"),
        (Self::TEMP_DISPLAY_FAHRENHEIT, "Fahrenheit"),
        (Self::WIFI_STATION_ENABLED, "Wifi enabled"),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, mask: u32) -> bool {
        self.0 & mask == mask
    }

    pub fn insert(&mut self, mask: u32) {
        self.0 |= mask;
    }

    pub fn remove(&mut self, mask: u32) {
        self.0 &= !mask;
    }

    /// Set or clear `mask`, returning true if any bit actually changed.
    pub fn set(&mut self, mask: u32, on: bool) -> bool {
        let before = self.0;
        if on {
            self.insert(mask);
        } else {
            self.remove(mask);
        }
        before != self.0
    }

    pub const fn initialized(self) -> bool {
        self.contains(Self::INITIALIZED)
    }

    pub const fn probe_connected(self) -> bool {
        self.contains(Self::TEMP_PROBE_CONNECTED)
    }

    pub const fn relay_connected(self) -> bool {
        self.contains(Self::DEVICE_RELAY_CONNECTED)
    }

    pub const fn debug_messages(self) -> bool {
        self.contains(Self::DEBUG_MESSAGES)
    }

    pub const fn fahrenheit(self) -> bool {
        self.contains(Self::TEMP_DISPLAY_FAHRENHEIT)
    }

    pub const fn wifi_station(self) -> bool {
        self.contains(Self::WIFI_STATION_ENABLED)
    }
}

impl fmt::LowerHex for ConfigFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}


// EOF
