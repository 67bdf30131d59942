// config.rs

use std::net::Ipv4Addr;

use crate::*;

/// Where the stored configuration stands after boot or the last change.
/// An uninitialized store never survives `SensorConfig::boot`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigState {
    /// Defaults were just written.
    Bootstrapped,
    /// Loaded from the store or changed since bootstrap.
    Configured,
}

/// Result of a single setting update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Unchanged,
    /// Value failed validation, stored value retained.
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StoredRecord {
    Current,
    OlderMinor(SchemaVersion),
    Unusable(&'static str),
}

const TEXT_LENGTHS: [usize; 3] = [
    offset::WIFI_SSID_LENGTH,
    offset::WIFI_PASSWORD_LENGTH,
    offset::LABEL_LENGTH,
];

// `raw` is the undecoded image of `record`; text lengths are checked there
// since decoding clamps them.
fn assess(record: &ConfigRecord, raw: &[u8; RECORD_SIZE]) -> StoredRecord {
    if !record.flags.initialized() {
        return StoredRecord::Unusable("not initialized");
    }
    if record.size as usize != RECORD_SIZE {
        return StoredRecord::Unusable("unexpected record size");
    }
    if record.version.major != SCHEMA_VERSION.major {
        return StoredRecord::Unusable("incompatible major version");
    }
    if !is_valid_baud(record.serial_baud) {
        return StoredRecord::Unusable("unsupported serial baud");
    }
    if !is_valid_wait_time(record.sensor_wait_time) {
        return StoredRecord::Unusable("zero sensor wait time");
    }
    if TEXT_LENGTHS.iter().any(|off| raw[*off] as usize > MAX_TEXT_LEN) {
        return StoredRecord::Unusable("text length out of range");
    }
    match record.version.minor.cmp(&SCHEMA_VERSION.minor) {
        std::cmp::Ordering::Less => StoredRecord::OlderMinor(record.version),
        std::cmp::Ordering::Equal => StoredRecord::Current,
        std::cmp::Ordering::Greater => StoredRecord::Unusable("written by newer firmware"),
    }
}

#[derive(Clone, Copy, Debug)]
enum TextField {
    Ssid,
    Password,
    Label,
}

impl TextField {
    fn name(self) -> &'static str {
        match self {
            TextField::Ssid => "WifiSSID",
            TextField::Password => "WifiPassword",
            TextField::Label => "Label",
        }
    }

    fn offsets(self) -> (usize, usize) {
        match self {
            TextField::Ssid => (offset::WIFI_SSID, offset::WIFI_SSID_LENGTH),
            TextField::Password => (offset::WIFI_PASSWORD, offset::WIFI_PASSWORD_LENGTH),
            TextField::Label => (offset::LABEL, offset::LABEL_LENGTH),
        }
    }

    fn get(self, record: &mut ConfigRecord) -> &mut FixedText {
        match self {
            TextField::Ssid => &mut record.wifi_ssid,
            TextField::Password => &mut record.wifi_password,
            TextField::Label => &mut record.label,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum AddressField {
    Station,
    Access,
    NetMask,
    Gateway,
}

impl AddressField {
    fn name(self) -> &'static str {
        match self {
            AddressField::Station => "StationIP",
            AddressField::Access => "AccessIP",
            AddressField::NetMask => "NetMask",
            AddressField::Gateway => "Gateway",
        }
    }

    fn offset(self) -> usize {
        match self {
            AddressField::Station => offset::STATION_IP,
            AddressField::Access => offset::ACCESS_IP,
            AddressField::NetMask => offset::NETMASK,
            AddressField::Gateway => offset::GATEWAY,
        }
    }

    fn get(self, record: &mut ConfigRecord) -> &mut Ipv4Addr {
        match self {
            AddressField::Station => &mut record.station_ip,
            AddressField::Access => &mut record.access_ip,
            AddressField::NetMask => &mut record.netmask,
            AddressField::Gateway => &mut record.gateway,
        }
    }
}

/// The device configuration: the in-memory record together with the store
/// that persists it. Created once at startup and handed to whoever needs it.
///
/// Every setter persists first and updates the in-memory copy afterwards, so
/// a failed commit leaves the record as it was.
pub struct SensorConfig<B: Backing> {
    store: RomStore<B>,
    record: ConfigRecord,
    state: ConfigState,
}

impl<B: Backing> SensorConfig<B> {
    /// Load the record, bootstrapping defaults when the stored image is
    /// blank, foreign or damaged. A stored record from an older minor
    /// version is upgraded in place.
    pub fn boot(mut store: RomStore<B>) -> Result<Self, StoreError> {
        let raw = store.read_raw()?;
        let mut record = ConfigRecord::from_bytes(&raw);
        let state = match assess(&record, &raw) {
            StoredRecord::Current => ConfigState::Configured,
            StoredRecord::OlderMinor(old) => {
                info!("Upgrading stored configuration {old} -> {SCHEMA_VERSION}");
                let off = store.field_offset(offset::VERSION);
                store.write_field(off, &SCHEMA_VERSION.raw().to_le_bytes())?;
                record.version = SCHEMA_VERSION;
                ConfigState::Configured
            }
            StoredRecord::Unusable(reason) => {
                warn!(
                    "Stored configuration unusable ({reason}, size {} version 0x{:04x}), writing defaults",
                    record.size,
                    record.version.raw()
                );
                store.initialize_defaults(Some(&mut record))?;
                ConfigState::Bootstrapped
            }
        };
        dump_to_diagnostics(Some(&record), Some("Configuration at boot:"));
        Ok(Self {
            store,
            record,
            state,
        })
    }

    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    pub fn store(&self) -> &RomStore<B> {
        &self.store
    }

    pub fn into_store(self) -> RomStore<B> {
        self.store
    }

    /// Wipe the record region and write the defaults again.
    pub fn factory_reset(&mut self) -> Result<(), StoreError> {
        warn!("Factory reset");
        let base = self.store.base();
        self.store.erase(RECORD_SIZE, base)?;
        self.store.initialize_defaults(Some(&mut self.record))?;
        self.state = ConfigState::Bootstrapped;
        Ok(())
    }

    /// True when the stored record matches the in-memory copy.
    pub fn verify(&self) -> Result<bool, StoreError> {
        Ok(self.store.read_record()? == self.record)
    }

    pub fn dump(&self, label: &str) {
        dump_to_diagnostics(Some(&self.record), Some(label));
    }

    fn write(&mut self, field: usize, bytes: &[u8]) -> Result<(), StoreError> {
        let off = self.store.field_offset(field);
        self.store.write_field(off, bytes)?;
        self.state = ConfigState::Configured;
        Ok(())
    }

    fn changed(&self, name: &str) -> Outcome {
        info!("{name} updated, new settings take effect after restart");
        if self.record.flags.debug_messages() {
            self.dump("After update:");
        }
        Outcome::Written
    }

    fn set_text(&mut self, which: TextField, value: &str) -> Result<Outcome, StoreError> {
        let new = match FixedText::new(value) {
            Ok(t) => t,
            Err(e) => {
                error!("{}: {e}, ignoring setting", which.name());
                return Ok(Outcome::Rejected);
            }
        };
        let old_len = which.get(&mut self.record).len() as usize;
        if *which.get(&mut self.record) == new {
            return Ok(Outcome::Unchanged);
        }

        // content and terminator, plus zeros over any tail left by a longer
        // previous value
        let (buf_off, len_off) = which.offsets();
        let span = (new.len() as usize + 1).max(old_len);
        let buf = new.to_buffer();
        self.write(buf_off, &buf[..span])?;
        self.write(len_off, &[new.len()])?;
        *which.get(&mut self.record) = new;
        Ok(self.changed(which.name()))
    }

    pub fn set_wifi_ssid(&mut self, ssid: &str) -> Result<Outcome, StoreError> {
        self.set_text(TextField::Ssid, ssid)
    }

    pub fn set_wifi_password(&mut self, password: &str) -> Result<Outcome, StoreError> {
        self.set_text(TextField::Password, password)
    }

    pub fn set_label(&mut self, label: &str) -> Result<Outcome, StoreError> {
        self.set_text(TextField::Label, label)
    }

    // Only octets that differ are written.
    fn set_address(&mut self, which: AddressField, new: Ipv4Addr) -> Result<Outcome, StoreError> {
        let old = *which.get(&mut self.record);
        if old == new {
            return Ok(Outcome::Unchanged);
        }
        let (old_octets, new_octets) = (old.octets(), new.octets());
        for i in 0..4 {
            if old_octets[i] != new_octets[i] {
                self.write(which.offset() + i, &new_octets[i..=i])?;
            }
        }
        *which.get(&mut self.record) = new;
        Ok(self.changed(which.name()))
    }

    pub fn set_station_ip(&mut self, addr: Ipv4Addr) -> Result<Outcome, StoreError> {
        self.set_address(AddressField::Station, addr)
    }

    /// Access point address, private ranges only.
    pub fn set_access_ip(&mut self, addr: Ipv4Addr) -> Result<Outcome, StoreError> {
        if !is_private_v4(addr) {
            error!("AccessIP: {addr} is not a private address, ignoring setting");
            return Ok(Outcome::Rejected);
        }
        self.set_address(AddressField::Access, addr)
    }

    pub fn set_netmask(&mut self, mask: Ipv4Addr) -> Result<Outcome, StoreError> {
        self.set_address(AddressField::NetMask, mask)
    }

    pub fn set_gateway(&mut self, addr: Ipv4Addr) -> Result<Outcome, StoreError> {
        self.set_address(AddressField::Gateway, addr)
    }

    pub fn set_serial_baud(&mut self, baud: u32) -> Result<Outcome, StoreError> {
        if !is_valid_baud(baud) {
            error!("SerialBaud: {baud} is not supported, ignoring setting");
            return Ok(Outcome::Rejected);
        }
        if baud == self.record.serial_baud {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::SERIAL_BAUD, &baud.to_le_bytes())?;
        self.record.serial_baud = baud;
        Ok(self.changed("SerialBaud"))
    }

    pub fn set_web_server_port(&mut self, port: u16) -> Result<Outcome, StoreError> {
        if port == self.record.web_server_port {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::WEB_SERVER_PORT, &port.to_le_bytes())?;
        self.record.web_server_port = port;
        Ok(self.changed("WebServerPort"))
    }

    pub fn set_websocket_port(&mut self, port: u16) -> Result<Outcome, StoreError> {
        if port == self.record.websocket_server_port {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::WEBSOCKET_SERVER_PORT, &port.to_le_bytes())?;
        self.record.websocket_server_port = port;
        Ok(self.changed("WebSocketServerPort"))
    }

    /// Interval between sensor reads in milliseconds, never zero.
    pub fn set_sensor_wait_time(&mut self, ms: u32) -> Result<Outcome, StoreError> {
        if !is_valid_wait_time(ms) {
            error!("SensorWaitTime: the read interval cannot be zero, ignoring setting");
            return Ok(Outcome::Rejected);
        }
        if ms == self.record.sensor_wait_time {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::SENSOR_WAIT_TIME, &ms.to_le_bytes())?;
        self.record.sensor_wait_time = ms;
        Ok(self.changed("SensorWaitTime"))
    }

    pub fn set_temp_high_limit(&mut self, degrees: i16) -> Result<Outcome, StoreError> {
        if degrees == self.record.temp_high_limit {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::TEMP_HIGH_LIMIT, &degrees.to_le_bytes())?;
        self.record.temp_high_limit = degrees;
        Ok(self.changed("TempHighLimit"))
    }

    pub fn set_temp_low_limit(&mut self, degrees: i16) -> Result<Outcome, StoreError> {
        if degrees == self.record.temp_low_limit {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::TEMP_LOW_LIMIT, &degrees.to_le_bytes())?;
        self.record.temp_low_limit = degrees;
        Ok(self.changed("TempLowLimit"))
    }

    /// Apply several flag edits and store the Flags field once. The
    /// initialized marker stays set whatever `edit` does.
    pub fn update_flags<F>(&mut self, edit: F) -> Result<Outcome, StoreError>
    where
        F: FnOnce(&mut ConfigFlags),
    {
        let mut flags = self.record.flags;
        edit(&mut flags);
        if !flags.initialized() {
            warn!("Flags: the initialized marker cannot be cleared, keeping it");
            flags.insert(ConfigFlags::INITIALIZED);
        }
        if flags == self.record.flags {
            return Ok(Outcome::Unchanged);
        }
        self.write(offset::FLAGS, &flags.bits().to_le_bytes())?;
        self.record.flags = flags;
        Ok(self.changed("Flags"))
    }

    pub fn set_probe_connected(&mut self, on: bool) -> Result<Outcome, StoreError> {
        self.update_flags(|f| {
            f.set(ConfigFlags::TEMP_PROBE_CONNECTED, on);
        })
    }

    pub fn set_relay_connected(&mut self, on: bool) -> Result<Outcome, StoreError> {
        self.update_flags(|f| {
            f.set(ConfigFlags::DEVICE_RELAY_CONNECTED, on);
        })
    }

    pub fn set_debug_messages(&mut self, on: bool) -> Result<Outcome, StoreError> {
        self.update_flags(|f| {
            f.set(ConfigFlags::DEBUG_MESSAGES, on);
        })
    }

    pub fn set_fahrenheit(&mut self, on: bool) -> Result<Outcome, StoreError> {
        self.update_flags(|f| {
            f.set(ConfigFlags::TEMP_DISPLAY_FAHRENHEIT, on);
        })
    }

    pub fn set_wifi_station(&mut self, on: bool) -> Result<Outcome, StoreError> {
        self.update_flags(|f| {
            f.set(ConfigFlags::WIFI_STATION_ENABLED, on);
        })
    }
}


// EOF
