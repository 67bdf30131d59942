// record.rs

use std::{fmt, net::Ipv4Addr};

use crate::*;

/// Serial baud rate used until the user picks another one.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Layout revision this firmware writes.
pub const SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 1);

/// Stored as one u16: major in the high byte, minor in the low byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion {
    pub major: u8,
    pub minor: u8,
}

impl SchemaVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self {
            major: (raw >> 8) as u8,
            minor: raw as u8,
        }
    }

    pub const fn raw(self) -> u16 {
        ((self.major as u16) << 8) | self.minor as u16
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// In-memory copy of every persisted device setting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigRecord {
    pub size: u16,
    pub version: SchemaVersion,
    pub flags: ConfigFlags,
    pub wifi_ssid: FixedText,
    pub wifi_password: FixedText,
    /// Address while connected to a network as a WiFi client.
    pub station_ip: Ipv4Addr,
    /// Address while acting as an access point.
    pub access_ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub serial_baud: u32,
    pub web_server_port: u16,
    pub websocket_server_port: u16,
    /// Milliseconds between sensor reads.
    pub sensor_wait_time: u32,
    /// The relay is switched off above this temperature.
    pub temp_high_limit: i16,
    /// The relay is switched off below this temperature.
    pub temp_low_limit: i16,
    pub label: FixedText,
    pub spare: [u8; SPARE_LEN],
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ConfigRecord {
    /// Out-of-the-box settings: reachable as an access point on
    /// 192.168.0.10 with Fahrenheit limits of 35..85.
    pub fn defaults() -> Self {
        Self {
            size: RECORD_SIZE as u16,
            version: SCHEMA_VERSION,
            flags: ConfigFlags::from_bits(
                ConfigFlags::INITIALIZED
                    | ConfigFlags::TEMP_PROBE_CONNECTED
                    | ConfigFlags::DEVICE_RELAY_CONNECTED
                    | ConfigFlags::TEMP_DISPLAY_FAHRENHEIT
                    | ConfigFlags::WIFI_STATION_ENABLED,
            ),
            wifi_ssid: FixedText::default(),
            wifi_password: FixedText::default(),
            station_ip: Ipv4Addr::UNSPECIFIED,
            access_ip: Ipv4Addr::new(192, 168, 0, 10),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 0, 62),
            serial_baud: DEFAULT_BAUD,
            web_server_port: 80,
            websocket_server_port: 81,
            sensor_wait_time: 15 * 1000,
            temp_high_limit: 85,
            temp_low_limit: 35,
            label: FixedText::default(),
            spare: [0; SPARE_LEN],
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        put(&mut buf, offset::SIZE, &self.size.to_le_bytes());
        put(&mut buf, offset::VERSION, &self.version.raw().to_le_bytes());
        put(&mut buf, offset::FLAGS, &self.flags.bits().to_le_bytes());
        put(&mut buf, offset::WIFI_SSID, &self.wifi_ssid.to_buffer());
        put(&mut buf, offset::WIFI_PASSWORD, &self.wifi_password.to_buffer());
        put(&mut buf, offset::STATION_IP, &self.station_ip.octets());
        put(&mut buf, offset::ACCESS_IP, &self.access_ip.octets());
        put(&mut buf, offset::NETMASK, &self.netmask.octets());
        put(&mut buf, offset::GATEWAY, &self.gateway.octets());
        put(&mut buf, offset::SERIAL_BAUD, &self.serial_baud.to_le_bytes());
        put(&mut buf, offset::WEB_SERVER_PORT, &self.web_server_port.to_le_bytes());
        put(
            &mut buf,
            offset::WEBSOCKET_SERVER_PORT,
            &self.websocket_server_port.to_le_bytes(),
        );
        put(&mut buf, offset::SENSOR_WAIT_TIME, &self.sensor_wait_time.to_le_bytes());
        put(&mut buf, offset::TEMP_HIGH_LIMIT, &self.temp_high_limit.to_le_bytes());
        put(&mut buf, offset::TEMP_LOW_LIMIT, &self.temp_low_limit.to_le_bytes());
        buf[offset::WIFI_SSID_LENGTH] = self.wifi_ssid.len();
        buf[offset::WIFI_PASSWORD_LENGTH] = self.wifi_password.len();
        put(&mut buf, offset::LABEL, &self.label.to_buffer());
        buf[offset::LABEL_LENGTH] = self.label.len();
        put(&mut buf, offset::SPARE, &self.spare);
        buf
    }

    pub fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        Self {
            size: u16::from_le_bytes(get(buf, offset::SIZE)),
            version: SchemaVersion::from_raw(u16::from_le_bytes(get(buf, offset::VERSION))),
            flags: ConfigFlags::from_bits(u32::from_le_bytes(get(buf, offset::FLAGS))),
            wifi_ssid: FixedText::from_stored(
                &get(buf, offset::WIFI_SSID),
                buf[offset::WIFI_SSID_LENGTH],
            ),
            wifi_password: FixedText::from_stored(
                &get(buf, offset::WIFI_PASSWORD),
                buf[offset::WIFI_PASSWORD_LENGTH],
            ),
            station_ip: Ipv4Addr::from(get::<4>(buf, offset::STATION_IP)),
            access_ip: Ipv4Addr::from(get::<4>(buf, offset::ACCESS_IP)),
            netmask: Ipv4Addr::from(get::<4>(buf, offset::NETMASK)),
            gateway: Ipv4Addr::from(get::<4>(buf, offset::GATEWAY)),
            serial_baud: u32::from_le_bytes(get(buf, offset::SERIAL_BAUD)),
            web_server_port: u16::from_le_bytes(get(buf, offset::WEB_SERVER_PORT)),
            websocket_server_port: u16::from_le_bytes(get(buf, offset::WEBSOCKET_SERVER_PORT)),
            sensor_wait_time: u32::from_le_bytes(get(buf, offset::SENSOR_WAIT_TIME)),
            temp_high_limit: i16::from_le_bytes(get(buf, offset::TEMP_HIGH_LIMIT)),
            temp_low_limit: i16::from_le_bytes(get(buf, offset::TEMP_LOW_LIMIT)),
            label: FixedText::from_stored(&get(buf, offset::LABEL), buf[offset::LABEL_LENGTH]),
            spare: get(buf, offset::SPARE),
        }
    }

    /// Human readable listing of every field, one per line.
    pub fn diagnostics<'a>(&'a self, label: Option<&'a str>) -> Diagnostics<'a> {
        Diagnostics {
            record: self,
            label,
        }
    }
}

fn put(buf: &mut [u8; RECORD_SIZE], off: usize, bytes: &[u8]) {
    buf[off..off + bytes.len()].copy_from_slice(bytes);
}

fn get<const N: usize>(buf: &[u8; RECORD_SIZE], off: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[off..off + N]);
    out
}

pub struct Diagnostics<'a> {
    record: &'a ConfigRecord,
    label: Option<&'a str>,
}

fn yes_no(on: bool) -> &'static str {
    if on {
        "TRUE"
    } else {
        "FALSE"
    }
}

impl fmt::Display for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.record;
        if let Some(label) = self.label {
            writeln!(f, "{label}")?;
        }
        writeln!(f, "   Size ................. {}", r.size)?;
        writeln!(f, "   Version .............. 0x{:04x} ({})", r.version.raw(), r.version)?;
        writeln!(f, "   Flags ................ 0x{:08x}", r.flags)?;
        for (mask, name) in ConfigFlags::NAMED {
            let name = format!("{name} ");
            writeln!(f, "      {name:.<19} {}", yes_no(r.flags.contains(mask)))?;
        }
        writeln!(f, "   WifiSSIDLength ....... {}", r.wifi_ssid.len())?;
        writeln!(f, "   WifiSSID ............. {}", r.wifi_ssid.to_str_lossy())?;
        writeln!(f, "   WifiPasswordLength ... {}", r.wifi_password.len())?;
        writeln!(
            f,
            "   WifiPassword ......... {}",
            "*".repeat(r.wifi_password.len() as usize)
        )?;
        writeln!(f, "   StationIP ............ {}", r.station_ip)?;
        writeln!(f, "   AccessIP ............. {}", r.access_ip)?;
        writeln!(f, "   NetMask .............. {}", r.netmask)?;
        writeln!(f, "   Gateway .............. {}", r.gateway)?;
        writeln!(f, "   SerialBaud ........... {}", r.serial_baud)?;
        writeln!(f, "   WebServerPort ........ {}", r.web_server_port)?;
        writeln!(f, "   WebSocketServerPort .. {}", r.websocket_server_port)?;
        writeln!(f, "   SensorWaitTime ....... {}", r.sensor_wait_time)?;
        writeln!(f, "   TempHighLimit ........ {}", r.temp_high_limit)?;
        writeln!(f, "   TempLowLimit ......... {}", r.temp_low_limit)?;
        writeln!(f, "   LabelLength .......... {}", r.label.len())?;
        write!(f, "   Label ................ {}", r.label.to_str_lossy())
    }
}


// EOF
