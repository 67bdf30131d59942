// layout.rs
//
// Byte layout of the persisted configuration record. The offsets are a wire
// format: they are relative to the record base offset and must never move.

/// Total size of the persisted record in bytes.
pub const RECORD_SIZE: usize = 176;

/// Capacity of the emulated EEPROM region.
pub const DEFAULT_CAPACITY: usize = 512;

/// Where the record starts inside the backing store. Must be a multiple of 8.
pub const DEFAULT_BASE_OFFSET: usize = 0;

/// Longest SSID, password or label, not counting the terminator.
pub const MAX_TEXT_LEN: usize = 31;

/// Size of each text buffer including the terminator.
pub const TEXT_BUF_LEN: usize = MAX_TEXT_LEN + 1;

pub const SPARE_LEN: usize = 37;

pub mod offset {
    pub const SIZE: usize = 0;
    pub const VERSION: usize = 2;
    pub const FLAGS: usize = 4;
    pub const WIFI_SSID: usize = 8;
    pub const WIFI_PASSWORD: usize = 40;
    pub const STATION_IP: usize = 72;
    pub const ACCESS_IP: usize = 76;
    pub const NETMASK: usize = 80;
    pub const GATEWAY: usize = 84;
    pub const SERIAL_BAUD: usize = 88;
    pub const WEB_SERVER_PORT: usize = 92;
    pub const WEBSOCKET_SERVER_PORT: usize = 94;
    pub const SENSOR_WAIT_TIME: usize = 96;
    pub const TEMP_HIGH_LIMIT: usize = 100;
    pub const TEMP_LOW_LIMIT: usize = 102;
    pub const WIFI_SSID_LENGTH: usize = 104;
    pub const WIFI_PASSWORD_LENGTH: usize = 105;
    pub const LABEL: usize = 106;
    pub const LABEL_LENGTH: usize = 138;
    pub const SPARE: usize = 139;
}

/// Name, offset and width of every field, in storage order.
pub const FIELDS: [(&str, usize, usize); 20] = [
    ("Size", offset::SIZE, 2),
    ("Version", offset::VERSION, 2),
    ("Flags", offset::FLAGS, 4),
    ("WifiSSID", offset::WIFI_SSID, TEXT_BUF_LEN),
    ("WifiPassword", offset::WIFI_PASSWORD, TEXT_BUF_LEN),
    ("StationIP", offset::STATION_IP, 4),
    ("AccessIP", offset::ACCESS_IP, 4),
    ("NetMask", offset::NETMASK, 4),
    ("Gateway", offset::GATEWAY, 4),
    ("SerialBaud", offset::SERIAL_BAUD, 4),
    ("WebServerPort", offset::WEB_SERVER_PORT, 2),
    ("WebSocketServerPort", offset::WEBSOCKET_SERVER_PORT, 2),
    ("SensorWaitTime", offset::SENSOR_WAIT_TIME, 4),
    ("TempHighLimit", offset::TEMP_HIGH_LIMIT, 2),
    ("TempLowLimit", offset::TEMP_LOW_LIMIT, 2),
    ("WifiSSIDLength", offset::WIFI_SSID_LENGTH, 1),
    ("WifiPasswordLength", offset::WIFI_PASSWORD_LENGTH, 1),
    ("Label", offset::LABEL, TEXT_BUF_LEN),
    ("LabelLength", offset::LABEL_LENGTH, 1),
    ("Spare", offset::SPARE, SPARE_LEN),
];

// Every 2 and 4 byte field sits on a multiple of its own width, fields are
// contiguous and the last one ends exactly at RECORD_SIZE.
const fn layout_is_sound() -> bool {
    let mut i = 0;
    let mut next = 0;
    while i < FIELDS.len() {
        let (_, off, width) = FIELDS[i];
        if off != next {
            return false;
        }
        if (width == 2 || width == 4) && off % width != 0 {
            return false;
        }
        next = off + width;
        i += 1;
    }
    next == RECORD_SIZE
}

const _: () = assert!(layout_is_sound());
const _: () = assert!(DEFAULT_BASE_OFFSET % 8 == 0);
const _: () = assert!(DEFAULT_BASE_OFFSET + RECORD_SIZE <= DEFAULT_CAPACITY);


// EOF
