// validate.rs
//
// Value constraints checked before anything reaches the store.

use std::net::Ipv4Addr;

/// Serial baud rates the device accepts.
pub const BAUD_RATES: [u32; 9] = [
    9600, 14400, 19200, 28800, 38400, 57600, 115_200, 230_400, 460_800,
];

pub fn is_valid_baud(baud: u32) -> bool {
    BAUD_RATES.contains(&baud)
}

/// 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16.
pub fn is_private_v4(addr: Ipv4Addr) -> bool {
    match addr.octets() {
        [10, ..] => true,
        [172, b, ..] => (16..=31).contains(&b),
        [192, 168, ..] => true,
        _ => false,
    }
}

pub fn is_valid_wait_time(ms: u32) -> bool {
    ms > 0
}


// EOF
