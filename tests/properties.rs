// tests/properties.rs
//
// Behaviour of the configuration store as seen by code outside the crate.

use std::net::Ipv4Addr;

use esp32sensor::*;

fn booted() -> SensorConfig<MemBacking> {
    SensorConfig::boot(RomStore::new(MemBacking::default()).unwrap()).unwrap()
}

fn diff(before: &[u8], after: &[u8]) -> Vec<usize> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn defaults_read_back_exactly() {
    let mut store = RomStore::new(MemBacking::default()).unwrap();
    let mut record = ConfigRecord::defaults();
    record.label = FixedText::new("stale").unwrap();
    store.initialize_defaults(Some(&mut record)).unwrap();

    let r = store.read_record().unwrap();
    assert_eq!(r, record);
    assert_eq!(r.size, 176);
    assert_eq!(r.version.raw(), 0x0101);
    assert_eq!(
        r.flags.bits(),
        ConfigFlags::INITIALIZED
            | ConfigFlags::TEMP_PROBE_CONNECTED
            | ConfigFlags::DEVICE_RELAY_CONNECTED
            | ConfigFlags::TEMP_DISPLAY_FAHRENHEIT
            | ConfigFlags::WIFI_STATION_ENABLED
    );
    assert!(!r.flags.debug_messages());
    assert_eq!(r.station_ip, Ipv4Addr::new(0, 0, 0, 0));
    assert_eq!(r.access_ip, Ipv4Addr::new(192, 168, 0, 10));
    assert_eq!(r.netmask, Ipv4Addr::new(255, 255, 255, 0));
    assert_eq!(r.gateway, Ipv4Addr::new(192, 168, 0, 62));
    assert_eq!(r.serial_baud, DEFAULT_BAUD);
    assert_eq!(r.web_server_port, 80);
    assert_eq!(r.websocket_server_port, 81);
    assert_eq!(r.sensor_wait_time, 15000);
    assert_eq!(r.temp_high_limit, 85);
    assert_eq!(r.temp_low_limit, 35);
    assert_eq!(r.wifi_ssid.len(), 0);
    assert_eq!(r.wifi_password.len(), 0);
    assert_eq!(r.label.len(), 0);
}

#[test]
fn field_write_touches_only_its_bytes() {
    let mut store = RomStore::new(MemBacking::default()).unwrap();
    store.initialize_defaults(Some(&mut ConfigRecord::defaults())).unwrap();
    let before = store.snapshot().unwrap();

    let off = store.field_offset(offset::TEMP_LOW_LIMIT);
    store.write_field(off, &(-40i16).to_le_bytes()).unwrap();
    let after = store.snapshot().unwrap();

    assert!(diff(&before, &after).iter().all(|i| (off..off + 2).contains(i)));
    assert_eq!(store.read_record().unwrap().temp_low_limit, -40);
}

#[test]
fn typed_setters_touch_only_their_field() {
    let mut cfg = booted();
    let cases: Vec<(usize, usize, Box<dyn Fn(&mut SensorConfig<MemBacking>) -> Outcome>)> = vec![
        (offset::TEMP_HIGH_LIMIT, 2, Box::new(|c| c.set_temp_high_limit(120).unwrap())),
        (offset::SERIAL_BAUD, 4, Box::new(|c| c.set_serial_baud(9600).unwrap())),
        (offset::SENSOR_WAIT_TIME, 4, Box::new(|c| c.set_sensor_wait_time(60_000).unwrap())),
        (offset::WEBSOCKET_SERVER_PORT, 2, Box::new(|c| c.set_websocket_port(8081).unwrap())),
        (
            offset::ACCESS_IP,
            4,
            Box::new(|c| c.set_access_ip(Ipv4Addr::new(10, 0, 0, 1)).unwrap()),
        ),
        (offset::FLAGS, 4, Box::new(|c| c.set_relay_connected(false).unwrap())),
    ];
    for (field, width, set) in cases {
        let before = cfg.store().snapshot().unwrap();
        assert_eq!(set(&mut cfg), Outcome::Written);
        let after = cfg.store().snapshot().unwrap();
        let changed = diff(&before, &after);
        assert!(!changed.is_empty());
        assert!(changed.iter().all(|i| (field..field + width).contains(i)), "field at {field}");
        assert!(cfg.verify().unwrap());
    }
}

#[test]
fn writing_twice_equals_writing_once() {
    let mut once = RomStore::new(MemBacking::default()).unwrap();
    let mut twice = RomStore::new(MemBacking::default()).unwrap();
    once.initialize_defaults(Some(&mut ConfigRecord::defaults())).unwrap();
    twice.initialize_defaults(Some(&mut ConfigRecord::defaults())).unwrap();

    let off = once.field_offset(offset::SERIAL_BAUD);
    let value = 57_600u32.to_le_bytes();
    once.write_field(off, &value).unwrap();
    twice.write_field(off, &value).unwrap();
    twice.write_field(off, &value).unwrap();

    assert_eq!(once.snapshot().unwrap(), twice.snapshot().unwrap());
    assert_eq!(once.backing().flushes(), twice.backing().flushes());
}

#[test]
fn writes_below_the_base_are_refused() {
    let mut store = RomStore::with_base(MemBacking::default(), 64).unwrap();
    store.initialize_defaults(Some(&mut ConfigRecord::defaults())).unwrap();
    let before = store.snapshot().unwrap();

    for off in [0, 8, 63] {
        let err = store.write_field(off, &[0xde, 0xad]).unwrap_err();
        assert!(matches!(err, StoreError::BelowBase { base: 64, .. }));
    }
    assert_eq!(store.snapshot().unwrap(), before);

    store.write_field(64, &[176, 0]).unwrap();
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn absent_record_is_a_no_op() {
    let mut store = RomStore::new(MemBacking::from_bytes(vec![0x5a; DEFAULT_CAPACITY])).unwrap();
    store.initialize_defaults(None).unwrap();
    assert!(store.snapshot().unwrap().iter().all(|b| *b == 0x5a));
    assert_eq!(store.backing().flushes(), 0);
}

#[test]
fn ssid_length_boundary() {
    let mut cfg = booted();
    let longest = "s".repeat(31);
    assert_eq!(cfg.set_wifi_ssid(&longest).unwrap(), Outcome::Written);
    assert_eq!(cfg.record().wifi_ssid.len(), 31);

    let snap = cfg.store().snapshot().unwrap();
    assert_eq!(snap[offset::WIFI_SSID_LENGTH], 31);
    assert_eq!(snap[offset::WIFI_SSID + 31], 0);

    assert_eq!(cfg.set_wifi_ssid(&"t".repeat(32)).unwrap(), Outcome::Rejected);
    assert_eq!(cfg.store().snapshot().unwrap(), snap);
    assert!(cfg.record().wifi_ssid == *longest.as_str());
}

#[test]
fn password_and_label_share_the_boundary() {
    let mut cfg = booted();
    assert_eq!(cfg.set_wifi_password(&"p".repeat(31)).unwrap(), Outcome::Written);
    assert_eq!(cfg.set_wifi_password(&"p".repeat(32)).unwrap(), Outcome::Rejected);
    assert_eq!(cfg.set_label(&"l".repeat(31)).unwrap(), Outcome::Written);
    assert_eq!(cfg.set_label(&"l".repeat(40)).unwrap(), Outcome::Rejected);
    assert_eq!(cfg.record().wifi_password.len(), 31);
    assert_eq!(cfg.record().label.len(), 31);
}

#[test]
fn each_stored_flag_bit_toggles_alone() {
    let mut store = RomStore::new(MemBacking::default()).unwrap();
    let mut record = ConfigRecord::defaults();
    store.initialize_defaults(Some(&mut record)).unwrap();
    let off = store.field_offset(offset::FLAGS);

    for (mask, name) in ConfigFlags::NAMED {
        for on in [true, false] {
            let before = store.read_record().unwrap().flags;
            let mut flags = before;
            flags.set(mask, on);
            store.write_field(off, &flags.bits().to_le_bytes()).unwrap();

            let after = store.read_record().unwrap().flags;
            assert_eq!(after.contains(mask), on, "{name}");
            assert_eq!(after.bits() & !mask, before.bits() & !mask, "{name}");
        }
        // put the default back before the next bit
        store.write_field(off, &record.flags.bits().to_le_bytes()).unwrap();
    }
}

#[test]
fn named_flag_setters_toggle_one_bit() {
    let mut cfg = booted();
    type Setter = fn(&mut SensorConfig<MemBacking>, bool) -> Result<Outcome, StoreError>;
    let setters: [(u32, Setter); 5] = [
        (ConfigFlags::TEMP_PROBE_CONNECTED, SensorConfig::set_probe_connected),
        (ConfigFlags::DEVICE_RELAY_CONNECTED, SensorConfig::set_relay_connected),
        (ConfigFlags::DEBUG_MESSAGES, SensorConfig::set_debug_messages),
        (ConfigFlags::TEMP_DISPLAY_FAHRENHEIT, SensorConfig::set_fahrenheit),
        (ConfigFlags::WIFI_STATION_ENABLED, SensorConfig::set_wifi_station),
    ];
    for (mask, set) in setters {
        for on in [true, false, true] {
            let before = cfg.record().flags.bits();
            set(&mut cfg, on).unwrap();
            let after = cfg.record().flags.bits();
            assert_eq!(after & mask != 0, on);
            assert_eq!(after & !mask, before & !mask);
            assert!(cfg.verify().unwrap());
        }
    }
}

#[test]
fn settings_survive_a_reboot() {
    let mut cfg = booted();
    cfg.set_wifi_ssid("home").unwrap();
    cfg.set_wifi_password("correct horse").unwrap();
    cfg.set_station_ip(Ipv4Addr::new(192, 168, 1, 77)).unwrap();
    cfg.set_celsius_limits();

    let rebooted = SensorConfig::boot(cfg.into_store()).unwrap();
    let r = rebooted.record();
    assert_eq!(rebooted.state(), ConfigState::Configured);
    assert!(r.wifi_ssid == *"home");
    assert!(r.wifi_password == *"correct horse");
    assert_eq!(r.station_ip, Ipv4Addr::new(192, 168, 1, 77));
    assert!(!r.flags.fahrenheit());
    assert_eq!((r.temp_low_limit, r.temp_high_limit), (2, 30));
}

trait CelsiusLimits {
    fn set_celsius_limits(&mut self);
}

impl CelsiusLimits for SensorConfig<MemBacking> {
    fn set_celsius_limits(&mut self) {
        self.set_fahrenheit(false).unwrap();
        self.set_temp_low_limit(2).unwrap();
        self.set_temp_high_limit(30).unwrap();
    }
}

#[test]
fn file_backed_store_persists_across_opens() {
    let path = std::env::temp_dir().join(format!("esp32sensor-props-{}.eeprom", std::process::id()));
    let _ = std::fs::remove_file(&path);

    {
        let store = RomStore::new(FileBacking::open(&path, DEFAULT_CAPACITY).unwrap()).unwrap();
        let mut cfg = SensorConfig::boot(store).unwrap();
        assert_eq!(cfg.state(), ConfigState::Bootstrapped);
        cfg.set_label("greenhouse").unwrap();
    }

    let store = RomStore::new(FileBacking::open(&path, DEFAULT_CAPACITY).unwrap()).unwrap();
    let cfg = SensorConfig::boot(store).unwrap();
    assert_eq!(cfg.state(), ConfigState::Configured);
    assert!(cfg.record().label == *"greenhouse");
    let _ = std::fs::remove_file(&path);
}
