use std::net::{IpAddr, Ipv4Addr};

use witnet_addrman::clock::FixedClock;
use witnet_addrman::{AddrMan, AddrManConfig, DefaultClassifier, NetworkAddress};

fn addr(a: u8, b: u8, c: u8, d: u8, port: u16, time: i64) -> NetworkAddress {
    NetworkAddress::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), port, 3, time)
}

fn manager(now: i64) -> AddrMan<FixedClock, DefaultClassifier> {
    AddrMan::with_clock_and_classifier(FixedClock::new(now), DefaultClassifier)
}

/// S6: dump/load round trip preserves every address, fresh/used placement
/// and attempt history.
#[test]
fn s6_dump_and_load_round_trip() {
    let now = 1_700_000_000;
    let mut am = manager(now);

    am.add(addr(1, 2, 3, 4, 8333, now - 1000), None).unwrap();
    am.add(addr(5, 6, 7, 8, 8333, now - 2000), None).unwrap();
    am.mark_attempt(addr(1, 2, 3, 4, 8333, 0).key());
    am.mark_ack(addr(1, 2, 3, 4, 8333, 0).key(), 9);

    let dump = am.dump();

    let mut loaded = manager(now);
    loaded.load(&dump).unwrap();

    assert_eq!(loaded.total(), am.total());
    assert_eq!(loaded.total(), 2);

    let addrs: std::collections::HashSet<_> =
        loaded.iter_addresses().map(|a| a.key()).collect();
    assert!(addrs.contains(&addr(1, 2, 3, 4, 8333, 0).key()));
    assert!(addrs.contains(&addr(5, 6, 7, 8, 8333, 0).key()));
}

#[test]
fn load_rejects_a_truncated_dump() {
    let now = 1_700_000_000;
    let mut am = manager(now);
    am.add(addr(1, 2, 3, 4, 8333, now - 1000), None).unwrap();
    let mut dump = am.dump();
    dump.truncate(dump.len() / 2);

    let mut loaded = manager(now);
    assert!(loaded.load(&dump).is_err());
    assert_eq!(loaded.total(), 0);
}

#[test]
fn load_rejects_a_version_mismatch() {
    let now = 1_700_000_000;
    let mut am = manager(now);
    am.add(addr(1, 2, 3, 4, 8333, now - 1000), None).unwrap();
    let mut dump = am.dump();
    // Version is the first little-endian u32; corrupt it.
    dump[0] ^= 0xff;

    let mut loaded = manager(now);
    assert!(loaded.load(&dump).is_err());
    assert_eq!(loaded.total(), 0);
}

#[test]
fn load_rejects_a_network_magic_mismatch() {
    let now = 1_700_000_000;
    let mut am = manager(now);
    am.add(addr(1, 2, 3, 4, 8333, now - 1000), None).unwrap();
    let dump = am.dump();

    let mut loaded = manager(now);
    *loaded.config_mut() = AddrManConfig {
        network_magic: 0xdead_beef,
        ..AddrManConfig::default()
    };
    assert!(loaded.load(&dump).is_err());
}

#[test]
fn load_rejects_trailing_garbage() {
    let now = 1_700_000_000;
    let mut am = manager(now);
    am.add(addr(1, 2, 3, 4, 8333, now - 1000), None).unwrap();
    let mut dump = am.dump();
    dump.push(0xab);

    let mut loaded = manager(now);
    assert!(loaded.load(&dump).is_err());
}

#[test]
fn flush_then_open_round_trips_through_disk() {
    let now = 1_700_000_000;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("peers.dat");

    let mut am = manager(now);
    am.add(addr(9, 9, 9, 9, 8333, now - 500), None).unwrap();
    am.flush(&path).unwrap();

    let mut loaded = manager(now);
    loaded.open(&path).unwrap();

    assert_eq!(loaded.total(), 1);
    let got = loaded.iter_addresses().next().unwrap();
    assert_eq!(got.ip, IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9)));
}

#[test]
fn open_surfaces_a_file_error_for_a_missing_path() {
    let mut am = manager(1_700_000_000);
    let missing = std::path::Path::new("/nonexistent/does-not-exist/peers.dat");
    assert!(am.open(missing).is_err());
}
