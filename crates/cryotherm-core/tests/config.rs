use std::fs;

use cryotherm_core::config::{ConfigError, IpTable, MonitorConfig};
use cryotherm_core::conversion::ProbeType;
use cryotherm_core::monitor::MonitorError;
use pretty_assertions::assert_eq;

#[test]
fn test_ip_table_strips_quotes_spaces_and_comments() {
    let table = IpTable::parse(
        "IP1 = '192.168.1.101'   # dilution unit\n\
         IP3=\"192.168.1.103\"\n\
         \n\
         # spare bridge\n\
         IP 4 = ' 192.168.1.104 '\n",
    )
    .unwrap();
    let entries: Vec<_> = table.entries().collect();
    assert_eq!(
        entries,
        vec![
            ("IP1", "192.168.1.101"),
            ("IP3", "192.168.1.103"),
            ("IP4", "192.168.1.104"),
        ]
    );
}

#[test]
fn test_ip_table_rejects_line_without_equals() {
    let err = IpTable::parse("IP1 = '192.168.1.101'\nIP2 192.168.1.102\n").unwrap_err();
    assert!(matches!(err, ConfigError::MalformedLine { line: 2, .. }));
}

#[test]
fn test_ip_table_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("IPs_connection.txt");
    fs::write(&path, "IP1 = '192.168.1.101'\n").unwrap();
    let table = IpTable::load(&path).unwrap();
    assert_eq!(table.get("IP1"), Some("192.168.1.101"));
}

#[test]
fn test_config_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    let mut config = MonitorConfig::default();
    config.monitor.buffer_len = 200;
    config.conversion.fallback_temperature = 400.0;
    config.probes[0].above_transition = true;
    config.save(&path).unwrap();

    let loaded = MonitorConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"Mobile BT\""));
}

#[test]
fn test_partial_json_takes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    fs::write(
        &path,
        r#"{
            "probes": [
                {"name": "Etage 4 K", "address": "IP3", "channel": 1, "probe_type": "Mobile HT"}
            ],
            "monitor": {"buffer_len": 10}
        }"#,
    )
    .unwrap();
    let config = MonitorConfig::load(&path).unwrap();
    assert_eq!(config.probes.len(), 1);
    assert_eq!(config.probes[0].probe_type, ProbeType::MobileHt);
    assert!(!config.probes[0].above_transition);
    assert_eq!(config.monitor.buffer_len, 10);
    assert_eq!(config.monitor.sample_rate_hz, 1.0);
    assert_eq!(config.conversion.fallback_temperature, 500.0);
}

#[test]
fn test_unknown_probe_type_in_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    fs::write(
        &path,
        r#"{"probes": [{"name": "x", "address": "IP1", "channel": 1, "probe_type": "Bogus"}]}"#,
    )
    .unwrap();
    assert!(matches!(MonitorConfig::load(&path), Err(ConfigError::JsonError(_))));
}

#[test]
fn test_invalid_buffer_length_in_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    fs::write(&path, r#"{"monitor": {"buffer_len": 0}}"#).unwrap();
    assert!(matches!(
        MonitorConfig::load(&path),
        Err(ConfigError::Monitor(MonitorError::InvalidBufferLength(0)))
    ));
}

#[test]
fn test_build_monitor_resolves_addresses() {
    let table = IpTable::parse("IP1 = '192.168.1.101'\nIP3 = '192.168.1.103'\n").unwrap();
    let (monitor, ids) = MonitorConfig::default().build_monitor(&table).unwrap();
    assert_eq!(ids.len(), 6);
    let addresses: Vec<_> = monitor
        .probes()
        .iter()
        .map(|p| (p.config().address.as_str(), p.config().channel))
        .collect();
    assert_eq!(
        addresses,
        vec![
            ("192.168.1.101", 1),
            ("192.168.1.101", 2),
            ("192.168.1.101", 3),
            ("192.168.1.103", 1),
            ("192.168.1.103", 2),
            ("192.168.1.103", 3),
        ]
    );
    assert_eq!(monitor.probe(ids[5]).unwrap().config().probe_type, ProbeType::Pt100);
    assert_eq!(monitor.probe(ids[0]).unwrap().samples().len(), 50);
}
