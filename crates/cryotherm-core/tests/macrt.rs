use std::net::UdpSocket;
use std::thread;

use cryotherm_core::conversion::ProbeType;
use cryotherm_core::monitor::ProbeConfig;
use cryotherm_core::protocol::{MacrtClient, MacrtConfig, PollError, ResistanceSource};

/// Client talking to a loopback bridge bound on an ephemeral port
fn client_and_bridge(reply_timeout_ms: u64) -> (MacrtClient, UdpSocket) {
    let bridge = UdpSocket::bind("127.0.0.1:0").unwrap();
    let bridge_port = bridge.local_addr().unwrap().port();
    // 127.0.0.1 ends in 1, so the bridge port is base + 1
    let client = MacrtClient::bind(MacrtConfig {
        query_port: 0,
        response_port: 0,
        base_port: bridge_port - 1,
        reply_timeout_ms,
    })
    .unwrap();
    (client, bridge)
}

#[test]
fn test_query_and_reply() {
    let (mut client, bridge) = client_and_bridge(2_000);
    let reply_port = client.response_port().unwrap();

    let server = thread::spawn(move || {
        let mut buf = [0u8; 64];
        let (len, _) = bridge.recv_from(&mut buf).unwrap();
        let query = String::from_utf8_lossy(&buf[..len]).to_string();
        bridge
            .send_to(b"25 R 1234.5 Ohm\n", ("127.0.0.1", reply_port))
            .unwrap();
        query
    });

    let probe = ProbeConfig::new("Anneau 80mK", "127.0.0.1", 3, ProbeType::MobileBt);
    let r = client.read_resistance(&probe).unwrap();
    assert_eq!(r, 1234.5);
    assert_eq!(server.join().unwrap(), "MACRTGET 25");
}

#[test]
fn test_silent_bridge_is_no_reading() {
    let (mut client, _bridge) = client_and_bridge(50);
    let probe = ProbeConfig::new("Boite Mel", "127.0.0.1", 1, ProbeType::MobileBt);
    assert!(matches!(client.read_resistance(&probe), Err(PollError::NoReading)));
}

#[test]
fn test_bad_probe_settings() {
    let (mut client, _bridge) = client_and_bridge(50);
    let bad_channel = ProbeConfig::new("x", "127.0.0.1", 0, ProbeType::Pt100);
    assert!(matches!(
        client.read_resistance(&bad_channel),
        Err(PollError::InvalidChannel(0))
    ));
    let bad_address = ProbeConfig::new("x", "IP1", 1, ProbeType::Pt100);
    assert!(matches!(
        client.read_resistance(&bad_address),
        Err(PollError::InvalidAddress(_))
    ));
}
