//! MACRT bridge client
//!
//! Each bridge listens on UDP port `12000 + last octet of its address`. A
//! query is the text `MACRTGET <register>` where the register of channel `n`
//! is `(n - 1)·11 + 3`. The bridge answers on port 12000 of the querying
//! host with whitespace-separated fields; the third one is the resistance.

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    PollError, ResistanceSource, DEFAULT_QUERY_PORT, DEFAULT_REPLY_TIMEOUT_MS, MACRT_BASE_PORT,
};
use crate::monitor::ProbeConfig;

/// Registers per channel on a bridge
const REGISTERS_PER_CHANNEL: u32 = 11;

/// Offset of the resistance register within a channel
const RESISTANCE_REGISTER: u32 = 3;

/// MACRT client settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacrtConfig {
    /// Local port queries are sent from (0 picks any)
    #[serde(default = "default_query_port")]
    pub query_port: u16,
    /// Local port replies arrive on (0 picks any)
    #[serde(default = "default_response_port")]
    pub response_port: u16,
    /// Bridge port is this plus the last octet of its address
    #[serde(default = "default_response_port")]
    pub base_port: u16,
    /// How long to wait for a reply
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

fn default_query_port() -> u16 {
    DEFAULT_QUERY_PORT
}

fn default_response_port() -> u16 {
    MACRT_BASE_PORT
}

fn default_reply_timeout_ms() -> u64 {
    DEFAULT_REPLY_TIMEOUT_MS
}

impl Default for MacrtConfig {
    fn default() -> Self {
        Self {
            query_port: DEFAULT_QUERY_PORT,
            response_port: MACRT_BASE_PORT,
            base_port: MACRT_BASE_PORT,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}

/// Query text for a bridge channel
pub fn query_text(channel: u8) -> Result<String, PollError> {
    if channel == 0 {
        return Err(PollError::InvalidChannel(channel));
    }
    let register = (u32::from(channel) - 1) * REGISTERS_PER_CHANNEL + RESISTANCE_REGISTER;
    Ok(format!("MACRTGET {register}"))
}

/// Resistance carried by a bridge reply
pub fn parse_reply(reply: &str) -> Result<f64, PollError> {
    reply
        .split_whitespace()
        .nth(2)
        .and_then(|field| field.parse::<f64>().ok())
        .ok_or_else(|| PollError::MalformedReply(reply.trim().to_string()))
}

/// UDP client for MACRT resistance bridges
#[derive(Debug)]
pub struct MacrtClient {
    query: UdpSocket,
    response: UdpSocket,
    config: MacrtConfig,
}

impl MacrtClient {
    /// Bind the query and reply sockets
    pub fn bind(config: MacrtConfig) -> Result<Self, PollError> {
        let query = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.query_port))?;
        let response = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.response_port))?;
        response.set_read_timeout(Some(Duration::from_millis(config.reply_timeout_ms.max(1))))?;
        info!(
            query_port = query.local_addr()?.port(),
            response_port = response.local_addr()?.port(),
            "MACRT client bound"
        );
        Ok(Self {
            query,
            response,
            config,
        })
    }

    /// Local port replies are expected on
    pub fn response_port(&self) -> Result<u16, PollError> {
        Ok(self.response.local_addr()?.port())
    }

    /// Settings in use
    pub fn config(&self) -> &MacrtConfig {
        &self.config
    }

    /// Socket address of the bridge at `address`
    pub fn bridge_endpoint(&self, address: &str) -> Result<SocketAddrV4, PollError> {
        let ip: Ipv4Addr = address
            .trim()
            .parse()
            .map_err(|_| PollError::InvalidAddress(address.to_string()))?;
        let port = self
            .config
            .base_port
            .checked_add(u16::from(ip.octets()[3]))
            .ok_or_else(|| PollError::InvalidAddress(address.to_string()))?;
        Ok(SocketAddrV4::new(ip, port))
    }

    /// Discard replies that arrived after an earlier query timed out
    fn drain_stale(&self) -> io::Result<()> {
        let mut buf = [0u8; 512];
        self.response.set_nonblocking(true)?;
        let drained = loop {
            match self.response.recv_from(&mut buf) {
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.response.set_nonblocking(false)?;
        drained
    }
}

impl ResistanceSource for MacrtClient {
    fn read_resistance(&mut self, probe: &ProbeConfig) -> Result<f64, PollError> {
        let query = query_text(probe.channel)?;
        let endpoint = self.bridge_endpoint(&probe.address)?;
        self.drain_stale()?;

        debug!(%endpoint, %query, probe = %probe.name, "querying bridge");
        self.query.send_to(query.as_bytes(), endpoint)?;

        let mut buf = [0u8; 512];
        let len = match self.response.recv_from(&mut buf) {
            Ok((len, _)) => len,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Err(PollError::NoReading);
            }
            Err(e) => return Err(e.into()),
        };
        let reply = String::from_utf8_lossy(&buf[..len]);
        parse_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_register() {
        assert_eq!(query_text(1).unwrap(), "MACRTGET 3");
        assert_eq!(query_text(3).unwrap(), "MACRTGET 25");
        assert!(matches!(query_text(0), Err(PollError::InvalidChannel(0))));
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply("3 OK 1234.5 ohm\n").unwrap(), 1234.5);
        assert!(matches!(parse_reply("3 OK"), Err(PollError::MalformedReply(_))));
        assert!(matches!(parse_reply("a b c"), Err(PollError::MalformedReply(_))));
    }

    #[test]
    fn test_bridge_port_from_last_octet() {
        let client = MacrtClient::bind(MacrtConfig {
            query_port: 0,
            response_port: 0,
            ..MacrtConfig::default()
        })
        .unwrap();
        let ep = client.bridge_endpoint("192.168.1.103").unwrap();
        assert_eq!(ep.port(), 12103);
        assert!(matches!(
            client.bridge_endpoint("not-an-ip"),
            Err(PollError::InvalidAddress(_))
        ));
    }
}
