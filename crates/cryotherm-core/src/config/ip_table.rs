//! Bridge address table
//!
//! Plain text file mapping short names to bridge addresses:
//!
//! ```text
//! IP1 = '192.168.1.101'   # dilution unit
//! IP3 = "192.168.1.103"
//! ```
//!
//! Spaces and quotes are stripped from keys and values, and anything after
//! `#` is a comment.

use std::fs;
use std::path::Path;

use super::ConfigError;

/// Ordered name to address table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpTable {
    entries: Vec<(String, String)>,
}

impl IpTable {
    /// Parse table text
    ///
    /// Blank and comment-only lines are skipped. A later entry replaces an
    /// earlier one with the same key.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, rest)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine {
                    line: idx + 1,
                    content: raw.to_string(),
                });
            };
            let key: String = key.chars().filter(|c| *c != ' ').collect();
            let value: String = rest
                .split('#')
                .next()
                .unwrap_or_default()
                .chars()
                .filter(|c| !matches!(c, ' ' | '"' | '\''))
                .collect();
            if key.is_empty() {
                return Err(ConfigError::MalformedLine {
                    line: idx + 1,
                    content: raw.to_string(),
                });
            }
            table.insert(key, value);
        }
        Ok(table)
    }

    /// Load a table file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Add or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, address: impl Into<String>) {
        let key = key.into();
        let address = address.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = address,
            None => self.entries.push((key, address)),
        }
    }

    /// Address for a name
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Address for `address_or_key`: the table entry if it is a known name,
    /// the text itself otherwise
    pub fn resolve<'a>(&'a self, address_or_key: &'a str) -> &'a str {
        self.get(address_or_key).unwrap_or(address_or_key)
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_entry_wins() {
        let table = IpTable::parse("IP1 = '10.0.0.1'\nIP1 = '10.0.0.2'\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("IP1"), Some("10.0.0.2"));
    }

    #[test]
    fn test_resolve_falls_back_to_literal() {
        let table = IpTable::parse("IP1 = '10.0.0.1'").unwrap();
        assert_eq!(table.resolve("IP1"), "10.0.0.1");
        assert_eq!(table.resolve("192.168.1.5"), "192.168.1.5");
    }
}
