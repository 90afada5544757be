//! Configuration validation

use super::{Config, PortEntry};
use crate::dataplane::CidrKey;
use crate::protocol::MacAddr;
use crate::telemetry::{is_known_format, is_known_level};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_logging(config, &mut result);
    validate_macs(config, &mut result);
    validate_prefixes("ipv4", 32, &config.blacklist.ipv4, &mut result);
    validate_prefixes("ipv6", 128, &config.blacklist.ipv6, &mut result);
    validate_ports("tcp", &config.blacklist.tcp, &mut result);
    validate_ports("udp", &config.blacklist.udp, &mut result);

    if config.blacklist.is_empty() {
        result.warn("blacklist: no entries, every frame will pass");
    }

    result
}

fn validate_logging(config: &Config, result: &mut ValidationResult) {
    if !is_known_level(&config.logging.level) {
        result.warn(format!(
            "logging.level: unknown level '{}', using info",
            config.logging.level
        ));
    }
    if !is_known_format(&config.logging.format) {
        result.warn(format!(
            "logging.format: unknown format '{}', using pretty",
            config.logging.format
        ));
    }
}

fn validate_macs(config: &Config, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (i, entry) in config.blacklist.mac.iter().enumerate() {
        match entry.parse::<MacAddr>() {
            Ok(mac) => {
                if !seen.insert(mac) {
                    result.warn(format!("blacklist.mac[{}]: duplicate entry {}", i, mac));
                }
            }
            Err(e) => result.error(format!("blacklist.mac[{}]: {}", i, e)),
        }
    }
}

fn validate_prefixes(list: &str, width: u32, entries: &[String], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        let cidr = match entry.parse::<CidrKey>() {
            Ok(cidr) => cidr,
            Err(e) => {
                result.error(format!("blacklist.{}[{}]: {}", list, i, e));
                continue;
            }
        };

        if cidr.address.width() != width {
            result.error(format!(
                "blacklist.{}[{}]: '{}' is not an {} prefix",
                list, i, entry, list
            ));
            continue;
        }
        if cidr.has_host_bits() {
            result.warn(format!(
                "blacklist.{}[{}]: '{}' has host bits set, stored as {}",
                list,
                i,
                entry,
                cidr.network()
            ));
        }
        if !seen.insert(cidr.network()) {
            result.warn(format!(
                "blacklist.{}[{}]: duplicate entry {}",
                list,
                i,
                cidr.network()
            ));
        }
    }
}

fn validate_ports(list: &str, entries: &[PortEntry], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        if !seen.insert(*entry) {
            result.warn(format!(
                "blacklist.{}[{}]: duplicate entry {:?} port {}",
                list, i, entry.direction, entry.port
            ));
        }
    }
}
