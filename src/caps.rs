//! Parsing of the monitor-supplied capability string.
//!
//! Capability strings use an informal nested-parenthesis dialect,
//! `key(value)` tokens in sequence:
//!
//! ```text
//! (prot(monitor)type(LCD)model(ACME)cmds(01 02)vcp(02 10 12 14(01 05 08)))
//! ```
//!
//! Monitors are known to return slightly malformed strings in the field
//! (bit errors, dropped characters), so parsing never fails: missing or
//! unparsable pieces degrade to empty defaults with a logged warning, and
//! unknown keys are ignored.

use std::collections::HashMap;

use tracing::warn;

use crate::features::{self, FeatureDefinition};

/// Parsed capability information reported by one monitor.
///
/// Built once per monitor session and cached by the facade; only re-opening
/// the monitor produces a fresh report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Capabilities {
    /// Protocol class, such as `"monitor"`.
    pub protocol: String,
    /// Device type, such as `"LCD"`.
    pub device_type: String,
    /// Model name.
    pub model: String,
    /// MCCS version, such as `"2.1"`.
    pub mccs_version: String,
    /// Supported VCP features, in the order the monitor reported them.
    /// Codes the registry knows carry their registry definition; the rest
    /// are synthesized with [`FeatureDefinition::unknown`].
    pub supported_features: Vec<FeatureDefinition>,
    /// Monitor-supplied feature names by code. Populated lazily from the
    /// reserved `vcpname` key; may remain empty.
    pub feature_names: HashMap<u8, String>,
}

impl Capabilities {
    /// Whether the monitor reports support for the VCP `code`.
    pub fn supports_code(&self, code: u8) -> bool {
        self.supported_features.iter().any(|def| def.code == code)
    }
}

/// Parses a capability string into a best-effort [`Capabilities`].
///
/// Mandatory fields (`prot`, `type`, `model`, `mccs_ver`, a non-empty `vcp`
/// list) that are missing leave their defaults in place and log a warning;
/// this function never fails.
pub fn parse_capabilities(caps: &str) -> Capabilities {
    let mut protocol: Option<String> = None;
    let mut device_type: Option<String> = None;
    let mut model: Option<String> = None;
    let mut mccs_version: Option<String> = None;
    let mut supported: Vec<FeatureDefinition> = Vec::new();

    let mut rest = caps;
    while let Some(entry) = next_entry(rest) {
        rest = entry.tail;
        match entry.key {
            "prot" => assign_first(&mut protocol, entry.group),
            "type" => assign_first(&mut device_type, entry.group),
            "model" => assign_first(&mut model, entry.group),
            "mccs_ver" => assign_first(&mut mccs_version, entry.group),
            // Supported command opcodes; parsed for validity but not
            // retained, matching what callers consume today.
            "cmds" => {
                hex_values(entry.group);
            }
            "vcp" => parse_vcp_group(entry.group, &mut supported),
            // Reserved for mapping codes to human names.
            "vcpname" => {}
            _ => {}
        }
    }

    if protocol.is_none() {
        warn!("prot missing from capabilities string");
    }
    if device_type.is_none() {
        warn!("type missing from capabilities string");
    }
    if model.is_none() {
        warn!("model missing from capabilities string");
    }
    if mccs_version.is_none() {
        warn!("mccs_ver missing from capabilities string");
    }
    if supported.is_empty() {
        warn!("vcp missing from capabilities string");
    }

    Capabilities {
        protocol: protocol.unwrap_or_default(),
        device_type: device_type.unwrap_or_default(),
        model: model.unwrap_or_default(),
        mccs_version: mccs_version.unwrap_or_default(),
        supported_features: supported,
        feature_names: HashMap::new(),
    }
}

struct Entry<'a> {
    key: &'a str,
    group: &'a str,
    tail: &'a str,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Finds the next `key(...)` token, skipping anything that is not one.
fn next_entry(input: &str) -> Option<Entry<'_>> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if is_word_byte(bytes[i]) {
            let start = i;
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            let key = &input[start..i];
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'(' {
                let (group, after) = balanced_group(input, j);
                return Some(Entry {
                    key,
                    group,
                    tail: &input[after..],
                });
            }
            // A bare word with no following group; resume after it.
        } else {
            i += 1;
        }
    }
    None
}

/// Returns the text inside the balanced group opening at `open`, and the
/// index just past its closing parenthesis. An unterminated group consumes
/// the remainder of the input.
fn balanced_group(input: &str, open: usize) -> (&str, usize) {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    for i in open..bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return (&input[open + 1..i], i + 1);
                }
            }
            _ => {}
        }
    }
    (&input[open + 1..], input.len())
}

/// Parses the contents of a `vcp` group: bare hex tokens are feature codes,
/// and a parenthesized group attaches an enumerated value list to the most
/// recently appended feature.
fn parse_vcp_group(group: &str, supported: &mut Vec<FeatureDefinition>) {
    let bytes = group.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                let (inner, after) = balanced_group(group, i);
                i = after;
                match supported.last_mut() {
                    Some(last) => last.enumerated_values.extend(hex_values(inner)),
                    None => warn!("value list with no preceding VCP code in capabilities string"),
                }
            }
            b if is_word_byte(b) => {
                let start = i;
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                let token = &group[start..i];
                match u8::from_str_radix(token, 16) {
                    Ok(code) => {
                        let def = features::lookup_by_code(code)
                            .cloned()
                            .unwrap_or_else(|| FeatureDefinition::unknown(code));
                        supported.push(def);
                    }
                    Err(_) => warn!(token, "ignoring unparsable VCP code token"),
                }
            }
            _ => i += 1,
        }
    }
}

fn hex_values(text: &str) -> Vec<u16> {
    let mut values = Vec::new();
    for token in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        match u16::from_str_radix(token, 16) {
            Ok(value) => values.push(value),
            Err(_) => warn!(token, "ignoring unparsable value token"),
        }
    }
    values
}

fn assign_first(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.trim().to_owned());
    }
}
