//! Template-driven command encoder. Resolves a catalog definition, validates
//! and clamps parameters, substitutes them into the hex payload template, and
//! finishes the payload with the optional terminator and CRC trailer.

use crate::core::WriteMode;
use crate::error::{LinkError, ProtocolError, ValidationError};
use crate::infra::{crc, hex};
use crate::protocol::catalog::{self, CommandDefinition, ParamType, TargetRole};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Caller-supplied value for one declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

/// Named parameter set passed to [`encode`]. Insertion order is irrelevant;
/// parameters are resolved by the catalog definition.
#[derive(Debug, Clone, Default)]
pub struct CommandParams {
    values: Vec<(String, ParamValue)>,
}

impl CommandParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: i64) -> Self {
        self.values.push((name.to_string(), ParamValue::Int(value)));
        self
    }

    pub fn set_text(mut self, name: &str, value: &str) -> Self {
        self.values
            .push((name.to_string(), ParamValue::Text(value.to_string())));
        self
    }

    fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Final product of an [`encode`] call: wire bytes plus routing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCommand {
    pub payload: Vec<u8>,
    pub target: TargetRole,
    pub write_mode: WriteMode,
    pub description: &'static str,
}

/// Encode `(category, command, params)` into wire bytes using the static
/// catalog. Unknown entries are a [`ProtocolError`]; parameter problems are
/// [`ValidationError`]s.
pub fn encode(
    category: &str,
    command: &str,
    params: &CommandParams,
) -> Result<EncodedCommand, LinkError> {
    let definition =
        catalog::lookup(category, command).ok_or_else(|| ProtocolError::UnknownCommand {
            category: category.to_string(),
            command: command.to_string(),
        })?;

    let payload = encode_definition(definition, params)?;

    Ok(EncodedCommand {
        payload,
        target: definition.target,
        write_mode: definition.write_mode,
        description: definition.description,
    })
}

/// Encode against an explicit definition. Split out so tests can exercise
/// terminator and CRC handling without a dedicated catalog entry.
pub(crate) fn encode_definition(
    definition: &CommandDefinition,
    params: &CommandParams,
) -> Result<Vec<u8>, LinkError> {
    let mut template = String::from(definition.template);

    for decl in definition.params {
        let value = resolve_parameter(decl, params)?;
        template = substitute(&template, decl.name, &value);
    }

    let mut payload = hex::decode(&template).map_err(LinkError::Protocol)?;

    if !definition.terminator.is_empty() {
        let terminator = hex::decode(definition.terminator).map_err(LinkError::Protocol)?;
        payload.extend_from_slice(&terminator);
    }

    if definition.crc {
        crc::append_crc(&mut payload);
    }

    Ok(payload)
}

/// Resolved parameter ready for template substitution.
enum Resolved {
    Int(i64),
    Text(String),
}

fn resolve_parameter(
    decl: &'static catalog::ParameterDefinition,
    params: &CommandParams,
) -> Result<Resolved, ValidationError> {
    if decl.ty == ParamType::Text {
        return match params.get(decl.name) {
            Some(ParamValue::Text(text)) => Ok(Resolved::Text(text.clone())),
            Some(ParamValue::Int(_)) => Err(ValidationError::WrongType { name: decl.name }),
            None => Err(ValidationError::MissingParameter { name: decl.name }),
        };
    }

    let value = match params.get(decl.name) {
        Some(ParamValue::Int(v)) => *v,
        Some(ParamValue::Text(_)) => {
            return Err(ValidationError::WrongType { name: decl.name });
        }
        None => decl
            .default
            .ok_or(ValidationError::MissingParameter { name: decl.name })?,
    };

    // Clamp to the declared bounds, then recheck against the type's natural
    // range: a declared bound outside that range must not silently pass.
    let (min, max) = decl.bounds();
    let clamped = value.clamp(min, max);
    let (nat_min, nat_max) = decl.ty.natural_range();
    if clamped < nat_min || clamped > nat_max {
        return Err(ValidationError::OutOfRange {
            name: decl.name,
            value: clamped,
            min: nat_min,
            max: nat_max,
        });
    }

    Ok(Resolved::Int(clamped))
}

/// Replace every placeholder form of `name` in the template:
/// `{name:02X}` one hex byte, `{name:04X}` two hex bytes little-endian,
/// `{name}` the raw decimal/text rendering.
fn substitute(template: &str, name: &str, value: &Resolved) -> String {
    let byte_pattern = format!("{{{name}:02X}}");
    let word_pattern = format!("{{{name}:04X}}");
    let raw_pattern = format!("{{{name}}}");

    let mut out = String::from(template);
    match value {
        Resolved::Int(v) => {
            let byte = format!("{:02X}", (*v as u64) & 0xFF);
            let word = format!("{:02X}{:02X}", (*v as u64) & 0xFF, ((*v as u64) >> 8) & 0xFF);
            out = out.replace(&byte_pattern, &byte);
            out = out.replace(&word_pattern, &word);
            out = out.replace(&raw_pattern, &v.to_string());
        }
        Resolved::Text(text) => {
            out = out.replace(&raw_pattern, text);
        }
    }
    out
}

/// Split a payload into pieces no larger than `mtu - 3` bytes (three bytes
/// reserved for the ATT header).
pub fn chunk_payload(payload: &[u8], mtu: u16) -> Vec<Vec<u8>> {
    let max_chunk = (mtu as usize).saturating_sub(3).max(1);
    if payload.len() <= max_chunk {
        return alloc::vec![payload.to_vec()];
    }
    payload.chunks(max_chunk).map(<[u8]>::to_vec).collect()
}
