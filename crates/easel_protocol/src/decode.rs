//! Decoder for outbound messages
//!
//! Reverses [`serialize_commands`](crate::message::serialize_commands): the command stream is
//! parsed, every descriptor argument is resolved against the argument buffers of its own entry
//! and the remote references of switch entries are parsed back.

use crate::args::Scalar;
use crate::array::{decode_array, ArrayDescriptor, DType, NdArray};
use crate::errors::ProtocolError;
use crate::message::OutboundMessage;
use crate::opcodes::Opcode;
use crate::reference::RemoteRef;
use bytes::Bytes;
use serde_json::Value;

/// Argument of a decoded command
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedArg {
    Scalar(Scalar),
    Array(NdArray),
}

/// Entry of a decoded command stream
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEntry {
    Draw {
        opcode: Opcode,
        args: Vec<DecodedArg>,
    },
    Switch(RemoteRef),
    Set {
        attribute: u16,
        value: Scalar,
    },
}

impl DecodedEntry {
    pub fn opcode(&self) -> Opcode {
        match self {
            DecodedEntry::Draw { opcode, .. } => *opcode,
            DecodedEntry::Switch(_) => Opcode::SwitchCanvas,
            DecodedEntry::Set { .. } => Opcode::Set,
        }
    }
}

/// Decodes a complete message
pub fn decode_message(message: &OutboundMessage) -> Result<Vec<DecodedEntry>, ProtocolError> {
    decode_buffers(&message.metadata, &message.buffers)
}

/// Parses the JSON command stream (buffer 0) of a message without resolving arguments
pub fn command_stream(
    metadata: &ArrayDescriptor,
    buffers: &[Bytes],
) -> Result<Value, ProtocolError> {
    if metadata.dtype != DType::Uint8 {
        return Err(ProtocolError::UnsupportedDtype(metadata.dtype));
    }

    let stream = buffers
        .first()
        .ok_or_else(|| ProtocolError::MalformedEntry("message has no command stream".into()))?;

    if stream.len() != metadata.byte_len() {
        return Err(ProtocolError::BufferLength {
            dtype: metadata.dtype,
            shape: metadata.shape.clone(),
            expected: metadata.byte_len(),
            found: stream.len(),
        });
    }

    Ok(serde_json::from_slice(stream)?)
}

/// Decodes a metadata descriptor and buffer list as handed to the transport
pub fn decode_buffers(
    metadata: &ArrayDescriptor,
    buffers: &[Bytes],
) -> Result<Vec<DecodedEntry>, ProtocolError> {
    let entries = match command_stream(metadata, buffers)? {
        // a batch is a list of entries, a single entry starts with its opcode
        Value::Array(items) if items.first().map_or(true, Value::is_array) => items,
        single @ Value::Array(_) => vec![single],
        other => {
            return Err(ProtocolError::MalformedEntry(format!(
                "command stream is not a list: {other}"
            )))
        }
    };

    let arg_buffers = &buffers[1..];
    let mut offset = 0;
    let decoded = entries
        .iter()
        .map(|entry| decode_entry(entry, arg_buffers, &mut offset))
        .collect::<Result<Vec<_>, _>>()?;

    if offset != arg_buffers.len() {
        return Err(ProtocolError::MalformedEntry(format!(
            "{} argument buffers are not claimed by any entry",
            arg_buffers.len() - offset
        )));
    }

    Ok(decoded)
}

fn decode_entry(
    entry: &Value,
    arg_buffers: &[Bytes],
    offset: &mut usize,
) -> Result<DecodedEntry, ProtocolError> {
    let Value::Array(parts) = entry else {
        return Err(ProtocolError::MalformedEntry(format!("entry is not a list: {entry}")));
    };
    if parts.len() > 3 {
        return Err(ProtocolError::MalformedEntry(format!("entry has extra fields: {entry}")));
    }

    let id = parts
        .first()
        .and_then(Value::as_u64)
        .ok_or_else(|| ProtocolError::MalformedEntry(format!("entry has no opcode: {entry}")))?;
    let opcode = u8::try_from(id)
        .ok()
        .and_then(Opcode::from_id)
        .ok_or(ProtocolError::UnknownOpcode(id))?;

    let args: &[Value] = match parts.get(1) {
        Some(Value::Array(args)) => args,
        None => &[],
        Some(other) => {
            return Err(ProtocolError::MalformedEntry(format!(
                "arguments are not a list: {other}"
            )))
        }
    };

    // switch and set entries carry no count
    let count = match parts.get(2) {
        None => 0,
        Some(value) => value.as_u64().ok_or_else(|| {
            ProtocolError::MalformedEntry(format!("buffer count is not a number: {value}"))
        })? as usize,
    };

    let end = offset
        .checked_add(count)
        .filter(|end| *end <= arg_buffers.len())
        .ok_or(ProtocolError::BufferIndex {
            index: offset.saturating_add(count).saturating_sub(1),
            count: arg_buffers.len(),
        })?;
    let own_buffers = &arg_buffers[*offset..end];
    *offset = end;

    match opcode {
        Opcode::SwitchCanvas => {
            let reference = args
                .first()
                .and_then(Value::as_str)
                .and_then(RemoteRef::parse)
                .ok_or_else(|| {
                    ProtocolError::MalformedEntry(format!("switch without surface: {entry}"))
                })?;
            Ok(DecodedEntry::Switch(reference))
        }
        Opcode::Set => {
            let [attribute, value] = args else {
                return Err(ProtocolError::MalformedEntry(format!("malformed set: {entry}")));
            };
            let attribute = attribute
                .as_u64()
                .and_then(|id| u16::try_from(id).ok())
                .ok_or_else(|| {
                    ProtocolError::MalformedEntry(format!("malformed attribute id: {attribute}"))
                })?;
            Ok(DecodedEntry::Set {
                attribute,
                value: serde_json::from_value(value.clone())?,
            })
        }
        _ => Ok(DecodedEntry::Draw {
            opcode,
            args: args
                .iter()
                .map(|arg| decode_arg(arg, own_buffers))
                .collect::<Result<_, _>>()?,
        }),
    }
}

fn decode_arg(arg: &Value, buffers: &[Bytes]) -> Result<DecodedArg, ProtocolError> {
    if !arg.is_object() {
        return Ok(DecodedArg::Scalar(serde_json::from_value(arg.clone())?));
    }

    let descriptor: ArrayDescriptor = serde_json::from_value(arg.clone())?;
    let idx = descriptor.idx.ok_or_else(|| {
        ProtocolError::MalformedEntry(format!("array argument without buffer index: {arg}"))
    })?;
    let bytes = buffers.get(idx).ok_or(ProtocolError::BufferIndex {
        index: idx,
        count: buffers.len(),
    })?;

    Ok(DecodedArg::Array(decode_array(bytes, &descriptor)?))
}
