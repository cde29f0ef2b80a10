//! Wire serialization
//!
//! An outbound message is a metadata descriptor plus a buffer list:
//!
//! ```text
//!   metadata: {"shape": [N], "dtype": "uint8"}
//!   buffers:  [command stream (N bytes of JSON), arg buffer 0, arg buffer 1, ...]
//! ```
//!
//! A batch is written as a JSON list of entries, a single immediate command as one flat entry.
//! Argument buffers follow in allocation order, so the buffers of entry *k* come right after
//! those of entries 0..k.

use crate::array::{encode_array, ArrayDescriptor, NdArray};
use crate::command::Entry;
use crate::errors::ProtocolError;
use bytes::Bytes;
use log::debug;

/// What goes into one message
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Single(&'a Entry),
    Batch(&'a [Entry]),
}

/// A message ready to be handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub metadata: ArrayDescriptor,
    pub buffers: Vec<Bytes>,
}

impl OutboundMessage {
    /// JSON command stream
    pub fn command_stream(&self) -> &[u8] {
        self.buffers
            .first()
            .map(|stream| &stream[..])
            .unwrap_or_default()
    }

    /// Argument buffers in allocation order
    pub fn arg_buffers(&self) -> &[Bytes] {
        self.buffers.get(1..).unwrap_or(&[])
    }
}

/// Serializes entries and packs them with their argument buffers into one message
pub fn serialize_commands(
    payload: Payload<'_>,
    arg_buffers: Vec<Bytes>,
) -> Result<OutboundMessage, ProtocolError> {
    let stream = match payload {
        Payload::Single(entry) => serde_json::to_vec(entry)?,
        Payload::Batch(entries) => serde_json::to_vec(entries)?,
    };

    let (metadata, stream) = encode_array(&NdArray::from(stream));
    debug!(
        "serialized command stream of {} bytes with {} argument buffers",
        stream.len(),
        arg_buffers.len()
    );

    let mut buffers = Vec::with_capacity(arg_buffers.len() + 1);
    buffers.push(stream);
    buffers.extend(arg_buffers);

    Ok(OutboundMessage { metadata, buffers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::CommandArgs;
    use crate::array::DType;
    use crate::command::encode;
    use crate::opcodes::Opcode;

    fn fill_rect(x: i32, y: i32, w: i32, h: i32) -> Entry {
        let (command, _) = encode(
            Opcode::FillRect,
            CommandArgs::new().arg(x).arg(y).arg(w).arg(h),
        );
        command.into()
    }

    #[test]
    fn batch_is_a_list_of_entries() {
        let entries = vec![fill_rect(10, 10, 20, 20), fill_rect(40, 40, 15, 15)];
        let message = serialize_commands(Payload::Batch(&entries), vec![]).unwrap();

        let stream = std::str::from_utf8(message.command_stream()).unwrap();
        assert_eq!(stream, "[[0,[10,10,20,20],0],[0,[40,40,15,15],0]]");
        assert_eq!(message.metadata.dtype, DType::Uint8);
        assert_eq!(message.metadata.shape, vec![stream.len()]);
        assert_eq!(message.metadata.idx, None);
        assert!(message.arg_buffers().is_empty());
    }

    #[test]
    fn single_entry_is_flat() {
        let entry = fill_rect(1, 2, 3, 4);
        let message = serialize_commands(Payload::Single(&entry), vec![]).unwrap();
        assert_eq!(message.command_stream(), b"[0,[1,2,3,4],0]");
    }

    #[test]
    fn buffers_follow_the_stream() {
        let (command, buffers) = encode(
            Opcode::FillCircles,
            CommandArgs::new()
                .arg(vec![1.0f32, 2.0])
                .arg(vec![3.0f32, 4.0])
                .arg(5.0),
        );
        let entry = Entry::from(command);
        let message = serialize_commands(Payload::Single(&entry), buffers.clone()).unwrap();

        assert_eq!(message.buffers.len(), 3);
        assert_eq!(message.arg_buffers(), &buffers[..]);
        assert_eq!(message.metadata.shape, vec![message.command_stream().len()]);
    }

    #[test]
    fn metadata_json() {
        let entry = fill_rect(1, 2, 3, 4);
        let message = serialize_commands(Payload::Single(&entry), vec![]).unwrap();
        assert_eq!(
            serde_json::to_string(&message.metadata).unwrap(),
            r#"{"shape":[15],"dtype":"uint8"}"#
        );
    }
}
