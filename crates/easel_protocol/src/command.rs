//! Command entries
//!
//! A drawing command is sent as `[opcode, args, bufferCount]`. Two special entries exist: the
//! surface switch `[59, [reference]]` and the attribute set `[41, [attributeId, value]]`.

use crate::args::{CommandArgs, Scalar, WireArg};
use crate::attributes::{AttrValue, AttributeKey};
use crate::errors::ProtocolError;
use crate::opcodes::Opcode;
use crate::reference::RemoteRef;
use bytes::Bytes;
use serde::{Serialize, Serializer};

/// One encoded drawing command
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub opcode: Opcode,
    pub args: Vec<WireArg>,
    /// Number of side buffers belonging to this command
    pub buffer_count: usize,
}

impl Command {
    /// Creates a command, dropping trailing null arguments
    pub fn new(opcode: Opcode, mut args: Vec<WireArg>, buffer_count: usize) -> Self {
        strip_trailing_nulls(&mut args);
        Self {
            opcode,
            args,
            buffer_count,
        }
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.opcode, &self.args, self.buffer_count).serialize(serializer)
    }
}

/// Removes null arguments from the end of the list. Nulls in between are kept.
pub fn strip_trailing_nulls(args: &mut Vec<WireArg>) {
    while args.last().is_some_and(WireArg::is_null) {
        args.pop();
    }
}

/// Builds a command from a finished argument list, returning its side buffers alongside
pub fn encode(opcode: Opcode, args: CommandArgs) -> (Command, Vec<Bytes>) {
    let (args, buffers) = args.into_parts();
    (Command::new(opcode, args, buffers.len()), buffers)
}

/// Builds a command from its camelCase name
pub fn encode_by_name(
    name: &str,
    args: Vec<WireArg>,
    buffers: &[Bytes],
) -> Result<Command, ProtocolError> {
    let opcode =
        Opcode::from_name(name).ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))?;
    Ok(Command::new(opcode, args, buffers.len()))
}

/// Entry of a command stream
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Draw(Command),
    /// Subsequent commands target this surface
    Switch(RemoteRef),
    /// Changes a drawing attribute
    Set { attribute: u16, value: Scalar },
}

impl Entry {
    /// Validated attribute change
    pub fn set<A: AttributeKey>(attribute: A, value: &AttrValue) -> Result<Self, ProtocolError> {
        attribute.validate(value)?;
        Ok(Entry::Set {
            attribute: attribute.id(),
            value: value.to_scalar(),
        })
    }

    pub fn switch(surface: &RemoteRef) -> Self {
        Entry::Switch(surface.clone())
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Entry::Draw(command) => command.opcode,
            Entry::Switch(_) => Opcode::SwitchCanvas,
            Entry::Set { .. } => Opcode::Set,
        }
    }

    /// Number of side buffers this entry consumes
    pub fn buffer_count(&self) -> usize {
        match self {
            Entry::Draw(command) => command.buffer_count,
            _ => 0,
        }
    }
}

impl From<Command> for Entry {
    fn from(command: Command) -> Self {
        Entry::Draw(command)
    }
}

impl Serialize for Entry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Entry::Draw(command) => command.serialize(serializer),
            Entry::Switch(surface) => {
                (Opcode::SwitchCanvas, [surface.serialized()]).serialize(serializer)
            }
            Entry::Set { attribute, value } => {
                (Opcode::Set, (attribute, value)).serialize(serializer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attribute, RoughAttribute};

    #[test]
    fn trailing_nulls_are_stripped() {
        let args = CommandArgs::new()
            .arg("hello")
            .arg(10)
            .arg(20)
            .arg(None::<f64>)
            .arg(None::<f64>);
        let (command, buffers) = encode(Opcode::FillText, args);

        assert!(buffers.is_empty());
        assert_eq!(command.args.len(), 3);
        assert_eq!(
            serde_json::to_string(&command).unwrap(),
            r#"[27,["hello",10,20],0]"#
        );
    }

    #[test]
    fn embedded_nulls_are_kept() {
        let args = CommandArgs::new().arg(1).arg(None::<f64>).arg(2).arg(None::<f64>);
        let (command, _) = encode(Opcode::Arc, args);
        assert_eq!(serde_json::to_string(&command).unwrap(), r#"[22,[1,null,2],0]"#);
    }

    #[test]
    fn buffer_count_matches_buffers() {
        let args = CommandArgs::new()
            .arg(vec![1.0f64, 2.0])
            .arg(vec![3.0f64, 4.0])
            .arg(vec![5.0f64, 6.0]);
        let (command, buffers) = encode(Opcode::FillCircles, args);
        assert_eq!(command.buffer_count, 3);
        assert_eq!(buffers.len(), 3);
    }

    #[test]
    fn encode_by_name_looks_up_the_table() {
        let (args, buffers) = CommandArgs::new().arg(0).arg(0).arg(5).arg(5).into_parts();
        let command = encode_by_name("fillRect", args.clone(), &buffers).unwrap();
        assert_eq!(command.opcode, Opcode::FillRect);

        assert!(matches!(
            encode_by_name("fillSquare", args, &buffers),
            Err(ProtocolError::UnknownCommand(name)) if name == "fillSquare"
        ));
    }

    #[test]
    fn special_entries() {
        let switch = Entry::switch(&RemoteRef::new("abc".into()));
        assert_eq!(
            serde_json::to_string(&switch).unwrap(),
            r#"[59,["IPY_MODEL_abc"]]"#
        );

        let set = Entry::set(Attribute::FillStyle, &"red".into()).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"[41,[0,"red"]]"#);

        let rough = Entry::set(RoughAttribute::Roughness, &2.5.into()).unwrap();
        assert_eq!(serde_json::to_string(&rough).unwrap(), r#"[41,[101,2.5]]"#);
    }

    #[test]
    fn set_validates() {
        assert!(Entry::set(Attribute::GlobalAlpha, &3.0.into()).is_err());
    }
}
