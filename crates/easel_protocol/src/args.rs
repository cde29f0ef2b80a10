//! Argument normalization
//!
//! Every drawing argument is either a scalar, which is inlined into the command's argument
//! list, or a bulk array, which is lifted out into a side buffer and replaced by an indexed
//! descriptor. Buffer indices are local to the command and follow allocation order.

use crate::array::{encode_array, ArrayDescriptor, NdArray};
use crate::points::MultiPoint;
use crate::reference::RemoteRef;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Inline argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(value) => Some(*value as f64),
            Scalar::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// A single drawing argument, decided at the API boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Scalar(Scalar),
    Bulk(NdArray),
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value.into())
                }
            }

            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_scalar_from!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    &str => Str,
    String => Str,
);

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        Arg::Scalar(value.into())
    }
}

impl From<&RemoteRef> for Scalar {
    fn from(value: &RemoteRef) -> Self {
        Scalar::Str(value.serialized())
    }
}

impl From<&RemoteRef> for Arg {
    fn from(value: &RemoteRef) -> Self {
        Arg::Scalar(value.into())
    }
}

impl From<Scalar> for Arg {
    fn from(value: Scalar) -> Self {
        Arg::Scalar(value)
    }
}

impl From<NdArray> for Arg {
    fn from(value: NdArray) -> Self {
        Arg::Bulk(value)
    }
}

impl From<&NdArray> for Arg {
    fn from(value: &NdArray) -> Self {
        Arg::Bulk(value.clone())
    }
}

macro_rules! impl_bulk_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for Arg {
                fn from(values: Vec<$ty>) -> Self {
                    Arg::Bulk(NdArray::from(values))
                }
            }

            impl From<&[$ty]> for Arg {
                fn from(values: &[$ty]) -> Self {
                    Arg::Bulk(NdArray::from(values))
                }
            }
        )*
    };
}

impl_bulk_from!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Argument as it appears in a command's argument list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireArg {
    Array(ArrayDescriptor),
    Scalar(Scalar),
}

impl WireArg {
    pub fn is_null(&self) -> bool {
        matches!(self, WireArg::Scalar(Scalar::Null))
    }
}

/// Appends one argument. Bulk arrays get their bytes pushed onto `buffers` and a descriptor
/// whose `idx` is the position of those bytes.
pub fn populate_args(arg: Arg, args: &mut Vec<WireArg>, buffers: &mut Vec<Bytes>) {
    match arg {
        Arg::Scalar(scalar) => args.push(WireArg::Scalar(scalar)),
        Arg::Bulk(array) => {
            let (descriptor, bytes) = encode_array(&array);
            args.push(WireArg::Array(descriptor.with_index(buffers.len())));
            buffers.push(bytes);
        }
    }
}

/// Argument list and side buffers of one command under construction
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    args: Vec<WireArg>,
    buffers: Vec<Bytes>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        populate_args(arg.into(), &mut self.args, &mut self.buffers);
        self
    }

    /// Appends `arg`, or repeats the previous argument when it is absent. Used for optional
    /// heights that default to the width.
    pub fn arg_or_repeat<A: Into<Arg>>(self, arg: Option<A>) -> Self {
        match arg {
            Some(arg) => self.arg(arg),
            None => self.repeat_last(),
        }
    }

    /// Appends a copy of the previous wire argument. A descriptor keeps its `idx`, so no new
    /// buffer is allocated. With no previous argument a null is appended.
    pub fn repeat_last(mut self) -> Self {
        let last = self
            .args
            .last()
            .cloned()
            .unwrap_or(WireArg::Scalar(Scalar::Null));
        self.args.push(last);
        self
    }

    /// Appends a normalized point set as `points, counts, item count`
    pub fn points(self, points: MultiPoint) -> Self {
        let items = points.items as i64;
        self.arg(points.points).arg(points.counts).arg(items)
    }

    pub fn args(&self) -> &[WireArg] {
        &self.args
    }

    pub fn buffers(&self) -> &[Bytes] {
        &self.buffers
    }

    pub fn into_parts(self) -> (Vec<WireArg>, Vec<Bytes>) {
        (self.args, self.buffers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DType;

    #[test]
    fn scalars_are_inlined() {
        let args = CommandArgs::new()
            .arg(10)
            .arg(2.5)
            .arg(true)
            .arg("hello")
            .arg(None::<f64>);

        assert!(args.buffers().is_empty());
        assert_eq!(
            args.args(),
            &[
                WireArg::Scalar(Scalar::Int(10)),
                WireArg::Scalar(Scalar::Float(2.5)),
                WireArg::Scalar(Scalar::Bool(true)),
                WireArg::Scalar(Scalar::Str("hello".into())),
                WireArg::Scalar(Scalar::Null),
            ]
        );
    }

    #[test]
    fn arrays_get_sequential_buffer_indices() {
        let args = CommandArgs::new()
            .arg(vec![1.0f64, 2.0, 3.0])
            .arg(5)
            .arg(vec![4i32, 5, 6]);

        assert_eq!(args.buffers().len(), 2);
        assert_eq!(
            args.args()[0],
            WireArg::Array(ArrayDescriptor::new(vec![3], DType::Float64).with_index(0))
        );
        assert_eq!(args.args()[1], WireArg::Scalar(Scalar::Int(5)));
        assert_eq!(
            args.args()[2],
            WireArg::Array(ArrayDescriptor::new(vec![3], DType::Int32).with_index(1))
        );
    }

    #[test]
    fn repeat_last_scalar() {
        let (args, buffers) = CommandArgs::new()
            .arg(1)
            .arg(2)
            .arg(30)
            .arg_or_repeat(None::<f64>)
            .into_parts();

        assert!(buffers.is_empty());
        assert_eq!(args[2], args[3]);
        assert_eq!(args[3], WireArg::Scalar(Scalar::Int(30)));
    }

    #[test]
    fn repeat_last_bulk_reuses_buffer() {
        let (args, buffers) = CommandArgs::new()
            .arg(vec![0.0f64, 1.0])
            .arg(vec![0.0f64, 1.0])
            .arg(vec![5.0f64, 6.0])
            .arg_or_repeat(None::<f64>)
            .into_parts();

        assert_eq!(buffers.len(), 3);
        assert_eq!(args.len(), 4);
        assert_eq!(args[3], args[2]);
        match &args[3] {
            WireArg::Array(descriptor) => assert_eq!(descriptor.idx, Some(2)),
            other => panic!("expected a descriptor, got {other:?}"),
        }
    }

    #[test]
    fn repeat_on_empty_list_appends_null() {
        let (args, _) = CommandArgs::new().repeat_last().into_parts();
        assert_eq!(args, vec![WireArg::Scalar(Scalar::Null)]);
    }

    #[test]
    fn wire_args_serialize_inline() {
        let (args, _) = CommandArgs::new().arg(1).arg(vec![1u8, 2]).arg("x").into_parts();
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"[1,{"shape":[2],"dtype":"uint8","idx":0},"x"]"#);

        let back: Vec<WireArg> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, args);
    }

    #[test]
    fn remote_refs_are_strings() {
        let reference = RemoteRef::new("abc".into());
        let (args, _) = CommandArgs::new().arg(&reference).into_parts();
        assert_eq!(args[0], WireArg::Scalar(Scalar::Str("IPY_MODEL_abc".into())));
    }
}
