use crate::errors::Error;
use core::fmt::Display;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A setting can be either a signed integer, unsigned integer, string, map or boolean.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Setting {
    SInt(isize),
    UInt(usize),
    String(String),
    Bool(bool),
    Map(Vec<String>),
}

impl Setting {
    #[must_use]
    pub fn to_bool(&self) -> bool {
        if !matches!(self, Self::Bool(_)) {
            warn!("setting is not a boolean");
        }

        match self {
            Self::Bool(value) => *value,
            Self::SInt(value) => *value != 0,
            Self::UInt(value) => *value != 0,
            Self::String(value) => is_bool_value(value),
            Self::Map(values) => !values.is_empty(),
        }
    }

    #[must_use]
    pub fn to_sint(&self) -> isize {
        if !matches!(self, Self::SInt(_)) {
            warn!("setting is not an signed integer");
        }

        match self {
            Self::SInt(value) => *value,
            Self::UInt(value) => *value as isize,
            Self::Bool(value) => isize::from(*value),
            Self::String(value) => isize::from(is_bool_value(value)),
            Self::Map(values) => values.len() as isize,
        }
    }

    #[must_use]
    pub fn to_uint(&self) -> usize {
        if !matches!(self, Self::UInt(_)) {
            warn!("setting is not an unsigned integer");
        }

        match self {
            Self::UInt(value) => *value,
            Self::SInt(value) => *value as usize,
            Self::Bool(value) => usize::from(*value),
            Self::String(value) => usize::from(is_bool_value(value)),
            Self::Map(values) => values.len(),
        }
    }

    #[allow(clippy::inherent_to_string_shadow_display)]
    #[must_use]
    pub fn to_string(&self) -> String {
        if !matches!(self, Self::String(_)) {
            warn!("setting is not a string");
        }

        match self {
            Self::SInt(value) => value.to_string(),
            Self::UInt(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Bool(value) => value.to_string(),
            Self::Map(values) => values.join(","),
        }
    }

    #[must_use]
    pub fn to_map(&self) -> Vec<String> {
        if !matches!(self, Self::Map(_)) {
            warn!("setting is not a map");
        }

        match self {
            Self::Map(values) => values.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Typed text form as stored on disk (`u:20`, `b:true`, ...)
    fn to_typed_string(&self) -> String {
        match self {
            Self::SInt(value) => format!("i:{value}"),
            Self::UInt(value) => format!("u:{value}"),
            Self::String(value) => format!("s:{value}"),
            Self::Bool(value) => format!("b:{value}"),
            Self::Map(values) => format!("m:{}", values.join(",")),
        }
    }
}

fn is_bool_value(s: &str) -> bool {
    let us = s.to_uppercase();
    ["YES", "ON", "TRUE", "1"].contains(&us.as_str())
}

impl Serialize for Setting {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.to_typed_string())
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value)
            .map_err(|err| serde::de::Error::custom(format!("cannot deserialize: {err}")))
    }
}

impl Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SInt(value) => write!(f, "i:{value}"),
            Self::UInt(value) => write!(f, "u:{value}"),
            Self::String(value) => write!(f, "s:{value}"),
            Self::Bool(value) => write!(f, "b:{value}"),
            Self::Map(values) => write!(f, "m: {}", values.join(",")),
        }
    }
}

impl FromStr for Setting {
    type Err = Error;

    // first element is the type:
    //   b:true
    //   i:-123
    //   u:234
    //   s:hello world
    //   m:foo,bar,baz

    fn from_str(key: &str) -> Result<Self, Error> {
        let Some((key_type, key_value)) = key.split_once(':') else {
            return Err(Error::Config(format!("setting without type prefix: {key}")));
        };

        let setting = match key_type {
            "b" => Self::Bool(
                key_value
                    .parse::<bool>()
                    .map_err(|err| Error::Config(format!("error parsing {key_value}: {err}")))?,
            ),
            "i" => Self::SInt(
                key_value
                    .parse::<isize>()
                    .map_err(|err| Error::Config(format!("error parsing {key_value}: {err}")))?,
            ),
            "u" => Self::UInt(
                key_value
                    .parse::<usize>()
                    .map_err(|err| Error::Config(format!("error parsing {key_value}: {err}")))?,
            ),
            "s" => Self::String(key_value.to_string()),
            "m" => Self::Map(key_value.split(',').map(str::to_string).collect()),
            _ => return Err(Error::Config(format!("unknown setting: {key_value}"))),
        };

        Ok(setting)
    }
}

/// `SettingInfo` returns information about a given setting
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SettingInfo {
    /// Name of the key in dot notation (ie: surface.ready.max_retries)
    pub key: String,
    /// Description of the setting
    pub description: String,
    /// Default setting if none has been specified
    pub default: Setting,
}
