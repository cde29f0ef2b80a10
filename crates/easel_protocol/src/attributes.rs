//! Drawing state attributes
//!
//! Attributes use their own numbering, separate from the opcode table. The rough sketch style
//! adds a few attributes of its own starting at 100.

use crate::args::Scalar;
use crate::color::parse_color;
use crate::errors::ProtocolError;
use crate::reference::RemoteRef;
use std::fmt;

/// Value of a drawing attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Number(f64),
    Bool(bool),
    /// Gradient, pattern or other remote object
    Reference(RemoteRef),
}

impl AttrValue {
    /// Form in which the value is sent
    pub fn to_scalar(&self) -> Scalar {
        match self {
            AttrValue::Str(value) => Scalar::Str(value.clone()),
            AttrValue::Number(value) => Scalar::Float(*value),
            AttrValue::Bool(value) => Scalar::Bool(*value),
            AttrValue::Reference(reference) => Scalar::Str(reference.serialized()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(value) => write!(f, "{value}"),
            AttrValue::Number(value) => write!(f, "{value}"),
            AttrValue::Bool(value) => write!(f, "{value}"),
            AttrValue::Reference(reference) => write!(f, "{reference}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(f64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<RemoteRef> for AttrValue {
    fn from(value: RemoteRef) -> Self {
        AttrValue::Reference(value)
    }
}

impl From<&RemoteRef> for AttrValue {
    fn from(value: &RemoteRef) -> Self {
        AttrValue::Reference(value.clone())
    }
}

/// Entry of an attribute table
pub trait AttributeKey: Copy + fmt::Debug {
    /// Numeric id used on the wire
    fn id(self) -> u16;

    /// camelCase attribute name
    fn name(self) -> &'static str;

    /// Initial value on a fresh surface
    fn default_value(self) -> AttrValue;

    /// Checks whether the value is acceptable for this attribute
    fn validate(self, value: &AttrValue) -> Result<(), ProtocolError>;
}

/// Base attributes of a 2D drawing context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    FillStyle = 0,
    StrokeStyle = 1,
    GlobalAlpha = 2,
    Font = 3,
    TextAlign = 4,
    TextBaseline = 5,
    Direction = 6,
    GlobalCompositeOperation = 7,
    LineWidth = 8,
    LineCap = 9,
    LineJoin = 10,
    MiterLimit = 11,
    LineDashOffset = 12,
    ShadowOffsetX = 13,
    ShadowOffsetY = 14,
    ShadowBlur = 15,
    ShadowColor = 16,
    Filter = 17,
    ImageSmoothingEnabled = 18,
}

const TEXT_ALIGN: &[&str] = &["start", "end", "left", "right", "center"];
const TEXT_BASELINE: &[&str] = &[
    "top",
    "hanging",
    "middle",
    "alphabetic",
    "ideographic",
    "bottom",
];
const DIRECTION: &[&str] = &["ltr", "rtl", "inherit"];
const LINE_CAP: &[&str] = &["butt", "round", "square"];
const LINE_JOIN: &[&str] = &["round", "bevel", "miter"];
const COMPOSITE_OPERATION: &[&str] = &[
    "source-over",
    "source-in",
    "source-out",
    "source-atop",
    "destination-over",
    "destination-in",
    "destination-out",
    "destination-atop",
    "lighter",
    "copy",
    "xor",
    "multiply",
    "screen",
    "overlay",
    "darken",
    "lighten",
    "color-dodge",
    "color-burn",
    "hard-light",
    "soft-light",
    "difference",
    "exclusion",
    "hue",
    "saturation",
    "color",
    "luminosity",
];
const ROUGH_FILL_STYLE: &[&str] = &[
    "hachure",
    "solid",
    "zigzag",
    "cross-hatch",
    "dots",
    "dashed",
    "zigzag-line",
];

impl Attribute {
    pub const ALL: [Attribute; 19] = [
        Attribute::FillStyle,
        Attribute::StrokeStyle,
        Attribute::GlobalAlpha,
        Attribute::Font,
        Attribute::TextAlign,
        Attribute::TextBaseline,
        Attribute::Direction,
        Attribute::GlobalCompositeOperation,
        Attribute::LineWidth,
        Attribute::LineCap,
        Attribute::LineJoin,
        Attribute::MiterLimit,
        Attribute::LineDashOffset,
        Attribute::ShadowOffsetX,
        Attribute::ShadowOffsetY,
        Attribute::ShadowBlur,
        Attribute::ShadowColor,
        Attribute::Filter,
        Attribute::ImageSmoothingEnabled,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }
}

impl AttributeKey for Attribute {
    fn id(self) -> u16 {
        self as u16
    }

    fn name(self) -> &'static str {
        match self {
            Attribute::FillStyle => "fillStyle",
            Attribute::StrokeStyle => "strokeStyle",
            Attribute::GlobalAlpha => "globalAlpha",
            Attribute::Font => "font",
            Attribute::TextAlign => "textAlign",
            Attribute::TextBaseline => "textBaseline",
            Attribute::Direction => "direction",
            Attribute::GlobalCompositeOperation => "globalCompositeOperation",
            Attribute::LineWidth => "lineWidth",
            Attribute::LineCap => "lineCap",
            Attribute::LineJoin => "lineJoin",
            Attribute::MiterLimit => "miterLimit",
            Attribute::LineDashOffset => "lineDashOffset",
            Attribute::ShadowOffsetX => "shadowOffsetX",
            Attribute::ShadowOffsetY => "shadowOffsetY",
            Attribute::ShadowBlur => "shadowBlur",
            Attribute::ShadowColor => "shadowColor",
            Attribute::Filter => "filter",
            Attribute::ImageSmoothingEnabled => "imageSmoothingEnabled",
        }
    }

    fn default_value(self) -> AttrValue {
        match self {
            Attribute::FillStyle | Attribute::StrokeStyle => "black".into(),
            Attribute::GlobalAlpha => 1.0.into(),
            Attribute::Font => "12px serif".into(),
            Attribute::TextAlign => "start".into(),
            Attribute::TextBaseline => "alphabetic".into(),
            Attribute::Direction => "inherit".into(),
            Attribute::GlobalCompositeOperation => "source-over".into(),
            Attribute::LineWidth => 1.0.into(),
            Attribute::LineCap => "butt".into(),
            Attribute::LineJoin => "miter".into(),
            Attribute::MiterLimit => 10.0.into(),
            Attribute::LineDashOffset
            | Attribute::ShadowOffsetX
            | Attribute::ShadowOffsetY
            | Attribute::ShadowBlur => 0.0.into(),
            Attribute::ShadowColor => "rgba(0, 0, 0, 0)".into(),
            Attribute::Filter => "none".into(),
            Attribute::ImageSmoothingEnabled => true.into(),
        }
    }

    fn validate(self, value: &AttrValue) -> Result<(), ProtocolError> {
        let name = self.name();
        match self {
            Attribute::FillStyle | Attribute::StrokeStyle => match value {
                AttrValue::Reference(_) => Ok(()),
                other => expect_color(name, other),
            },
            Attribute::ShadowColor => expect_color(name, value),
            Attribute::GlobalAlpha => expect_number(name, value, 0.0, 1.0),
            Attribute::Font | Attribute::Filter => expect_string(name, value).map(|_| ()),
            Attribute::TextAlign => expect_keyword(name, value, TEXT_ALIGN),
            Attribute::TextBaseline => expect_keyword(name, value, TEXT_BASELINE),
            Attribute::Direction => expect_keyword(name, value, DIRECTION),
            Attribute::GlobalCompositeOperation => {
                expect_keyword(name, value, COMPOSITE_OPERATION)
            }
            Attribute::LineCap => expect_keyword(name, value, LINE_CAP),
            Attribute::LineJoin => expect_keyword(name, value, LINE_JOIN),
            Attribute::LineWidth | Attribute::MiterLimit | Attribute::ShadowBlur => {
                expect_number(name, value, 0.0, f64::MAX)
            }
            Attribute::LineDashOffset | Attribute::ShadowOffsetX | Attribute::ShadowOffsetY => {
                expect_number(name, value, f64::MIN, f64::MAX)
            }
            Attribute::ImageSmoothingEnabled => match value {
                AttrValue::Bool(_) => Ok(()),
                other => Err(ProtocolError::invalid(name, format!("expected a bool, got {other}"))),
            },
        }
    }
}

/// Attributes of the rough sketch style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoughAttribute {
    RoughFillStyle = 100,
    Roughness = 101,
    Bowing = 102,
}

impl RoughAttribute {
    pub const ALL: [RoughAttribute; 3] = [
        RoughAttribute::RoughFillStyle,
        RoughAttribute::Roughness,
        RoughAttribute::Bowing,
    ];
}

/// Name of the attribute with the given wire id, base or rough
pub fn attribute_name(id: u16) -> Option<&'static str> {
    Attribute::ALL
        .into_iter()
        .find(|attr| attr.id() == id)
        .map(Attribute::name)
        .or_else(|| {
            RoughAttribute::ALL
                .into_iter()
                .find(|attr| attr.id() == id)
                .map(RoughAttribute::name)
        })
}

impl AttributeKey for RoughAttribute {
    fn id(self) -> u16 {
        self as u16
    }

    fn name(self) -> &'static str {
        match self {
            RoughAttribute::RoughFillStyle => "roughFillStyle",
            RoughAttribute::Roughness => "roughness",
            RoughAttribute::Bowing => "bowing",
        }
    }

    fn default_value(self) -> AttrValue {
        match self {
            RoughAttribute::RoughFillStyle => "hachure".into(),
            RoughAttribute::Roughness | RoughAttribute::Bowing => 1.0.into(),
        }
    }

    fn validate(self, value: &AttrValue) -> Result<(), ProtocolError> {
        match self {
            RoughAttribute::RoughFillStyle => expect_keyword(self.name(), value, ROUGH_FILL_STYLE),
            RoughAttribute::Roughness => expect_number(self.name(), value, 0.0, f64::MAX),
            RoughAttribute::Bowing => expect_number(self.name(), value, f64::MIN, f64::MAX),
        }
    }
}

fn expect_string<'a>(name: &str, value: &'a AttrValue) -> Result<&'a str, ProtocolError> {
    value
        .as_str()
        .ok_or_else(|| ProtocolError::invalid(name, format!("expected a string, got {value}")))
}

fn expect_color(name: &str, value: &AttrValue) -> Result<(), ProtocolError> {
    let color = expect_string(name, value)?;
    parse_color(color)
        .map(|_| ())
        .map_err(|_| ProtocolError::invalid(name, format!("'{color}' is not a valid CSS color")))
}

fn expect_keyword(name: &str, value: &AttrValue, allowed: &[&str]) -> Result<(), ProtocolError> {
    let keyword = expect_string(name, value)?;
    if allowed.contains(&keyword) {
        return Ok(());
    }

    Err(ProtocolError::invalid(
        name,
        format!("'{keyword}' is not one of {}", allowed.join(", ")),
    ))
}

fn expect_number(name: &str, value: &AttrValue, min: f64, max: f64) -> Result<(), ProtocolError> {
    let Some(number) = value.as_f64() else {
        return Err(ProtocolError::invalid(name, format!("expected a number, got {value}")));
    };

    if !number.is_finite() || number < min || number > max {
        return Err(ProtocolError::invalid(name, format!("{number} is out of range")));
    }

    Ok(())
}
