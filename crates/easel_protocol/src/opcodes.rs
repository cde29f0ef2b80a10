//! Opcode table, wire version 1
//!
//! Command names map to small integers that never change within a protocol version. New
//! commands may only be appended.

use serde::{Serialize, Serializer};
use std::fmt;

/// Version of the opcode table below
pub const PROTOCOL_VERSION: u32 = 1;

macro_rules! opcodes {
    ($($variant:ident = $value:literal => $name:literal,)*) => {
        /// A drawing command
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($variant = $value,)*
        }

        impl Opcode {
            /// Every opcode in table order
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// camelCase command name
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub fn from_id(id: u8) -> Option<Self> {
                match id {
                    $($value => Some(Opcode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    FillRect = 0 => "fillRect",
    StrokeRect = 1 => "strokeRect",
    FillRects = 2 => "fillRects",
    StrokeRects = 3 => "strokeRects",
    ClearRect = 4 => "clearRect",
    FillArc = 5 => "fillArc",
    FillCircle = 6 => "fillCircle",
    StrokeArc = 7 => "strokeArc",
    StrokeCircle = 8 => "strokeCircle",
    FillArcs = 9 => "fillArcs",
    StrokeArcs = 10 => "strokeArcs",
    FillCircles = 11 => "fillCircles",
    StrokeCircles = 12 => "strokeCircles",
    StrokeLine = 13 => "strokeLine",
    BeginPath = 14 => "beginPath",
    ClosePath = 15 => "closePath",
    Stroke = 16 => "stroke",
    FillPath = 17 => "fillPath",
    Fill = 18 => "fill",
    MoveTo = 19 => "moveTo",
    LineTo = 20 => "lineTo",
    Rect = 21 => "rect",
    Arc = 22 => "arc",
    Ellipse = 23 => "ellipse",
    ArcTo = 24 => "arcTo",
    QuadraticCurveTo = 25 => "quadraticCurveTo",
    BezierCurveTo = 26 => "bezierCurveTo",
    FillText = 27 => "fillText",
    StrokeText = 28 => "strokeText",
    SetLineDash = 29 => "setLineDash",
    DrawImage = 30 => "drawImage",
    PutImageData = 31 => "putImageData",
    Clip = 32 => "clip",
    Save = 33 => "save",
    Restore = 34 => "restore",
    Translate = 35 => "translate",
    Rotate = 36 => "rotate",
    Scale = 37 => "scale",
    Transform = 38 => "transform",
    SetTransform = 39 => "setTransform",
    ResetTransform = 40 => "resetTransform",
    Set = 41 => "set",
    Clear = 42 => "clear",
    Sleep = 43 => "sleep",
    FillPolygon = 44 => "fillPolygon",
    StrokePolygon = 45 => "strokePolygon",
    StrokeLines = 46 => "strokeLines",
    FillPolygons = 47 => "fillPolygons",
    StrokePolygons = 48 => "strokePolygons",
    StrokeLineSegments = 49 => "strokeLineSegments",
    FillStyledRects = 50 => "fillStyledRects",
    StrokeStyledRects = 51 => "strokeStyledRects",
    FillStyledCircles = 52 => "fillStyledCircles",
    StrokeStyledCircles = 53 => "strokeStyledCircles",
    FillStyledArcs = 54 => "fillStyledArcs",
    StrokeStyledArcs = 55 => "strokeStyledArcs",
    FillStyledPolygons = 56 => "fillStyledPolygons",
    StrokeStyledPolygons = 57 => "strokeStyledPolygons",
    StrokeStyledLineSegments = 58 => "strokeStyledLineSegments",
    SwitchCanvas = 59 => "switchCanvas",
}

impl Opcode {
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Opcode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("fillRect", 0)]
    #[test_case("strokeLine", 13)]
    #[test_case("set", 41)]
    #[test_case("clear", 42)]
    #[test_case("sleep", 43)]
    #[test_case("fillPolygon", 44)]
    #[test_case("strokeStyledLineSegments", 58)]
    #[test_case("switchCanvas", 59)]
    fn published_table(name: &str, id: u8) {
        let opcode = Opcode::from_name(name).unwrap();
        assert_eq!(opcode.id(), id);
        assert_eq!(opcode.name(), name);
        assert_eq!(Opcode::from_id(id), Some(opcode));
    }

    #[test]
    fn table_is_dense() {
        assert_eq!(Opcode::ALL.len(), 60);
        for (index, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(opcode.id() as usize, index);
        }
        assert_eq!(Opcode::from_id(60), None);
    }

    #[test]
    fn unknown_names() {
        assert_eq!(Opcode::from_name("fill_rect"), None);
        assert_eq!(Opcode::from_name(""), None);
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Opcode::FillCircles).unwrap(), "11");
    }
}
