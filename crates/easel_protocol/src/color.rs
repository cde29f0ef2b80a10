//! CSS color values
//!
//! Style attributes and the text form of colors accept everything a 2D canvas context does:
//! hex notation, `rgb()`/`rgba()`, `hsl()`/`hsla()` and the named colors.

use crate::args::Arg;
use crate::array::NdArray;
use crate::errors::ProtocolError;
use colors_transform::{AlphaColor, Color, Hsl, Rgb};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::str::FromStr;

/// An RGB color with alpha channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RgbColor {
    /// Red component (0-255)
    pub r: f32,
    /// Green component (0-255)
    pub g: f32,
    /// Blue component (0-255)
    pub b: f32,
    /// Alpha component (0 = transparent, 1 = solid)
    pub a: f32,
}

impl RgbColor {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        RgbColor { r, g, b, a }
    }
}

impl FromStr for RgbColor {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_color(value)
    }
}

/// Parses a CSS color string
pub fn parse_color(value: &str) -> Result<RgbColor, ProtocolError> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    let invalid = || ProtocolError::invalid("color", format!("'{value}' is not a valid CSS color"));

    let color = match lower.as_str() {
        "" => None,
        "transparent" => Some(RgbColor::new(0.0, 0.0, 0.0, 0.0)),
        v if v.starts_with('#') => parse_hex(v),
        v if v.starts_with("rgba(") || v.starts_with("rgb(") => Rgb::from_str(v)
            .ok()
            .map(|rgb| RgbColor::new(rgb.get_red(), rgb.get_green(), rgb.get_blue(), rgb.get_alpha())),
        v if v.starts_with("hsla(") || v.starts_with("hsl(") => Hsl::from_str(v).ok().map(|hsl| {
            let rgb = hsl.to_rgb();
            RgbColor::new(rgb.get_red(), rgb.get_green(), rgb.get_blue(), hsl.get_alpha())
        }),
        v => CSS_COLORNAMES.get(v).and_then(|hex| parse_hex(hex)),
    };

    color.ok_or_else(invalid)
}

/// Checks a bulk color argument: one `(3,)` RGB triple or an `(n, 3)` array of them
pub fn validate_color_array(colors: &NdArray) -> Result<(), ProtocolError> {
    match colors.shape() {
        [3] | [_, 3] => Ok(()),
        shape => Err(ProtocolError::invalid(
            "color",
            format!("expected an (n, 3) or (3,) RGB array, got shape {shape:?}"),
        )),
    }
}

/// Checks a per-shape alpha argument: a number in `[0, 1]` or a 1-D array
pub fn validate_alpha(alpha: &Arg) -> Result<(), ProtocolError> {
    match alpha {
        Arg::Scalar(scalar) => match scalar.as_f64() {
            Some(value) if (0.0..=1.0).contains(&value) => Ok(()),
            _ => Err(ProtocolError::invalid(
                "alpha",
                format!("expected a number between 0 and 1, got {scalar:?}"),
            )),
        },
        Arg::Bulk(array) if array.ndim() == 1 => Ok(()),
        Arg::Bulk(array) => Err(ProtocolError::invalid(
            "alpha",
            format!("expected a 1-D array, got shape {:?}", array.shape()),
        )),
    }
}

fn hex_digit(value: &str, range: std::ops::Range<usize>) -> Option<f32> {
    let digits = value.get(range)?;
    let parsed = u8::from_str_radix(digits, 16).ok()?;
    if digits.len() == 1 {
        // #abc is shorthand for #aabbcc
        Some(f32::from(parsed * 16 + parsed))
    } else {
        Some(f32::from(parsed))
    }
}

fn parse_hex(value: &str) -> Option<RgbColor> {
    let value = value.strip_prefix('#')?;
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match value.len() {
        3 => Some(RgbColor::new(
            hex_digit(value, 0..1)?,
            hex_digit(value, 1..2)?,
            hex_digit(value, 2..3)?,
            1.0,
        )),
        4 => Some(RgbColor::new(
            hex_digit(value, 0..1)?,
            hex_digit(value, 1..2)?,
            hex_digit(value, 2..3)?,
            hex_digit(value, 3..4)? / 255.0,
        )),
        6 => Some(RgbColor::new(
            hex_digit(value, 0..2)?,
            hex_digit(value, 2..4)?,
            hex_digit(value, 4..6)?,
            1.0,
        )),
        8 => Some(RgbColor::new(
            hex_digit(value, 0..2)?,
            hex_digit(value, 2..4)?,
            hex_digit(value, 4..6)?,
            hex_digit(value, 6..8)? / 255.0,
        )),
        _ => None,
    }
}

lazy_static! {
    static ref CSS_COLORNAMES: HashMap<&'static str, &'static str> =
        COLOR_NAMES.iter().copied().collect();
}

const COLOR_NAMES: &[(&str, &str)] = &[
    ("aliceblue", "#f0f8ff"),
    ("antiquewhite", "#faebd7"),
    ("aqua", "#00ffff"),
    ("aquamarine", "#7fffd4"),
    ("azure", "#f0ffff"),
    ("beige", "#f5f5dc"),
    ("bisque", "#ffe4c4"),
    ("black", "#000000"),
    ("blanchedalmond", "#ffebcd"),
    ("blue", "#0000ff"),
    ("blueviolet", "#8a2be2"),
    ("brown", "#a52a2a"),
    ("burlywood", "#deb887"),
    ("cadetblue", "#5f9ea0"),
    ("chartreuse", "#7fff00"),
    ("chocolate", "#d2691e"),
    ("coral", "#ff7f50"),
    ("cornflowerblue", "#6495ed"),
    ("cornsilk", "#fff8dc"),
    ("crimson", "#dc143c"),
    ("cyan", "#00ffff"),
    ("darkblue", "#00008b"),
    ("darkcyan", "#008b8b"),
    ("darkgoldenrod", "#b8860b"),
    ("darkgray", "#a9a9a9"),
    ("darkgreen", "#006400"),
    ("darkgrey", "#a9a9a9"),
    ("darkkhaki", "#bdb76b"),
    ("darkmagenta", "#8b008b"),
    ("darkolivegreen", "#556b2f"),
    ("darkorange", "#ff8c00"),
    ("darkorchid", "#9932cc"),
    ("darkred", "#8b0000"),
    ("darksalmon", "#e9967a"),
    ("darkseagreen", "#8fbc8f"),
    ("darkslateblue", "#483d8b"),
    ("darkslategray", "#2f4f4f"),
    ("darkslategrey", "#2f4f4f"),
    ("darkturquoise", "#00ced1"),
    ("darkviolet", "#9400d3"),
    ("deeppink", "#ff1493"),
    ("deepskyblue", "#00bfff"),
    ("dimgray", "#696969"),
    ("dimgrey", "#696969"),
    ("dodgerblue", "#1e90ff"),
    ("firebrick", "#b22222"),
    ("floralwhite", "#fffaf0"),
    ("forestgreen", "#228b22"),
    ("fuchsia", "#ff00ff"),
    ("gainsboro", "#dcdcdc"),
    ("ghostwhite", "#f8f8ff"),
    ("gold", "#ffd700"),
    ("goldenrod", "#daa520"),
    ("gray", "#808080"),
    ("green", "#008000"),
    ("greenyellow", "#adff2f"),
    ("grey", "#808080"),
    ("honeydew", "#f0fff0"),
    ("hotpink", "#ff69b4"),
    ("indianred", "#cd5c5c"),
    ("indigo", "#4b0082"),
    ("ivory", "#fffff0"),
    ("khaki", "#f0e68c"),
    ("lavender", "#e6e6fa"),
    ("lavenderblush", "#fff0f5"),
    ("lawngreen", "#7cfc00"),
    ("lemonchiffon", "#fffacd"),
    ("lightblue", "#add8e6"),
    ("lightcoral", "#f08080"),
    ("lightcyan", "#e0ffff"),
    ("lightgoldenrodyellow", "#fafad2"),
    ("lightgray", "#d3d3d3"),
    ("lightgreen", "#90ee90"),
    ("lightgrey", "#d3d3d3"),
    ("lightpink", "#ffb6c1"),
    ("lightsalmon", "#ffa07a"),
    ("lightseagreen", "#20b2aa"),
    ("lightskyblue", "#87cefa"),
    ("lightslategray", "#778899"),
    ("lightslategrey", "#778899"),
    ("lightsteelblue", "#b0c4de"),
    ("lightyellow", "#ffffe0"),
    ("lime", "#00ff00"),
    ("limegreen", "#32cd32"),
    ("linen", "#faf0e6"),
    ("magenta", "#ff00ff"),
    ("maroon", "#800000"),
    ("mediumaquamarine", "#66cdaa"),
    ("mediumblue", "#0000cd"),
    ("mediumorchid", "#ba55d3"),
    ("mediumpurple", "#9370db"),
    ("mediumseagreen", "#3cb371"),
    ("mediumslateblue", "#7b68ee"),
    ("mediumspringgreen", "#00fa9a"),
    ("mediumturquoise", "#48d1cc"),
    ("mediumvioletred", "#c71585"),
    ("midnightblue", "#191970"),
    ("mintcream", "#f5fffa"),
    ("mistyrose", "#ffe4e1"),
    ("moccasin", "#ffe4b5"),
    ("navajowhite", "#ffdead"),
    ("navy", "#000080"),
    ("oldlace", "#fdf5e6"),
    ("olive", "#808000"),
    ("olivedrab", "#6b8e23"),
    ("orange", "#ffa500"),
    ("orangered", "#ff4500"),
    ("orchid", "#da70d6"),
    ("palegoldenrod", "#eee8aa"),
    ("palegreen", "#98fb98"),
    ("paleturquoise", "#afeeee"),
    ("palevioletred", "#db7093"),
    ("papayawhip", "#ffefd5"),
    ("peachpuff", "#ffdab9"),
    ("peru", "#cd853f"),
    ("pink", "#ffc0cb"),
    ("plum", "#dda0dd"),
    ("powderblue", "#b0e0e6"),
    ("purple", "#800080"),
    ("rebeccapurple", "#663399"),
    ("red", "#ff0000"),
    ("rosybrown", "#bc8f8f"),
    ("royalblue", "#4169e1"),
    ("saddlebrown", "#8b4513"),
    ("salmon", "#fa8072"),
    ("sandybrown", "#f4a460"),
    ("seagreen", "#2e8b57"),
    ("seashell", "#fff5ee"),
    ("sienna", "#a0522d"),
    ("silver", "#c0c0c0"),
    ("skyblue", "#87ceeb"),
    ("slateblue", "#6a5acd"),
    ("slategray", "#708090"),
    ("slategrey", "#708090"),
    ("snow", "#fffafa"),
    ("springgreen", "#00ff7f"),
    ("steelblue", "#4682b4"),
    ("tan", "#d2b48c"),
    ("teal", "#008080"),
    ("thistle", "#d8bfd8"),
    ("tomato", "#ff6347"),
    ("turquoise", "#40e0d0"),
    ("violet", "#ee82ee"),
    ("wheat", "#f5deb3"),
    ("white", "#ffffff"),
    ("whitesmoke", "#f5f5f5"),
    ("yellow", "#ffff00"),
    ("yellowgreen", "#9acd32"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("#123", 0x11, 0x22, 0x33 ; "short hex")]
    #[test_case("#abcdef", 0xab, 0xcd, 0xef ; "long hex")]
    #[test_case("#ABCDEF", 0xab, 0xcd, 0xef ; "uppercase hex")]
    #[test_case("red", 255, 0, 0 ; "red")]
    #[test_case("Green", 0, 128, 0 ; "mixed case name")]
    #[test_case("rebeccapurple", 0x66, 0x33, 0x99 ; "rebeccapurple")]
    #[test_case("rgb(10, 20, 30)", 10, 20, 30 ; "rgb function")]
    fn valid_colors(value: &str, r: u8, g: u8, b: u8) {
        let color = parse_color(value).unwrap();
        assert_eq!(color.r, f32::from(r));
        assert_eq!(color.g, f32::from(g));
        assert_eq!(color.b, f32::from(b));
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn hex_alpha() {
        let color = parse_color("#ff000080").unwrap();
        assert_eq!(color.r, 255.0);
        assert!((color.a - 128.0 / 255.0).abs() < 1e-6);

        let color = parse_color("#f00f").unwrap();
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn hsl_function() {
        let color = parse_color("hsl(10, 20%, 30%)").unwrap();
        assert_eq!(color.r, 91.8);
        assert_eq!(color.g, 66.3);
        assert_eq!(color.b, 61.2);
    }

    #[test]
    fn transparent() {
        assert_eq!(parse_color("transparent").unwrap().a, 0.0);
    }

    #[test_case("" ; "empty")]
    #[test_case("#12" ; "too short hex")]
    #[test_case("#ggg" ; "not hex")]
    #[test_case("notacolor" ; "unknown name")]
    #[test_case("rgb(10)" ; "incomplete rgb")]
    fn invalid_colors(value: &str) {
        assert!(matches!(
            parse_color(value),
            Err(ProtocolError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn color_arrays() {
        let single = NdArray::from(vec![255u8, 0, 0]);
        let many = NdArray::new(vec![2, 3], vec![0u8; 6]).unwrap();
        let rgba = NdArray::new(vec![2, 4], vec![0u8; 8]).unwrap();

        assert!(validate_color_array(&single).is_ok());
        assert!(validate_color_array(&many).is_ok());
        assert!(validate_color_array(&rgba).is_err());
        assert!(validate_color_array(&NdArray::from(vec![1u8, 2])).is_err());
    }

    #[test]
    fn alpha_arguments() {
        assert!(validate_alpha(&Arg::from(0.5)).is_ok());
        assert!(validate_alpha(&Arg::from(1)).is_ok());
        assert!(validate_alpha(&Arg::from(vec![0.1f64, 0.2])).is_ok());
        assert!(validate_alpha(&Arg::from(1.5)).is_err());
        assert!(validate_alpha(&Arg::from("opaque")).is_err());
        let grid = NdArray::new(vec![2, 2], vec![1.0f64; 4]).unwrap();
        assert!(validate_alpha(&Arg::from(grid)).is_err());
    }

    #[test]
    fn every_named_color_parses() {
        for (name, _) in COLOR_NAMES {
            assert!(parse_color(name).is_ok(), "{name}");
        }
    }
}
