//! Typed component attributes addressable by name.
//!
//! Attributes carry everything layout persistence needs: the value kinds
//! below cover strings, integers, flags, colors and flex edges. Values
//! serialize to the text forms used in layout files (`"text"`, `42`,
//! `true`, `190,190,190`, `50%+10`).

use crate::gui::flex::FlexDimension;
use crate::image::color::Color;

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Color(Color),
    Dimension(FlexDimension),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttributeValue::Color(color) => Some(*color),
            _ => None,
        }
    }

    pub fn as_dimension(&self) -> Option<FlexDimension> {
        match self {
            AttributeValue::Dimension(dimension) => Some(*dimension),
            _ => None,
        }
    }

    /// Serialize into the layout file form.
    pub fn serialize(&self) -> String {
        match self {
            AttributeValue::Text(text) => format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")),
            AttributeValue::Integer(value) => value.to_string(),
            AttributeValue::Boolean(value) => value.to_string(),
            AttributeValue::Color(color) => {
                if color.alpha == 255 {
                    format!("{},{},{}", color.red, color.green, color.blue)
                } else {
                    format!("{},{},{},{}", color.red, color.green, color.blue, color.alpha)
                }
            }
            AttributeValue::Dimension(dimension) => {
                if dimension.ratio == 0 {
                    dimension.offset.to_string()
                } else if dimension.offset == 0 {
                    format!("{}%", dimension.ratio)
                } else if dimension.offset < 0 {
                    format!("{}%{}", dimension.ratio, dimension.offset)
                } else {
                    format!("{}%+{}", dimension.ratio, dimension.offset)
                }
            }
        }
    }

    /// Parse a layout file value. The kind is inferred from the syntax, so
    /// a plain integer parses as `Integer`; setters accept integers where a
    /// dimension is expected.
    pub fn parse(text: &str) -> Option<AttributeValue> {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return Some(AttributeValue::Text(inner.replace("\\\"", "\"").replace("\\\\", "\\")));
        }
        if text == "true" || text == "false" {
            return Some(AttributeValue::Boolean(text == "true"));
        }
        if let Some(percent_at) = text.find('%') {
            let ratio: i32 = text[..percent_at].trim().parse().ok()?;
            let rest = text[percent_at + 1..].trim();
            let offset: i32 = if rest.is_empty() {
                0
            } else {
                rest.strip_prefix('+').unwrap_or(rest).parse().ok()?
            };
            return Some(AttributeValue::Dimension(FlexDimension::new(ratio, offset)));
        }
        if text.contains(',') {
            let channels: Vec<i32> = text.split(',').map(|part| part.trim().parse().ok()).collect::<Option<_>>()?;
            return match channels.as_slice() {
                [red, green, blue] => Some(AttributeValue::Color(Color::opaque(*red, *green, *blue))),
                [red, green, blue, alpha] => Some(AttributeValue::Color(Color::new(*red, *green, *blue, *alpha))),
                _ => None,
            };
        }
        text.parse().ok().map(AttributeValue::Integer)
    }

    /// Read as a flex edge, accepting plain integers as pixel offsets.
    pub fn to_dimension(&self) -> Option<FlexDimension> {
        match self {
            AttributeValue::Dimension(dimension) => Some(*dimension),
            AttributeValue::Integer(offset) => Some(FlexDimension::pixels(*offset as i32)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_through_their_text_forms() {
        let values = [
            AttributeValue::Text("main panel".into()),
            AttributeValue::Integer(-7),
            AttributeValue::Boolean(true),
            AttributeValue::Color(Color::opaque(190, 190, 190)),
            AttributeValue::Color(Color::new(1, 2, 3, 4)),
            AttributeValue::Dimension(FlexDimension::new(50, 10)),
            AttributeValue::Dimension(FlexDimension::new(100, -4)),
            AttributeValue::Dimension(FlexDimension::new(25, 0)),
        ];
        for value in values {
            let text = value.serialize();
            assert_eq!(AttributeValue::parse(&text), Some(value.clone()), "{text}");
        }
    }

    #[test]
    fn plain_integers_convert_to_pixel_dimensions() {
        let value = AttributeValue::parse("42").unwrap();
        assert_eq!(value.to_dimension(), Some(FlexDimension::pixels(42)));
    }

    #[test]
    fn quoted_text_preserves_escapes() {
        let value = AttributeValue::Text("say \"hi\"".into());
        assert_eq!(AttributeValue::parse(&value.serialize()), Some(value));
    }
}
