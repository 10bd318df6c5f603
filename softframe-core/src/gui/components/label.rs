//! Static text.

use crate::base::geometry::{IRect, IVector2};
use crate::font::{RasterFont, default_font};
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{Component, ComponentCore};
use crate::image::color::Color;
use crate::image::ImageRgba;
use std::any::Any;

pub struct Label {
    core: ComponentCore,
    text: String,
    color: Color,
    font: RasterFont,
}

impl Label {
    pub fn new() -> Label {
        Label {
            core: ComponentCore::new(),
            text: String::new(),
            color: Color::opaque(0, 0, 0),
            font: default_font(),
        }
    }

    pub fn with_text(text: &str) -> Label {
        let mut label = Label::new();
        label.text = text.into();
        label
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Label {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Label"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_container(&self) -> bool {
        false
    }

    fn desired_dimensions(&mut self) -> IVector2 {
        IVector2::new(self.font.line_width(&self.text) + 4, self.font.size() + 2)
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        self.font.print_multi_line(target, &self.text, relative_location, self.color);
    }

    fn class_attribute(&self, name: &str) -> Option<AttributeValue> {
        if name.eq_ignore_ascii_case("Text") {
            Some(AttributeValue::Text(self.text.clone()))
        } else if name.eq_ignore_ascii_case("Color") {
            Some(AttributeValue::Color(self.color))
        } else {
            None
        }
    }

    fn set_class_attribute(&mut self, name: &str, value: &AttributeValue) -> bool {
        if name.eq_ignore_ascii_case("Text") {
            if let Some(text) = value.as_text() {
                self.text = text.into();
                self.core.mark_child_changed();
                return true;
            }
        } else if name.eq_ignore_ascii_case("Color") {
            if let Some(color) = value.as_color() {
                self.color = color;
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Text", "Color"]
    }
}
