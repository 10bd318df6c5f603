//! Push buttons.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::draw_alpha_filter;
use crate::font::{RasterFont, default_font};
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{
    Component, ComponentCore, STATE_FOCUS, STATE_HOVER, dispatch_mouse_callbacks,
};
use crate::gui::input::{MouseEvent, MouseEventType};
use crate::gui::theme::{ThemeImageCache, ThemeRequest};
use crate::image::color::Color;
use crate::image::ImageRgba;
use std::any::Any;

pub struct Button {
    core: ComponentCore,
    text: String,
    color: Color,
    font: RasterFont,
    pressed: bool,
    cache: ThemeImageCache,
}

impl Button {
    pub fn new() -> Button {
        Button {
            core: ComponentCore::new(),
            text: String::new(),
            color: Color::opaque(130, 130, 130),
            font: default_font(),
            pressed: false,
            cache: ThemeImageCache::new(),
        }
    }

    pub fn with_text(text: &str) -> Button {
        let mut button = Button::new();
        button.text = text.into();
        button
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.into();
        self.core.mark_child_changed();
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Button {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Button"
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
        IVector2::new(self.font.line_width(&self.text) + 16, self.font.size() + 8)
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        let state = self.core.state();
        let request = ThemeRequest::new(relative_location.width(), relative_location.height(), self.color)
            .with_states(self.pressed, state & STATE_FOCUS != 0, state & STATE_HOVER != 0);
        let theme = self.core.theme();
        let image = self.cache.fetch(&theme, "Button", request);
        draw_alpha_filter(target, &image, relative_location.left(), relative_location.top());
        let text_width = self.font.line_width(&self.text);
        let press_shift = if self.pressed { 1 } else { 0 };
        let location = IVector2::new(
            relative_location.left() + (relative_location.width() - text_width) / 2 + press_shift,
            relative_location.top() + (relative_location.height() - self.font.size()) / 2 + press_shift,
        );
        self.font.print_line(target, &self.text, location, Color::opaque(0, 0, 0));
    }

    fn receive_mouse_event(&mut self, event: &MouseEvent) {
        match event.event_type {
            MouseEventType::MouseDown => {
                self.pressed = true;
            }
            MouseEventType::MouseUp => {
                let was_pressed = self.pressed;
                self.pressed = false;
                // A release over the button activates it; dragging off and
                // releasing elsewhere aborts.
                if was_pressed && self.point_is_inside(event.position) {
                    if let Some(callback) = &mut self.core.on_pressed {
                        callback();
                    }
                }
            }
            _ => {}
        }
        dispatch_mouse_callbacks(&mut self.core, event);
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
                self.set_text(text);
                return true;
            }
        } else if name.eq_ignore_ascii_case("Color") {
            if let Some(color) = value.as_color() {
                self.color = color;
                self.cache.invalidate();
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Text", "Color"]
    }

    fn changed_theme(&mut self, _theme: &crate::gui::theme::Theme) {
        self.cache.invalidate();
    }
}
