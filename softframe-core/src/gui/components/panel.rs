//! The plain container component.

use crate::base::geometry::IRect;
use crate::draw::{draw_alpha_filter, draw_rectangle};
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{Component, ComponentCore};
use crate::gui::theme::{ThemeImageCache, ThemeRequest};
use crate::image::color::Color;
use crate::image::ImageRgba;
use std::any::Any;

/// A rectangle holding child components. With `solid` off, the panel draws
/// nothing and only provides layout.
pub struct Panel {
    core: ComponentCore,
    color: Color,
    solid: bool,
    cache: ThemeImageCache,
}

impl Panel {
    pub fn new() -> Panel {
        Panel {
            core: ComponentCore::new(),
            color: Color::opaque(190, 190, 190),
            solid: true,
            cache: ThemeImageCache::new(),
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.cache.invalidate();
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Panel {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Panel"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        if !self.solid {
            return;
        }
        if relative_location.width() <= 2 || relative_location.height() <= 2 {
            draw_rectangle(target, relative_location, self.color);
            return;
        }
        let theme = self.core.theme();
        let request = ThemeRequest::new(relative_location.width(), relative_location.height(), self.color);
        let image = self.cache.fetch(&theme, "Panel", request);
        draw_alpha_filter(target, &image, relative_location.left(), relative_location.top());
    }

    fn class_attribute(&self, name: &str) -> Option<AttributeValue> {
        if name.eq_ignore_ascii_case("Color") {
            Some(AttributeValue::Color(self.color))
        } else if name.eq_ignore_ascii_case("Solid") {
            Some(AttributeValue::Boolean(self.solid))
        } else {
            None
        }
    }

    fn set_class_attribute(&mut self, name: &str, value: &AttributeValue) -> bool {
        if name.eq_ignore_ascii_case("Color") {
            if let Some(color) = value.as_color() {
                self.set_color(color);
                return true;
            }
        } else if name.eq_ignore_ascii_case("Solid") {
            if let Some(solid) = value.as_boolean() {
                self.solid = solid;
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Color", "Solid"]
    }

    fn changed_theme(&mut self, _theme: &crate::gui::theme::Theme) {
        self.cache.invalidate();
    }
}
