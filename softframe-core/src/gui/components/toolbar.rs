//! Containers stacking their children along one axis.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::draw_alpha_filter;
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{Component, ComponentCore, set_location_of};
use crate::gui::theme::{ThemeImageCache, ThemeRequest};
use crate::image::color::Color;
use crate::image::ImageRgba;
use std::any::Any;

/// Stacks children by their desired dimensions with `padding` around the
/// block and `spacing` between members, horizontally by default.
pub struct Toolbar {
    core: ComponentCore,
    color: Color,
    vertical: bool,
    padding: i32,
    spacing: i32,
    cache: ThemeImageCache,
}

impl Toolbar {
    pub fn new() -> Toolbar {
        Toolbar {
            core: ComponentCore::new(),
            color: Color::opaque(170, 170, 170),
            vertical: false,
            padding: 2,
            spacing: 2,
            cache: ThemeImageCache::new(),
        }
    }

    fn stack_children(&mut self) {
        let children = self.core.children().to_vec();
        let mut along = self.padding;
        for child in children {
            let mut child = child.borrow_mut();
            let desired = child.desired_dimensions();
            let space = if self.vertical {
                IRect::new(self.padding, along, self.core.location().width() - self.padding * 2, desired.y)
            } else {
                IRect::new(along, self.padding, desired.x, self.core.location().height() - self.padding * 2)
            };
            child.apply_layout(space);
            along += if self.vertical { desired.y } else { desired.x } + self.spacing;
        }
    }
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Toolbar {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Toolbar"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn desired_dimensions(&mut self) -> IVector2 {
        let children = self.core.children().to_vec();
        let mut along = self.padding * 2;
        let mut across = 0;
        for (counted, child) in children.iter().enumerate() {
            let desired = child.borrow_mut().desired_dimensions();
            if counted > 0 {
                along += self.spacing;
            }
            along += if self.vertical { desired.y } else { desired.x };
            across = across.max(if self.vertical { desired.x } else { desired.y });
        }
        across += self.padding * 2;
        if self.vertical {
            IVector2::new(across, along)
        } else {
            IVector2::new(along, across)
        }
    }

    fn apply_layout(&mut self, given_space: IRect) {
        self.core.given_space = given_space;
        let new_location = self.core.region().resolve(given_space);
        set_location_of(self, new_location);
        // The location may be unchanged while members changed size.
        self.stack_children();
    }

    fn update_location_event(&mut self, _old_location: IRect, _new_location: IRect) {
        self.stack_children();
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        let theme = self.core.theme();
        let request = ThemeRequest::new(relative_location.width(), relative_location.height(), self.color);
        let image = self.cache.fetch(&theme, "Toolbar", request);
        draw_alpha_filter(target, &image, relative_location.left(), relative_location.top());
    }

    fn class_attribute(&self, name: &str) -> Option<AttributeValue> {
        if name.eq_ignore_ascii_case("Color") {
            Some(AttributeValue::Color(self.color))
        } else if name.eq_ignore_ascii_case("Vertical") {
            Some(AttributeValue::Boolean(self.vertical))
        } else if name.eq_ignore_ascii_case("Padding") {
            Some(AttributeValue::Integer(self.padding as i64))
        } else if name.eq_ignore_ascii_case("Spacing") {
            Some(AttributeValue::Integer(self.spacing as i64))
        } else {
            None
        }
    }

    fn set_class_attribute(&mut self, name: &str, value: &AttributeValue) -> bool {
        if name.eq_ignore_ascii_case("Color") {
            if let Some(color) = value.as_color() {
                self.color = color;
                self.cache.invalidate();
                return true;
            }
        } else if name.eq_ignore_ascii_case("Vertical") {
            if let Some(vertical) = value.as_boolean() {
                self.vertical = vertical;
                self.core.mark_child_changed();
                return true;
            }
        } else if name.eq_ignore_ascii_case("Padding") {
            if let Some(padding) = value.as_integer() {
                self.padding = padding as i32;
                self.core.mark_child_changed();
                return true;
            }
        } else if name.eq_ignore_ascii_case("Spacing") {
            if let Some(spacing) = value.as_integer() {
                self.spacing = spacing as i32;
                self.core.mark_child_changed();
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Color", "Vertical", "Padding", "Spacing"]
    }

    fn changed_theme(&mut self, _theme: &crate::gui::theme::Theme) {
        self.cache.invalidate();
    }
}
