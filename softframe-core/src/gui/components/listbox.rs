//! Selectable item lists.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::{draw_alpha_filter, draw_rectangle};
use crate::font::{RasterFont, default_font};
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{
    Component, ComponentCore, STATE_FOCUS, dispatch_mouse_callbacks,
};
use crate::gui::components::scroll::VerticalScrollBar;
use crate::gui::input::{Key, KeyboardEvent, KeyboardEventType, MouseEvent, MouseEventType};
use crate::gui::theme::{ThemeImageCache, ThemeRequest};
use crate::image::color::Color;
use crate::image::ImageRgba;
use std::any::Any;

pub struct ListBox {
    core: ComponentCore,
    items: Vec<String>,
    selected: i64,
    color: Color,
    font: RasterFont,
    scroll: VerticalScrollBar,
    cache: ThemeImageCache,
}

impl ListBox {
    pub fn new() -> ListBox {
        ListBox {
            core: ComponentCore::new(),
            items: Vec::new(),
            selected: -1,
            color: Color::opaque(130, 130, 130),
            font: default_font(),
            scroll: VerticalScrollBar::new(),
            cache: ThemeImageCache::new(),
        }
    }

    pub fn push_item(&mut self, text: &str) {
        self.items.push(text.into());
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected_index(&self) -> i64 {
        self.selected
    }

    /// Select an item, firing the select callback for real changes.
    /// Out-of-range indices clear the selection.
    pub fn select(&mut self, index: i64) {
        let clamped = if index < 0 || index >= self.items.len() as i64 { -1 } else { index };
        if clamped != self.selected {
            self.selected = clamped;
            if let Some(callback) = &mut self.core.on_select {
                callback(clamped);
            }
        }
    }

    fn row_height(&self) -> i32 {
        self.font.size() + 2
    }

    fn content_height(&self) -> i32 {
        self.items.len() as i32 * self.row_height()
    }

    fn local_view(&self) -> IRect {
        let location = self.core.location();
        IRect::new(1, 1, location.width() - 2, location.height() - 2)
    }

    fn row_at(&self, local: IVector2) -> Option<i64> {
        let view = self.local_view();
        if !view.contains(local) || local.x >= view.left() + self.scroll.inner_width() {
            return None;
        }
        let index = ((local.y - view.top() + self.scroll.offset()) / self.row_height()) as i64;
        (index >= 0 && index < self.items.len() as i64).then_some(index)
    }

    /// Scroll the selected row into the visible band.
    fn show_selection(&mut self) {
        if self.selected < 0 {
            return;
        }
        let row_top = self.selected as i32 * self.row_height();
        let view_height = self.local_view().height();
        if row_top < self.scroll.offset() {
            self.scroll.set_offset(row_top);
        } else if row_top + self.row_height() > self.scroll.offset() + view_height {
            self.scroll.set_offset(row_top + self.row_height() - view_height);
        }
    }
}

impl Default for ListBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ListBox {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "ListBox"
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
        let widest = self.items.iter().map(|item| self.font.line_width(item)).max().unwrap_or(0);
        IVector2::new(widest + 24, (self.row_height() * 4).max(48))
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        let state = self.core.state();
        let theme = self.core.theme();
        let request = ThemeRequest::new(relative_location.width(), relative_location.height(), self.color)
            .with_states(false, state & STATE_FOCUS != 0, false);
        let image = self.cache.fetch(&theme, "ListBox", request);
        draw_alpha_filter(target, &image, relative_location.left(), relative_location.top());
        self.scroll.update(self.local_view(), self.content_height());
        let view = self.local_view();
        let origin = relative_location.upper_left();
        let row_height = self.row_height();
        let first = self.scroll.offset() / row_height;
        let last = ((self.scroll.offset() + view.height()) / row_height + 1).min(self.items.len() as i32);
        for index in first.max(0)..last {
            let row_top = view.top() + index * row_height - self.scroll.offset();
            let row = IRect::new(view.left(), row_top, self.scroll.inner_width() - 1, row_height) + origin;
            let clipped = IRect::cut(row, view + origin);
            if !clipped.has_area() {
                continue;
            }
            let text_color = if index as i64 == self.selected {
                draw_rectangle(target, clipped, Color::opaque(60, 90, 160));
                Color::opaque(255, 255, 255)
            } else {
                Color::opaque(0, 0, 0)
            };
            self.font.print_line(
                target,
                &self.items[index as usize],
                IVector2::new(row.left() + 3, row.top() + 1),
                text_color,
            );
        }
        self.scroll.draw(target, origin, &theme, self.color);
    }

    fn receive_mouse_event(&mut self, event: &MouseEvent) {
        let local = event.position - self.core.location().upper_left();
        let local_event = MouseEvent { position: local, ..*event };
        // Events can arrive before the first draw refreshed the bar.
        self.scroll.update(self.local_view(), self.content_height());
        if !self.scroll.handle_mouse(&local_event) {
            if event.event_type == MouseEventType::MouseDown {
                if let Some(row) = self.row_at(local) {
                    self.select(row);
                }
            }
        }
        dispatch_mouse_callbacks(&mut self.core, event);
    }

    fn receive_keyboard_event(&mut self, event: &KeyboardEvent) {
        if event.event_type == KeyboardEventType::KeyDown && !self.items.is_empty() {
            let last = self.items.len() as i64 - 1;
            match event.key {
                Key::UpArrow => self.select((self.selected - 1).max(0)),
                Key::DownArrow => self.select((self.selected + 1).min(last)),
                Key::Home => self.select(0),
                Key::End => self.select(last),
                Key::PageUp => {
                    let page = (self.local_view().height() / self.row_height()).max(1) as i64;
                    self.select((self.selected - page).max(0));
                }
                Key::PageDown => {
                    let page = (self.local_view().height() / self.row_height()).max(1) as i64;
                    self.select((self.selected + page).min(last));
                }
                _ => {}
            }
            self.show_selection();
        }
        if let Some(callback) = match event.event_type {
            KeyboardEventType::KeyDown => &mut self.core.on_key_down,
            KeyboardEventType::KeyUp => &mut self.core.on_key_up,
            KeyboardEventType::KeyType => &mut self.core.on_key_type,
        } {
            callback(event);
        }
    }

    fn class_attribute(&self, name: &str) -> Option<AttributeValue> {
        if name.eq_ignore_ascii_case("Color") {
            Some(AttributeValue::Color(self.color))
        } else if name.eq_ignore_ascii_case("SelectedIndex") {
            Some(AttributeValue::Integer(self.selected))
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
        } else if name.eq_ignore_ascii_case("SelectedIndex") {
            if let Some(index) = value.as_integer() {
                self.select(index);
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Color", "SelectedIndex"]
    }

    fn changed_theme(&mut self, _theme: &crate::gui::theme::Theme) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn key_down(key: Key) -> KeyboardEvent {
        KeyboardEvent::new(KeyboardEventType::KeyDown, '\0', key)
    }

    fn populated() -> (ListBox, Rc<RefCell<Vec<i64>>>) {
        let mut list = ListBox::new();
        for name in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"] {
            list.push_item(name);
        }
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        list.core_mut().on_select = Some(Box::new(move |index| sink.borrow_mut().push(index)));
        list.apply_layout(IRect::new(0, 0, 120, 80));
        (list, fired)
    }

    #[test]
    fn clicks_and_keys_drive_the_selection() {
        let (mut list, fired) = populated();
        let row = list.row_height();
        // A click in the second row selects it.
        list.receive_mouse_event(&MouseEvent::down(IVector2::new(10, 1 + row + 1)));
        assert_eq!(list.selected_index(), 1);
        list.receive_keyboard_event(&key_down(Key::DownArrow));
        assert_eq!(list.selected_index(), 2);
        list.receive_keyboard_event(&key_down(Key::End));
        assert_eq!(list.selected_index(), 7);
        list.receive_keyboard_event(&key_down(Key::Home));
        // Up at the first row clamps without another callback.
        list.receive_keyboard_event(&key_down(Key::UpArrow));
        assert_eq!(list.selected_index(), 0);
        assert_eq!(fired.borrow().as_slice(), &[1, 2, 7, 0]);
    }

    #[test]
    fn out_of_range_selection_clears() {
        let (mut list, fired) = populated();
        list.select(2);
        list.select(99);
        assert_eq!(list.selected_index(), -1);
        assert_eq!(fired.borrow().as_slice(), &[2, -1]);
    }

    #[test]
    fn keyboard_selection_scrolls_into_view() {
        let (mut list, _fired) = populated();
        // Eight rows never fit the 80 pixel box, so jumping to the end
        // scrolls down and back.
        list.receive_keyboard_event(&key_down(Key::End));
        assert!(list.scroll.offset() > 0);
        list.receive_keyboard_event(&key_down(Key::Home));
        assert_eq!(list.scroll.offset(), 0);
    }
}
