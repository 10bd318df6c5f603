//! Editable text areas.

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

/// Caret position as line and column in characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Caret {
    line: usize,
    column: usize,
}

pub struct TextBox {
    core: ComponentCore,
    lines: Vec<String>,
    caret: Caret,
    multi_line: bool,
    color: Color,
    font: RasterFont,
    scroll: VerticalScrollBar,
    cache: ThemeImageCache,
}

impl TextBox {
    pub fn new() -> TextBox {
        TextBox {
            core: ComponentCore::new(),
            lines: vec![String::new()],
            caret: Caret::default(),
            multi_line: false,
            color: Color::opaque(130, 130, 130),
            font: default_font(),
            scroll: VerticalScrollBar::new(),
            cache: ThemeImageCache::new(),
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(String::from).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.caret = Caret::default();
    }

    fn clamp_caret(&mut self) {
        self.caret.line = self.caret.line.min(self.lines.len() - 1);
        self.caret.column = self.caret.column.min(self.lines[self.caret.line].chars().count());
    }

    fn byte_offset(line: &str, column: usize) -> usize {
        line.char_indices().nth(column).map(|(offset, _)| offset).unwrap_or(line.len())
    }

    fn insert_character(&mut self, character: char) {
        let line = &mut self.lines[self.caret.line];
        let offset = TextBox::byte_offset(line, self.caret.column);
        line.insert(offset, character);
        self.caret.column += 1;
    }

    fn insert_line_break(&mut self) {
        let line = &mut self.lines[self.caret.line];
        let offset = TextBox::byte_offset(line, self.caret.column);
        let tail = line.split_off(offset);
        self.lines.insert(self.caret.line + 1, tail);
        self.caret.line += 1;
        self.caret.column = 0;
    }

    fn backspace(&mut self) {
        if self.caret.column > 0 {
            let line = &mut self.lines[self.caret.line];
            let offset = TextBox::byte_offset(line, self.caret.column - 1);
            line.remove(offset);
            self.caret.column -= 1;
        } else if self.caret.line > 0 {
            let removed = self.lines.remove(self.caret.line);
            self.caret.line -= 1;
            self.caret.column = self.lines[self.caret.line].chars().count();
            self.lines[self.caret.line].push_str(&removed);
        }
    }

    fn delete_forward(&mut self) {
        let length = self.lines[self.caret.line].chars().count();
        if self.caret.column < length {
            let line = &mut self.lines[self.caret.line];
            let offset = TextBox::byte_offset(line, self.caret.column);
            line.remove(offset);
        } else if self.caret.line + 1 < self.lines.len() {
            let next = self.lines.remove(self.caret.line + 1);
            self.lines[self.caret.line].push_str(&next);
        }
    }

    fn line_height(&self) -> i32 {
        self.font.size()
    }

    fn local_view(&self) -> IRect {
        let location = self.core.location();
        IRect::new(2, 2, location.width() - 4, location.height() - 4)
    }

    /// Column whose pixel position is closest to `x` within `line`.
    fn column_at(&self, line: &str, x: i32) -> usize {
        let mut width = 0;
        for (column, character) in line.chars().enumerate() {
            let step = self.font.character_width(character);
            if width + step / 2 >= x {
                return column;
            }
            width += step;
        }
        line.chars().count()
    }
}

impl Default for TextBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for TextBox {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "TextBox"
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
        if self.multi_line {
            IVector2::new(120, self.line_height() * 4 + 8)
        } else {
            IVector2::new(120, self.line_height() + 8)
        }
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        let state = self.core.state();
        let focused = state & STATE_FOCUS != 0;
        let theme = self.core.theme();
        let request = ThemeRequest::new(relative_location.width(), relative_location.height(), self.color)
            .with_states(false, focused, false);
        let image = self.cache.fetch(&theme, "TextBox", request);
        draw_alpha_filter(target, &image, relative_location.left(), relative_location.top());
        let view = self.local_view();
        self.scroll.update(view, self.lines.len() as i32 * self.line_height());
        let origin = relative_location.upper_left();
        let line_height = self.line_height();
        for (index, line) in self.lines.iter().enumerate() {
            let top = view.top() + index as i32 * line_height - self.scroll.offset();
            if top + line_height < view.top() || top > view.bottom() {
                continue;
            }
            self.font.print_line(
                target,
                line,
                IVector2::new(view.left(), top) + origin,
                Color::opaque(0, 0, 0),
            );
        }
        if focused {
            // The caret is a vertical line at the insertion point.
            let line = &self.lines[self.caret.line];
            let prefix: String = line.chars().take(self.caret.column).collect();
            let caret_x = view.left() + self.font.line_width(&prefix) + origin.x;
            let caret_top = view.top() + self.caret.line as i32 * line_height - self.scroll.offset() + origin.y;
            draw_rectangle(
                target,
                IRect::new(caret_x, caret_top, 1, line_height),
                Color::opaque(0, 0, 0),
            );
        }
        self.scroll.draw(target, origin, &theme, self.color);
    }

    fn receive_mouse_event(&mut self, event: &MouseEvent) {
        let local = event.position - self.core.location().upper_left();
        let local_event = MouseEvent { position: local, ..*event };
        // Events can arrive before the first draw refreshed the bar.
        self.scroll.update(self.local_view(), self.lines.len() as i32 * self.line_height());
        if !self.scroll.handle_mouse(&local_event) && event.event_type == MouseEventType::MouseDown {
            let view = self.local_view();
            let line_index = ((local.y - view.top() + self.scroll.offset()) / self.line_height()).max(0) as usize;
            self.caret.line = line_index.min(self.lines.len() - 1);
            self.caret.column = self.column_at(&self.lines[self.caret.line].clone(), local.x - view.left());
        }
        dispatch_mouse_callbacks(&mut self.core, event);
    }

    fn receive_keyboard_event(&mut self, event: &KeyboardEvent) {
        match event.event_type {
            KeyboardEventType::KeyDown => match event.key {
                Key::LeftArrow => {
                    if self.caret.column > 0 {
                        self.caret.column -= 1;
                    } else if self.caret.line > 0 {
                        self.caret.line -= 1;
                        self.caret.column = self.lines[self.caret.line].chars().count();
                    }
                }
                Key::RightArrow => {
                    if self.caret.column < self.lines[self.caret.line].chars().count() {
                        self.caret.column += 1;
                    } else if self.caret.line + 1 < self.lines.len() {
                        self.caret.line += 1;
                        self.caret.column = 0;
                    }
                }
                Key::UpArrow => {
                    self.caret.line = self.caret.line.saturating_sub(1);
                    self.clamp_caret();
                }
                Key::DownArrow => {
                    self.caret.line = (self.caret.line + 1).min(self.lines.len() - 1);
                    self.clamp_caret();
                }
                Key::Home => self.caret.column = 0,
                Key::End => self.caret.column = self.lines[self.caret.line].chars().count(),
                Key::Backspace => self.backspace(),
                Key::Delete => self.delete_forward(),
                Key::Return => {
                    if self.multi_line {
                        self.insert_line_break();
                    }
                }
                _ => {}
            },
            KeyboardEventType::KeyType => {
                if event.character >= ' ' && event.character != '\u{7f}' {
                    self.insert_character(event.character);
                }
            }
            KeyboardEventType::KeyUp => {}
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
        if name.eq_ignore_ascii_case("Text") {
            Some(AttributeValue::Text(self.text()))
        } else if name.eq_ignore_ascii_case("Color") {
            Some(AttributeValue::Color(self.color))
        } else if name.eq_ignore_ascii_case("MultiLine") {
            Some(AttributeValue::Boolean(self.multi_line))
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
        } else if name.eq_ignore_ascii_case("MultiLine") {
            if let Some(multi_line) = value.as_boolean() {
                self.multi_line = multi_line;
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Text", "Color", "MultiLine"]
    }

    fn changed_theme(&mut self, _theme: &crate::gui::theme::Theme) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_down(key: Key) -> KeyboardEvent {
        KeyboardEvent::new(KeyboardEventType::KeyDown, '\0', key)
    }

    fn type_char(character: char) -> KeyboardEvent {
        KeyboardEvent::new(KeyboardEventType::KeyType, character, Key::Unhandled)
    }

    #[test]
    fn typed_characters_insert_at_the_caret() {
        let mut textbox = TextBox::new();
        for character in "héllo".chars() {
            textbox.receive_keyboard_event(&type_char(character));
        }
        assert_eq!(textbox.text(), "héllo");
        // Two steps left, then insert mid-word; columns count characters,
        // not bytes, so the accented letter is one step.
        textbox.receive_keyboard_event(&key_down(Key::LeftArrow));
        textbox.receive_keyboard_event(&key_down(Key::LeftArrow));
        textbox.receive_keyboard_event(&type_char('x'));
        assert_eq!(textbox.text(), "hélxlo");
        assert_eq!(textbox.caret, Caret { line: 0, column: 4 });
    }

    #[test]
    fn backspace_removes_whole_characters() {
        let mut textbox = TextBox::new();
        textbox.set_text("aé");
        textbox.receive_keyboard_event(&key_down(Key::End));
        textbox.receive_keyboard_event(&key_down(Key::Backspace));
        assert_eq!(textbox.text(), "a");
        textbox.receive_keyboard_event(&key_down(Key::Backspace));
        assert_eq!(textbox.text(), "");
        // At the very start, backspace has nothing left to do.
        textbox.receive_keyboard_event(&key_down(Key::Backspace));
        assert_eq!(textbox.text(), "");
        assert_eq!(textbox.caret, Caret { line: 0, column: 0 });
    }

    #[test]
    fn backspace_at_line_start_merges_with_the_previous_line() {
        let mut textbox = TextBox::new();
        textbox.set_text("ab\ncd");
        textbox.receive_keyboard_event(&key_down(Key::DownArrow));
        textbox.receive_keyboard_event(&key_down(Key::Home));
        textbox.receive_keyboard_event(&key_down(Key::Backspace));
        assert_eq!(textbox.text(), "abcd");
        // The caret lands at the seam.
        assert_eq!(textbox.caret, Caret { line: 0, column: 2 });
    }

    #[test]
    fn delete_at_line_end_pulls_the_next_line_up() {
        let mut textbox = TextBox::new();
        textbox.set_text("ab\ncd");
        textbox.receive_keyboard_event(&key_down(Key::End));
        textbox.receive_keyboard_event(&key_down(Key::Delete));
        assert_eq!(textbox.text(), "abcd");
        assert_eq!(textbox.caret, Caret { line: 0, column: 2 });
        // Deleting inside a line removes the character under the caret.
        textbox.receive_keyboard_event(&key_down(Key::Home));
        textbox.receive_keyboard_event(&key_down(Key::Delete));
        assert_eq!(textbox.text(), "bcd");
    }

    #[test]
    fn return_splits_the_line_only_in_multi_line_boxes() {
        let mut textbox = TextBox::new();
        textbox.set_text("abcd");
        textbox.receive_keyboard_event(&key_down(Key::RightArrow));
        textbox.receive_keyboard_event(&key_down(Key::RightArrow));
        textbox.receive_keyboard_event(&key_down(Key::Return));
        assert_eq!(textbox.text(), "abcd");
        textbox.multi_line = true;
        textbox.receive_keyboard_event(&key_down(Key::Return));
        assert_eq!(textbox.text(), "ab\ncd");
        assert_eq!(textbox.caret, Caret { line: 1, column: 0 });
    }

    #[test]
    fn vertical_moves_clamp_the_column_to_the_shorter_line() {
        let mut textbox = TextBox::new();
        textbox.multi_line = true;
        textbox.set_text("long line\nab\nanother");
        textbox.receive_keyboard_event(&key_down(Key::End));
        assert_eq!(textbox.caret, Caret { line: 0, column: 9 });
        textbox.receive_keyboard_event(&key_down(Key::DownArrow));
        assert_eq!(textbox.caret, Caret { line: 1, column: 2 });
        textbox.receive_keyboard_event(&key_down(Key::DownArrow));
        textbox.receive_keyboard_event(&key_down(Key::DownArrow));
        // The last line absorbs further moves.
        assert_eq!(textbox.caret.line, 2);
    }

    #[test]
    fn byte_offset_walks_character_boundaries() {
        assert_eq!(TextBox::byte_offset("aéb", 0), 0);
        assert_eq!(TextBox::byte_offset("aéb", 1), 1);
        // The accented letter takes two bytes.
        assert_eq!(TextBox::byte_offset("aéb", 2), 3);
        assert_eq!(TextBox::byte_offset("aéb", 3), 4);
        assert_eq!(TextBox::byte_offset("aéb", 99), 4);
    }

    #[test]
    fn column_at_picks_the_nearest_boundary() {
        let textbox = TextBox::new();
        let step = textbox.font.character_width('a');
        assert_eq!(textbox.column_at("aaa", 0), 0);
        // Just past a character's midpoint belongs to the next column.
        assert_eq!(textbox.column_at("aaa", step), 1);
        assert_eq!(textbox.column_at("aaa", step * 2), 2);
        assert_eq!(textbox.column_at("aaa", step * 10), 3);
    }

    #[test]
    fn mouse_down_places_the_caret() {
        use crate::base::geometry::{IRect, IVector2};
        use crate::gui::input::MouseEvent;

        let mut textbox = TextBox::new();
        textbox.multi_line = true;
        textbox.set_text("abcd\nefgh");
        textbox.apply_layout(IRect::new(0, 0, 120, 80));
        let step = textbox.font.character_width('a');
        let second_line_y = 2 + textbox.line_height() + 1;
        textbox.receive_mouse_event(&MouseEvent::down(IVector2::new(2 + step * 2, second_line_y)));
        assert_eq!(textbox.caret, Caret { line: 1, column: 2 });
    }
}
