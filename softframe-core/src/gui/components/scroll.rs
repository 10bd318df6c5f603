//! Shared vertical scroll bar logic for list boxes and text boxes.
//!
//! The bar occupies a strip at the right edge of its host: an up button, a
//! down button, and a knob whose size and position mirror the visible
//! fraction. The host forwards its local mouse events; the helper reports
//! the new scroll offset.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::draw_alpha_filter;
use crate::gui::input::{MouseEvent, MouseEventType, MouseKey};
use crate::gui::theme::{Theme, ThemeRequest};
use crate::image::color::Color;
use crate::image::ImageRgba;

pub const SCROLL_BAR_WIDTH: i32 = 16;
const BUTTON_STEP: i32 = 24;

pub struct VerticalScrollBar {
    /// Scroll offset in content pixels.
    offset: i32,
    content_height: i32,
    view: IRect,
    dragging_knob: bool,
    drag_grip: i32,
    pressed_up: bool,
    pressed_down: bool,
}

impl VerticalScrollBar {
    pub fn new() -> VerticalScrollBar {
        VerticalScrollBar {
            offset: 0,
            content_height: 0,
            view: IRect::default(),
            dragging_knob: false,
            drag_grip: 0,
            pressed_up: false,
            pressed_down: false,
        }
    }

    /// Update geometry. `view` is the host's content rectangle in local
    /// coordinates; the bar claims its right strip when needed.
    pub fn update(&mut self, view: IRect, content_height: i32) {
        self.view = view;
        self.content_height = content_height;
        self.clamp_offset();
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
        self.clamp_offset();
    }

    /// True when the content overflows and the bar is visible.
    pub fn visible(&self) -> bool {
        self.content_height > self.view.height()
    }

    /// The host content width left of the bar.
    pub fn inner_width(&self) -> i32 {
        if self.visible() { self.view.width() - SCROLL_BAR_WIDTH } else { self.view.width() }
    }

    fn clamp_offset(&mut self) {
        let max_offset = (self.content_height - self.view.height()).max(0);
        self.offset = self.offset.clamp(0, max_offset);
    }

    fn bar_rect(&self) -> IRect {
        IRect::new(self.view.right() - SCROLL_BAR_WIDTH, self.view.top(), SCROLL_BAR_WIDTH, self.view.height())
    }

    fn up_rect(&self) -> IRect {
        let bar = self.bar_rect();
        IRect::new(bar.left(), bar.top(), bar.width(), bar.width())
    }

    fn down_rect(&self) -> IRect {
        let bar = self.bar_rect();
        IRect::new(bar.left(), bar.bottom() - bar.width(), bar.width(), bar.width())
    }

    fn track_rect(&self) -> IRect {
        let bar = self.bar_rect();
        IRect::new(bar.left(), bar.top() + bar.width(), bar.width(), (bar.height() - bar.width() * 2).max(0))
    }

    fn knob_rect(&self) -> IRect {
        let track = self.track_rect();
        if self.content_height <= self.view.height() || track.height() <= 0 {
            return track;
        }
        let knob_height = (track.height() * self.view.height() / self.content_height).max(8).min(track.height());
        let max_offset = (self.content_height - self.view.height()).max(1);
        let travel = track.height() - knob_height;
        let knob_top = track.top() + travel * self.offset / max_offset;
        IRect::new(track.left(), knob_top, track.width(), knob_height)
    }

    fn offset_for_knob_top(&self, knob_top: i32) -> i32 {
        let track = self.track_rect();
        let knob = self.knob_rect();
        let travel = (track.height() - knob.height()).max(1);
        let max_offset = (self.content_height - self.view.height()).max(0);
        (knob_top - track.top()) * max_offset / travel
    }

    /// Handle a host-local mouse event. Returns true when the event was
    /// consumed by the bar.
    pub fn handle_mouse(&mut self, event: &MouseEvent) -> bool {
        // The wheel scrolls regardless of where the pointer sits.
        if event.event_type == MouseEventType::Scroll {
            match event.key {
                MouseKey::ScrollUp => {
                    self.offset -= BUTTON_STEP;
                    self.clamp_offset();
                    return true;
                }
                MouseKey::ScrollDown => {
                    self.offset += BUTTON_STEP;
                    self.clamp_offset();
                    return true;
                }
                _ => {}
            }
        }
        if !self.visible() {
            return false;
        }
        match event.event_type {
            MouseEventType::MouseDown => {
                if self.up_rect().contains(event.position) {
                    self.pressed_up = true;
                    self.offset -= BUTTON_STEP;
                    self.clamp_offset();
                    true
                } else if self.down_rect().contains(event.position) {
                    self.pressed_down = true;
                    self.offset += BUTTON_STEP;
                    self.clamp_offset();
                    true
                } else if self.knob_rect().contains(event.position) {
                    self.dragging_knob = true;
                    self.drag_grip = event.position.y - self.knob_rect().top();
                    true
                } else if self.track_rect().contains(event.position) {
                    // Jump a page towards the click.
                    if event.position.y < self.knob_rect().top() {
                        self.offset -= self.view.height();
                    } else {
                        self.offset += self.view.height();
                    }
                    self.clamp_offset();
                    true
                } else {
                    false
                }
            }
            MouseEventType::MouseMove => {
                if self.dragging_knob {
                    self.offset = self.offset_for_knob_top(event.position.y - self.drag_grip);
                    self.clamp_offset();
                    true
                } else {
                    false
                }
            }
            MouseEventType::MouseUp => {
                let was_active = self.dragging_knob || self.pressed_up || self.pressed_down;
                self.dragging_knob = false;
                self.pressed_up = false;
                self.pressed_down = false;
                was_active
            }
            MouseEventType::Scroll => false,
        }
    }

    /// Draw the bar into host-relative coordinates offset by `origin`.
    pub fn draw(&self, target: &ImageRgba, origin: IVector2, theme: &Theme, color: Color) {
        if !self.visible() {
            return;
        }
        let place = |rect: IRect| rect + origin;
        let up = self.up_rect();
        let image = theme.generate_image(
            "ScrollUp",
            ThemeRequest::new(up.width(), up.height(), color).with_states(self.pressed_up, false, false),
        );
        draw_alpha_filter(target, &image, place(up).left(), place(up).top());
        let down = self.down_rect();
        let image = theme.generate_image(
            "ScrollDown",
            ThemeRequest::new(down.width(), down.height(), color).with_states(self.pressed_down, false, false),
        );
        draw_alpha_filter(target, &image, place(down).left(), place(down).top());
        let knob = self.knob_rect();
        if knob.has_area() {
            let image = theme.generate_image(
                "ScrollKnob",
                ThemeRequest::new(knob.width(), knob.height(), color).with_states(self.dragging_knob, false, false),
            );
            draw_alpha_filter(target, &image, place(knob).left(), place(knob).top());
        }
    }
}

impl Default for VerticalScrollBar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> VerticalScrollBar {
        let mut bar = VerticalScrollBar::new();
        bar.update(IRect::new(0, 0, 100, 100), 400);
        bar
    }

    #[test]
    fn overflow_controls_visibility_and_inner_width() {
        let mut bar = VerticalScrollBar::new();
        bar.update(IRect::new(0, 0, 100, 100), 50);
        assert!(!bar.visible());
        assert_eq!(bar.inner_width(), 100);
        bar.update(IRect::new(0, 0, 100, 100), 400);
        assert!(bar.visible());
        assert_eq!(bar.inner_width(), 100 - SCROLL_BAR_WIDTH);
    }

    #[test]
    fn offsets_clamp_to_the_scrollable_range() {
        let mut bar = bar();
        bar.set_offset(-10);
        assert_eq!(bar.offset(), 0);
        bar.set_offset(10_000);
        assert_eq!(bar.offset(), 300);
    }

    #[test]
    fn buttons_step_and_wheel_scrolls() {
        let mut bar = bar();
        let down_button = IVector2::new(92, 95);
        assert!(bar.handle_mouse(&MouseEvent::down(down_button)));
        assert!(bar.offset() > 0);
        let before = bar.offset();
        assert!(bar.handle_mouse(&MouseEvent::new(
            MouseEventType::Scroll,
            MouseKey::ScrollUp,
            IVector2::new(50, 50)
        )));
        assert!(bar.offset() < before);
    }

    #[test]
    fn knob_drag_tracks_the_pointer() {
        let mut bar = bar();
        let knob_top = bar.knob_rect().top();
        let grab = IVector2::new(92, knob_top + 2);
        assert!(bar.handle_mouse(&MouseEvent::down(grab)));
        assert!(bar.handle_mouse(&MouseEvent::moved(IVector2::new(92, knob_top + 22))));
        assert!(bar.offset() > 0);
        assert!(bar.handle_mouse(&MouseEvent::up(IVector2::new(92, knob_top + 22))));
        // After release, moves no longer scroll.
        let settled = bar.offset();
        assert!(!bar.handle_mouse(&MouseEvent::moved(IVector2::new(92, knob_top + 40))));
        assert_eq!(bar.offset(), settled);
    }
}
