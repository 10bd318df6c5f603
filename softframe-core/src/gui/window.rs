//! The window/canvas driver.
//!
//! The window owns the root component and an integer pixel scale. The GUI
//! draws into a low-resolution canvas of `max(1, inner / scale)` pixels per
//! side; presenting block-magnifies it into the backend surface, and mouse
//! positions are divided by the scale on the way in, so components never
//! know the scale exists. An optional depth buffer matches the canvas size
//! and is dropped on resize.

use crate::base::geometry::{IRect, IVector2};
use crate::filter::block_magnify;
use crate::gui::component::{
    Component, ComponentRc, apply_theme, into_handle, send_keyboard_event, send_mouse_event,
};
use crate::gui::components::Panel;
use crate::gui::input::{InputEvent, KeyboardEvent, MouseEvent, MouseEventType, WindowEventType};
use crate::gui::persistence::{LayoutError, load_layout, save_layout};
use crate::gui::theme::Theme;
use crate::image::color::PackOrderIndex;
use crate::image::pixel::Raster;
use crate::image::{ImageF32, ImageRgba};
use std::time::Duration;

/// What the platform layer provides: a surface, a window, input events and
/// the clipboard. The core drives it, never the other way around.
pub trait WindowBackend {
    /// The surface image in the backend's native pack order. May change
    /// identity after `resize_canvas` or an external resize.
    fn canvas(&mut self) -> ImageRgba;
    fn resize_canvas(&mut self, width: i32, height: i32);
    fn inner_size(&self) -> IVector2;
    fn set_title(&mut self, title: &str);
    fn title(&self) -> String;
    fn set_fullscreen(&mut self, fullscreen: bool);
    fn is_fullscreen(&self) -> bool;
    fn set_cursor_position(&mut self, position: IVector2);
    fn set_cursor_visible(&mut self, visible: bool);
    fn clipboard_store(&mut self, text: &str);
    fn clipboard_load(&mut self, timeout: Duration) -> Option<String>;
    /// Non-blocking: everything the platform queued since the last call.
    fn prefetch_events(&mut self) -> Vec<InputEvent>;
    /// Push the current surface contents to the screen.
    fn present(&mut self);
}

/// In-memory backend for tests, demos and server-side rendering.
pub struct HeadlessBackend {
    surface: ImageRgba,
    title: String,
    fullscreen: bool,
    cursor_position: IVector2,
    cursor_visible: bool,
    clipboard: Option<String>,
    queued_events: Vec<InputEvent>,
    pub presented_frames: usize,
}

impl HeadlessBackend {
    pub fn new(width: i32, height: i32) -> HeadlessBackend {
        HeadlessBackend {
            surface: ImageRgba::create_with_order(width.max(1), height.max(1), PackOrderIndex::Bgra)
                .expect("surface creation"),
            title: String::new(),
            fullscreen: false,
            cursor_position: IVector2::default(),
            cursor_visible: true,
            clipboard: None,
            queued_events: Vec::new(),
            presented_frames: 0,
        }
    }

    /// Enqueue an event as if the platform delivered it.
    pub fn push_event(&mut self, event: InputEvent) {
        self.queued_events.push(event);
    }
}

impl WindowBackend for HeadlessBackend {
    fn canvas(&mut self) -> ImageRgba {
        self.surface.clone()
    }
    fn resize_canvas(&mut self, width: i32, height: i32) {
        self.surface = ImageRgba::create_with_order(width.max(1), height.max(1), PackOrderIndex::Bgra)
            .expect("surface creation");
    }
    fn inner_size(&self) -> IVector2 {
        IVector2::new(self.surface.width(), self.surface.height())
    }
    fn set_title(&mut self, title: &str) {
        self.title = title.into();
    }
    fn title(&self) -> String {
        self.title.clone()
    }
    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }
    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
    fn set_cursor_position(&mut self, position: IVector2) {
        self.cursor_position = position;
    }
    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }
    fn clipboard_store(&mut self, text: &str) {
        self.clipboard = Some(text.into());
    }
    fn clipboard_load(&mut self, _timeout: Duration) -> Option<String> {
        self.clipboard.clone()
    }
    fn prefetch_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.queued_events)
    }
    fn present(&mut self) {
        self.presented_frames += 1;
    }
}

pub struct Window {
    backend: Box<dyn WindowBackend>,
    root: ComponentRc,
    pixel_scale: i32,
    low_resolution_canvas: Option<ImageRgba>,
    depth_buffer: Option<ImageF32>,
    closing: bool,
}

impl Window {
    pub fn new(backend: Box<dyn WindowBackend>) -> Window {
        let root = into_handle(Panel::new());
        let mut window = Window {
            backend,
            root,
            pixel_scale: 1,
            low_resolution_canvas: None,
            depth_buffer: None,
            closing: false,
        };
        window.apply_root_layout();
        window
    }

    pub fn root(&self) -> ComponentRc {
        self.root.clone()
    }

    /// Replace the root component, laying it out over the whole canvas.
    pub fn set_root(&mut self, root: ComponentRc) {
        self.root = root;
        self.apply_root_layout();
    }

    fn canvas_width(&self) -> i32 {
        (self.backend.inner_size().x / self.pixel_scale).max(1)
    }

    fn canvas_height(&self) -> i32 {
        (self.backend.inner_size().y / self.pixel_scale).max(1)
    }

    fn apply_root_layout(&mut self) {
        let space = IRect::new(0, 0, self.canvas_width(), self.canvas_height());
        self.root.borrow_mut().apply_layout(space);
    }

    pub fn pixel_scale(&self) -> i32 {
        self.pixel_scale
    }

    /// Change the pixel scale; the canvas shrinks or grows accordingly and
    /// the depth buffer resets.
    pub fn set_pixel_scale(&mut self, scale: i32) {
        let scale = scale.max(1);
        if scale != self.pixel_scale {
            self.pixel_scale = scale;
            self.low_resolution_canvas = None;
            self.depth_buffer = None;
            self.apply_root_layout();
        }
    }

    /// The canvas the GUI draws into: the low-resolution image when scaled,
    /// the backend surface otherwise.
    pub fn canvas(&mut self) -> ImageRgba {
        if self.pixel_scale > 1 {
            let width = self.canvas_width();
            let height = self.canvas_height();
            let stale = match &self.low_resolution_canvas {
                Some(canvas) => canvas.width() != width || canvas.height() != height,
                None => true,
            };
            if stale {
                // Deterministic RGBA order; conversion happens on upscale.
                self.low_resolution_canvas = ImageRgba::create(width, height).ok();
                self.depth_buffer = None;
            }
            self.low_resolution_canvas.clone().expect("low resolution canvas")
        } else {
            self.backend.canvas()
        }
    }

    /// Depth buffer of the canvas size, allocated on demand.
    pub fn depth_buffer(&mut self) -> ImageF32 {
        let width = self.canvas_width();
        let height = self.canvas_height();
        let stale = match &self.depth_buffer {
            Some(buffer) => buffer.width() != width || buffer.height() != height,
            None => true,
        };
        if stale {
            self.depth_buffer = ImageF32::create(width, height).ok();
        }
        self.depth_buffer.clone().expect("depth buffer")
    }

    /// Pump backend events into the GUI. Returns false once the window was
    /// asked to close.
    pub fn execute_events(&mut self) -> bool {
        for event in self.backend.prefetch_events() {
            match event {
                InputEvent::Mouse(event) => self.send_mouse_event(&event),
                InputEvent::Keyboard(event) => self.send_keyboard_event(&event),
                InputEvent::Window(event) => match event.event_type {
                    WindowEventType::Close => self.closing = true,
                    WindowEventType::Redraw => {
                        self.low_resolution_canvas = None;
                        self.depth_buffer = None;
                        self.apply_root_layout();
                    }
                },
            }
        }
        !self.closing
    }

    /// Scale a backend mouse event into canvas coordinates and route it.
    /// Events outside the root are still delivered while a hold is active,
    /// so captured drags always see their mouse up.
    pub fn send_mouse_event(&mut self, event: &MouseEvent) {
        let scaled = event.descaled(self.pixel_scale);
        let deliver = {
            let root = self.root.borrow();
            (root.core().visible() && root.point_is_inside(scaled.position))
                || event.event_type == MouseEventType::MouseUp
                || root.core().hold_count() > 0
        };
        if deliver {
            send_mouse_event(&self.root, &scaled, false);
        }
    }

    pub fn send_keyboard_event(&mut self, event: &KeyboardEvent) {
        send_keyboard_event(&self.root, event);
    }

    /// Draw the component tree into the canvas.
    pub fn draw_components(&mut self) {
        let canvas = self.canvas();
        crate::gui::component::draw(&self.root, &canvas, IVector2::default());
    }

    /// Upload the canvas: upscaled by whole pixels when scaled, then
    /// presented by the backend.
    pub fn show_canvas(&mut self) {
        if self.pixel_scale > 1 {
            if let Some(source) = &self.low_resolution_canvas {
                let target = self.backend.canvas();
                block_magnify(&target, source, self.pixel_scale, self.pixel_scale);
            }
        }
        self.backend.present();
    }

    pub fn set_theme(&mut self, theme: &Theme) {
        apply_theme(&self.root, theme);
    }

    pub fn set_title(&mut self, title: &str) {
        self.backend.set_title(title);
    }

    pub fn title(&self) -> String {
        self.backend.title()
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.backend.set_fullscreen(fullscreen);
    }

    pub fn clipboard_store(&mut self, text: &str) {
        self.backend.clipboard_store(text);
    }

    pub fn clipboard_load(&mut self, timeout: Duration) -> Option<String> {
        self.backend.clipboard_load(timeout)
    }

    /// Serialize the current component tree.
    pub fn save_layout(&self) -> String {
        save_layout(&self.root)
    }

    /// Replace the component tree from a layout document.
    pub fn load_layout(&mut self, document: &str) -> Result<(), LayoutError> {
        self.root = load_layout(document)?;
        self.apply_root_layout();
        Ok(())
    }
}
