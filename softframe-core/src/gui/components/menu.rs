//! Drop-down menus.
//!
//! A menu draws a clickable header in its normal location; clicking toggles
//! an overlay listing the menu's children. The overlay is sized to the
//! widest child's desired width and the sum of their heights and is drawn
//! in the root's overlay pass, so it escapes every clip region. Children
//! that are menus themselves open as submenus beside their row; other
//! children act as plain items whose pressed and select callbacks fire on
//! release. Losing focus closes the whole chain.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::{draw_alpha_filter, draw_rectangle};
use crate::font::{RasterFont, default_font};
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{
    Component, ComponentCore, ComponentRc, ComponentState, STATE_FOCUS, STATE_HOVER,
    get_attribute,
};
use crate::gui::input::{MouseEvent, MouseEventType};
use crate::gui::theme::{ThemeImageCache, ThemeRequest};
use crate::image::color::Color;
use crate::image::ImageRgba;
use std::any::Any;

const ITEM_PADDING: i32 = 6;

pub struct Menu {
    core: ComponentCore,
    text: String,
    color: Color,
    font: RasterFont,
    pressed: bool,
    /// Overlay rectangle in the parent's coordinate system, valid while
    /// showing.
    overlay_rect: IRect,
    hovered_item: Option<usize>,
    cache: ThemeImageCache,
}

impl Menu {
    pub fn new() -> Menu {
        Menu {
            core: ComponentCore::new(),
            text: String::new(),
            color: Color::opaque(150, 150, 150),
            font: default_font(),
            pressed: false,
            overlay_rect: IRect::default(),
            hovered_item: None,
            cache: ThemeImageCache::new(),
        }
    }

    pub fn with_text(text: &str) -> Menu {
        let mut menu = Menu::new();
        menu.text = text.into();
        menu
    }

    fn item_label(child: &ComponentRc) -> String {
        get_attribute(&*child.borrow(), "Text")
            .and_then(|value| value.as_text().map(String::from))
            .unwrap_or_default()
    }

    fn row_height(&self) -> i32 {
        self.font.size() + ITEM_PADDING
    }

    /// Lay the overlay out below the header: as wide as the widest child
    /// asks for, as tall as all rows together.
    fn open_overlay(&mut self) {
        let location = self.core.location();
        let mut width = 40;
        for child in self.core.children() {
            width = width.max(self.font.line_width(&Menu::item_label(child)) + ITEM_PADDING * 4);
        }
        let height = (self.core.child_count() as i32 * self.row_height()).max(self.row_height());
        self.overlay_rect = IRect::new(location.left(), location.bottom(), width, height + 2);
        self.hovered_item = None;
        self.core.show_overlay();
    }

    fn close_overlay(&mut self) {
        self.core.hide_overlay();
        self.hovered_item = None;
        // Submenus close with their parent.
        for child in self.core.children() {
            child.borrow_mut().core_mut().hide_overlay();
        }
    }

    fn item_at(&self, point_in_parent: IVector2) -> Option<usize> {
        if !self.overlay_rect.contains(point_in_parent) {
            return None;
        }
        let index = ((point_in_parent.y - self.overlay_rect.top() - 1) / self.row_height()) as usize;
        (index < self.core.child_count()).then_some(index)
    }

    fn item_row(&self, index: usize) -> IRect {
        IRect::new(
            self.overlay_rect.left() + 1,
            self.overlay_rect.top() + 1 + index as i32 * self.row_height(),
            self.overlay_rect.width() - 2,
            self.row_height(),
        )
    }

    /// Activate the item under `index`: submenus open beside their row,
    /// leaves fire their callbacks and close the menu.
    fn activate_item(&mut self, index: usize) {
        let Some(child) = self.core.children().get(index).cloned() else {
            return;
        };
        let is_submenu = child.borrow().as_any().is::<Menu>();
        if is_submenu {
            let row = self.item_row(index);
            let mut child_mut = child.borrow_mut();
            let corner = self.core.location().upper_left();
            {
                let submenu = child_mut.as_any_mut().downcast_mut::<Menu>().expect("checked above");
                // The submenu's overlay rectangle lives in ITS parent
                // coordinate system, which is this menu's content space.
                let local_row = row - corner;
                submenu.overlay_rect = IRect::new(
                    self.overlay_rect.right() - corner.x,
                    local_row.top(),
                    submenu.overlay_width(),
                    submenu.overlay_height(),
                );
                submenu.hovered_item = None;
            }
            child_mut.core_mut().show_overlay();
        } else {
            let index_value = child.borrow().core().index();
            {
                let mut child_mut = child.borrow_mut();
                let mut pressed = child_mut.core_mut().on_pressed.take();
                drop(child_mut);
                if let Some(callback) = &mut pressed {
                    callback();
                }
                child.borrow_mut().core_mut().on_pressed = pressed;
            }
            if let Some(callback) = &mut self.core.on_select {
                callback(index_value);
            }
            self.close_overlay();
        }
    }

    fn overlay_width(&self) -> i32 {
        let mut width = 40;
        for child in self.core.children() {
            width = width.max(self.font.line_width(&Menu::item_label(child)) + ITEM_PADDING * 4);
        }
        width
    }

    fn overlay_height(&self) -> i32 {
        (self.core.child_count() as i32 * self.row_height()).max(self.row_height()) + 2
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Menu {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Menu"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    /// The menu draws and dispatches to its overlay members itself.
    fn manages_children(&self) -> bool {
        true
    }

    fn desired_dimensions(&mut self) -> IVector2 {
        IVector2::new(self.font.line_width(&self.text) + ITEM_PADDING * 2, self.font.size() + ITEM_PADDING)
    }

    fn point_is_inside_of_overlay(&self, point: IVector2) -> bool {
        self.overlay_rect.contains(point)
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        let state = self.core.state();
        let request = ThemeRequest::new(relative_location.width(), relative_location.height(), self.color)
            .with_states(
                self.pressed || self.core.showing_overlay(),
                state & STATE_FOCUS != 0,
                state & STATE_HOVER != 0,
            );
        let theme = self.core.theme();
        let image = self.cache.fetch(&theme, "MenuItem", request);
        draw_alpha_filter(target, &image, relative_location.left(), relative_location.top());
        let location = IVector2::new(
            relative_location.left() + ITEM_PADDING,
            relative_location.top() + (relative_location.height() - self.font.size()) / 2,
        );
        self.font.print_line(target, &self.text, location, Color::opaque(0, 0, 0));
    }

    fn draw_overlay(&mut self, target: &ImageRgba, absolute_offset: IVector2) {
        let theme = self.core.theme();
        let list_rect = self.overlay_rect + absolute_offset;
        let background = theme.generate_image(
            "MenuList",
            ThemeRequest::new(list_rect.width(), list_rect.height(), self.color),
        );
        draw_alpha_filter(target, &background, list_rect.left(), list_rect.top());
        let children = self.core.children().to_vec();
        for (index, child) in children.iter().enumerate() {
            let row = self.item_row(index) + absolute_offset;
            if self.hovered_item == Some(index) {
                draw_rectangle(target, row, Color::opaque(60, 90, 160));
            }
            let text_color = if self.hovered_item == Some(index) {
                Color::opaque(255, 255, 255)
            } else {
                Color::opaque(0, 0, 0)
            };
            self.font.print_line(
                target,
                &Menu::item_label(child),
                IVector2::new(row.left() + ITEM_PADDING, row.top() + ITEM_PADDING / 2),
                text_color,
            );
            if child.borrow().as_any().is::<Menu>() {
                // Submenu marker at the right edge.
                self.font.print_line(
                    target,
                    ">",
                    IVector2::new(row.right() - self.font.character_width('>') - 2, row.top() + ITEM_PADDING / 2),
                    text_color,
                );
            }
        }
    }

    fn receive_mouse_event(&mut self, event: &MouseEvent) {
        // The position arrives in parent coordinates, matching both the
        // header location and the overlay rectangle.
        let on_header = self.point_is_inside(event.position);
        match event.event_type {
            MouseEventType::MouseDown => {
                if on_header {
                    self.pressed = true;
                    if self.core.showing_overlay() {
                        self.close_overlay();
                    } else {
                        self.open_overlay();
                    }
                } else if let Some(index) = self.item_at(event.position) {
                    self.hovered_item = Some(index);
                }
            }
            MouseEventType::MouseMove => {
                if self.core.showing_overlay() {
                    self.hovered_item = self.item_at(event.position);
                }
            }
            MouseEventType::MouseUp => {
                self.pressed = false;
                if !on_header {
                    if let Some(index) = self.item_at(event.position) {
                        self.activate_item(index);
                    }
                }
            }
            MouseEventType::Scroll => {}
        }
        crate::gui::component::dispatch_mouse_callbacks(&mut self.core, event);
    }

    fn update_state_event(&mut self, old_state: ComponentState, new_state: ComponentState) {
        // Menus close when focus leaves them and their overlay members.
        if old_state & STATE_FOCUS != 0 && new_state & STATE_FOCUS == 0 && self.core.showing_overlay() {
            self.close_overlay();
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::component::{ComponentRc, STATE_FOCUS_DIRECT, add_child, into_handle};
    use crate::gui::components::Button;
    use crate::gui::flex::FlexRegion;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A "File" menu at (10, 5)..(70, 27) holding a plain item and a
    /// submenu.
    fn file_menu() -> (ComponentRc, ComponentRc, ComponentRc) {
        let menu = into_handle(Menu::with_text("File"));
        menu.borrow_mut().core_mut().set_region(FlexRegion::pixels(10, 5, 70, 27));
        let open = into_handle(Button::with_text("Open"));
        add_child(&menu, &open);
        let more = into_handle(Menu::with_text("More"));
        add_child(&menu, &more);
        menu.borrow_mut().apply_layout(IRect::new(0, 0, 200, 100));
        (menu, open, more)
    }

    fn as_menu<R>(handle: &ComponentRc, action: impl FnOnce(&mut Menu) -> R) -> R {
        let mut borrowed = handle.borrow_mut();
        action(borrowed.as_any_mut().downcast_mut::<Menu>().expect("a menu"))
    }

    #[test]
    fn the_overlay_opens_below_the_header_sized_to_its_items() {
        let (menu, _open, _more) = file_menu();
        let font = default_font();
        as_menu(&menu, |menu| {
            menu.open_overlay();
            assert!(menu.core.showing_overlay());
            let row = menu.row_height();
            let expected_width = (font.line_width("Open") + ITEM_PADDING * 4)
                .max(font.line_width("More") + ITEM_PADDING * 4)
                .max(40);
            assert_eq!(menu.overlay_rect, IRect::new(10, 27, expected_width, row * 2 + 2));
            // Overlay hit testing speaks the parent coordinate system.
            assert!(menu.point_is_inside_of_overlay(IVector2::new(12, 28)));
            assert!(!menu.point_is_inside_of_overlay(IVector2::new(12, 26)));
            assert_eq!(menu.item_at(IVector2::new(12, 28)), Some(0));
            assert_eq!(menu.item_at(IVector2::new(12, 28 + row)), Some(1));
            assert_eq!(menu.item_at(IVector2::new(12, 26)), None);
        });
    }

    #[test]
    fn activating_a_submenu_places_its_overlay_beside_the_row() {
        let (menu, _open, more) = file_menu();
        as_menu(&menu, |menu| {
            menu.open_overlay();
            menu.activate_item(1);
        });
        let parent_rect = as_menu(&menu, |menu| menu.overlay_rect);
        let row_height = as_menu(&menu, |menu| menu.row_height());
        as_menu(&more, |submenu| {
            assert!(submenu.core.showing_overlay());
            // The parent's overlay rectangle lives in the grandparent's
            // coordinates while the submenu's lives in the parent menu's
            // content space, so the menu corner (10, 5) is subtracted once.
            assert_eq!(submenu.overlay_rect.left(), parent_rect.right() - 10);
            assert_eq!(submenu.overlay_rect.top(), parent_rect.top() + 1 + row_height - 5);
            // An empty submenu falls back to the minimum list size.
            assert_eq!(submenu.overlay_rect.width(), 40);
            assert_eq!(submenu.overlay_rect.height(), row_height + 2);
        });
        // Closing the parent closes the chain.
        as_menu(&menu, |menu| menu.close_overlay());
        assert!(!as_menu(&more, |submenu| submenu.core.showing_overlay()));
    }

    #[test]
    fn activating_a_leaf_fires_callbacks_and_closes_the_menu() {
        let (menu, open, _more) = file_menu();
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let sink = log.clone();
            open.borrow_mut().core_mut().on_pressed =
                Some(Box::new(move || sink.borrow_mut().push("pressed".into())));
            crate::gui::component::set_attribute(
                &mut *open.borrow_mut(),
                "Index",
                &crate::gui::attributes::AttributeValue::Integer(7),
            );
            let sink = log.clone();
            menu.borrow_mut().core_mut().on_select =
                Some(Box::new(move |index| sink.borrow_mut().push(format!("select {index}"))));
        }
        as_menu(&menu, |menu| {
            menu.open_overlay();
            menu.activate_item(0);
            assert!(!menu.core.showing_overlay());
        });
        assert_eq!(log.borrow().as_slice(), ["pressed", "select 7"]);
    }

    #[test]
    fn the_header_toggles_and_moves_highlight_items() {
        let (menu, _open, _more) = file_menu();
        let header = IVector2::new(15, 10);
        as_menu(&menu, |menu| {
            menu.receive_mouse_event(&MouseEvent::down(header));
            assert!(menu.core.showing_overlay());
            let first_row = IVector2::new(15, menu.overlay_rect.top() + 2);
            menu.receive_mouse_event(&MouseEvent::moved(first_row));
            assert_eq!(menu.hovered_item, Some(0));
            // Releasing over the header keeps the overlay open.
            menu.receive_mouse_event(&MouseEvent::up(header));
            assert!(menu.core.showing_overlay());
            // A second click on the header closes it again.
            menu.receive_mouse_event(&MouseEvent::down(header));
            assert!(!menu.core.showing_overlay());
        });
    }

    #[test]
    fn losing_focus_closes_the_open_overlay() {
        let (menu, _open, _more) = file_menu();
        as_menu(&menu, |menu| {
            menu.open_overlay();
            menu.update_state_event(STATE_FOCUS_DIRECT, 0);
            assert!(!menu.core.showing_overlay());
        });
    }
}
