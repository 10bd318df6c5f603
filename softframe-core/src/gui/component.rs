//! The retained component tree: state bits, layout, drawing and event
//! routing.
//!
//! Components live in `Rc<RefCell<...>>` cells. The tree holds strong
//! handles from parent to child and a weak back reference from child to
//! parent; drag capture keeps a strong handle so a captured component
//! outlives its mouse-up. Tree-wide operations are free functions over
//! handles that borrow one cell at a time, so overriding components can
//! reach their children without re-entrant borrows. Inside `&mut self`
//! methods (event handlers, draw), a component must only touch its own
//! core and its children, never handle-level operations on itself.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::draw_rectangle;
use crate::gui::attributes::AttributeValue;
use crate::gui::flex::FlexRegion;
use crate::gui::input::{KeyboardEvent, KeyboardEventType, MouseEvent, MouseEventType};
use crate::gui::theme::Theme;
use crate::image::color::Color;
use crate::image::pixel::Raster;
use crate::image::ImageRgba;
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type ComponentRc = Rc<RefCell<dyn Component>>;
pub type ComponentWeak = Weak<RefCell<dyn Component>>;

/// Bit set over the three direct/indirect state pairs. A direct bit lives
/// on the component itself; the matching indirect bit means some descendant
/// has the direct bit. Direct bits occupy the even positions so shifting
/// left by one turns a child's contribution into the parent's indirect bit.
pub type ComponentState = u32;
pub const STATE_FOCUS_DIRECT: ComponentState = 1 << 0;
pub const STATE_FOCUS_INDIRECT: ComponentState = 1 << 1;
pub const STATE_HOVER_DIRECT: ComponentState = 1 << 2;
pub const STATE_HOVER_INDIRECT: ComponentState = 1 << 3;
pub const STATE_OVERLAY_DIRECT: ComponentState = 1 << 4;
pub const STATE_OVERLAY_INDIRECT: ComponentState = 1 << 5;
pub const STATE_FOCUS: ComponentState = STATE_FOCUS_DIRECT | STATE_FOCUS_INDIRECT;
pub const STATE_HOVER: ComponentState = STATE_HOVER_DIRECT | STATE_HOVER_INDIRECT;
pub const STATE_OVERLAY: ComponentState = STATE_OVERLAY_DIRECT | STATE_OVERLAY_INDIRECT;
pub const STATE_DIRECT_MASK: ComponentState = STATE_FOCUS_DIRECT | STATE_HOVER_DIRECT | STATE_OVERLAY_DIRECT;
pub const STATE_INDIRECT_MASK: ComponentState =
    STATE_FOCUS_INDIRECT | STATE_HOVER_INDIRECT | STATE_OVERLAY_INDIRECT;

pub type EmptyCallback = Box<dyn FnMut()>;
pub type IndexCallback = Box<dyn FnMut(i64)>;
pub type MouseCallback = Box<dyn FnMut(&MouseEvent)>;
pub type KeyboardCallback = Box<dyn FnMut(&KeyboardEvent)>;

/// The data every component carries.
pub struct ComponentCore {
    pub(crate) parent: ComponentWeak,
    pub(crate) self_weak: ComponentWeak,
    pub(crate) children: Vec<ComponentRc>,
    pub(crate) given_space: IRect,
    pub(crate) region: FlexRegion,
    pub(crate) region_accessed: bool,
    pub(crate) location: IRect,
    pub(crate) current_state: ComponentState,
    pub(crate) previous_state: ComponentState,
    pub(crate) hold_count: i32,
    pub(crate) drag_component: Option<ComponentRc>,
    pub(crate) child_changed: bool,
    pub(crate) requested_detach: bool,
    pub(crate) visible: bool,
    pub(crate) name: String,
    pub(crate) index: i64,
    pub(crate) theme: Theme,
    // Callback slots; assigned by the application.
    pub on_pressed: Option<EmptyCallback>,
    pub on_select: Option<IndexCallback>,
    pub on_mouse_down: Option<MouseCallback>,
    pub on_mouse_up: Option<MouseCallback>,
    pub on_mouse_move: Option<MouseCallback>,
    pub on_mouse_scroll: Option<MouseCallback>,
    pub on_key_down: Option<KeyboardCallback>,
    pub on_key_up: Option<KeyboardCallback>,
    pub on_key_type: Option<KeyboardCallback>,
}

impl Default for ComponentCore {
    fn default() -> Self {
        Self::new()
    }
}

/// An unset weak handle; `Weak::new` needs a sized type to start from.
pub(crate) fn empty_weak() -> ComponentWeak {
    Weak::<RefCell<crate::gui::components::Panel>>::new()
}

impl ComponentCore {
    pub fn new() -> ComponentCore {
        ComponentCore {
            parent: empty_weak(),
            self_weak: empty_weak(),
            children: Vec::new(),
            given_space: IRect::default(),
            region: FlexRegion::fill(),
            region_accessed: false,
            location: IRect::default(),
            current_state: 0,
            previous_state: 0,
            hold_count: 0,
            drag_component: None,
            child_changed: false,
            requested_detach: false,
            visible: true,
            name: String::new(),
            index: 0,
            theme: Theme::built_in(),
            on_pressed: None,
            on_select: None,
            on_mouse_down: None,
            on_mouse_up: None,
            on_mouse_move: None,
            on_mouse_scroll: None,
            on_key_down: None,
            on_key_up: None,
            on_key_type: None,
        }
    }

    pub fn location(&self) -> IRect {
        self.location
    }

    pub fn region(&self) -> FlexRegion {
        self.region
    }

    pub fn set_region(&mut self, region: FlexRegion) {
        self.region = region;
        self.region_accessed = true;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.into();
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn state(&self) -> ComponentState {
        self.current_state
    }

    pub fn theme(&self) -> Theme {
        self.theme.clone()
    }

    pub fn children(&self) -> &[ComponentRc] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn hold_count(&self) -> i32 {
        self.hold_count
    }

    /// The shared handle of this component, for registering it with
    /// siblings. Unavailable while the component is being constructed.
    pub fn self_handle(&self) -> Option<ComponentRc> {
        self.self_weak.upgrade()
    }

    pub fn parent_handle(&self) -> Option<ComponentRc> {
        self.parent.upgrade()
    }

    pub fn showing_overlay(&self) -> bool {
        self.current_state & STATE_OVERLAY_DIRECT != 0
    }

    /// Direct or indirect overlay ownership, deciding whether the overlay
    /// pass descends into this subtree.
    pub fn owns_overlay(&self) -> bool {
        self.current_state & STATE_OVERLAY != 0
    }

    pub fn owns_focus(&self) -> bool {
        self.current_state & STATE_FOCUS != 0
    }

    /// Show this component's overlay. The indirect bits of the ancestors
    /// catch up at the next notification flush.
    pub fn show_overlay(&mut self) {
        self.current_state |= STATE_OVERLAY_DIRECT;
    }

    pub fn hide_overlay(&mut self) {
        self.current_state &= !STATE_OVERLAY_DIRECT;
    }

    /// Ask the notification pass to detach this component from its parent.
    pub fn request_detach(&mut self) {
        self.requested_detach = true;
    }

    /// Tell the parent a desired dimension changed, so child layout reruns
    /// before the next draw or mouse event.
    pub fn mark_child_changed(&mut self) {
        self.child_changed = true;
    }

    fn core_attribute(&self, name: &str) -> Option<AttributeValue> {
        if name.eq_ignore_ascii_case("Name") {
            Some(AttributeValue::Text(self.name.clone()))
        } else if name.eq_ignore_ascii_case("Index") {
            Some(AttributeValue::Integer(self.index))
        } else if name.eq_ignore_ascii_case("Visible") {
            Some(AttributeValue::Boolean(self.visible))
        } else if name.eq_ignore_ascii_case("Left") {
            Some(AttributeValue::Dimension(self.region.left))
        } else if name.eq_ignore_ascii_case("Top") {
            Some(AttributeValue::Dimension(self.region.top))
        } else if name.eq_ignore_ascii_case("Right") {
            Some(AttributeValue::Dimension(self.region.right))
        } else if name.eq_ignore_ascii_case("Bottom") {
            Some(AttributeValue::Dimension(self.region.bottom))
        } else {
            None
        }
    }

    fn set_core_attribute(&mut self, name: &str, value: &AttributeValue) -> bool {
        if name.eq_ignore_ascii_case("Name") {
            if let Some(text) = value.as_text() {
                self.name = text.into();
                return true;
            }
        } else if name.eq_ignore_ascii_case("Index") {
            if let Some(index) = value.as_integer() {
                self.index = index;
                return true;
            }
        } else if name.eq_ignore_ascii_case("Visible") {
            if let Some(visible) = value.as_boolean() {
                self.visible = visible;
                return true;
            }
        } else if let Some(dimension) = value.to_dimension() {
            let edge = if name.eq_ignore_ascii_case("Left") {
                Some(&mut self.region.left)
            } else if name.eq_ignore_ascii_case("Top") {
                Some(&mut self.region.top)
            } else if name.eq_ignore_ascii_case("Right") {
                Some(&mut self.region.right)
            } else if name.eq_ignore_ascii_case("Bottom") {
                Some(&mut self.region.bottom)
            } else {
                None
            };
            if let Some(edge) = edge {
                *edge = dimension;
                self.region_accessed = true;
                return true;
            }
        }
        false
    }
}

pub const CORE_ATTRIBUTE_NAMES: &[&str] = &["Name", "Index", "Visible", "Left", "Top", "Right", "Bottom"];

/// The polymorphic component surface. Everything has a default so leaf
/// classes only override what they change.
pub trait Component: Any {
    fn core(&self) -> &ComponentCore;
    fn core_mut(&mut self) -> &mut ComponentCore;
    fn class_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Containers accept child components.
    fn is_container(&self) -> bool {
        true
    }

    /// Returning true suppresses the framework's generic child recursion
    /// for drawing and mouse dispatch; the component forwards itself.
    fn manages_children(&self) -> bool {
        false
    }

    /// Minimum useful size, queried by auto-stacking parents.
    fn desired_dimensions(&mut self) -> IVector2 {
        IVector2::new(32, 32)
    }

    /// True when `point` (in parent coordinates) hits this component. Most
    /// components are solid rectangles. Visibility is the caller's check.
    fn point_is_inside(&self, point: IVector2) -> bool {
        let location = self.core().location;
        point.x > location.left() && point.x < location.right() && point.y > location.top() && point.y < location.bottom()
    }

    /// True when `point` (in parent coordinates) hits this component's
    /// overlay. Whether an overlay is showing is the caller's check.
    fn point_is_inside_of_overlay(&self, _point: IVector2) -> bool {
        false
    }

    /// Draw the component into `target` at `relative_location`, clipping
    /// silently at the image edge. The default marks unknown classes with a
    /// red placeholder rectangle.
    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        draw_rectangle(target, relative_location, Color::opaque(200, 50, 50));
    }

    /// Draw the overlay. `absolute_offset` is the canvas position of the
    /// component's parent-space origin, so overlays escape all clipping.
    fn draw_overlay(&mut self, _target: &ImageRgba, _absolute_offset: IVector2) {}

    /// Store the offered space and recompute the location. Stacking parents
    /// override this to place children themselves.
    fn apply_layout(&mut self, given_space: IRect) {
        self.core_mut().given_space = given_space;
        let old_location = self.core().location;
        let new_location = self.core().region.resolve(given_space);
        self.core_mut().location = new_location;
        if old_location != new_location {
            self.update_location_event(old_location, new_location);
        }
        self.changed_location(old_location, new_location);
    }

    /// Called after the component moved or resized; the default hands each
    /// child the new content space.
    fn update_location_event(&mut self, _old_location: IRect, new_location: IRect) {
        let children = self.core().children.clone();
        let space = IRect::new(0, 0, new_location.width(), new_location.height());
        for child in children {
            child.borrow_mut().apply_layout(space);
        }
    }

    /// Notification hooks.
    fn changed_location(&mut self, _old_location: IRect, _new_location: IRect) {}
    fn changed_theme(&mut self, _theme: &Theme) {}
    fn changed_attribute(&mut self, _name: &str) {}
    fn update_state_event(&mut self, _old_state: ComponentState, _new_state: ComponentState) {}

    /// Receive a mouse event that hit this component, with the position in
    /// parent coordinates. The default dispatches to the callback slots.
    fn receive_mouse_event(&mut self, event: &MouseEvent) {
        dispatch_mouse_callbacks(self.core_mut(), event);
    }

    /// Receive a keyboard event along the focus trail.
    fn receive_keyboard_event(&mut self, event: &KeyboardEvent) {
        let core = self.core_mut();
        let callback = match event.event_type {
            KeyboardEventType::KeyDown => &mut core.on_key_down,
            KeyboardEventType::KeyUp => &mut core.on_key_up,
            KeyboardEventType::KeyType => &mut core.on_key_type,
        };
        if let Some(callback) = callback {
            callback(event);
        }
    }

    /// Class-specific attributes; the shared ones live on the core.
    fn class_attribute(&self, _name: &str) -> Option<AttributeValue> {
        None
    }
    fn set_class_attribute(&mut self, _name: &str, _value: &AttributeValue) -> bool {
        false
    }
    fn class_attribute_names(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Route a mouse event to the matching callback slot. Shared by the
/// default `receive_mouse_event` and by components that override it but
/// still honor the application callbacks.
pub fn dispatch_mouse_callbacks(core: &mut ComponentCore, event: &MouseEvent) {
    let callback = match event.event_type {
        MouseEventType::MouseDown => &mut core.on_mouse_down,
        MouseEventType::MouseUp => &mut core.on_mouse_up,
        MouseEventType::MouseMove => &mut core.on_mouse_move,
        MouseEventType::Scroll => &mut core.on_mouse_scroll,
    };
    if let Some(callback) = callback {
        callback(event);
    }
}

/// Resolve a typed attribute by name, shared core attributes first.
pub fn get_attribute(component: &dyn Component, name: &str) -> Option<AttributeValue> {
    component.core().core_attribute(name).or_else(|| component.class_attribute(name))
}

/// Assign a typed attribute by name. Returns false for unknown names or
/// mismatched kinds; successful assignments fire `changed_attribute`.
pub fn set_attribute(component: &mut dyn Component, name: &str, value: &AttributeValue) -> bool {
    let assigned =
        component.core_mut().set_core_attribute(name, value) || component.set_class_attribute(name, value);
    if assigned {
        component.changed_attribute(name);
    }
    assigned
}

/// All attribute names the component advertises for persistence.
pub fn attribute_names(component: &dyn Component) -> Vec<&'static str> {
    let mut names = CORE_ATTRIBUTE_NAMES.to_vec();
    names.extend_from_slice(component.class_attribute_names());
    names
}

/// Wrap a freshly constructed component into a shared handle, wiring its
/// self reference.
pub fn into_handle<T: Component>(component: T) -> ComponentRc {
    let handle: ComponentRc = Rc::new(RefCell::new(component));
    let weak = Rc::downgrade(&handle);
    handle.borrow_mut().core_mut().self_weak = weak;
    handle
}

/// Recompute the location from the flex region, firing the location events
/// on change. Works on the borrowed component so overrides can call it.
pub fn set_location_of(component: &mut dyn Component, new_location: IRect) {
    let old_location = component.core().location;
    component.core_mut().location = new_location;
    if old_location != new_location {
        component.update_location_event(old_location, new_location);
    }
    component.changed_location(old_location, new_location);
}

fn is_root(handle: &ComponentRc) -> bool {
    handle.borrow().core().parent.upgrade().is_none()
}

/// Walk to the root of the tree containing `handle`.
pub fn root_of(handle: &ComponentRc) -> ComponentRc {
    let mut current = handle.clone();
    loop {
        let parent = current.borrow().core().parent.upgrade();
        match parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

/// Attach `child` to `parent`. The child is laid out with the parent's
/// content size and detached from any previous parent first.
pub fn add_child(parent: &ComponentRc, child: &ComponentRc) {
    if !parent.borrow().is_container() {
        log::warn!("cannot attach a child to the non-container {:?}", parent.borrow().class_name());
        return;
    }
    if Rc::ptr_eq(parent, child) || has_child(child, parent) {
        log::warn!("cannot attach a component to itself or its own ancestor");
        return;
    }
    detach_from_parent(child);
    let content = {
        let location = parent.borrow().core().location;
        IRect::new(0, 0, location.width(), location.height())
    };
    child.borrow_mut().apply_layout(content);
    {
        let mut parent_mut = parent.borrow_mut();
        parent_mut.core_mut().children.push(child.clone());
        parent_mut.core_mut().child_changed = true;
    }
    child.borrow_mut().core_mut().parent = Rc::downgrade(parent);
}

/// True iff `child` is a member of `component`, searched recursively.
pub fn has_child(component: &ComponentRc, child: &ComponentRc) -> bool {
    let children = component.borrow().core().children.clone();
    for current in children {
        if Rc::ptr_eq(&current, child) || has_child(&current, child) {
            return true;
        }
    }
    false
}

/// Disconnect a component from its parent, clearing its back reference.
pub fn detach_from_parent(component: &ComponentRc) {
    let Some(parent) = component.borrow().core().parent.upgrade() else {
        return;
    };
    {
        let mut parent_mut = parent.borrow_mut();
        let core = parent_mut.core_mut();
        core.children.retain(|child| !Rc::ptr_eq(child, component));
        core.child_changed = true;
    }
    component.borrow_mut().core_mut().parent = empty_weak();
    update_indirect_states(&root_of(&parent));
    // An ongoing drag still holds a strong handle, so the component can
    // receive its mouse up before the reference count releases it.
}

/// Depth-first search for the first child with a matching name.
pub fn find_child_by_name(component: &ComponentRc, name: &str) -> Option<ComponentRc> {
    let children = component.borrow().core().children.clone();
    for child in children {
        if child.borrow().core().name == name {
            return Some(child);
        }
        if let Some(found) = find_child_by_name(&child, name) {
            return Some(found);
        }
    }
    None
}

/// Depth-first search matching both name and index.
pub fn find_child_by_name_and_index(component: &ComponentRc, name: &str, index: i64) -> Option<ComponentRc> {
    let children = component.borrow().core().children.clone();
    for child in children {
        {
            let borrowed = child.borrow();
            if borrowed.core().name == name && borrowed.core().index == index {
                return Some(child.clone());
            }
        }
        if let Some(found) = find_child_by_name_and_index(&child, name, index) {
            return Some(found);
        }
    }
    None
}

/// Assign a theme to a whole subtree, firing `changed_theme` on the way.
pub fn apply_theme(handle: &ComponentRc, theme: &Theme) {
    {
        let mut component = handle.borrow_mut();
        component.core_mut().theme = theme.clone();
        component.changed_theme(theme);
    }
    let children = handle.borrow().core().children.clone();
    for child in children {
        apply_theme(&child, theme);
    }
}

/// Bottom-up sweep restoring the invariant that an indirect bit is set iff
/// a descendant carries the direct bit.
pub fn update_indirect_states(handle: &ComponentRc) {
    let children = handle.borrow().core().children.clone();
    let mut child_states: ComponentState = 0;
    for child in children.iter().rev() {
        update_indirect_states(child);
        child_states |= child.borrow().core().current_state;
    }
    let expected_indirect =
        ((child_states & STATE_DIRECT_MASK) << 1) | (child_states & STATE_INDIRECT_MASK);
    let mut component = handle.borrow_mut();
    let core = component.core_mut();
    core.current_state = (core.current_state & STATE_DIRECT_MASK) | expected_indirect;
}

/// Clear state bits over a whole subtree.
pub fn apply_state_and_mask(handle: &ComponentRc, keep_mask: ComponentState) {
    handle.borrow_mut().core_mut().current_state &= keep_mask;
    let children = handle.borrow().core().children.clone();
    for child in children {
        apply_state_and_mask(&child, keep_mask);
    }
}

/// Set direct state bits on one component. With `unique`, the same bits are
/// cleared everywhere else first. The indirect sweep runs afterwards.
pub fn add_state_bits(handle: &ComponentRc, direct_states: ComponentState, unique: bool) {
    let root = root_of(handle);
    if unique {
        apply_state_and_mask(&root, !direct_states);
    }
    handle.borrow_mut().core_mut().current_state |= direct_states;
    update_indirect_states(&root);
}

pub fn remove_state_bits(handle: &ComponentRc, direct_states: ComponentState) {
    let root = root_of(handle);
    handle.borrow_mut().core_mut().current_state &= !direct_states;
    update_indirect_states(&root);
}

/// Focus this component: the previous focus trail is cleared and a new one
/// grows from the root through the indirect bits.
pub fn make_focused(handle: &ComponentRc) {
    add_state_bits(handle, STATE_FOCUS_DIRECT, true);
}

/// Directly hovered; ancestors get the indirect bit through the sweep.
pub fn hover(handle: &ComponentRc) {
    add_state_bits(handle, STATE_HOVER_DIRECT, true);
}

pub fn show_overlay(handle: &ComponentRc) {
    add_state_bits(handle, STATE_OVERLAY_DIRECT, false);
}

pub fn hide_overlay(handle: &ComponentRc) {
    remove_state_bits(handle, STATE_OVERLAY_DIRECT);
}

/// True iff this component is the tail of the focus trail: it carries the
/// direct bit and no descendant holds any focus bit.
pub fn is_focused(handle: &ComponentRc) -> bool {
    let component = handle.borrow();
    if component.core().current_state & STATE_FOCUS_DIRECT == 0 {
        return false;
    }
    component
        .core()
        .children
        .iter()
        .all(|child| child.borrow().core().current_state & STATE_FOCUS == 0)
}

/// Recompute the location lazily when the region was edited since the last
/// layout.
pub fn get_location(handle: &ComponentRc) -> IRect {
    let needs_update = handle.borrow().core().region_accessed;
    if needs_update {
        let mut component = handle.borrow_mut();
        component.core_mut().region_accessed = false;
        let given_space = component.core().given_space;
        let new_location = component.core().region.resolve(given_space);
        set_location_of(&mut *component, new_location);
    }
    handle.borrow().core().location
}

/// Rerun child placement when a child reported a desired-dimension change.
pub fn update_child_locations(handle: &ComponentRc) {
    let changed = handle.borrow().core().child_changed;
    if changed {
        let mut component = handle.borrow_mut();
        component.core_mut().child_changed = false;
        let location = component.core().location;
        component.update_location_event(location, location);
    }
}

/// Flush deferred work: focus/overlay sweeps, requested detaches, and one
/// `update_state_event` per component whose state changed since the last
/// flush. Runs once per input event and at the start of the root draw.
pub fn send_notifications(handle: &ComponentRc) {
    update_indirect_states(handle);
    send_notifications_recursive(handle);
}

fn send_notifications_recursive(handle: &ComponentRc) {
    // Backwards over a snapshot, so detaching is safe mid-loop.
    let children = handle.borrow().core().children.clone();
    for child in children.iter().rev() {
        let detach = child.borrow().core().requested_detach;
        if detach {
            child.borrow_mut().core_mut().requested_detach = false;
            detach_from_parent(child);
        } else {
            send_notifications_recursive(child);
        }
    }
    let states = {
        let core_ref = handle.borrow();
        (core_ref.core().previous_state, core_ref.core().current_state)
    };
    if states.0 != states.1 {
        let mut component = handle.borrow_mut();
        component.update_state_event(states.0, states.1);
        let settled = component.core().current_state;
        component.core_mut().previous_state = settled;
    }
}

/// Topmost showing overlay under `point`, searching children above their
/// parents in reverse draw order. `point` is relative to the component's
/// upper left corner.
fn topmost_overlay(handle: &ComponentRc, point: IVector2) -> Option<ComponentRc> {
    if !handle.borrow().core().visible {
        return None;
    }
    let children = handle.borrow().core().children.clone();
    for child in children.iter().rev() {
        let child_corner = child.borrow().core().location.upper_left();
        if let Some(found) = topmost_overlay(child, point - child_corner) {
            return Some(found);
        }
    }
    let component = handle.borrow();
    if component.core().showing_overlay()
        && component.point_is_inside_of_overlay(point + component.core().location.upper_left())
    {
        drop(component);
        Some(handle.clone())
    } else {
        None
    }
}

/// Sum of upper-left corners from `child` up to but excluding `ancestor`.
fn total_offset(child: &ComponentRc, ancestor: &ComponentRc) -> IVector2 {
    let mut offset = IVector2::default();
    let mut current = child.clone();
    loop {
        if Rc::ptr_eq(&current, ancestor) {
            return offset;
        }
        offset = offset + current.borrow().core().location.upper_left();
        let parent = current.borrow().core().parent.upgrade();
        match parent {
            Some(parent) => current = parent,
            None => return offset,
        }
    }
}

/// Topmost visible direct child containing `point` (in this component's
/// content coordinates, which equal the children's parent coordinates).
pub fn get_direct_child(handle: &ComponentRc, point: IVector2) -> Option<ComponentRc> {
    let children = handle.borrow().core().children.clone();
    for child in children.iter().rev() {
        let hit = {
            let borrowed = child.borrow();
            borrowed.core().visible && borrowed.point_is_inside(point)
        };
        if hit {
            return Some(child.clone());
        }
    }
    None
}

/// Route a mouse event into the tree. `event.position` is relative to the
/// receiving component's upper left corner.
///
/// A `MouseDown` that lands on a child focuses and captures it: every
/// later `MouseMove` and the matching `MouseUp` go to the same component
/// even when the point leaves its bounds. Overlays hit-test before regular
/// children at the root. `recursive` suppresses the root-only bookkeeping
/// when a component re-dispatches from inside its own handler.
pub fn send_mouse_event(handle: &ComponentRc, event: &MouseEvent, recursive: bool) {
    let at_root = is_root(handle);
    if at_root && !recursive {
        // Hover is recomputed from scratch on every event.
        apply_state_and_mask(handle, !STATE_HOVER);
        update_child_locations(handle);
    }
    // Find the component to interact with.
    let drag = handle.borrow().core().drag_component.clone();
    let mut child: Option<ComponentRc> = None;
    if event.event_type == MouseEventType::MouseDown || drag.is_none() {
        if at_root {
            child = topmost_overlay(handle, event.position);
        }
        if child.is_none() && !handle.borrow().manages_children() {
            child = get_direct_child(handle, event.position);
        }
    } else {
        child = drag;
    }
    // Grab on mouse down, so move and up events stay with the component.
    if event.event_type == MouseEventType::MouseDown {
        if let Some(grabbed) = &child {
            make_focused(grabbed);
            let mut component = handle.borrow_mut();
            component.core_mut().drag_component = Some(grabbed.clone());
            component.core_mut().hold_count += 1;
        }
    }
    match child {
        Some(child) => {
            // Localize through one or more levels of ownership; a captured
            // overlay member may sit several levels down.
            let offset = total_offset(&child, handle);
            let local_event = event.translated(-offset);
            send_mouse_event(&child, &local_event, false);
        }
        None => {
            // No child found: this component takes the event itself.
            let parent_event = event.translated(handle.borrow().core().location.upper_left());
            hover(handle);
            handle.borrow_mut().receive_mouse_event(&parent_event);
        }
    }
    if event.event_type == MouseEventType::MouseUp {
        let mut component = handle.borrow_mut();
        let core = component.core_mut();
        core.hold_count -= 1;
        if core.hold_count <= 0 {
            core.drag_component = None;
            // Extra up events can happen when the tree was built with a
            // button already held.
            core.hold_count = 0;
        }
    }
    if at_root && !recursive {
        send_notifications(handle);
    }
}

/// Route a keyboard event along the focus trail: components with the
/// direct bit receive it, subtrees with the indirect bit recurse.
pub fn send_keyboard_event(handle: &ComponentRc, event: &KeyboardEvent) {
    let children = handle.borrow().core().children.clone();
    for child in children {
        let state = child.borrow().core().current_state;
        if state & STATE_FOCUS != 0 {
            if state & STATE_FOCUS_DIRECT != 0 {
                child.borrow_mut().receive_keyboard_event(event);
            } else {
                send_keyboard_event(&child, event);
            }
        }
    }
    if is_root(handle) {
        send_notifications(handle);
    }
}

/// Draw a component subtree into `target`. `offset` is the upper left
/// corner of the parent container relative to the image.
pub fn draw(handle: &ComponentRc, target: &ImageRgba, offset: IVector2) {
    let at_root = is_root(handle);
    if at_root {
        // State changes land before anything uses them for rendering.
        send_notifications(handle);
    }
    if !handle.borrow().core().visible {
        return;
    }
    update_child_locations(handle);
    let container_bound = get_location(handle) + offset;
    handle.borrow_mut().draw_self(target, container_bound);
    let forwards_children = !handle.borrow().manages_children();
    if forwards_children {
        let children = handle.borrow().core().children.clone();
        for child in children {
            draw_clipped(&child, target, container_bound.upper_left(), container_bound);
        }
    }
    if at_root {
        let corner = handle.borrow().core().location.upper_left();
        draw_overlays(handle, target, corner);
    }
}

/// Draw while skipping pixels outside `clip_region`. Multiple calls with
/// disjoint clip regions compose to one unclipped draw.
pub fn draw_clipped(handle: &ComponentRc, target: &ImageRgba, offset: IVector2, clip_region: IRect) {
    let final_region = IRect::cut(clip_region, target.bound());
    if final_region.has_area() {
        if let Ok(clipped) = target.sub_image(final_region) {
            draw(handle, &clipped, offset - final_region.upper_left());
        }
    }
}

/// Second root pass painting overlays in absolute canvas coordinates,
/// children above their parents so nested menus stack correctly.
fn draw_overlays(handle: &ComponentRc, target: &ImageRgba, offset: IVector2) {
    let component = handle.borrow();
    // Invisible components may not show overlays; the framework owns the
    // visibility rule so individual components cannot forget it.
    if !component.core().visible || !component.core().owns_overlay() {
        return;
    }
    drop(component);
    let showing = handle.borrow().core().showing_overlay();
    if showing {
        let corner = handle.borrow().core().location.upper_left();
        handle.borrow_mut().draw_overlay(target, offset - corner);
    }
    let children = handle.borrow().core().children.clone();
    for child in children {
        let corner = child.borrow().core().location.upper_left();
        draw_overlays(&child, target, offset + corner);
    }
}
