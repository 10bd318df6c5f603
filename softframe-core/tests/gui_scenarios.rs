//! GUI routing scenarios: capture, focus, hover, overlays, notifications.

use softframe_core::base::geometry::{IRect, IVector2};
use softframe_core::gui::component::{
    self, Component, ComponentCore, ComponentState, STATE_DIRECT_MASK, STATE_FOCUS,
    STATE_FOCUS_DIRECT, STATE_HOVER, STATE_HOVER_DIRECT, add_child, detach_from_parent,
    find_child_by_name, find_child_by_name_and_index, has_child, into_handle, is_focused,
    make_focused, send_mouse_event, set_attribute, update_indirect_states,
};
use softframe_core::gui::components::{Button, Menu, Panel};
use softframe_core::gui::flex::FlexRegion;
use softframe_core::gui::input::{MouseEvent, MouseEventType, MouseKey};
use softframe_core::image::ImageRgba;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

type EventLog = Rc<RefCell<Vec<String>>>;

fn log_callbacks(core: &mut ComponentCore, log: &EventLog, name: &'static str) {
    let sink = log.clone();
    core.on_mouse_down = Some(Box::new(move |_| sink.borrow_mut().push(format!("{name}:down"))));
    let sink = log.clone();
    core.on_mouse_up = Some(Box::new(move |_| sink.borrow_mut().push(format!("{name}:up"))));
    let sink = log.clone();
    core.on_mouse_move = Some(Box::new(move |_| sink.borrow_mut().push(format!("{name}:move"))));
}

fn rooted_panel(width: i32, height: i32) -> softframe_core::gui::component::ComponentRc {
    let root = into_handle(Panel::new());
    root.borrow_mut().apply_layout(IRect::new(0, 0, width, height));
    root
}

#[test]
fn mouse_capture_keeps_the_button_grabbed_outside_its_bounds() {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let root = rooted_panel(200, 200);
    let button = into_handle(Button::with_text("target"));
    button.borrow_mut().core_mut().set_region(FlexRegion::pixels(10, 10, 30, 30));
    add_child(&root, &button);
    let bystander = into_handle(Button::with_text("bystander"));
    bystander.borrow_mut().core_mut().set_region(FlexRegion::pixels(90, 90, 130, 130));
    add_child(&root, &bystander);
    log_callbacks(button.borrow_mut().core_mut(), &log, "button");
    log_callbacks(bystander.borrow_mut().core_mut(), &log, "bystander");

    send_mouse_event(&root, &MouseEvent::down(IVector2::new(15, 15)), false);
    // The pressed-state imagery applies while held.
    assert!(button.borrow().as_any().downcast_ref::<Button>().unwrap().is_pressed());
    send_mouse_event(&root, &MouseEvent::moved(IVector2::new(100, 100)), false);
    send_mouse_event(&root, &MouseEvent::moved(IVector2::new(-5, -5)), false);
    send_mouse_event(&root, &MouseEvent::moved(IVector2::new(20, 20)), false);
    send_mouse_event(&root, &MouseEvent::up(IVector2::new(100, 100)), false);

    // Every move and the up went to the captured button, nothing to the
    // bystander under the pointer.
    assert_eq!(
        log.borrow().as_slice(),
        ["button:down", "button:move", "button:move", "button:move", "button:up"]
    );
    // The press visual reverts on release.
    assert!(!button.borrow().as_any().downcast_ref::<Button>().unwrap().is_pressed());
    // And the capture was released.
    assert_eq!(root.borrow().core().hold_count(), 0);
}

#[test]
fn mouse_down_focuses_the_hit_component() {
    let root = rooted_panel(100, 100);
    let first = into_handle(Button::with_text("first"));
    first.borrow_mut().core_mut().set_region(FlexRegion::pixels(0, 0, 40, 40));
    add_child(&root, &first);
    let second = into_handle(Button::with_text("second"));
    second.borrow_mut().core_mut().set_region(FlexRegion::pixels(50, 50, 90, 90));
    add_child(&root, &second);

    send_mouse_event(&root, &MouseEvent::down(IVector2::new(10, 10)), false);
    send_mouse_event(&root, &MouseEvent::up(IVector2::new(10, 10)), false);
    assert!(is_focused(&first));
    assert!(!is_focused(&second));
    // The root carries the indirect bit as part of the focus trail.
    assert_ne!(root.borrow().core().state() & STATE_FOCUS, 0);

    send_mouse_event(&root, &MouseEvent::down(IVector2::new(60, 60)), false);
    send_mouse_event(&root, &MouseEvent::up(IVector2::new(60, 60)), false);
    assert!(!is_focused(&first));
    assert!(is_focused(&second));
}

#[test]
fn hover_is_recomputed_per_event() {
    let root = rooted_panel(100, 100);
    let button = into_handle(Button::with_text("hover me"));
    button.borrow_mut().core_mut().set_region(FlexRegion::pixels(0, 0, 40, 40));
    add_child(&root, &button);

    send_mouse_event(&root, &MouseEvent::moved(IVector2::new(10, 10)), false);
    assert_ne!(button.borrow().core().state() & STATE_HOVER_DIRECT, 0);
    assert_ne!(root.borrow().core().state() & STATE_HOVER, 0);

    send_mouse_event(&root, &MouseEvent::moved(IVector2::new(80, 80)), false);
    assert_eq!(button.borrow().core().state() & STATE_HOVER, 0);
    // The miss landed on the root itself.
    assert_ne!(root.borrow().core().state() & STATE_HOVER_DIRECT, 0);
}

/// A component counting its state notifications.
struct Recorder {
    core: ComponentCore,
    notifications: Rc<RefCell<Vec<(ComponentState, ComponentState)>>>,
}

impl Component for Recorder {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Recorder"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn update_state_event(&mut self, old_state: ComponentState, new_state: ComponentState) {
        self.notifications.borrow_mut().push((old_state, new_state));
    }
}

#[test]
fn notifications_fire_once_per_event_and_only_on_change() {
    let root = rooted_panel(100, 100);
    let notifications = Rc::new(RefCell::new(Vec::new()));
    let recorder = into_handle(Recorder { core: ComponentCore::new(), notifications: notifications.clone() });
    recorder.borrow_mut().core_mut().set_region(FlexRegion::pixels(0, 0, 50, 50));
    add_child(&root, &recorder);

    // The click produces exactly one notification with focus and hover set.
    send_mouse_event(&root, &MouseEvent::down(IVector2::new(10, 10)), false);
    assert_eq!(notifications.borrow().len(), 1);
    let (old_state, new_state) = notifications.borrow()[0];
    assert_eq!(old_state, 0);
    assert_ne!(new_state & STATE_FOCUS_DIRECT, 0);
    assert_ne!(new_state & STATE_HOVER_DIRECT, 0);

    // An identical follow-up changes nothing, so nothing fires.
    send_mouse_event(&root, &MouseEvent::moved(IVector2::new(10, 10)), false);
    assert_eq!(notifications.borrow().len(), 1);
}

#[test]
fn indirect_bits_match_descendant_direct_bits_after_every_sweep() {
    let root = rooted_panel(100, 100);
    let middle = into_handle(Panel::new());
    add_child(&root, &middle);
    let leaf = into_handle(Button::with_text("leaf"));
    add_child(&middle, &leaf);

    make_focused(&leaf);
    check_indirect_invariant(&root);
    component::hover(&middle);
    check_indirect_invariant(&root);
    component::show_overlay(&leaf);
    update_indirect_states(&root);
    check_indirect_invariant(&root);
    component::hide_overlay(&leaf);
    update_indirect_states(&root);
    check_indirect_invariant(&root);
}

fn check_indirect_invariant(handle: &softframe_core::gui::component::ComponentRc) {
    let children: Vec<_> = handle.borrow().core().children().to_vec();
    let mut descendant_direct = 0;
    for child in &children {
        check_indirect_invariant(child);
        let child_state = child.borrow().core().state();
        descendant_direct |= (child_state & STATE_DIRECT_MASK) << 1;
        descendant_direct |= child_state & !STATE_DIRECT_MASK;
    }
    let state = handle.borrow().core().state();
    assert_eq!(state & !STATE_DIRECT_MASK, descendant_direct, "indirect bits wrong");
}

#[test]
fn deferred_detach_happens_at_the_notification_flush() {
    let root = rooted_panel(100, 100);
    let child = into_handle(Panel::new());
    add_child(&root, &child);
    assert_eq!(root.borrow().core().child_count(), 1);
    child.borrow_mut().core_mut().request_detach();
    // Nothing happens until an event flushes notifications.
    assert_eq!(root.borrow().core().child_count(), 1);
    send_mouse_event(
        &root,
        &MouseEvent::new(MouseEventType::MouseMove, MouseKey::NoKey, IVector2::new(99, 99)),
        false,
    );
    assert_eq!(root.borrow().core().child_count(), 0);
    assert!(child.borrow().core().parent_handle().is_none());
}

#[test]
fn drawing_uses_the_canvas_and_respects_visibility() {
    use softframe_core::gui::attributes::AttributeValue;
    use softframe_core::gui::component::set_attribute;

    let root = rooted_panel(32, 32);
    set_attribute(
        &mut *root.borrow_mut(),
        "Color",
        &AttributeValue::Color(softframe_core::Color::opaque(10, 200, 10)),
    );
    let canvas = ImageRgba::create(32, 32).unwrap();
    component::draw(&root, &canvas, IVector2::default());
    assert_eq!(canvas.read_color_clamp(16, 16), softframe_core::Color::opaque(10, 200, 10));

    // Invisible trees draw nothing.
    let blank = ImageRgba::create(32, 32).unwrap();
    root.borrow_mut().core_mut().set_visible(false);
    component::draw(&root, &blank, IVector2::default());
    assert_eq!(blank.read_color_clamp(16, 16), softframe_core::Color::new(0, 0, 0, 0));
}

#[test]
fn tree_queries_find_members_and_detach_cleanly() {
    use softframe_core::gui::attributes::AttributeValue;

    let root = rooted_panel(100, 100);
    let middle = into_handle(Panel::new());
    add_child(&root, &middle);
    let leaf = into_handle(Button::with_text("leaf"));
    leaf.borrow_mut().core_mut().set_name("target");
    set_attribute(&mut *leaf.borrow_mut(), "Index", &AttributeValue::Integer(3));
    add_child(&middle, &leaf);

    assert!(has_child(&root, &middle));
    assert!(has_child(&root, &leaf));
    assert!(has_child(&middle, &leaf));
    assert!(!has_child(&leaf, &root));
    assert!(Rc::ptr_eq(&find_child_by_name(&root, "target").unwrap(), &leaf));
    assert!(Rc::ptr_eq(&find_child_by_name_and_index(&root, "target", 3).unwrap(), &leaf));
    assert!(find_child_by_name_and_index(&root, "target", 4).is_none());
    assert!(find_child_by_name(&root, "missing").is_none());

    detach_from_parent(&leaf);
    assert!(!has_child(&root, &leaf));
    assert!(leaf.borrow().core().parent_handle().is_none());
    // A detached component can be re-attached elsewhere.
    add_child(&root, &leaf);
    assert!(has_child(&root, &leaf));
    assert!(!has_child(&middle, &leaf));
}

#[test]
fn menu_overlays_capture_clicks_outside_the_menu_bounds() {
    let root = rooted_panel(300, 200);
    let menu = into_handle(Menu::with_text("File"));
    menu.borrow_mut().core_mut().set_region(FlexRegion::pixels(10, 10, 70, 30));
    add_child(&root, &menu);
    let item = into_handle(Button::with_text("Open"));
    let pressed = Rc::new(RefCell::new(0));
    {
        let sink = pressed.clone();
        item.borrow_mut().core_mut().on_pressed = Some(Box::new(move || *sink.borrow_mut() += 1));
    }
    add_child(&menu, &item);
    let other = into_handle(Button::with_text("other"));
    other.borrow_mut().core_mut().set_region(FlexRegion::pixels(200, 100, 260, 130));
    add_child(&root, &other);

    // Clicking the header opens the overlay below it.
    send_mouse_event(&root, &MouseEvent::down(IVector2::new(20, 20)), false);
    send_mouse_event(&root, &MouseEvent::up(IVector2::new(20, 20)), false);
    assert!(menu.borrow().core().showing_overlay());
    // The overlay area sits below the header, outside the menu's location.
    let item_point = IVector2::new(15, 33);
    assert!(menu.borrow().point_is_inside_of_overlay(item_point));

    // Clicking the item row routes through the overlay hit test even though
    // the point is outside the menu's own rectangle; releasing activates it.
    send_mouse_event(&root, &MouseEvent::down(item_point), false);
    send_mouse_event(&root, &MouseEvent::up(item_point), false);
    assert_eq!(*pressed.borrow(), 1);
    assert!(!menu.borrow().core().showing_overlay());

    // Reopen, then focus another component: the menu closes on the flush.
    send_mouse_event(&root, &MouseEvent::down(IVector2::new(20, 20)), false);
    send_mouse_event(&root, &MouseEvent::up(IVector2::new(20, 20)), false);
    assert!(menu.borrow().core().showing_overlay());
    send_mouse_event(&root, &MouseEvent::down(IVector2::new(210, 110)), false);
    send_mouse_event(&root, &MouseEvent::up(IVector2::new(210, 110)), false);
    assert!(!menu.borrow().core().showing_overlay());
    assert!(is_focused(&other));
}
