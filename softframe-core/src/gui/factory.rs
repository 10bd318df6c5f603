//! The class-name component registry.
//!
//! Layout persistence creates components by class name through this
//! registry. Applications can register their own classes; unknown names
//! construct a placeholder that keeps its class name and attributes, so a
//! layout survives a round trip even when a class is missing (it shows up
//! as the default red rectangle at runtime).

use crate::gui::attributes::AttributeValue;
use crate::gui::component::{Component, ComponentCore, ComponentRc, into_handle};
use crate::gui::components::{Button, Label, ListBox, Menu, Panel, Picture, TextBox, Toolbar};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Mutex;

pub type ComponentConstructor = fn() -> ComponentRc;

lazy_static::lazy_static! {
    static ref REGISTRY: Mutex<HashMap<String, ComponentConstructor>> = {
        let mut classes: HashMap<String, ComponentConstructor> = HashMap::new();
        classes.insert("Panel".into(), || into_handle(Panel::new()));
        classes.insert("Button".into(), || into_handle(Button::new()));
        classes.insert("Label".into(), || into_handle(Label::new()));
        classes.insert("Picture".into(), || into_handle(Picture::new()));
        classes.insert("Toolbar".into(), || into_handle(Toolbar::new()));
        classes.insert("ListBox".into(), || into_handle(ListBox::new()));
        classes.insert("TextBox".into(), || into_handle(TextBox::new()));
        classes.insert("Menu".into(), || into_handle(Menu::new()));
        Mutex::new(classes)
    };
}

/// Register an application-defined class. Later registrations of the same
/// name win, which also allows replacing a built-in.
pub fn register_class(class_name: &str, constructor: ComponentConstructor) {
    REGISTRY.lock().unwrap().insert(class_name.into(), constructor);
}

/// Construct a component by class name. Unknown classes produce a
/// placeholder preserving the requested name.
pub fn create_component(class_name: &str) -> ComponentRc {
    if let Some(constructor) = REGISTRY.lock().unwrap().get(class_name) {
        return constructor();
    }
    log::warn!("unknown component class {class_name:?}, keeping a placeholder");
    into_handle(Placeholder::new(class_name))
}

pub fn is_registered(class_name: &str) -> bool {
    REGISTRY.lock().unwrap().contains_key(class_name)
}

/// Stand-in for a class the registry does not know. It keeps the original
/// class name and every attribute assigned to it, so saving the layout
/// reproduces the input, and draws as the default red rectangle.
pub struct Placeholder {
    core: ComponentCore,
    class_name: String,
    attributes: Vec<(String, AttributeValue)>,
}

impl Placeholder {
    fn new(class_name: &str) -> Placeholder {
        Placeholder { core: ComponentCore::new(), class_name: class_name.into(), attributes: Vec::new() }
    }

    pub fn original_class_name(&self) -> &str {
        &self.class_name
    }

    pub fn kept_attributes(&self) -> &[(String, AttributeValue)] {
        &self.attributes
    }
}

impl Component for Placeholder {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        // The dynamic name is exposed through `original_class_name`;
        // persistence special-cases placeholders.
        "Placeholder"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn class_attribute(&self, name: &str) -> Option<AttributeValue> {
        self.attributes
            .iter()
            .find(|(kept, _)| kept.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    fn set_class_attribute(&mut self, name: &str, value: &AttributeValue) -> bool {
        if let Some(entry) = self.attributes.iter_mut().find(|(kept, _)| kept.eq_ignore_ascii_case(name)) {
            entry.1 = value.clone();
        } else {
            self.attributes.push((name.into(), value.clone()));
        }
        true
    }
}
