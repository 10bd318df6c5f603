//! Layout text format: indented class-name headers with attribute lines.
//!
//! ```text
//! Panel
//!   Name = "main"
//!   Color = 190,190,190
//!   Button
//!     Name = "ok"
//!     Left = 50%-40
//!     Text = "OK"
//! ```
//!
//! Saving walks each component's advertised attributes, skipping values
//! that still match a freshly constructed instance. Loading builds through
//! the class registry; unknown classes keep their name and attributes as
//! placeholders instead of being dropped. Unknown attributes are kept on
//! placeholders and warned about elsewhere.

use crate::gui::attributes::AttributeValue;
use crate::gui::component::{
    ComponentRc, add_child, attribute_names, get_attribute, set_attribute,
};
use crate::gui::factory::{Placeholder, create_component};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("line {line}: unexpected indentation")]
    BadIndentation { line: usize },
    #[error("line {line}: could not parse the attribute value")]
    BadValue { line: usize },
    #[error("the layout document is empty")]
    Empty,
}

const INDENT: &str = "  ";

fn class_name_for_saving(component: &ComponentRc) -> String {
    let borrowed = component.borrow();
    match borrowed.as_any().downcast_ref::<Placeholder>() {
        Some(placeholder) => placeholder.original_class_name().into(),
        None => borrowed.class_name().into(),
    }
}

fn save_component(component: &ComponentRc, depth: usize, output: &mut String) {
    let pad = INDENT.repeat(depth);
    output.push_str(&pad);
    output.push_str(&class_name_for_saving(component));
    output.push('\n');
    // A pristine sibling tells which attributes still hold default values.
    let pristine = create_component(&class_name_for_saving(component));
    {
        let borrowed = component.borrow();
        for name in attribute_names(&*borrowed) {
            let Some(value) = get_attribute(&*borrowed, name) else {
                continue;
            };
            if get_attribute(&*pristine.borrow(), name).as_ref() == Some(&value) {
                continue;
            }
            output.push_str(&pad);
            output.push_str(INDENT);
            output.push_str(name);
            output.push_str(" = ");
            output.push_str(&value.serialize());
            output.push('\n');
        }
    }
    let children = component.borrow().core().children().to_vec();
    for child in children {
        save_component(&child, depth + 1, output);
    }
}

/// Serialize a component tree into the layout text form.
pub fn save_layout(root: &ComponentRc) -> String {
    let mut output = String::new();
    save_component(root, 0, &mut output);
    output
}

/// Parse a layout document into a component tree.
pub fn load_layout(document: &str) -> Result<ComponentRc, LayoutError> {
    // Stack of (depth, component); attribute lines bind to the topmost.
    let mut stack: Vec<(usize, ComponentRc)> = Vec::new();
    let mut root: Option<ComponentRc> = None;
    for (line_number, raw_line) in document.lines().enumerate() {
        let line_number = line_number + 1;
        if raw_line.trim().is_empty() {
            continue;
        }
        let trimmed = raw_line.trim_start();
        let indent_chars = raw_line.len() - trimmed.len();
        if indent_chars % INDENT.len() != 0 {
            return Err(LayoutError::BadIndentation { line: line_number });
        }
        let depth = indent_chars / INDENT.len();
        let trimmed = trimmed.trim_end();
        if let Some((name, value_text)) = trimmed.split_once('=') {
            // Attribute assignment on the innermost open component.
            let Some((component_depth, component)) = stack.last() else {
                return Err(LayoutError::BadIndentation { line: line_number });
            };
            if depth != component_depth + 1 {
                return Err(LayoutError::BadIndentation { line: line_number });
            }
            let value =
                AttributeValue::parse(value_text.trim()).ok_or(LayoutError::BadValue { line: line_number })?;
            let name = name.trim();
            if !set_attribute(&mut *component.borrow_mut(), name, &value) {
                log::warn!("line {line_number}: attribute {name:?} was not accepted");
            }
        } else {
            // A class header opens a component at its depth.
            while stack.last().is_some_and(|(component_depth, _)| *component_depth >= depth) {
                stack.pop();
            }
            let component = create_component(trimmed);
            match stack.last() {
                Some((parent_depth, parent)) => {
                    if depth != parent_depth + 1 {
                        return Err(LayoutError::BadIndentation { line: line_number });
                    }
                    add_child(parent, &component);
                }
                None => {
                    if root.is_some() {
                        return Err(LayoutError::BadIndentation { line: line_number });
                    }
                    root = Some(component.clone());
                }
            }
            stack.push((depth, component));
        }
    }
    root.ok_or(LayoutError::Empty)
}
