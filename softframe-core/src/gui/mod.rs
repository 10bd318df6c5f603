//! The retained-mode GUI: component tree, input routing, themes, layout
//! persistence and the window driver.

pub mod attributes;
pub mod component;
pub mod components;
pub mod factory;
pub mod flex;
pub mod input;
pub mod persistence;
pub mod theme;
pub mod window;
