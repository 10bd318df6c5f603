//! The built-in component classes.

mod button;
mod label;
mod listbox;
mod menu;
mod panel;
mod picture;
pub(crate) mod scroll;
mod textbox;
mod toolbar;

pub use button::Button;
pub use label::Label;
pub use listbox::ListBox;
pub use menu::Menu;
pub use panel::Panel;
pub use picture::Picture;
pub use scroll::VerticalScrollBar;
pub use textbox::TextBox;
pub use toolbar::Toolbar;
