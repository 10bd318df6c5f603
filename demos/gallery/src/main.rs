//! Headless GUI gallery: builds a themed widget tree, routes a scripted
//! mouse session through it, and saves the rendered frames as PNG files.
//!
//! Run with `cargo run -p gallery [output-directory]`.

use anyhow::{Context, Result};
use softframe_core::base::geometry::IVector2;
use softframe_core::codec;
use softframe_core::gui::component::{add_child, into_handle};
use softframe_core::gui::components::{Button, Label, ListBox, Menu, TextBox, Toolbar};
use softframe_core::gui::flex::FlexRegion;
use softframe_core::gui::input::MouseEvent;
use softframe_core::gui::theme::Theme;
use softframe_core::gui::window::{HeadlessBackend, Window};
use std::path::PathBuf;

const LAYOUT: &str = "\
Panel
  Name = \"main\"
  Color = 210,210,215
";

fn build_gui(window: &mut Window) -> Result<()> {
    window.load_layout(LAYOUT).context("loading the base layout")?;
    let root = window.root();

    let toolbar = into_handle(Toolbar::new());
    toolbar.borrow_mut().core_mut().set_region(FlexRegion::pixels(0, 0, 320, 28));
    add_child(&root, &toolbar);
    let file_menu = into_handle(Menu::with_text("File"));
    add_child(&toolbar, &file_menu);
    let open_item = into_handle(Button::with_text("Open"));
    add_child(&file_menu, &open_item);
    let save_item = into_handle(Button::with_text("Save"));
    add_child(&file_menu, &save_item);

    let greeting = into_handle(Label::with_text("softframe widget gallery"));
    greeting.borrow_mut().core_mut().set_region(FlexRegion::pixels(10, 36, 300, 56));
    add_child(&root, &greeting);

    let press_me = into_handle(Button::with_text("Press me"));
    press_me.borrow_mut().core_mut().set_region(FlexRegion::pixels(10, 64, 110, 92));
    press_me.borrow_mut().core_mut().on_pressed = Some(Box::new(|| {
        log::info!("the button was pressed");
    }));
    add_child(&root, &press_me);

    let list = into_handle(ListBox::new());
    list.borrow_mut().core_mut().set_region(FlexRegion::pixels(10, 100, 150, 190));
    {
        let mut list_mut = list.borrow_mut();
        let listbox = list_mut.as_any_mut().downcast_mut::<ListBox>().expect("a list box");
        for name in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"] {
            listbox.push_item(name);
        }
    }
    add_child(&root, &list);

    let editor = into_handle(TextBox::new());
    editor.borrow_mut().core_mut().set_region(FlexRegion::pixels(160, 100, 310, 190));
    {
        let mut editor_mut = editor.borrow_mut();
        let textbox = editor_mut.as_any_mut().downcast_mut::<TextBox>().expect("a text box");
        textbox.set_text("edit me");
    }
    add_child(&root, &editor);
    Ok(())
}

fn main() -> Result<()> {
    let output_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let mut window = Window::new(Box::new(HeadlessBackend::new(640, 400)));
    window.set_title("softframe gallery");
    window.set_pixel_scale(2);
    build_gui(&mut window)?;
    window.set_theme(&Theme::built_in());

    // Frame 1: the idle gallery.
    window.draw_components();
    window.show_canvas();
    codec::save(&window.canvas().duplicate(), &output_dir.join("gallery_idle.png"), 100)
        .context("saving the idle frame")?;

    // Frame 2: a scripted session holding the button and opening the menu.
    window.send_mouse_event(&MouseEvent::down(IVector2::new(80, 150)));
    window.draw_components();
    window.show_canvas();
    codec::save(&window.canvas().duplicate(), &output_dir.join("gallery_pressed.png"), 100)
        .context("saving the pressed frame")?;
    window.send_mouse_event(&MouseEvent::up(IVector2::new(80, 150)));

    window.send_mouse_event(&MouseEvent::down(IVector2::new(20, 20)));
    window.send_mouse_event(&MouseEvent::up(IVector2::new(20, 20)));
    window.draw_components();
    window.show_canvas();
    codec::save(&window.canvas().duplicate(), &output_dir.join("gallery_menu.png"), 100)
        .context("saving the menu frame")?;

    // The saved layout shows the persistence format for the whole tree.
    println!("{}", window.save_layout());
    println!("frames written to {}", output_dir.display());
    Ok(())
}
