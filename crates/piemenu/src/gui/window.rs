use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use piemenu_core::Point;

/// Pointer position in window coordinates. `None` until the window has a surface.
pub fn pointer_position(window: &gtk::ApplicationWindow) -> Option<Point> {
    let surface = window.surface()?;
    let pointer = gdk::Display::default()?.default_seat()?.pointer()?;
    let (x, y, _) = surface.device_position(&pointer)?;
    Some(Point::new(x, y))
}

/// Full-screen transparent overlay; the pie is drawn at pointer coordinates inside it.
pub fn init_layer_shell(window: &gtk::ApplicationWindow) {
    window.init_layer_shell();
    window.set_layer(Layer::Overlay);
    window.set_namespace(Some("piemenu"));
    window.set_exclusive_zone(-1);
    [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom]
        .into_iter()
        .for_each(|edge| window.set_anchor(edge, true));
    set_input_capture(window, false);
}

/// Keyboard goes to the overlay only while a gesture runs.
pub fn set_input_capture(window: &gtk::ApplicationWindow, captured: bool) {
    window.set_keyboard_mode(if captured {
        KeyboardMode::Exclusive
    } else {
        KeyboardMode::None
    });
}
