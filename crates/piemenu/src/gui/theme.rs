use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

/// A named theme color with the value used when the theme lacks it.
struct Swatch {
    name: &'static str,
    fallback: (f64, f64, f64, f64),
    /// Replaces the theme's alpha, so opaque theme colors stay see-through.
    alpha: Option<f64>,
}

impl Swatch {
    const fn new(name: &'static str, fallback: (f64, f64, f64, f64), alpha: Option<f64>) -> Self {
        Self {
            name,
            fallback,
            alpha,
        }
    }

    fn resolve(&self, context: &gtk::StyleContext) -> Srgba<f64> {
        match context.lookup_color(self.name) {
            Some(c) => Srgba::new(
                c.red() as f64,
                c.green() as f64,
                c.blue() as f64,
                self.alpha.unwrap_or(c.alpha() as f64),
            ),
            None => Srgba::from_components(self.fallback),
        }
    }
}

const HOVERED: Swatch = Swatch::new("theme_selected_bg_color", (0.4, 0.4, 0.8, 0.9), Some(0.9));
const CHAINED: Swatch = Swatch::new("accent_bg_color", (0.3, 0.5, 0.4, 0.8), Some(0.7));
const IDLE: Swatch = Swatch::new("theme_bg_color", (0.15, 0.15, 0.15, 0.5), Some(0.75));
const SLICE: Swatch = Swatch::new("theme_selected_bg_color", (0.4, 0.4, 0.8, 0.2), Some(0.2));
const DEAD_ZONE: Swatch = Swatch::new("theme_fg_color", (0.2, 0.2, 0.2, 0.15), Some(0.1));
const TEXT: Swatch = Swatch::new("theme_fg_color", (1.0, 1.0, 1.0, 1.0), None);

pub struct ThemeColors {
    pub hovered: Srgba<f64>,
    pub chained: Srgba<f64>,
    pub default: Srgba<f64>,
    pub slice: Srgba<f64>,
    pub center_circle: Srgba<f64>,
    pub text: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        Self {
            hovered: HOVERED.resolve(context),
            chained: CHAINED.resolve(context),
            default: IDLE.resolve(context),
            slice: SLICE.resolve(context),
            center_circle: DEAD_ZONE.resolve(context),
            text: TEXT.resolve(context),
        }
    }
}

const CSS: &str = "
.piemenu-window, .piemenu-drawing-area {
    background: none;
    background-color: transparent;
}
";

pub fn load_css() {
    let Some(display) = gdk::Display::default() else {
        log::warn!("No display, skipping CSS");
        return;
    };
    let provider = gtk::CssProvider::new();
    provider.load_from_data(CSS);
    gtk::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
