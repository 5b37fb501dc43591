use super::{CENTER_CIRCLE_RADIUS, CHAIN_MARKER_RADIUS, CORNER_RADIUS, FONT_SIZE, ITEM_ICON_SIZE};
use crate::gui::host::{GtkHost, ItemVisual};
use crate::gui::theme::ThemeColors;
use cairo::Context;
use gdk_pixbuf::Pixbuf;
use gdk4::prelude::*;
use palette::Srgba;
use piemenu_core::{Point, Rect, Size, Target};
use std::f64::consts::PI;

struct ItemRenderer<'a> {
    label: &'a str,
    visual: Option<&'a ItemVisual>,
    /// Unrotated box centered on the item position.
    natural: Size,
    center: Point,
    rotation: f64,
    hovered: bool,
}

impl<'a> ItemRenderer<'a> {
    fn draw(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        cr.save()?;
        cr.translate(self.center.x, self.center.y);
        cr.rotate(self.rotation.to_radians());
        self.draw_box(cr, colors)?;
        self.draw_content(cr, colors)?;
        if self.visual.is_some_and(|v| v.chains) {
            self.draw_chain_marker(cr, colors)?;
        }
        cr.restore()
    }

    fn draw_box(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let state = ItemState::resolve(self.visual, self.hovered);
        set_source(cr, state.color(colors));
        rounded_rect(
            cr,
            Rect::around(Point::ORIGIN, self.natural),
            CORNER_RADIUS,
        );
        cr.fill()
    }

    fn draw_content(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        match self.visual.and_then(|v| v.icon.as_ref()) {
            Some(pixbuf) => self.draw_icon(cr, pixbuf),
            None => self.draw_text(cr, colors),
        }
    }

    fn draw_icon(&self, cr: &Context, pixbuf: &Pixbuf) -> Result<(), cairo::Error> {
        let scale = ITEM_ICON_SIZE / pixbuf.width().max(pixbuf.height()).max(1) as f64;
        let (iw, ih) = (
            pixbuf.width() as f64 * scale,
            pixbuf.height() as f64 * scale,
        );

        cr.save()?;
        cr.translate(-iw / 2.0, -ih / 2.0);
        cr.scale(scale, scale);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint()?;
        cr.restore()
    }

    fn draw_text(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        set_source(cr, colors.text);
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(FONT_SIZE);
        if let Ok(ext) = cr.text_extents(self.label) {
            cr.move_to(
                -ext.x_advance() / 2.0,
                -(ext.y_bearing() + ext.height() / 2.0),
            );
            cr.show_text(self.label)?;
        }
        Ok(())
    }

    // small dot on the right edge for items that open another pie
    fn draw_chain_marker(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        set_source(cr, colors.text);
        cr.arc(
            self.natural.width / 2.0 - CHAIN_MARKER_RADIUS * 2.0,
            0.0,
            CHAIN_MARKER_RADIUS,
            0.0,
            2.0 * PI,
        );
        cr.fill()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemState {
    Hovered,
    Chained,
    Idle,
}

impl ItemState {
    /// Hovered wins over an item that opens another pie.
    fn resolve(visual: Option<&ItemVisual>, hovered: bool) -> Self {
        if hovered {
            Self::Hovered
        } else if visual.is_some_and(|v| v.chains) {
            Self::Chained
        } else {
            Self::Idle
        }
    }

    fn color(&self, colors: &ThemeColors) -> Srgba<f64> {
        match self {
            Self::Hovered => colors.hovered,
            Self::Chained => colors.chained,
            Self::Idle => colors.default,
        }
    }
}

pub fn draw(cr: &Context, host: &GtkHost, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let scene = host.scene();
    let Some(pie) = scene.shown else {
        return Ok(());
    };
    let center = scene.centers.get(&pie).copied().unwrap_or_default();

    draw_center_circle(cr, center, colors)?;

    for target in &scene.highlighted {
        if let Target::Slice(id) = target
            && id.pie == pie
            && let Some(rect) = scene.slices.get(id)
        {
            set_source(cr, colors.slice);
            rounded_rect(cr, rect.translate(center), CORNER_RADIUS);
            cr.fill()?;
        }
    }

    for (id, rect) in scene.items.iter().filter(|(id, _)| id.pie == pie) {
        ItemRenderer {
            label: scene.labels.get(id).map(String::as_str).unwrap_or_default(),
            visual: host.visual(*id),
            natural: scene.natural.get(id).copied().unwrap_or(Size::new(rect.width, rect.height)),
            center: rect.translate(center).center(),
            rotation: scene.rotations.get(id).copied().unwrap_or_default(),
            hovered: scene.highlighted.contains(&Target::Item(*id)),
        }
        .draw(cr, colors)?;
    }
    Ok(())
}

fn draw_center_circle(cr: &Context, center: Point, colors: &ThemeColors) -> Result<(), cairo::Error> {
    set_source(cr, colors.center_circle);
    cr.arc(center.x, center.y, CENTER_CIRCLE_RADIUS, 0.0, 2.0 * PI);
    cr.fill()
}

fn set_source(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn rounded_rect(cr: &Context, rect: Rect, radius: f64) {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    cr.new_sub_path();
    cr.arc(rect.right() - r, rect.y + r, r, -PI / 2.0, 0.0);
    cr.arc(rect.right() - r, rect.bottom() - r, r, 0.0, PI / 2.0);
    cr.arc(rect.x + r, rect.bottom() - r, r, PI / 2.0, PI);
    cr.arc(rect.x + r, rect.y + r, r, PI, 1.5 * PI);
    cr.close_path();
}
