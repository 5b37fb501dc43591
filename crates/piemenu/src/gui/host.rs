use crate::config::{Config, ItemConfig};
use crate::gui::app::AppMsg;
use crate::gui::menu::{FONT_SIZE, ICON_SIZE, ITEM_ICON_SIZE, ITEM_PADDING};
use crate::gui::window;
use gdk_pixbuf::Pixbuf;
use gtk4 as gtk;
use piemenu_core::{Host, Item, ItemId, PieId, PieMenu, Point, Rect, SliceId, Size, Target};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// What an item shows besides its label.
#[derive(Clone, Default)]
pub struct ItemVisual {
    pub icon: Option<Pixbuf>,
    pub chains: bool,
}

impl ItemVisual {
    pub fn from_config(cfg: &ItemConfig) -> Self {
        let icon = cfg.icon.as_ref().and_then(|path| {
            Pixbuf::from_file_at_scale(path, ICON_SIZE, ICON_SIZE, true)
                .inspect_err(|e| log::warn!("Failed to load icon {}: {}", path.display(), e))
                .ok()
        });
        Self {
            icon,
            chains: cfg.next_pie.is_some(),
        }
    }
}

/// Positions and hover state as last reported by the engine.
#[derive(Debug, Default)]
pub struct Scene {
    pub shown: Option<PieId>,
    pub centers: HashMap<PieId, Point>,
    /// Drawn in ascending id order, so later items sit on top.
    pub items: BTreeMap<ItemId, Rect>,
    pub slices: HashMap<SliceId, Rect>,
    pub labels: HashMap<ItemId, String>,
    pub natural: HashMap<ItemId, Size>,
    pub rotations: HashMap<ItemId, f64>,
    pub highlighted: HashSet<Target>,
    pub hit_testable: bool,
}

impl Scene {
    /// The topmost item of the shown pie whose box contains the absolute `point`.
    pub fn hit_test(&self, point: Point) -> Option<ItemId> {
        if !self.hit_testable {
            return None;
        }
        let pie = self.shown?;
        let center = *self.centers.get(&pie)?;
        self.items
            .iter()
            .rev()
            .filter(|(id, _)| id.pie == pie)
            .find(|(_, rect)| rect.translate(center).contains(point))
            .map(|(id, _)| *id)
    }

    pub fn detach(&mut self, pie: PieId) {
        if self.shown == Some(pie) {
            self.shown = None;
        }
        self.centers.remove(&pie);
        self.items.retain(|id, _| id.pie != pie);
        self.slices.retain(|id, _| id.pie != pie);
        self.labels.retain(|id, _| id.pie != pie);
        self.natural.retain(|id, _| id.pie != pie);
        self.rotations.retain(|id, _| id.pie != pie);
        self.highlighted.retain(|target| match target {
            Target::Pie(id) => *id != pie,
            Target::Slice(id) => id.pie != pie,
            Target::Item(id) => id.pie != pie,
            Target::Root => true,
        });
    }
}

/// Tells ticks of the current timer apart from ticks that were already queued when the timer
/// was cancelled or re-armed.
#[derive(Debug, Default)]
pub struct TimerTicket {
    current: Option<u64>,
    next: u64,
}

impl TimerTicket {
    fn issue(&mut self) -> u64 {
        let ticket = self.next;
        self.next += 1;
        self.current = Some(ticket);
        ticket
    }

    fn revoke(&mut self) {
        self.current = None;
    }

    /// True once for the tick of the live timer, false for stale ones.
    pub fn redeem(&mut self, ticket: u64) -> bool {
        if self.current == Some(ticket) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

/// Bounding box of a `size` box rotated by `deg`.
pub fn rotated_size(size: Size, deg: f64) -> Size {
    let (sin, cos) = deg.to_radians().sin_cos();
    Size::new(
        size.width * cos.abs() + size.height * sin.abs(),
        size.width * sin.abs() + size.height * cos.abs(),
    )
}

pub struct GtkHost {
    window: gtk::ApplicationWindow,
    sender: relm4::Sender<AppMsg>,
    visuals: HashMap<ItemId, ItemVisual>,
    scene: Scene,
    /// Pending timeout; the timeout clears it itself when it runs.
    timer: Rc<RefCell<Option<glib::SourceId>>>,
    ticket: TimerTicket,
    measure_cx: Option<cairo::Context>,
}

impl GtkHost {
    pub fn new(window: gtk::ApplicationWindow, sender: relm4::Sender<AppMsg>) -> Self {
        Self {
            window,
            sender,
            visuals: HashMap::new(),
            scene: Scene::default(),
            timer: Rc::new(RefCell::new(None)),
            ticket: TimerTicket::default(),
            measure_cx: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn visual(&self, id: ItemId) -> Option<&ItemVisual> {
        self.visuals.get(&id)
    }

    pub fn set_visual(&mut self, id: ItemId, visual: ItemVisual) {
        self.visuals.insert(id, visual);
    }

    /// Whether a tick delivered as [`AppMsg::Timer`] belongs to the timer still armed.
    pub fn timer_fired(&mut self, ticket: u64) -> bool {
        self.ticket.redeem(ticket)
    }

    fn text_width(&mut self, text: &str) -> f64 {
        if self.measure_cx.is_none() {
            self.measure_cx = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
                .and_then(|surface| cairo::Context::new(&surface))
                .inspect_err(|e| log::warn!("No cairo context for measuring: {}", e))
                .ok();
        }
        self.measure_cx
            .as_ref()
            .and_then(|cr| {
                cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
                cr.set_font_size(FONT_SIZE);
                cr.text_extents(text).ok()
            })
            .map(|ext| ext.x_advance())
            .unwrap_or_else(|| text.chars().count() as f64 * FONT_SIZE * 0.6)
    }
}

impl Host for GtkHost {
    fn measure(&mut self, id: ItemId, item: &Item) -> Size {
        let natural = if self.visuals.get(&id).is_some_and(|v| v.icon.is_some()) {
            Size::new(
                ITEM_ICON_SIZE + 2.0 * ITEM_PADDING,
                ITEM_ICON_SIZE + 2.0 * ITEM_PADDING,
            )
        } else {
            Size::new(
                self.text_width(&item.label) + 2.0 * ITEM_PADDING,
                FONT_SIZE + 2.0 * ITEM_PADDING,
            )
        };
        self.scene.labels.insert(id, item.label.clone());
        self.scene.natural.insert(id, natural);
        let rotation = self.scene.rotations.get(&id).copied().unwrap_or_default();
        rotated_size(natural, rotation)
    }

    fn apply_position(&mut self, target: Target, rect: Rect) {
        match target {
            Target::Item(id) => {
                self.scene.items.insert(id, rect);
            }
            Target::Slice(id) => {
                self.scene.slices.insert(id, rect);
            }
            Target::Pie(_) | Target::Root => {}
        }
    }

    fn apply_transform(&mut self, id: ItemId, rotation_deg: f64) {
        self.scene.rotations.insert(id, rotation_deg);
    }

    fn apply_center(&mut self, pie: PieId, center: Point) {
        self.scene.centers.insert(pie, center);
    }

    fn show(&mut self, pie: PieId) {
        self.scene.shown = Some(pie);
    }

    fn hide(&mut self, pie: PieId) {
        if self.scene.shown == Some(pie) {
            self.scene.shown = None;
        }
    }

    fn hit_test_point(&mut self, point: Point) -> Option<ItemId> {
        self.scene.hit_test(point)
    }

    fn set_items_hit_testable(&mut self, _pie: PieId, enabled: bool) {
        self.scene.hit_testable = enabled;
    }

    fn highlight(&mut self, target: Target, on: bool) {
        if on {
            self.scene.highlighted.insert(target);
        } else {
            self.scene.highlighted.remove(&target);
        }
    }

    fn capture_input(&mut self) {
        window::set_input_capture(&self.window, true);
    }

    fn release_input(&mut self) {
        window::set_input_capture(&self.window, false);
    }

    fn arm_timer(&mut self, delay: Duration) {
        self.cancel_timer();
        let ticket = self.ticket.issue();
        let (slot, sender) = (self.timer.clone(), self.sender.clone());
        let source = glib::timeout_add_local_once(delay, move || {
            // a one-shot source is destroyed once it has run and must not be removed again
            slot.borrow_mut().take();
            sender.emit(AppMsg::Timer(ticket));
        });
        *self.timer.borrow_mut() = Some(source);
    }

    fn cancel_timer(&mut self) {
        self.ticket.revoke();
        if let Some(source) = self.timer.borrow_mut().take() {
            source.remove();
        }
    }

    fn detach(&mut self, pie: PieId) {
        self.visuals.retain(|id, _| id.pie != pie);
        self.scene.detach(pie);
    }
}

/// Replaces every pie of `menu` with the ones described by `config`.
pub fn install(menu: &mut PieMenu<GtkHost>, config: &Config) {
    menu.destroy();
    *menu.options_mut() = config.global_options();

    for (name, pie) in &config.pies {
        let id = menu.add_pie(pie.to_pie(name));
        for (slice, cfg) in pie.slices.iter().enumerate() {
            for (index, item) in cfg.items.iter().enumerate() {
                let item_id = ItemId {
                    pie: id,
                    slice,
                    index,
                };
                menu.host_mut()
                    .set_visual(item_id, ItemVisual::from_config(item));
            }
        }
    }
    log::debug!("Installed {} pies", config.pies.len());
}
