//! The pointer-tracking state machine and pie registry.
//!
//! One [`PieMenu`] tracks at most one gesture at a time. A gesture starts with
//! [`PieMenu::start_pie`], is fed pointer events by the host, and ends on a selection without a
//! follow-up pie, a cancel, or [`PieMenu::cancel`]. Selecting an item with a `next_pie` hands the
//! gesture over to that pie, already pinned, without releasing input capture.

use crate::error::PieError;
use crate::geometry::{Point, offset_to_direction_deg};
use crate::hit::{find_item, find_slice};
use crate::host::Host;
use crate::layout::layout_pie;
use crate::model::{ItemId, Pie, PieId, PieName, PieRef, SliceId, Target};
use crate::notify::{Channels, EventKind, Handlers, Notification, Propagation, dispatch};
use crate::options::{Options, Scopes};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Builds pies referenced by name before anything registered them.
pub type PieFactory = Box<dyn FnMut(&PieName) -> Option<Pie>>;

/// Where the gesture stands. Readable by hosts, written only by the engine.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    pub current_pie: Option<PieId>,
    pub current_slice: Option<SliceId>,
    pub current_item: Option<ItemId>,
    pub last_slice: Option<SliceId>,
    pub last_item: Option<ItemId>,
    pub final_pie: Option<PieId>,
    pub final_slice: Option<SliceId>,
    pub final_item: Option<ItemId>,
    pub pinned: bool,
    pub dragging: bool,
    pub pressed: bool,
    /// Absolute pie center.
    pub center: Point,
    /// Absolute pointer position.
    pub position: Point,
    /// Pointer relative to the center.
    pub offset: Point,
    pub distance: f64,
    pub direction: f64,
    drag_start: Point,
    drag_offset: Point,
}

impl Cursor {
    fn locate(&mut self, pointer: Point) {
        self.position = pointer;
        self.offset = pointer - self.center;
        self.distance = self.offset.length();
        self.direction = offset_to_direction_deg(self.offset.x, self.offset.y);
    }

    fn clear_hover(&mut self) {
        self.current_slice = None;
        self.current_item = None;
        self.last_slice = None;
        self.last_item = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArmedTimer {
    delay: Duration,
    slice: Option<SliceId>,
    item: Option<ItemId>,
}

pub struct PieMenu<H: Host> {
    host: H,
    pies: HashMap<PieId, Pie>,
    names: HashMap<PieName, PieId>,
    next_id: u32,
    factory: Option<PieFactory>,
    global: Options,
    defaults: Options,
    root: Handlers,
    cursor: Cursor,
    channels: Channels,
    captured: bool,
    timer: Option<ArmedTimer>,
    final_slices: HashMap<PieId, SliceId>,
    final_items: HashMap<SliceId, ItemId>,
    /// Anonymous inline pies registered for the running gesture only.
    transient: HashSet<PieId>,
}

impl<H: Host> PieMenu<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            pies: HashMap::new(),
            names: HashMap::new(),
            next_id: 0,
            factory: None,
            global: Options::default(),
            defaults: Options::engine_defaults(),
            root: Handlers::default(),
            cursor: Cursor::default(),
            channels: Channels::default(),
            captured: false,
            timer: None,
            final_slices: HashMap::new(),
            final_items: HashMap::new(),
            transient: HashSet::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn options(&self) -> &Options {
        &self.global
    }

    /// Global options, consulted after item, slice and pie. Changes apply on the next lookup.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.global
    }

    pub fn defaults_mut(&mut self) -> &mut Options {
        &mut self.defaults
    }

    /// Registers an engine-level callback, the last stop of every notification.
    pub fn on<R: Into<Propagation>>(
        &mut self,
        kind: EventKind,
        f: impl Fn(&Notification) -> R + 'static,
    ) {
        self.root.insert(kind, f);
    }

    pub fn set_pie_factory(&mut self, factory: impl FnMut(&PieName) -> Option<Pie> + 'static) {
        self.factory = Some(Box::new(factory));
    }

    pub fn is_tracking(&self) -> bool {
        self.cursor.current_pie.is_some()
    }

    /// Registers `pie`, hoisting inline `next_pie` definitions into the registry first.
    /// A pie registered under a name already in use replaces the old one.
    pub fn add_pie(&mut self, mut pie: Pie) -> PieId {
        self.hoist(&mut pie.options);
        for slice in &mut pie.slices {
            self.hoist(&mut slice.options);
            for item in &mut slice.items {
                self.hoist(&mut item.options);
            }
        }

        let id = PieId(self.next_id);
        self.next_id += 1;

        if let Some(name) = &pie.name
            && let Some(old) = self.names.insert(name.clone(), id)
        {
            log::debug!("pie {name} replaced, dropping {old}");
            self.clear_pie(old);
        }
        self.pies.insert(id, pie);
        id
    }

    fn hoist(&mut self, options: &mut Options) {
        if matches!(options.next_pie, Some(PieRef::Inline(_)))
            && let Some(PieRef::Inline(inline)) = options.next_pie.take()
        {
            options.next_pie = Some(PieRef::Id(self.add_pie(*inline)));
        }
    }

    pub fn pie(&self, id: PieId) -> Option<&Pie> {
        self.pies.get(&id)
    }

    pub fn pie_mut(&mut self, id: PieId) -> Option<&mut Pie> {
        self.pies.get_mut(&id)
    }

    /// Looks `name` up, asking the pie factory on a miss.
    pub fn find_pie(&mut self, name: &PieName) -> Option<PieId> {
        if let Some(id) = self.names.get(name) {
            return Some(*id);
        }

        let built = self.factory.as_mut().and_then(|factory| factory(name));
        match built {
            Some(mut pie) => {
                pie.name = Some(name.clone());
                Some(self.add_pie(pie))
            }
            None => {
                log::warn!("{}", PieError::PieNotFound(name.clone()));
                None
            }
        }
    }

    /// Forgets a pie and tells the host to drop its visuals. Ends the gesture if it was active.
    pub fn clear_pie(&mut self, id: PieId) -> Option<Pie> {
        if self.cursor.current_pie == Some(id) {
            self.abort_gesture();
        }
        self.host.detach(id);
        self.transient.remove(&id);
        self.names.retain(|_, v| *v != id);
        self.final_slices.remove(&id);
        self.final_items.retain(|slice, _| slice.pie != id);
        self.pies.remove(&id)
    }

    /// Ends any gesture and drops every pie.
    pub fn destroy(&mut self) {
        self.abort_gesture();
        self.transient.clear();
        for id in self.pies.keys() {
            self.host.detach(*id);
        }
        self.pies.clear();
        self.names.clear();
        self.final_slices.clear();
        self.final_items.clear();
    }

    /// The slice chosen the last time `pie` was exited, if any.
    pub fn final_slice_of(&self, pie: PieId) -> Option<SliceId> {
        self.final_slices.get(&pie).copied()
    }

    pub fn final_item_of(&self, slice: SliceId) -> Option<ItemId> {
        self.final_items.get(&slice).copied()
    }

    fn resolve_pie_ref(&mut self, pie: &PieRef) -> Result<PieId, PieError> {
        match pie {
            PieRef::Name(name) => self
                .find_pie(name)
                .ok_or_else(|| PieError::PieNotFound(name.clone())),
            PieRef::Id(id) if self.pies.contains_key(id) => Ok(*id),
            PieRef::Id(id) => Err(PieError::PieNotFound(PieName::new(id.to_string()))),
            PieRef::Inline(inline) => {
                let id = self.add_pie((**inline).clone());
                if inline.name.is_none() {
                    self.transient.insert(id);
                }
                Ok(id)
            }
        }
    }

    /// Opens `pie` (or the default pie) centered at `pointer` and starts tracking as if the
    /// pointer had just been pressed there.
    pub fn start_pie(
        &mut self,
        pointer: Point,
        pie: Option<PieRef>,
        pinned: bool,
    ) -> Result<(), PieError> {
        if self.is_tracking() {
            log::debug!("new gesture while tracking, cancelling the old one");
            self.cancel();
        }

        self.capture();

        let found = match pie {
            Some(pie) => self.resolve_pie_ref(&pie),
            None => {
                let name = Scopes::new(None, None, None, Some(&self.global), &self.defaults)
                    .default_pie();
                self.find_pie(&name).ok_or(PieError::NoDefaultPie)
            }
        };
        let id = match found {
            Ok(id) => id,
            Err(e) => {
                log::error!("cannot start pie: {e}");
                self.track_done();
                return Err(e);
            }
        };

        log::debug!("start {id} at {pointer:?} pinned={pinned}");
        self.cursor.clear_hover();
        self.cursor.current_pie = Some(id);
        self.cursor.pinned = pinned;
        self.channels = self.channels_for(id);

        self.show_pie(id, pointer);
        self.notify(EventKind::PieStart, None, None);
        self.notify(EventKind::SliceStart, None, None);
        self.notify(EventKind::ItemStart, None, None);

        self.pointer_down(pointer);
        self.update_timer(true);
        Ok(())
    }

    pub fn pointer_down(&mut self, pointer: Point) {
        self.cursor.pressed = true;
        self.cursor.dragging = false;

        let Some(id) = self.cursor.current_pie else {
            log::error!("{}", PieError::NoActivePie);
            self.track_done();
            return;
        };

        self.cursor.locate(pointer);
        self.notify(EventKind::PieDown, None, None);

        if self.cursor.pinned && self.pie_scopes(id).draggy_pin() {
            self.cursor.drag_start = pointer;
            self.cursor.drag_offset = pointer - self.cursor.center;
        }

        self.track_current_pie(pointer);
    }

    pub fn pointer_move(&mut self, pointer: Point) {
        let Some(id) = self.cursor.current_pie else {
            return;
        };
        let (sticky_pin, draggy_pin, drag_threshold) = {
            let scopes = self.pie_scopes(id);
            (scopes.sticky_pin(), scopes.draggy_pin(), scopes.drag_threshold())
        };

        if !self.cursor.pressed && sticky_pin {
            self.center_pie(pointer, Point::ORIGIN);
        }

        if self.cursor.pressed && self.cursor.pinned && draggy_pin {
            if !self.cursor.dragging
                && (pointer - self.cursor.drag_start).length() > drag_threshold
            {
                log::trace!("drag {id}");
                self.cursor.dragging = true;
            }
            if self.cursor.dragging {
                self.center_pie(pointer, self.cursor.drag_offset);
            }
        }

        if self.cursor.dragging {
            self.cursor.locate(pointer);
        } else {
            self.track_current_pie(pointer);
        }
        self.notify(EventKind::PieMove, None, None);
    }

    pub fn pointer_up(&mut self, pointer: Point) {
        self.cursor.pressed = false;
        let Some(id) = self.cursor.current_pie else {
            return;
        };

        self.track_current_pie(pointer);
        self.notify(EventKind::PieUp, None, None);

        if self.cursor.dragging {
            self.cursor.dragging = false;
            return;
        }

        let (slice, item) = (self.cursor.current_slice, self.cursor.current_item);
        self.cursor.final_pie = Some(id);
        self.cursor.final_slice = slice;
        self.cursor.final_item = item;
        match slice {
            Some(slice) => {
                self.final_slices.insert(id, slice);
                match item {
                    Some(item) => self.final_items.insert(slice, item),
                    None => self.final_items.remove(&slice),
                };
            }
            None => {
                self.final_slices.remove(&id);
            }
        }

        let mut next = None;
        if let Some(slice) = slice {
            if let Some(item) = item {
                self.notify(EventKind::ItemSelect, Some(slice), Some(item));
                next = self.next_pie_of(item);
                self.cursor.current_item = None;
                self.host.highlight(Target::Item(item), false);
                self.notify(EventKind::ItemStop, Some(slice), Some(item));
                self.notify(EventKind::ItemStart, Some(slice), None);
            }

            self.notify(EventKind::SliceSelect, Some(slice), None);
            self.cursor.current_slice = None;
            self.host.highlight(Target::Slice(slice), false);
            self.notify(EventKind::SliceStop, Some(slice), None);
            self.notify(EventKind::SliceStart, None, None);
        }

        self.notify(EventKind::PieSelect, None, None);

        if slice.is_none() {
            if !self.cursor.pinned {
                self.cursor.pinned = true;
                self.notify(EventKind::PiePin, None, None);
                return;
            }
            self.notify(EventKind::PieCancel, None, None);
        }

        self.end_pie();

        match next {
            Some(next) => self.chain_to(next, pointer),
            None => self.track_done(),
        }
    }

    /// Ends the gesture as a cancel, e.g. on Escape.
    pub fn cancel(&mut self) {
        if self.cursor.current_pie.is_none() {
            return;
        }

        self.close_hover();
        self.notify(EventKind::PieCancel, None, None);
        self.end_pie();
        self.track_done();
    }

    /// Called by the host when the timer armed through [`Host::arm_timer`] fires.
    pub fn on_timer(&mut self) {
        self.timer = None;
        if self.cursor.current_pie.is_none() {
            return;
        }
        self.notify(
            EventKind::Timer,
            self.cursor.current_slice,
            self.cursor.current_item,
        );
        self.update_timer(true);
    }

    fn next_pie_of(&mut self, item: ItemId) -> Option<PieId> {
        let next = self.pies.get(&item.pie).and_then(|pie| {
            let slice = pie.slice(item.slice_id())?;
            let it = pie.item(item)?;
            Scopes::new(
                Some(&it.options),
                Some(&slice.options),
                Some(&pie.options),
                Some(&self.global),
                &self.defaults,
            )
            .next_pie()
            .cloned()
        })?;
        self.resolve_pie_ref(&next)
            .inspect_err(|e| log::warn!("{item} names a missing next pie: {e}"))
            .ok()
    }

    fn chain_to(&mut self, id: PieId, pointer: Point) {
        log::debug!("chain to {id}");
        self.cursor.current_pie = Some(id);
        self.channels = self.channels_for(id);
        self.cursor.pinned = true;
        self.notify(EventKind::PieStart, None, None);
        self.notify(EventKind::PiePin, None, None);
        self.show_pie(id, pointer);
        self.track_current_pie(pointer);
    }

    fn end_pie(&mut self) {
        let Some(id) = self.cursor.current_pie else {
            return;
        };
        self.host.hide(id);
        if self.cursor.pinned {
            self.notify(EventKind::PieUnpin, None, None);
        }
        self.cursor.pinned = false;
        self.notify(EventKind::PieStop, None, None);
        self.cursor.current_pie = None;
        self.update_timer(false);
    }

    /// Sends the stop edges of the hovered item and slice and forgets them.
    fn close_hover(&mut self) {
        let (slice, item) = (self.cursor.current_slice, self.cursor.current_item);
        self.cursor.last_slice = slice;
        self.cursor.last_item = item;
        self.cursor.current_slice = None;
        self.cursor.current_item = None;
        if let Some(item) = item {
            self.host.highlight(Target::Item(item), false);
            self.notify(EventKind::ItemStop, slice, Some(item));
        }
        if let Some(slice) = slice {
            self.host.highlight(Target::Slice(slice), false);
            self.notify(EventKind::SliceStop, Some(slice), None);
        }
    }

    /// Ends the gesture because its pie goes away. No cancel is reported, but every open
    /// start edge still gets its stop.
    fn abort_gesture(&mut self) {
        if self.cursor.current_pie.is_some() {
            self.close_hover();
            self.end_pie();
        }
        self.update_timer(false);
        self.cursor.clear_hover();
        self.cursor.pinned = false;
        self.track_done();
    }

    fn capture(&mut self) {
        if !self.captured {
            self.host.capture_input();
            self.captured = true;
        }
    }

    fn track_done(&mut self) {
        self.cursor.pressed = false;
        self.cursor.dragging = false;
        if self.captured {
            self.host.release_input();
            self.captured = false;
        }

        let current = self.cursor.current_pie;
        let spent: Vec<PieId> = self
            .transient
            .iter()
            .copied()
            .filter(|id| Some(*id) != current)
            .collect();
        for id in spent {
            self.transient.remove(&id);
            self.clear_pie(id);
        }
    }

    fn show_pie(&mut self, id: PieId, pointer: Point) {
        let (slices, items): (usize, Vec<ItemId>) = match self.pies.get(&id) {
            Some(pie) => (pie.slices.len(), pie.item_ids(id).collect()),
            None => return,
        };

        self.notify(EventKind::PieShow, None, None);
        for index in 0..slices {
            let slice = SliceId { pie: id, index };
            self.notify(EventKind::SliceShow, Some(slice), None);
            for item in items.iter().filter(|item| item.slice == index) {
                self.notify(EventKind::ItemShow, Some(slice), Some(*item));
            }
        }

        if let Some(pie) = self.pies.get_mut(&id) {
            layout_pie(&mut self.host, id, pie, &self.global, &self.defaults);
        }
        self.center_pie(pointer, Point::ORIGIN);
        self.host.show(id);
    }

    fn center_pie(&mut self, pointer: Point, offset: Point) {
        let center = pointer - offset;
        self.cursor.center = center;
        self.cursor.position = center;
        self.cursor.offset = Point::ORIGIN;
        self.cursor.distance = 0.0;
        self.cursor.direction = 0.0;

        if let Some(id) = self.cursor.current_pie
            && let Some(pie) = self.pies.get(&id)
        {
            self.host
                .apply_position(Target::Pie(id), pie.bounds().translate(center));
            self.host.apply_center(id, center);
        }
    }

    fn track_current_pie(&mut self, pointer: Point) {
        self.cursor.locate(pointer);
        self.cursor.last_slice = self.cursor.current_slice;
        self.cursor.last_item = self.cursor.current_item;

        let hover = self
            .cursor
            .current_pie
            .and_then(|id| Some((id, self.pies.get(&id)?)))
            .filter(|(_, pie)| !pie.slices.is_empty())
            .map(|(id, pie)| {
                hover(
                    &mut self.host,
                    id,
                    pie,
                    self.cursor.position,
                    self.cursor.offset,
                    &self.global,
                    &self.defaults,
                )
            });
        let Some((slice, item)) = hover else {
            self.cursor.current_slice = None;
            self.cursor.current_item = None;
            return;
        };
        self.cursor.current_slice = slice;
        self.cursor.current_item = item;

        let (last_slice, last_item) = (self.cursor.last_slice, self.cursor.last_item);
        if slice != last_slice {
            if let Some(last) = last_slice {
                self.host.highlight(Target::Slice(last), false);
            }
            self.notify(EventKind::SliceStop, last_slice, None);
            if let Some(current) = slice {
                self.host.highlight(Target::Slice(current), true);
            }
            self.notify(EventKind::SliceStart, slice, None);
        }

        if item != last_item {
            if let Some(last) = last_item {
                self.host.highlight(Target::Item(last), false);
            }
            self.notify(EventKind::ItemStop, last_slice, last_item);
            if let Some(current) = item {
                self.host.highlight(Target::Item(current), true);
            }
            self.notify(EventKind::ItemStart, slice, item);
        }

        self.notify(EventKind::PieUpdate, None, None);
        if slice.is_some() {
            self.notify(EventKind::SliceUpdate, slice, None);
            if item.is_some() {
                self.notify(EventKind::ItemUpdate, slice, item);
            }
        }

        self.update_timer(true);
    }

    fn update_timer(&mut self, enabled: bool) {
        let delay = self
            .cursor
            .current_pie
            .filter(|_| enabled)
            .and_then(|id| self.pies.get(&id))
            .and_then(|pie| {
                let scopes = self.hover_scopes(pie);
                scopes.timer().then(|| scopes.timer_delay())
            });

        match delay {
            Some(delay) => {
                let armed = ArmedTimer {
                    delay,
                    slice: self.cursor.current_slice,
                    item: self.cursor.current_item,
                };
                if self.timer != Some(armed) {
                    self.host.arm_timer(delay);
                    self.timer = Some(armed);
                }
            }
            None => {
                if self.timer.take().is_some() {
                    self.host.cancel_timer();
                }
            }
        }
    }

    fn pie_scopes(&self, id: PieId) -> Scopes<'_> {
        let pie = self.pies.get(&id).map(|p| &p.options);
        Scopes::new(None, None, pie, Some(&self.global), &self.defaults)
    }

    fn hover_scopes<'a>(&'a self, pie: &'a Pie) -> Scopes<'a> {
        let slice = self.cursor.current_slice.and_then(|s| pie.slice(s));
        let item = self.cursor.current_item.and_then(|i| pie.item(i));
        Scopes::new(
            item.map(|i| &i.options),
            slice.map(|s| &s.options),
            Some(&pie.options),
            Some(&self.global),
            &self.defaults,
        )
    }

    fn channels_for(&self, id: PieId) -> Channels {
        let scopes = self.pie_scopes(id);
        Channels {
            inline: scopes.notify_inline(),
            trigger: scopes.notify_trigger(),
            callbacks: scopes.notify_callbacks(),
        }
    }

    fn notify(&mut self, kind: EventKind, slice: Option<SliceId>, item: Option<ItemId>) {
        let Some(id) = self.cursor.current_pie else {
            return;
        };
        let Some(pie) = self.pies.get(&id) else {
            return;
        };
        let n = Notification {
            kind,
            pie: id,
            slice,
            item,
            pointer: (kind != EventKind::Timer).then_some(self.cursor.position),
            pinned: self.cursor.pinned,
        };
        dispatch(&mut self.host, self.channels, pie, &self.root, &n);
    }
}

/// Slice and item under the pointer. An item surface under the pointer wins over the
/// direction/distance result unless it opts out.
fn hover<H: Host>(
    host: &mut H,
    id: PieId,
    pie: &Pie,
    position: Point,
    offset: Point,
    global: &Options,
    defaults: &Options,
) -> (Option<SliceId>, Option<ItemId>) {
    let inactive_distance =
        Scopes::new(None, None, Some(&pie.options), Some(global), defaults).inactive_distance();
    let slice = find_slice(pie, offset, inactive_distance);
    let scopes = Scopes::new(
        None,
        slice.and_then(|s| pie.slices.get(s)).map(|s| &s.options),
        Some(&pie.options),
        Some(global),
        defaults,
    );

    if scopes.select_item_under_cursor() {
        host.set_items_hit_testable(id, true);
        let hit = host.hit_test_point(position);
        host.set_items_hit_testable(id, false);

        if let Some(hit) = hit
            && hit.pie == id
            && pie
                .item(hit)
                .is_some_and(|item| item.options.select_item_under_cursor != Some(false))
        {
            return (Some(hit.slice_id()), Some(hit));
        }
    }

    let Some(index) = slice else {
        return (None, None);
    };
    let item = pie
        .slices
        .get(index)
        .and_then(|s| find_item(s, offset, scopes.slice_item_tracking()));
    (
        Some(SliceId { pie: id, index }),
        item.map(|i| ItemId {
            pie: id,
            slice: index,
            index: i,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, Slice};
    use crate::testing::{RecordingHost, record_all};

    const CENTER: Point = Point { x: 500.0, y: 500.0 };

    fn at(dx: f64, dy: f64) -> Point {
        Point::new(CENTER.x + dx, CENTER.y + dy)
    }

    fn four_slices(name: &str) -> Pie {
        (0..4).fold(Pie::named(name), |pie, s| {
            pie.with_slice(
                Slice::new()
                    .with_item(Item::new(format!("{s}.0")))
                    .with_item(Item::new(format!("{s}.1"))),
            )
        })
    }

    fn engine() -> (PieMenu<RecordingHost>, PieId) {
        let mut menu = PieMenu::new(RecordingHost::default());
        let id = menu.add_pie(four_slices("defaultPie"));
        (menu, id)
    }

    fn kinds(log: &[Notification]) -> Vec<EventKind> {
        log.iter().map(|n| n.kind).collect()
    }

    fn item(pie: PieId, slice: usize, index: usize) -> ItemId {
        ItemId { pie, slice, index }
    }

    #[test]
    fn test_click_pins_then_second_click_cancels() {
        let (mut menu, id) = engine();
        menu.options_mut().sticky_pin = Some(false);
        menu.options_mut().draggy_pin = Some(false);
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        assert_eq!(menu.host().captures, 1);
        menu.pointer_up(CENTER);

        assert!(menu.is_tracking());
        assert!(menu.cursor().pinned);
        assert!(menu.host().visible.contains(&id));
        assert_eq!(kinds(&log.borrow()).last(), Some(&EventKind::PiePin));

        log.borrow_mut().clear();
        menu.pointer_down(CENTER);
        menu.pointer_up(CENTER);

        let seen = kinds(&log.borrow());
        assert!(seen.contains(&EventKind::PieCancel));
        assert_eq!(
            &seen[seen.len() - 3..],
            [EventKind::PieCancel, EventKind::PieUnpin, EventKind::PieStop]
        );
        assert!(!menu.is_tracking());
        assert!(menu.host().visible.is_empty());
        assert_eq!(menu.host().releases, 1);
    }

    #[test]
    fn test_release_over_item_selects_it() {
        let (mut menu, id) = engine();
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_move(at(0.0, -118.0));
        let target = item(id, 0, 0);
        assert_eq!(menu.cursor().current_item, Some(target));
        assert!(menu.host().highlighted.contains(&Target::Item(target)));

        log.borrow_mut().clear();
        menu.pointer_up(at(0.0, -118.0));

        let seen = kinds(&log.borrow());
        let from_select: Vec<_> = seen
            .iter()
            .copied()
            .skip_while(|k| *k != EventKind::ItemSelect)
            .collect();
        assert_eq!(
            from_select,
            [
                EventKind::ItemSelect,
                EventKind::ItemStop,
                EventKind::ItemStart,
                EventKind::SliceSelect,
                EventKind::SliceStop,
                EventKind::SliceStart,
                EventKind::PieSelect,
                EventKind::PieStop,
            ]
        );
        assert!(!menu.is_tracking());
        assert!(menu.host().highlighted.is_empty());
        assert_eq!(menu.host().releases, 1);
        assert_eq!(menu.cursor().final_item, Some(target));
        assert_eq!(menu.final_slice_of(id), Some(target.slice_id()));
        assert_eq!(menu.final_item_of(target.slice_id()), Some(target));
    }

    #[test]
    fn test_selecting_item_with_next_pie_chains_pinned() {
        let mut menu = PieMenu::new(RecordingHost::default());
        let mut root = four_slices("defaultPie");
        root.slices[0].items[0] = Item::new("more").with_next_pie("Other");
        let first = menu.add_pie(root);
        let other = menu.add_pie(four_slices("Other"));
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_move(at(0.0, -118.0));
        menu.pointer_up(at(0.0, -118.0));

        {
            let log = log.borrow();
            let select = log
                .iter()
                .position(|n| n.kind == EventKind::ItemSelect)
                .unwrap();
            let start = log
                .iter()
                .position(|n| n.kind == EventKind::PieStart && n.pie == other)
                .unwrap();
            assert!(select < start);
            assert!(log[start].pinned);
            assert!(
                log[select..start]
                    .iter()
                    .all(|n| n.kind != EventKind::PieDown)
            );
            assert_eq!(log[start + 1].kind, EventKind::PiePin);
        }

        assert_eq!(menu.cursor().current_pie, Some(other));
        assert!(menu.cursor().pinned);
        assert!(menu.host().visible.contains(&other));
        assert!(!menu.host().visible.contains(&first));
        assert_eq!(menu.host().captures, 1);
        assert_eq!(menu.host().releases, 0);

        // the chained pie is centered on the release point; pick its first item
        let center = menu.cursor().center;
        let pick = Point::new(center.x, center.y - 118.0);
        menu.pointer_down(pick);
        menu.pointer_up(pick);

        assert!(!menu.is_tracking());
        assert_eq!(menu.cursor().final_item, Some(item(other, 0, 0)));
        assert_eq!(menu.host().captures, 1);
        assert_eq!(menu.host().releases, 1);
    }

    #[test]
    fn test_hover_edges_pair_up() {
        let (mut menu, _) = engine();
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        let path = [
            (0.0, -118.0),
            (0.0, -210.0),
            (5.0, -205.0),
            (130.0, 0.0),
            (0.0, 0.0),
            (-190.0, 10.0),
            (0.0, 130.0),
            (0.0, 125.0),
            (60.0, -60.0),
        ];
        for (dx, dy) in path {
            menu.pointer_move(at(dx, dy));
        }
        menu.cancel();

        let mut open_slice: Option<SliceId> = None;
        let mut open_item: Option<ItemId> = None;
        for n in log.borrow().iter() {
            match (n.kind, n.slice, n.item) {
                (EventKind::SliceStart, Some(s), _) => {
                    assert_eq!(open_slice, None);
                    open_slice = Some(s);
                }
                (EventKind::SliceStop, Some(s), _) => {
                    assert_eq!(open_slice, Some(s));
                    open_slice = None;
                }
                (EventKind::ItemStart, _, Some(i)) => {
                    assert_eq!(open_item, None);
                    open_item = Some(i);
                }
                (EventKind::ItemStop, _, Some(i)) => {
                    assert_eq!(open_item, Some(i));
                    open_item = None;
                }
                _ => {}
            }
        }
        assert_eq!((open_slice, open_item), (None, None));
    }

    #[test]
    fn test_pinned_press_and_drag_moves_the_pie() {
        let (mut menu, id) = engine();
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, true).unwrap();
        menu.pointer_move(at(3.0, 0.0));
        assert!(!menu.cursor().dragging);

        menu.pointer_move(at(50.0, 40.0));
        assert!(menu.cursor().dragging);
        assert_eq!(menu.cursor().center, at(50.0, 40.0));
        assert_eq!(menu.cursor().current_slice, None);
        let (pie, rect) = *menu.host().positions.last().unwrap();
        assert_eq!(pie, Target::Pie(id));
        assert_eq!(rect.center().x.round(), 550.0);

        log.borrow_mut().clear();
        menu.pointer_up(at(50.0, 40.0));
        assert!(!menu.cursor().dragging);
        assert!(menu.is_tracking());
        assert!(!kinds(&log.borrow()).contains(&EventKind::PieSelect));
    }

    #[test]
    fn test_timer_rearms_on_hover_change_only() {
        let mut menu = PieMenu::new(RecordingHost::default());
        menu.add_pie(four_slices("defaultPie").with_options(Options {
            timer: Some(true),
            timer_delay: Some(Duration::from_millis(250)),
            ..Default::default()
        }));
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        assert_eq!(menu.host().armed, vec![Duration::from_millis(250)]);

        menu.pointer_move(at(0.0, -118.0));
        assert_eq!(menu.host().armed.len(), 2);
        menu.pointer_move(at(1.0, -119.0));
        assert_eq!(menu.host().armed.len(), 2);

        menu.on_timer();
        let tick = log
            .borrow()
            .iter()
            .find(|n| n.kind == EventKind::Timer)
            .cloned()
            .unwrap();
        assert_eq!(tick.item, menu.cursor().current_item);
        assert_eq!(tick.pointer, None);
        assert_eq!(menu.host().armed.len(), 3);

        menu.pointer_up(at(1.0, -119.0));
        assert!(menu.host().cancels >= 1);
        assert!(menu.timer.is_none());
    }

    #[test]
    fn test_item_under_cursor_wins_unless_it_opts_out() {
        let (mut menu, id) = engine();
        let east = item(id, 1, 1);
        menu.host_mut().hit = Some(east);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_move(at(0.0, -118.0));
        assert_eq!(menu.cursor().current_item, Some(east));
        assert_eq!(menu.cursor().current_slice, Some(east.slice_id()));
        assert!(!menu.host().hit_testable);
        assert!(menu.host().hit_tests > 0);

        menu.pie_mut(id).unwrap().slices[1].items[1]
            .options
            .select_item_under_cursor = Some(false);
        menu.pointer_move(at(0.0, -119.0));
        assert_eq!(menu.cursor().current_item, Some(item(id, 0, 0)));

        menu.options_mut().select_item_under_cursor = Some(false);
        menu.pie_mut(id).unwrap().slices[1].items[1]
            .options
            .select_item_under_cursor = None;
        menu.pointer_move(at(0.0, -118.0));
        assert_eq!(menu.cursor().current_item, Some(item(id, 0, 0)));
    }

    #[test]
    fn test_missing_default_pie_aborts_softly() {
        let mut menu = PieMenu::new(RecordingHost::default());
        menu.add_pie(four_slices("other"));

        assert_eq!(
            menu.start_pie(CENTER, None, false),
            Err(PieError::NoDefaultPie)
        );
        assert!(!menu.is_tracking());
        assert_eq!(menu.host().captures, 1);
        assert_eq!(menu.host().releases, 1);

        assert_eq!(
            menu.start_pie(CENTER, Some("nope".into()), false),
            Err(PieError::PieNotFound("nope".into()))
        );

        menu.pointer_down(CENTER);
        menu.pointer_move(CENTER);
        menu.pointer_up(CENTER);
        assert_eq!(menu.host().releases, 2);

        menu.options_mut().default_pie = Some("other".into());
        assert!(menu.start_pie(CENTER, None, false).is_ok());
    }

    #[test]
    fn test_cancel_closes_hover_and_releases_once() {
        let (mut menu, id) = engine();
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_move(at(118.0, 0.0));
        log.borrow_mut().clear();
        menu.cancel();

        assert_eq!(
            kinds(&log.borrow()),
            [
                EventKind::ItemStop,
                EventKind::SliceStop,
                EventKind::PieCancel,
                EventKind::PieStop
            ]
        );
        assert_eq!(log.borrow()[0].item, Some(item(id, 1, 0)));
        assert_eq!(menu.host().releases, 1);
        menu.cancel();
        assert_eq!(menu.host().releases, 1);
    }

    #[test]
    fn test_sticky_pin_recenters_on_hover() {
        let (mut menu, _) = engine();
        menu.options_mut().sticky_pin = Some(true);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_up(CENTER);
        menu.pointer_move(at(0.0, -118.0));

        assert_eq!(menu.cursor().center, at(0.0, -118.0));
        assert_eq!(menu.cursor().current_slice, None);
    }

    #[test]
    fn test_show_notifications_precede_layout() {
        let (mut menu, _) = engine();
        let log = record_all(&mut menu);
        menu.start_pie(CENTER, None, false).unwrap();

        let seen = kinds(&log.borrow());
        assert_eq!(seen[0], EventKind::PieShow);
        assert_eq!(
            seen.iter().filter(|k| **k == EventKind::SliceShow).count(),
            4
        );
        assert_eq!(seen.iter().filter(|k| **k == EventKind::ItemShow).count(), 8);
        let start = seen.iter().position(|k| *k == EventKind::PieStart).unwrap();
        assert_eq!(
            &seen[start..start + 4],
            [
                EventKind::PieStart,
                EventKind::SliceStart,
                EventKind::ItemStart,
                EventKind::PieDown
            ]
        );
    }

    #[test]
    fn test_inline_next_pie_is_hoisted() {
        let mut menu = PieMenu::new(RecordingHost::default());
        let root = Pie::named("root").with_slice(
            Slice::new().with_item(Item::new("sub").with_next_pie(Pie::named("sub").with_slice(
                Slice::new().with_item(Item::new("leaf")),
            ))),
        );
        let id = menu.add_pie(root);

        let sub = menu.find_pie(&"sub".into()).unwrap();
        let next = &menu.pie(id).unwrap().slices[0].items[0].options.next_pie;
        assert!(matches!(next, Some(PieRef::Id(n)) if *n == sub));
    }

    #[test]
    fn test_factory_builds_on_first_reference() {
        let mut menu = PieMenu::new(RecordingHost::default());
        menu.set_pie_factory(|name| {
            (name.as_str() != "missing")
                .then(|| Pie::new().with_slice(Slice::new().with_item(Item::new("x"))))
        });

        let built = menu.find_pie(&"made".into()).unwrap();
        assert_eq!(menu.find_pie(&"made".into()), Some(built));
        assert_eq!(menu.pie(built).unwrap().name, Some("made".into()));
        assert_eq!(menu.find_pie(&"missing".into()), None);
    }

    #[test]
    fn test_replacing_and_clearing_detach_visuals() {
        let (mut menu, old) = engine();
        let new = menu.add_pie(four_slices("defaultPie"));
        assert_ne!(old, new);
        assert_eq!(menu.host().detached, vec![old]);
        assert!(menu.pie(old).is_none());

        menu.start_pie(CENTER, None, false).unwrap();
        assert_eq!(menu.cursor().current_pie, Some(new));
        menu.destroy();
        assert!(!menu.is_tracking());
        assert_eq!(menu.host().releases, 1);
        assert_eq!(menu.host().detached, vec![old, new]);
        assert_eq!(menu.find_pie(&"defaultPie".into()), None);
    }

    #[test]
    fn test_destroy_closes_open_hover_edges() {
        let (mut menu, id) = engine();
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_move(at(0.0, -118.0));
        log.borrow_mut().clear();
        menu.destroy();

        let seen: Vec<_> = log
            .borrow()
            .iter()
            .map(|n| (n.kind, n.slice, n.item))
            .collect();
        let hovered = item(id, 0, 0);
        assert_eq!(
            seen,
            [
                (EventKind::ItemStop, Some(hovered.slice_id()), Some(hovered)),
                (EventKind::SliceStop, Some(hovered.slice_id()), None),
                (EventKind::PieStop, None, None),
            ]
        );
        assert!(menu.host().highlighted.is_empty());
        assert_eq!(menu.host().releases, 1);
    }

    #[test]
    fn test_replacing_the_active_pie_stops_its_gesture() {
        let (mut menu, old) = engine();
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        menu.pointer_up(CENTER);
        menu.pointer_move(at(118.0, 0.0));
        log.borrow_mut().clear();
        menu.add_pie(four_slices("defaultPie"));

        let seen = kinds(&log.borrow());
        assert_eq!(
            seen,
            [
                EventKind::ItemStop,
                EventKind::SliceStop,
                EventKind::PieUnpin,
                EventKind::PieStop
            ]
        );
        assert!(log.borrow().iter().all(|n| n.pie == old));
        assert!(!menu.is_tracking());
        assert_eq!(menu.host().releases, 1);
    }

    #[test]
    fn test_anonymous_inline_pies_live_for_one_gesture() {
        let (mut menu, _) = engine();

        for _ in 0..5 {
            let inline = Pie::new().with_slice(Slice::new().with_item(Item::new("once")));
            menu.start_pie(CENTER, Some(inline.into()), false).unwrap();
            assert_eq!(menu.pies.len(), 2);
            menu.cancel();
        }

        assert_eq!(menu.pies.len(), 1);
        assert_eq!(menu.host().detached.len(), 5);
        assert!(menu.transient.is_empty());

        let named = Pie::named("kept").with_slice(Slice::new().with_item(Item::new("stays")));
        menu.start_pie(CENTER, Some(named.into()), false).unwrap();
        menu.cancel();
        assert!(menu.find_pie(&"kept".into()).is_some());
    }

    #[test]
    fn test_disabled_channels_follow_pie_options() {
        let mut menu = PieMenu::new(RecordingHost::default());
        menu.add_pie(four_slices("defaultPie").with_options(Options {
            notify_trigger: Some(false),
            ..Default::default()
        }));
        let log = record_all(&mut menu);

        menu.start_pie(CENTER, None, false).unwrap();
        assert!(menu.host().triggers.is_empty());
        assert!(!menu.host().inline.is_empty());
        assert!(!log.borrow().is_empty());
    }
}
