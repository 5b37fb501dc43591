use crate::geometry::{Point, Rect, Size};
use crate::host::Host;
use crate::model::{Item, ItemId, PieId, Target};
use crate::notify::{EventKind, Notification, Propagation};
use crate::tracker::PieMenu;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;
use strum::IntoEnumIterator;

/// Host double that records every call the engine makes.
pub(crate) struct RecordingHost {
    pub item_size: Size,
    pub positions: Vec<(Target, Rect)>,
    pub transforms: HashMap<ItemId, f64>,
    pub visible: HashSet<PieId>,
    pub hit: Option<ItemId>,
    pub hit_testable: bool,
    pub hit_tests: usize,
    pub highlighted: HashSet<Target>,
    pub captures: usize,
    pub releases: usize,
    pub armed: Vec<Duration>,
    pub cancels: usize,
    pub inline: Vec<(Target, EventKind)>,
    pub triggers: Vec<(Target, EventKind)>,
    pub detached: Vec<PieId>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            item_size: Size::new(40.0, 20.0),
            positions: Vec::new(),
            transforms: HashMap::new(),
            visible: HashSet::new(),
            hit: None,
            hit_testable: false,
            hit_tests: 0,
            highlighted: HashSet::new(),
            captures: 0,
            releases: 0,
            armed: Vec::new(),
            cancels: 0,
            inline: Vec::new(),
            triggers: Vec::new(),
            detached: Vec::new(),
        }
    }
}

impl Host for RecordingHost {
    fn measure(&mut self, _id: ItemId, _item: &Item) -> Size {
        self.item_size
    }

    fn apply_position(&mut self, target: Target, rect: Rect) {
        self.positions.push((target, rect));
    }

    fn show(&mut self, pie: PieId) {
        self.visible.insert(pie);
    }

    fn hide(&mut self, pie: PieId) {
        self.visible.remove(&pie);
    }

    fn apply_transform(&mut self, id: ItemId, rotation_deg: f64) {
        self.transforms.insert(id, rotation_deg);
    }

    fn hit_test_point(&mut self, _point: Point) -> Option<ItemId> {
        self.hit_tests += 1;
        self.hit.filter(|_| self.hit_testable)
    }

    fn set_items_hit_testable(&mut self, _pie: PieId, enabled: bool) {
        self.hit_testable = enabled;
    }

    fn highlight(&mut self, target: Target, on: bool) {
        if on {
            self.highlighted.insert(target);
        } else {
            self.highlighted.remove(&target);
        }
    }

    fn capture_input(&mut self) {
        self.captures += 1;
    }

    fn release_input(&mut self) {
        self.releases += 1;
    }

    fn arm_timer(&mut self, delay: Duration) {
        self.armed.push(delay);
    }

    fn cancel_timer(&mut self) {
        self.cancels += 1;
    }

    fn run_inline(&mut self, target: Target, n: &Notification) -> Propagation {
        self.inline.push((target, n.kind));
        Propagation::Proceed
    }

    fn trigger(&mut self, target: Target, n: &Notification) {
        self.triggers.push((target, n.kind));
    }

    fn detach(&mut self, pie: PieId) {
        self.detached.push(pie);
    }
}

/// Subscribes to every event kind at the engine level and collects the notifications.
pub(crate) fn record_all<H: Host>(menu: &mut PieMenu<H>) -> Rc<RefCell<Vec<Notification>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::iter() {
        let log = log.clone();
        menu.on(kind, move |n: &Notification| log.borrow_mut().push(n.clone()));
    }
    log
}
