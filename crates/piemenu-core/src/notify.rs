//! Interaction notifications and how they bubble.
//!
//! Every notification goes out through three channels, each of which can be switched off per
//! pie or globally:
//!
//! 1. inline: the host's per-element handler ([`Host::run_inline`]), at every level;
//! 2. trigger: the host's native event ([`Host::trigger`]), once at the deepest element and once
//!    more at the root target, since pie elements do not live under the root in the host tree;
//! 3. callbacks: the [`Handlers`] tables of item, slice, pie and engine, at every level.
//!
//! Levels run item → slice → pie → root and are skipped when absent. A [`Propagation::Stop`]
//! from channel 1 or 3 ends the walk after the current level.

use crate::geometry::Point;
use crate::host::Host;
use crate::model::{ItemId, Pie, PieId, SliceId, Target};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr, StrumDisplay,
)]
pub enum EventKind {
    #[strum(serialize = "piedown")]
    PieDown,
    #[strum(serialize = "piemove")]
    PieMove,
    #[strum(serialize = "pieup")]
    PieUp,
    #[strum(serialize = "pieshow")]
    PieShow,
    #[strum(serialize = "piestart")]
    PieStart,
    #[strum(serialize = "piestop")]
    PieStop,
    #[strum(serialize = "piepin")]
    PiePin,
    #[strum(serialize = "pieunpin")]
    PieUnpin,
    #[strum(serialize = "piecancel")]
    PieCancel,
    #[strum(serialize = "pieupdate")]
    PieUpdate,
    #[strum(serialize = "pieselect")]
    PieSelect,
    #[strum(serialize = "piesliceshow")]
    SliceShow,
    #[strum(serialize = "pieslicestart")]
    SliceStart,
    #[strum(serialize = "pieslicestop")]
    SliceStop,
    #[strum(serialize = "piesliceupdate")]
    SliceUpdate,
    #[strum(serialize = "piesliceselect")]
    SliceSelect,
    #[strum(serialize = "pieitemshow")]
    ItemShow,
    #[strum(serialize = "pieitemstart")]
    ItemStart,
    #[strum(serialize = "pieitemstop")]
    ItemStop,
    #[strum(serialize = "pieitemupdate")]
    ItemUpdate,
    #[strum(serialize = "pieitemselect")]
    ItemSelect,
    #[strum(serialize = "pietimer")]
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Pie,
    Slice,
    Item,
}

impl EventKind {
    /// The most specific level this kind of event starts bubbling from.
    pub fn level(self) -> Level {
        match self {
            Self::SliceShow
            | Self::SliceStart
            | Self::SliceStop
            | Self::SliceUpdate
            | Self::SliceSelect => Level::Slice,
            Self::ItemShow
            | Self::ItemStart
            | Self::ItemStop
            | Self::ItemUpdate
            | Self::ItemSelect
            | Self::Timer => Level::Item,
            _ => Level::Pie,
        }
    }
}

/// What a handler receives. `slice`/`item` are `None` for the "nothing" region, e.g. an
/// item-start with no item when the pointer enters the dead zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: EventKind,
    pub pie: PieId,
    pub slice: Option<SliceId>,
    pub item: Option<ItemId>,
    /// Pointer position that caused it; `None` for timer ticks.
    pub pointer: Option<Point>,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    #[default]
    Proceed,
    Stop,
}

impl From<()> for Propagation {
    fn from(_: ()) -> Self {
        Self::Proceed
    }
}

pub type Callback = Rc<dyn Fn(&Notification) -> Propagation>;

/// Sparse event → callback table attached to an item, slice, pie or the engine.
#[derive(Clone, Default)]
pub struct Handlers {
    table: HashMap<EventKind, Callback>,
}

impl Handlers {
    pub fn insert<R: Into<Propagation>>(
        &mut self,
        kind: EventKind,
        f: impl Fn(&Notification) -> R + 'static,
    ) {
        self.table.insert(kind, Rc::new(move |n: &Notification| -> Propagation { f(n).into() }));
    }

    pub fn get(&self, kind: EventKind) -> Option<&Callback> {
        self.table.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    pub inline: bool,
    pub trigger: bool,
    pub callbacks: bool,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            inline: true,
            trigger: true,
            callbacks: true,
        }
    }
}

fn bubble_chain(n: &Notification) -> impl Iterator<Item = Target> {
    let level = n.kind.level();
    let item = (level == Level::Item).then_some(n.item).flatten();
    let slice = (level != Level::Pie).then_some(n.slice).flatten();
    [
        item.map(Target::Item),
        slice.map(Target::Slice),
        Some(Target::Pie(n.pie)),
    ]
    .into_iter()
    .flatten()
}

fn handlers_of(pie: &Pie, target: Target) -> Option<&Handlers> {
    match target {
        Target::Item(id) => pie.item(id).map(|i| &i.handlers),
        Target::Slice(id) => pie.slice(id).map(|s| &s.handlers),
        Target::Pie(_) => Some(&pie.handlers),
        Target::Root => None,
    }
}

fn deliver<H: Host>(
    host: &mut H,
    channels: Channels,
    target: Target,
    handlers: Option<&Handlers>,
    trigger: bool,
    n: &Notification,
) -> Propagation {
    let mut flow = Propagation::Proceed;
    if channels.inline && host.run_inline(target, n) == Propagation::Stop {
        flow = Propagation::Stop;
    }
    if trigger && channels.trigger {
        host.trigger(target, n);
    }
    if channels.callbacks
        && let Some(callback) = handlers.and_then(|h| h.get(n.kind))
        && callback(n) == Propagation::Stop
    {
        flow = Propagation::Stop;
    }
    flow
}

/// Delivers `n` through every enabled channel, bubbling from its level up to `root`.
pub(crate) fn dispatch<H: Host>(
    host: &mut H,
    channels: Channels,
    pie: &Pie,
    root: &Handlers,
    n: &Notification,
) {
    log::trace!("{} {:?} {:?}", n.kind, n.slice, n.item);

    for (depth, target) in bubble_chain(n).enumerate() {
        let handlers = handlers_of(pie, target);
        if deliver(host, channels, target, handlers, depth == 0, n) == Propagation::Stop {
            return;
        }
    }
    deliver(host, channels, Target::Root, Some(root), true, n);
}
