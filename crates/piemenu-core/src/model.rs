use crate::geometry::{DirectionSpec, Point, Rect, direction_vector};
use crate::notify::{EventKind, Handlers, Notification, Propagation};
use crate::options::Options;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    Deref,
    From,
    Into,
    AsRef,
)]
#[serde(transparent)]
pub struct PieName(String);

crate::impl_string_newtype!(PieName);

/// Stable handle of a registered pie. Never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("pie#{_0}")]
pub struct PieId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{pie}/slice#{index}")]
pub struct SliceId {
    pub pie: PieId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{pie}/slice#{slice}/item#{index}")]
pub struct ItemId {
    pub pie: PieId,
    pub slice: usize,
    pub index: usize,
}

impl ItemId {
    pub fn slice_id(&self) -> SliceId {
        SliceId {
            pie: self.pie,
            index: self.slice,
        }
    }
}

/// Whatever a notification or host call is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Root,
    Pie(PieId),
    Slice(SliceId),
    Item(ItemId),
}

/// A pie named in the registry, an already registered one, or a definition to register on use.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "PieName")]
pub enum PieRef {
    Name(PieName),
    Id(PieId),
    Inline(Box<Pie>),
}

impl From<PieName> for PieRef {
    fn from(name: PieName) -> Self {
        Self::Name(name)
    }
}

impl From<&str> for PieRef {
    fn from(name: &str) -> Self {
        Self::Name(PieName::from(name))
    }
}

impl From<PieId> for PieRef {
    fn from(id: PieId) -> Self {
        Self::Id(id)
    }
}

impl From<Pie> for PieRef {
    fn from(pie: Pie) -> Self {
        Self::Inline(Box::new(pie))
    }
}

/// Computed placement of an item, relative to the pie center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemGeometry {
    pub rect: Rect,
    pub center: Point,
    pub rotation: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Item {
    pub label: String,
    pub options: Options,
    pub handlers: Handlers,
    pub(crate) geometry: Option<ItemGeometry>,
}

impl Item {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_next_pie(mut self, pie: impl Into<PieRef>) -> Self {
        self.options.next_pie = Some(pie.into());
        self
    }

    pub fn on<R: Into<Propagation>>(
        mut self,
        kind: EventKind,
        f: impl Fn(&Notification) -> R + 'static,
    ) -> Self {
        self.handlers.insert(kind, f);
        self
    }

    /// `None` until the item's pie has been laid out.
    pub fn geometry(&self) -> Option<&ItemGeometry> {
        self.geometry.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Slice {
    /// Requested direction; slices without one are distributed automatically.
    pub direction: Option<DirectionSpec>,
    pub options: Options,
    pub handlers: Handlers,
    pub items: Vec<Item>,
    pub(crate) angle: Option<f64>,
    pub(crate) vector: Point,
    pub(crate) bounds: Option<Rect>,
}

impl Slice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: impl Into<DirectionSpec>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn on<R: Into<Propagation>>(
        mut self,
        kind: EventKind,
        f: impl Fn(&Notification) -> R + 'static,
    ) -> Self {
        self.handlers.insert(kind, f);
        self
    }

    /// Assigned direction in degrees, once laid out.
    pub fn angle(&self) -> Option<f64> {
        self.angle
    }

    /// Unit vector of the assigned direction (zero before layout).
    pub fn vector(&self) -> Point {
        self.vector
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub(crate) fn set_angle(&mut self, deg: f64) {
        self.angle = Some(deg);
        self.vector = direction_vector(deg);
    }

    pub(crate) fn clear_angle(&mut self) {
        self.angle = None;
        self.vector = Point::ORIGIN;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pie {
    pub name: Option<PieName>,
    pub options: Options,
    pub handlers: Handlers,
    pub slices: Vec<Slice>,
    pub(crate) bounds: Rect,
}

impl Pie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<PieName>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_slice(mut self, slice: Slice) -> Self {
        self.slices.push(slice);
        self
    }

    pub fn on<R: Into<Propagation>>(
        mut self,
        kind: EventKind,
        f: impl Fn(&Notification) -> R + 'static,
    ) -> Self {
        self.handlers.insert(kind, f);
        self
    }

    /// Bounding box of all items relative to the pie center, from the last layout.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn slice(&self, id: SliceId) -> Option<&Slice> {
        self.slices.get(id.index)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.slices.get(id.slice)?.items.get(id.index)
    }

    /// Ids of every item, slice by slice.
    pub fn item_ids(&self, pie: PieId) -> impl Iterator<Item = ItemId> + '_ {
        self.slices.iter().enumerate().flat_map(move |(slice, s)| {
            (0..s.items.len()).map(move |index| ItemId { pie, slice, index })
        })
    }
}
