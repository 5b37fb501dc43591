//! Scoped option lookup.
//!
//! Every option may be set on an item, its slice, its pie, the engine's global options, or left
//! to the engine defaults. Lookups walk that chain on every call, so options changed by a host
//! between two pointer events take effect on the next one.

use crate::geometry::{Direction, DirectionSpec};
use crate::model::{PieName, PieRef};
use serde::Deserialize;
use serde_with::{DeserializeFromStr, DurationMilliSeconds, serde_as};
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumString};

pub const INITIAL_SLICE_DIRECTION: Direction = Direction::North;
pub const CLOCKWISE: bool = true;
pub const ANGULAR_SPAN_FRACTION: f64 = 1.0;
pub const SELECT_ITEM_UNDER_CURSOR: bool = true;
pub const INACTIVE_DISTANCE: f64 = 20.0;
pub const ITEM_DISTANCE_MIN: f64 = 120.0;
pub const ITEM_DISTANCE_SPACING: f64 = 80.0;
pub const ITEM_GAP: f64 = 0.0;
pub const ITEM_SHEAR: f64 = 30.0;
pub const ROTATE_ITEMS: bool = false;
pub const STICKY_PIN: bool = false;
pub const DRAGGY_PIN: bool = true;
pub const DRAG_THRESHOLD: f64 = 5.0;
pub const TIMER: bool = false;
pub const TIMER_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_PIE: &str = "defaultPie";

/// How the items of one slice are placed along its direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, DeserializeFromStr, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum SliceItemLayout {
    /// First item at `item_distance_min`, each next one `item_distance_spacing` further out.
    #[default]
    #[strum(serialize = "spacedDistance", serialize = "spaced_distance")]
    SpacedDistance,
    /// Every item at `item_distance_min`; items overlap.
    #[strum(serialize = "minDistance", serialize = "min_distance")]
    MinDistance,
    /// Items stacked edge to edge, sheared along the slice.
    #[strum(serialize = "nonOverlapping", serialize = "non_overlapping")]
    NonOverlapping,
    /// Kept verbatim so layout can report it and skip the slice.
    #[strum(default)]
    Unknown(String),
}

/// How the active item of the active slice is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, DeserializeFromStr, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum SliceItemTracking {
    /// Only the item whose surface is under the pointer.
    #[strum(serialize = "target")]
    Target,
    /// The item whose center is nearest to the pointer offset.
    #[default]
    #[strum(serialize = "closestItem", serialize = "closest_item")]
    ClosestItem,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Options {
    pub clockwise: Option<bool>,
    pub turn: Option<f64>,
    pub initial_slice_direction: Option<DirectionSpec>,
    #[serde(alias = "pie_sliced")]
    pub angular_span_fraction: Option<f64>,
    pub slice_item_layout: Option<SliceItemLayout>,
    pub slice_item_tracking: Option<SliceItemTracking>,
    pub select_item_under_cursor: Option<bool>,
    pub inactive_distance: Option<f64>,
    pub item_distance_min: Option<f64>,
    pub item_distance_spacing: Option<f64>,
    pub item_gap: Option<f64>,
    pub item_shear: Option<f64>,
    pub rotate_items: Option<bool>,
    pub item_rotation: Option<f64>,
    pub sticky_pin: Option<bool>,
    pub draggy_pin: Option<bool>,
    pub drag_threshold: Option<f64>,
    pub timer: Option<bool>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub timer_delay: Option<Duration>,
    pub next_pie: Option<PieRef>,
    pub default_pie: Option<PieName>,
    pub notify_inline: Option<bool>,
    pub notify_trigger: Option<bool>,
    pub notify_callbacks: Option<bool>,
}

impl Options {
    /// The last scope of every lookup.
    pub fn engine_defaults() -> Self {
        Self {
            clockwise: Some(CLOCKWISE),
            turn: None,
            initial_slice_direction: Some(DirectionSpec::Named(INITIAL_SLICE_DIRECTION)),
            angular_span_fraction: Some(ANGULAR_SPAN_FRACTION),
            slice_item_layout: Some(SliceItemLayout::SpacedDistance),
            slice_item_tracking: Some(SliceItemTracking::ClosestItem),
            select_item_under_cursor: Some(SELECT_ITEM_UNDER_CURSOR),
            inactive_distance: Some(INACTIVE_DISTANCE),
            item_distance_min: Some(ITEM_DISTANCE_MIN),
            item_distance_spacing: Some(ITEM_DISTANCE_SPACING),
            item_gap: Some(ITEM_GAP),
            item_shear: Some(ITEM_SHEAR),
            rotate_items: Some(ROTATE_ITEMS),
            item_rotation: None,
            sticky_pin: Some(STICKY_PIN),
            draggy_pin: Some(DRAGGY_PIN),
            drag_threshold: Some(DRAG_THRESHOLD),
            timer: Some(TIMER),
            timer_delay: Some(TIMER_DELAY),
            next_pie: None,
            default_pie: Some(PieName::new(DEFAULT_PIE)),
            notify_inline: Some(true),
            notify_trigger: Some(true),
            notify_callbacks: Some(true),
        }
    }
}

/// Returns the first value `key` finds in `scopes`, skipping absent scopes, or `fallback`.
pub fn resolve<'a, T: Clone + 'a>(
    scopes: &[Option<&'a Options>],
    key: impl Fn(&'a Options) -> Option<&'a T>,
    fallback: T,
) -> T {
    scopes
        .iter()
        .flatten()
        .find_map(|scope| key(*scope))
        .cloned()
        .unwrap_or(fallback)
}

/// The fixed item → slice → pie → global → defaults chain.
#[derive(Debug, Clone, Copy)]
pub struct Scopes<'a> {
    chain: [Option<&'a Options>; 5],
}

impl<'a> Scopes<'a> {
    pub fn new(
        item: Option<&'a Options>,
        slice: Option<&'a Options>,
        pie: Option<&'a Options>,
        global: Option<&'a Options>,
        defaults: &'a Options,
    ) -> Self {
        Self {
            chain: [item, slice, pie, global, Some(defaults)],
        }
    }

    pub fn find<T: 'a>(&self, key: impl Fn(&'a Options) -> Option<&'a T>) -> Option<&'a T> {
        self.chain.iter().flatten().find_map(|scope| key(*scope))
    }

    pub fn resolve<T: Clone + 'a>(
        &self,
        key: impl Fn(&'a Options) -> Option<&'a T>,
        fallback: T,
    ) -> T {
        resolve(&self.chain, key, fallback)
    }

    pub fn turn(&self) -> Option<f64> {
        self.find(|o| o.turn.as_ref()).copied()
    }

    pub fn item_rotation(&self) -> Option<f64> {
        self.find(|o| o.item_rotation.as_ref()).copied()
    }

    pub fn next_pie(&self) -> Option<&'a PieRef> {
        self.find(|o| o.next_pie.as_ref())
    }
}

macro_rules! scoped_options {
    ($($name:ident: $ty:ty = $fallback:expr),* $(,)?) => {
        impl<'a> Scopes<'a> {
            $(
                pub fn $name(&self) -> $ty {
                    self.resolve(|o| o.$name.as_ref(), $fallback)
                }
            )*
        }
    };
}

scoped_options! {
    clockwise: bool = CLOCKWISE,
    initial_slice_direction: DirectionSpec = DirectionSpec::Named(INITIAL_SLICE_DIRECTION),
    angular_span_fraction: f64 = ANGULAR_SPAN_FRACTION,
    slice_item_layout: SliceItemLayout = SliceItemLayout::SpacedDistance,
    slice_item_tracking: SliceItemTracking = SliceItemTracking::ClosestItem,
    select_item_under_cursor: bool = SELECT_ITEM_UNDER_CURSOR,
    inactive_distance: f64 = INACTIVE_DISTANCE,
    item_distance_min: f64 = ITEM_DISTANCE_MIN,
    item_distance_spacing: f64 = ITEM_DISTANCE_SPACING,
    item_gap: f64 = ITEM_GAP,
    item_shear: f64 = ITEM_SHEAR,
    rotate_items: bool = ROTATE_ITEMS,
    sticky_pin: bool = STICKY_PIN,
    draggy_pin: bool = DRAGGY_PIN,
    drag_threshold: f64 = DRAG_THRESHOLD,
    timer: bool = TIMER,
    timer_delay: Duration = TIMER_DELAY,
    default_pie: PieName = PieName::new(DEFAULT_PIE),
    notify_inline: bool = true,
    notify_trigger: bool = true,
    notify_callbacks: bool = true,
}
