//! Radial menu interaction engine: slice/item layout, pointer tracking and notification
//! bubbling. Rendering and input belong to a [`Host`].

#[macro_use]
mod macros;

pub mod error;
pub mod geometry;
pub mod hit;
pub mod host;
pub mod layout;
pub mod model;
pub mod notify;
pub mod options;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::PieError;
pub use geometry::{Direction, DirectionSpec, Point, Rect, Size};
pub use host::Host;
pub use model::{Item, ItemGeometry, ItemId, Pie, PieId, PieName, PieRef, Slice, SliceId, Target};
pub use notify::{EventKind, Handlers, Notification, Propagation};
pub use options::{Options, SliceItemLayout, SliceItemTracking};
pub use tracker::{Cursor, PieFactory, PieMenu};
