pub mod view;

pub use view::draw;

pub const ICON_SIZE: i32 = 64;
pub const ITEM_ICON_SIZE: f64 = 32.0; // drawn icon edge
pub const ITEM_PADDING: f64 = 8.0;
pub const FONT_SIZE: f64 = 14.0;
pub const CORNER_RADIUS: f64 = 6.0;
pub const CENTER_CIRCLE_RADIUS: f64 = 24.0;
pub const CHAIN_MARKER_RADIUS: f64 = 3.0;
