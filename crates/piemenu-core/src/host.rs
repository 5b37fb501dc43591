use crate::geometry::{Point, Rect, Size};
use crate::model::{Item, ItemId, PieId, Target};
use crate::notify::{Notification, Propagation};
use std::time::Duration;

/// The renderer and input surface the engine drives.
///
/// Coordinates handed to `apply_position` are relative to the pie center for items and slices
/// and absolute (pointer space) for pies. Only the first four methods are mandatory.
pub trait Host {
    /// Size of the item's visual after the rotation from `apply_transform` is applied.
    fn measure(&mut self, id: ItemId, item: &Item) -> Size;

    fn apply_position(&mut self, target: Target, rect: Rect);

    fn show(&mut self, pie: PieId);

    fn hide(&mut self, pie: PieId);

    fn apply_transform(&mut self, _id: ItemId, _rotation_deg: f64) {}

    /// Absolute center of `pie`, sent whenever the pie is (re)centered.
    fn apply_center(&mut self, _pie: PieId, _center: Point) {}

    /// The item surface under an absolute point, if any is hit-testable there.
    fn hit_test_point(&mut self, _point: Point) -> Option<ItemId> {
        None
    }

    /// Item surfaces ignore the pointer except while the engine hit-tests them.
    fn set_items_hit_testable(&mut self, _pie: PieId, _enabled: bool) {}

    fn highlight(&mut self, _target: Target, _on: bool) {}

    fn capture_input(&mut self) {}

    fn release_input(&mut self) {}

    /// One-shot timer; arming replaces any pending one. When it fires the host calls
    /// [`crate::PieMenu::on_timer`].
    fn arm_timer(&mut self, _delay: Duration) {}

    fn cancel_timer(&mut self) {}

    /// Inline per-element handler (first notification channel).
    fn run_inline(&mut self, _target: Target, _n: &Notification) -> Propagation {
        Propagation::Proceed
    }

    /// Host-native event (second notification channel).
    fn trigger(&mut self, _target: Target, _n: &Notification) {}

    /// Drops whatever visuals the host built for `pie`.
    fn detach(&mut self, _pie: PieId) {}
}
