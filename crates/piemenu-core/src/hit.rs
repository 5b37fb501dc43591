//! Pointer offset → slice/item lookup. Read-only over the pie, so safe to call speculatively.

use crate::geometry::Point;
use crate::model::{Pie, Slice};
use crate::options::SliceItemTracking;

/// Index of the slice pointed at by `offset` (relative to the pie center), or `None` inside the
/// dead zone. Ties go to the slice that comes first.
pub fn find_slice(pie: &Pie, offset: Point, inactive_distance: f64) -> Option<usize> {
    if pie.slices.is_empty() || offset.length() <= inactive_distance {
        return None;
    }
    if pie.slices.len() == 1 {
        return Some(0);
    }

    let mut best = None;
    let mut best_dot = f64::NEG_INFINITY;
    for (index, slice) in pie.slices.iter().enumerate() {
        let dot = slice.vector().dot(offset);
        if dot > best_dot {
            best_dot = dot;
            best = Some(index);
        }
    }
    best
}

/// Index of the item of `slice` nearest to `offset`. With [`SliceItemTracking::Target`] only the
/// under-cursor hit test picks items, so this returns `None`.
pub fn find_item(slice: &Slice, offset: Point, tracking: SliceItemTracking) -> Option<usize> {
    if tracking == SliceItemTracking::Target {
        return None;
    }
    match slice.items.len() {
        0 => None,
        1 => Some(0),
        _ => slice
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let center = item.geometry()?.center;
                Some((index, (center - offset).length_squared()))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index),
    }
}
