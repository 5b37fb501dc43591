use crate::error::PieError;
use crate::geometry::{
    Point, Rect, Size, direction_bucket, normal_deg, readable_rotation_deg, round_half_up,
};
use crate::host::Host;
use crate::model::{ItemGeometry, ItemId, Pie, PieId, SliceId, Target};
use crate::options::{Options, Scopes, SliceItemLayout};
use std::collections::HashSet;

const FULL_TURN: f64 = 360.0;
// below this step the halving scan degenerates into a plain bucket search
const MIN_TURN: f64 = 0.5;

/// Gives every slice of `pie` a direction and unit vector.
///
/// Explicit directions claim their integer-degree bucket first; a second claim on a bucket is
/// reported and that slice joins the automatic ones, which are spread from
/// `initial_slice_direction` in steps of `turn`, skipping claimed buckets.
pub fn assign_directions(pie: &mut Pie, global: &Options, defaults: &Options) {
    let count = pie.slices.len();
    if count == 0 {
        return;
    }

    let scopes = Scopes::new(None, None, Some(&pie.options), Some(global), defaults);
    let clockwise = scopes.clockwise();
    let initial = scopes.initial_slice_direction().degrees().unwrap_or(90.0);
    let auto_turn =
        (if clockwise { -FULL_TURN } else { FULL_TURN }) * scopes.angular_span_fraction()
            / count as f64;
    let mut turn = scopes
        .turn()
        .filter(|t| *t != 0.0)
        .unwrap_or(auto_turn);
    if !turn.is_finite() || turn == 0.0 {
        turn = FULL_TURN / count as f64;
    }

    let mut used = HashSet::new();
    for (index, slice) in pie.slices.iter_mut().enumerate() {
        slice.clear_angle();
        let Some(spec) = slice.direction else {
            continue;
        };
        let Some(deg) = spec.degrees() else {
            log::warn!("{}", PieError::InvalidDirection { slice: index });
            continue;
        };
        let bucket = direction_bucket(deg);
        if !used.insert(bucket) {
            log::warn!("{}", PieError::DirectionCollision { slice: index, bucket });
            continue;
        }
        slice.set_angle(deg);
    }

    let mut current = normal_deg(initial);
    for slice in pie.slices.iter_mut().filter(|s| s.angle.is_none()) {
        current = next_free_direction(current, &mut turn, &used);
        used.insert(direction_bucket(current));
        slice.set_angle(current);
        current = normal_deg(current + turn);
    }
}

fn next_free_direction(mut current: f64, turn: &mut f64, used: &HashSet<i32>) -> f64 {
    if used.len() >= FULL_TURN as usize {
        log::error!("every direction bucket is taken, slices will overlap");
        return current;
    }

    let mut travelled = 0.0;
    while used.contains(&direction_bucket(current)) {
        if turn.abs() < MIN_TURN {
            let start = direction_bucket(current);
            return (0..360)
                .map(|step| (start + step).rem_euclid(360))
                .find(|bucket| !used.contains(bucket))
                .map_or(current, f64::from);
        }
        current = normal_deg(current + *turn);
        travelled += turn.abs();
        if travelled >= FULL_TURN - 1e-9 {
            // a whole revolution found nothing: interleave between the used directions
            *turn /= 2.0;
            current = normal_deg(current + *turn);
            travelled = 0.0;
        }
    }
    current
}

struct ItemParams {
    distance_min: f64,
    distance_spacing: f64,
    gap: f64,
    shear: f64,
    rotation: f64,
}

impl ItemParams {
    fn resolve(scopes: &Scopes<'_>, slice_angle: f64) -> Self {
        let rotation = scopes.item_rotation().unwrap_or_else(|| {
            if scopes.rotate_items() {
                readable_rotation_deg(slice_angle)
            } else {
                0.0
            }
        });
        Self {
            distance_min: scopes.item_distance_min(),
            distance_spacing: scopes.item_distance_spacing(),
            gap: scopes.item_gap(),
            shear: scopes.item_shear(),
            rotation,
        }
    }
}

/// Places the items of one slice in order, remembering the previous one.
struct ItemPlacer {
    layout: SliceItemLayout,
    dir: Point,
    distance: f64,
    previous: Option<(Point, Rect)>,
}

impl ItemPlacer {
    fn new(layout: SliceItemLayout, dir: Point) -> Self {
        Self {
            layout,
            dir,
            distance: 0.0,
            previous: None,
        }
    }

    fn place(&mut self, size: Size, p: &ItemParams) -> (Point, Rect) {
        let center = match self.layout {
            SliceItemLayout::SpacedDistance => {
                self.distance = match self.previous {
                    None => p.distance_min,
                    Some(_) => self.distance + p.distance_spacing,
                };
                self.dir.scale(self.distance)
            }
            SliceItemLayout::NonOverlapping => {
                let c = match self.previous {
                    None => self.first_non_overlapping(size, p),
                    Some((prev_center, prev)) => self.stacked(size, p, prev_center, prev),
                };
                Point::new(round_half_up(c.x), round_half_up(c.y))
            }
            SliceItemLayout::MinDistance | SliceItemLayout::Unknown(_) => {
                self.dir.scale(p.distance_min)
            }
        };
        let rect = Rect::around(center, size);
        self.previous = Some((center, rect));
        (center, rect)
    }

    fn first_non_overlapping(&self, size: Size, p: &ItemParams) -> Point {
        let Point { x: dx, y: dy } = self.dir;
        let mut c = self.dir.scale(p.distance_min);
        let (half_w, half_h) = (size.width / 2.0, size.height / 2.0);

        if dx.abs() + 0.01 < dy.abs() {
            // mostly vertical: push out along y, then sideways if the slice leans
            c.y += if dy < 0.0 { -half_h } else { half_h };
            if dx.abs() > 0.01 {
                c.x += if dx > 0.0 { half_w } else { -half_w };
            }
        } else {
            c.x += if dx < 0.0 { -half_w } else { half_w };
            if dy.abs() > 0.01 {
                c.y += if dy < 0.0 { half_h } else { -half_h };
            }
        }
        c
    }

    fn stacked(&self, size: Size, p: &ItemParams, prev_center: Point, prev: Rect) -> Point {
        let Point { x: dx, y: dy } = self.dir;
        let (half_w, half_h) = (size.width / 2.0, size.height / 2.0);

        if dx.abs() + 0.1 < dy.abs() {
            let y = if dy < 0.0 {
                prev.y - half_h - p.gap
            } else {
                prev.bottom() + half_h + p.gap
            };
            Point::new(prev_center.x + dx * p.shear, y)
        } else {
            let x = if dx < 0.0 {
                prev.x - half_w - p.gap
            } else {
                prev.right() + half_w + p.gap
            };
            Point::new(x, prev_center.y + dy * p.shear)
        }
    }
}

/// Min/max of every item edge, seeded with the pie center.
#[derive(Default)]
struct Extent {
    min: Point,
    max: Point,
}

impl Extent {
    fn include(&mut self, r: &Rect) {
        self.min = Point::new(self.min.x.min(r.x), self.min.y.min(r.y));
        self.max = Point::new(self.max.x.max(r.right()), self.max.y.max(r.bottom()));
    }

    fn rect(&self) -> Rect {
        Rect::new(
            round_half_up(self.min.x),
            round_half_up(self.min.y),
            (self.max.x - self.min.x).ceil(),
            (self.max.y - self.min.y).ceil(),
        )
    }
}

/// Assigns directions, then measures and positions every item, and records the pie's bounds.
/// Slices with an unknown item layout are reported and left unpositioned.
pub fn layout_pie<H: Host>(
    host: &mut H,
    id: PieId,
    pie: &mut Pie,
    global: &Options,
    defaults: &Options,
) {
    assign_directions(pie, global, defaults);

    let pie_options = &pie.options;
    let mut extent = Extent::default();

    for (slice_index, slice) in pie.slices.iter_mut().enumerate() {
        slice.bounds = None;
        if slice.items.is_empty() {
            continue;
        }

        let layout = Scopes::new(None, Some(&slice.options), Some(pie_options), Some(global), defaults)
            .slice_item_layout();
        if let SliceItemLayout::Unknown(name) = &layout {
            log::warn!(
                "{}",
                PieError::UnknownLayout {
                    slice: slice_index,
                    layout: name.clone(),
                }
            );
            continue;
        }

        let angle = slice.angle.unwrap_or_default();
        let mut placer = ItemPlacer::new(layout, slice.vector);
        let mut slice_bounds: Option<Rect> = None;

        for (index, item) in slice.items.iter_mut().enumerate() {
            let item_id = ItemId {
                pie: id,
                slice: slice_index,
                index,
            };
            let params = ItemParams::resolve(
                &Scopes::new(
                    Some(&item.options),
                    Some(&slice.options),
                    Some(pie_options),
                    Some(global),
                    defaults,
                ),
                angle,
            );

            host.apply_transform(item_id, params.rotation);
            let measured = host.measure(item_id, item);
            let size = Size::new(measured.width.ceil(), measured.height.ceil());
            let (center, rect) = placer.place(size, &params);

            item.geometry = Some(ItemGeometry {
                rect,
                center,
                rotation: params.rotation,
            });
            host.apply_position(Target::Item(item_id), rect);
            extent.include(&rect);
            slice_bounds = Some(slice_bounds.map_or(rect, |b| b.union(&rect)));
        }

        slice.bounds = slice_bounds;
        if let Some(rect) = slice_bounds {
            let slice_id = SliceId {
                pie: id,
                index: slice_index,
            };
            host.apply_position(Target::Slice(slice_id), rect);
        }
    }

    pie.bounds = extent.rect();
}
