//! Discretization of raw observations into table states

use tracing::trace;

use mephisto_rl_core::{
    CollisionQuery, ContactKind, DiscretizationMode, Point, Probe, ProbeReading, RadarState,
    RawObservation, State, PROBE_COUNT,
};

/// Maps raw observations to states for one configured mode.
///
/// Encoding is pure: the same mode, observation and layout always produce
/// the same state. Radar encoding asks the layout afresh on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateEncoder {
    mode: DiscretizationMode,
}

impl StateEncoder {
    /// Create an encoder for a discretization mode
    #[must_use]
    pub fn new(mode: DiscretizationMode) -> Self {
        Self { mode }
    }

    /// Configured mode
    #[must_use]
    pub fn mode(&self) -> DiscretizationMode {
        self.mode
    }

    /// Encode an observation.
    ///
    /// The random baseline keeps pixel positions so its episodes can still be
    /// inspected.
    pub fn encode(&self, observation: &RawObservation, world: &dyn CollisionQuery) -> State {
        match self.mode {
            DiscretizationMode::Random | DiscretizationMode::Pixel => {
                encode_pixel(observation.position)
            }
            DiscretizationMode::Tiled { tile_size } => {
                encode_tiled(observation.position, tile_size)
            }
            DiscretizationMode::Radar { probe_distance } => {
                State::Radar(encode_radar(observation, world, probe_distance))
            }
        }
    }
}

/// Truncate to integer pixel coordinates
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_pixel(position: Point) -> State {
    State::Pixel {
        x: position.x.trunc() as i64,
        y: position.y.trunc() as i64,
    }
}

/// Snap down to the nearest lower multiple of `tile_size`.
///
/// Coordinates beyond the `i64` range saturate, which no table bounds admit.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn encode_tiled(position: Point, tile_size: i64) -> State {
    let tile = tile_size as f64;
    let snap = |v: f64| ((v / tile).floor() as i64).saturating_mul(tile_size);
    State::Tiled {
        x: snap(position.x),
        y: snap(position.y),
    }
}

/// Category at a probe point; platform beats deathground beats goal
fn sense(world: &dyn CollisionQuery, point: Point) -> ContactKind {
    ContactKind::PRIORITY
        .into_iter()
        .find(|kind| world.collides(point, *kind))
        .unwrap_or(ContactKind::Empty)
}

/// Probe the seven directions around the player.
///
/// Exactly one reading is flagged closest to the goal: the probe with the
/// smallest Euclidean distance, the lowest probe index winning ties.
#[must_use]
pub fn encode_radar(
    observation: &RawObservation,
    world: &dyn CollisionQuery,
    probe_distance: f64,
) -> RadarState {
    let mut readings = [ProbeReading {
        contact: ContactKind::Empty,
        closest_to_goal: false,
    }; PROBE_COUNT];
    let mut closest = 0;
    let mut closest_distance = f64::INFINITY;

    for (i, probe) in Probe::ALL.into_iter().enumerate() {
        let (dx, dy) = probe.offset(probe_distance);
        let point = observation.position.offset(dx, dy);
        readings[i].contact = sense(world, point);

        let distance = point.distance(observation.goal);
        if distance < closest_distance {
            closest_distance = distance;
            closest = i;
        }
    }
    readings[closest].closest_to_goal = true;

    trace!(position = %observation.position, closest = ?Probe::ALL[closest], "radar sweep");
    RadarState(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{DenseTable, Grid};
    use mephisto_rl_core::{ActionSet, ActionValueTable, MapBounds, NoCollisions, RLError};
    use proptest::prelude::*;

    /// Single solid square per category
    struct Layout {
        cells: Vec<(Point, ContactKind)>,
    }

    impl CollisionQuery for Layout {
        fn collides(&self, point: Point, kind: ContactKind) -> bool {
            self.cells.iter().any(|(cell, k)| {
                *k == kind
                    && (cell.x..cell.x + 10.0).contains(&point.x)
                    && (cell.y..cell.y + 10.0).contains(&point.y)
            })
        }
    }

    fn observe(x: f64, y: f64, goal: Point) -> RawObservation {
        RawObservation::new(Point::new(x, y), goal)
    }

    #[test]
    fn test_pixel_truncates() {
        let encoder = StateEncoder::new(DiscretizationMode::Pixel);
        let state = encoder.encode(&observe(12.9, 40.2, Point::default()), &NoCollisions);
        assert_eq!(state, State::Pixel { x: 12, y: 40 });
    }

    #[test]
    fn test_tiled_snaps_down() {
        assert_eq!(encode_tiled(Point::new(63.9, 64.0), 64), State::Tiled { x: 0, y: 64 });
        assert_eq!(encode_tiled(Point::new(130.0, 5.0), 64), State::Tiled { x: 128, y: 0 });
        assert_eq!(encode_tiled(Point::new(-1.0, 0.0), 64), State::Tiled { x: -64, y: 0 });
    }

    #[test]
    fn test_huge_coordinates_saturate() {
        let state = encode_tiled(Point::new(1e19, -1e19), 64);
        assert_eq!(state, State::Tiled { x: i64::MAX, y: i64::MIN });

        let table = DenseTable::new(
            Grid::Tiled { tile_size: 64 },
            MapBounds::new(640, 256),
            ActionSet::basic().len(),
        )
        .unwrap();
        assert!(matches!(table.row(&state), Err(RLError::StateOutOfBounds { .. })));
    }

    proptest! {
        #[test]
        fn prop_same_cell_same_state(
            tile in 1i64..256,
            cx in -1000i64..1000,
            cy in -1000i64..1000,
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
        ) {
            let size = tile as f64;
            // Keep offsets a hair under a full tile so the sum cannot round up.
            let offset = |f: f64| f * (size - 1e-6);
            let corner = Point::new(cx as f64 * size, cy as f64 * size);
            let inside = corner.offset(offset(fx), offset(fy));

            let expected = State::Tiled { x: cx * tile, y: cy * tile };
            prop_assert_eq!(encode_tiled(corner, tile), expected);
            prop_assert_eq!(encode_tiled(inside, tile), expected);
        }
    }

    #[test]
    fn test_radar_flags_each_probe() {
        let position = Point::new(100.0, 100.0);
        for probe in Probe::ALL {
            let (dx, dy) = probe.offset(64.0);
            let obs = RawObservation::new(position, position.offset(dx, dy));
            let radar = encode_radar(&obs, &NoCollisions, 64.0);
            assert_eq!(radar.closest(), Some(probe));
            assert_eq!(radar.0.iter().filter(|r| r.closest_to_goal).count(), 1);
        }
    }

    #[test]
    fn test_radar_flags_strictly_closest_probe() {
        // Goal far to the lower right: the down-right probe is nearest.
        let obs = observe(100.0, 100.0, Point::new(500.0, -300.0));
        let radar = encode_radar(&obs, &NoCollisions, 64.0);
        assert_eq!(radar.closest(), Some(Probe::DownRight));
        assert_eq!(radar.0.iter().filter(|r| r.closest_to_goal).count(), 1);

        // Goal straight up: the up probe is nearest.
        let obs = observe(100.0, 100.0, Point::new(100.0, 900.0));
        assert_eq!(encode_radar(&obs, &NoCollisions, 64.0).closest(), Some(Probe::Up));
    }

    #[test]
    fn test_radar_tie_goes_to_lowest_index() {
        // Goal directly below: down-left and down-right are equally close.
        let obs = observe(100.0, 100.0, Point::new(100.0, -500.0));
        let radar = encode_radar(&obs, &NoCollisions, 64.0);
        assert_eq!(radar.closest(), Some(Probe::DownLeft));

        // Goal on the player: the three axis probes tie and left comes first.
        let obs = observe(100.0, 100.0, Point::new(100.0, 100.0));
        assert_eq!(encode_radar(&obs, &NoCollisions, 64.0).closest(), Some(Probe::Left));
    }

    #[test]
    fn test_radar_contact_priority() {
        let spot = Point::new(30.0, 96.0);
        let layout = Layout {
            cells: vec![
                (spot, ContactKind::Goal),
                (spot, ContactKind::Deathground),
                (spot, ContactKind::Platform),
                (Point::new(160.0, 96.0), ContactKind::Goal),
                (Point::new(30.0, 30.0), ContactKind::Deathground),
            ],
        };
        let obs = observe(100.0, 100.0, Point::new(1000.0, 1000.0));
        let radar = encode_radar(&obs, &layout, 64.0);

        assert_eq!(radar.reading(Probe::Left).contact, ContactKind::Platform);
        assert_eq!(radar.reading(Probe::Right).contact, ContactKind::Goal);
        assert_eq!(radar.reading(Probe::DownLeft).contact, ContactKind::Deathground);
        assert_eq!(radar.reading(Probe::Up).contact, ContactKind::Empty);
    }

    #[test]
    fn test_radar_reads_layout_every_call() {
        let obs = observe(100.0, 100.0, Point::new(1000.0, 1000.0));
        let mut layout = Layout { cells: Vec::new() };
        let before = encode_radar(&obs, &layout, 64.0);
        layout.cells.push((Point::new(160.0, 96.0), ContactKind::Platform));
        let after = encode_radar(&obs, &layout, 64.0);

        assert_eq!(before.reading(Probe::Right).contact, ContactKind::Empty);
        assert_eq!(after.reading(Probe::Right).contact, ContactKind::Platform);
    }
}
