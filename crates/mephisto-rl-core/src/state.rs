//! Discrete state representations used as value table keys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ContactKind, RLError};

/// Number of radar probes around the player
pub const PROBE_COUNT: usize = 7;

/// Fixed directional sensing points relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    /// Left of the player
    Left,
    /// Right of the player
    Right,
    /// Above the player
    Up,
    /// Above and to the left
    UpLeft,
    /// Above and to the right
    UpRight,
    /// Below and to the left
    DownLeft,
    /// Below and to the right
    DownRight,
}

impl Probe {
    /// Probes in index order; the index is the tie-break authority
    pub const ALL: [Probe; PROBE_COUNT] = [
        Probe::Left,
        Probe::Right,
        Probe::Up,
        Probe::UpLeft,
        Probe::UpRight,
        Probe::DownLeft,
        Probe::DownRight,
    ];

    /// Offset from the player centre for a probe reach of `distance`
    #[must_use]
    pub fn offset(self, distance: f64) -> (f64, f64) {
        match self {
            Self::Left => (-distance, 0.0),
            Self::Right => (distance, 0.0),
            Self::Up => (0.0, distance),
            Self::UpLeft => (-distance, distance),
            Self::UpRight => (distance, distance),
            Self::DownLeft => (-distance, -distance),
            Self::DownRight => (distance, -distance),
        }
    }

    /// Position in [`Probe::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What one probe sensed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeReading {
    /// Category found at the probe location
    pub contact: ContactKind,
    /// Whether this probe is the one nearest to the goal
    pub closest_to_goal: bool,
}

/// Ordered readings of all seven probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RadarState(pub [ProbeReading; PROBE_COUNT]);

impl RadarState {
    /// Reading for a given probe
    #[must_use]
    pub fn reading(&self, probe: Probe) -> ProbeReading {
        self.0[probe.index()]
    }

    /// The probe flagged as closest to the goal
    #[must_use]
    pub fn closest(&self) -> Option<Probe> {
        Probe::ALL
            .into_iter()
            .find(|probe| self.reading(*probe).closest_to_goal)
    }
}

/// Discretized situation of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Exact integer pixel position
    Pixel {
        /// Horizontal pixel
        x: i64,
        /// Vertical pixel
        y: i64,
    },
    /// Position snapped down to the tile grid
    Tiled {
        /// Horizontal tile origin in pixels
        x: i64,
        /// Vertical tile origin in pixels
        y: i64,
    },
    /// Readings of the radar probes
    Radar(RadarState),
}

impl State {
    /// Deterministic string key: `px:X,Y`, `tile:X,Y` or `radar:k0,..,k6`
    /// where the closest-to-goal probe carries a trailing `*`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Pixel { x, y } => format!("px:{x},{y}"),
            Self::Tiled { x, y } => format!("tile:{x},{y}"),
            Self::Radar(radar) => {
                let readings: Vec<String> = radar
                    .0
                    .iter()
                    .map(|r| {
                        let mark = if r.closest_to_goal { "*" } else { "" };
                        format!("{}{mark}", r.contact.name())
                    })
                    .collect();
                format!("radar:{}", readings.join(","))
            }
        }
    }

    /// Grid coordinates for position states
    #[must_use]
    pub fn coordinates(&self) -> Option<(i64, i64)> {
        match self {
            Self::Pixel { x, y } | Self::Tiled { x, y } => Some((*x, *y)),
            Self::Radar(_) => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn parse_pair(body: &str, key: &str) -> crate::Result<(i64, i64)> {
    let invalid = || RLError::InvalidState(format!("malformed coordinate key: {key}"));
    let (x, y) = body.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok((x, y))
}

impl FromStr for State {
    type Err = RLError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (prefix, body) = key
            .split_once(':')
            .ok_or_else(|| RLError::InvalidState(format!("missing state prefix: {key}")))?;

        match prefix {
            "px" => parse_pair(body, key).map(|(x, y)| Self::Pixel { x, y }),
            "tile" => parse_pair(body, key).map(|(x, y)| Self::Tiled { x, y }),
            "radar" => {
                let parts: Vec<&str> = body.split(',').collect();
                if parts.len() != PROBE_COUNT {
                    return Err(RLError::InvalidState(format!(
                        "radar key needs {PROBE_COUNT} readings: {key}"
                    )));
                }
                let mut readings = [ProbeReading {
                    contact: ContactKind::Empty,
                    closest_to_goal: false,
                }; PROBE_COUNT];
                for (slot, part) in readings.iter_mut().zip(parts) {
                    let (name, closest) = match part.strip_suffix('*') {
                        Some(name) => (name, true),
                        None => (part, false),
                    };
                    let contact = ContactKind::from_name(name).ok_or_else(|| {
                        RLError::InvalidState(format!("unknown contact kind {name} in {key}"))
                    })?;
                    *slot = ProbeReading {
                        contact,
                        closest_to_goal: closest,
                    };
                }
                if readings.iter().filter(|r| r.closest_to_goal).count() != 1 {
                    return Err(RLError::InvalidState(format!(
                        "radar key must flag exactly one closest probe: {key}"
                    )));
                }
                Ok(Self::Radar(RadarState(readings)))
            }
            other => Err(RLError::InvalidState(format!("unknown state prefix {other} in {key}"))),
        }
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    /// Touched deathground
    Death,
    /// Fell off the map
    OutOfBounds,
    /// Reached the goal
    Goal,
    /// Host asked for a restart
    Restart,
    /// Tick budget exhausted
    TimeLimit,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Death => "death",
            Self::OutOfBounds => "out_of_bounds",
            Self::Goal => "goal",
            Self::Restart => "restart",
            Self::TimeLimit => "time_limit",
        };
        f.write_str(name)
    }
}
