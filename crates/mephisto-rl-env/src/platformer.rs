//! Headless kinematic platformer
//!
//! One call to [`Environment::step`] is one simulation tick. Velocities are in
//! pixels per tick and `y` points up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mephisto_rl_core::{
    Action, CollisionQuery, ContactKind, ControlInput, Environment, MapBounds, Point,
    RLError, RawObservation, Result, RewardEvent, RewardSchedule, Step, Terminal,
};

use crate::tilemap::{Aabb, TileMap};

/// Player physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Horizontal walking speed
    pub movement_speed: f64,
    /// Downward acceleration per tick
    pub gravity: f64,
    /// Vertical speed at take-off
    pub jump_speed: f64,
    /// Speed along the dash direction
    pub dash_speed: f64,
    /// Ticks a dash lasts
    pub dash_duration: u32,
    /// Ticks after a dash before the next one
    pub dash_cooldown: u32,
    /// Half the player's width
    pub half_width: f64,
    /// Half the player's height
    pub half_height: f64,
    /// Tile edge in pixels
    pub tile_size: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            movement_speed: 10.0,
            gravity: 1.5,
            jump_speed: 25.0,
            dash_speed: 25.0,
            dash_duration: 6,
            dash_cooldown: 120,
            half_width: 24.0,
            half_height: 32.0,
            tile_size: 64.0,
        }
    }
}

impl EnvConfig {
    /// Reject physics that cannot be simulated
    pub fn validate(&self) -> Result<()> {
        let speeds = [
            self.movement_speed,
            self.gravity,
            self.jump_speed,
            self.dash_speed,
        ];
        if speeds.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(RLError::InvalidConfiguration(
                "speeds and gravity must be finite and non-negative".to_string(),
            ));
        }
        if !(self.half_width > 0.0 && self.half_height > 0.0) {
            return Err(RLError::InvalidConfiguration(format!(
                "player extents must be positive, got {}x{}",
                self.half_width, self.half_height
            )));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(RLError::InvalidConfiguration(format!(
                "tile size must be positive, got {}",
                self.tile_size
            )));
        }
        Self::check_fits(self.half_width, self.tile_size)
    }

    /// Edge warps keep the player inside the map only if it fits in a tile
    fn check_fits(half_width: f64, tile_size: f64) -> Result<()> {
        if 2.0 * half_width > tile_size {
            return Err(RLError::InvalidConfiguration(format!(
                "player width {} exceeds tile size {tile_size}",
                2.0 * half_width
            )));
        }
        Ok(())
    }
}

/// Player on a [`TileMap`], driven by discrete actions.
///
/// Per tick: held keys set the velocity (skipped while a dash is active),
/// gravity applies, the player moves one axis at a time and is pushed out of
/// platforms, the dash timer advances, the player wraps across the left and
/// right edges and is stopped at the top edge. Then the goal, falling below
/// the map and touching deathground are checked. The step penalty applies on
/// every tick and all triggered rewards are summed. Any terminal event puts
/// the player back at the start before the observation is taken.
#[derive(Debug, Clone)]
pub struct PlatformerEnv {
    map: TileMap,
    config: EnvConfig,
    rewards: RewardSchedule,
    position: Point,
    velocity: Point,
    dash_timer: u32,
    dash_cooldown: u32,
    dash_direction: (f64, f64),
    dashing: bool,
}

impl PlatformerEnv {
    /// Place a player at the map's start
    pub fn new(map: TileMap, config: EnvConfig, rewards: RewardSchedule) -> Result<Self> {
        config.validate()?;
        EnvConfig::check_fits(config.half_width, map.tile_size())?;
        let position = map.start();
        Ok(Self {
            map,
            config,
            rewards,
            position,
            velocity: Point::default(),
            dash_timer: 0,
            dash_cooldown: 0,
            dash_direction: (0.0, 0.0),
            dashing: false,
        })
    }

    /// Parse `level` and place a player on it
    pub fn from_ascii(level: &str, config: EnvConfig, rewards: RewardSchedule) -> Result<Self> {
        let map = TileMap::parse(level, config.tile_size)?;
        Self::new(map, config, rewards)
    }

    /// The level
    #[must_use]
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Physics settings
    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Player centre
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Player velocity in pixels per tick
    #[must_use]
    pub fn velocity(&self) -> Point {
        self.velocity
    }

    /// Whether a dash is in progress
    #[must_use]
    pub fn is_dashing(&self) -> bool {
        self.dashing
    }

    /// Ticks until the next dash is allowed
    #[must_use]
    pub fn dash_cooldown(&self) -> u32 {
        self.dash_cooldown
    }

    /// Whether the player stands on a platform
    #[must_use]
    pub fn grounded(&self) -> bool {
        self.map
            .overlaps(self.body().shifted(0.0, -1.0), ContactKind::Platform)
    }

    fn body(&self) -> Aabb {
        Aabb::around(self.position, self.config.half_width, self.config.half_height)
    }

    fn respawn(&mut self) {
        self.position = self.map.start();
        self.velocity = Point::default();
        self.dash_timer = 0;
        self.dash_cooldown = 0;
        self.dash_direction = (0.0, 0.0);
        self.dashing = false;
    }

    fn apply_controls(&mut self, controls: ControlInput) {
        if self.dash_timer > 0 {
            return;
        }
        let horizontal = f64::from(controls.horizontal());
        self.velocity.x = horizontal * self.config.movement_speed;

        if controls.up && self.grounded() {
            self.velocity.y = self.config.jump_speed;
        }
        if controls.dash && !self.dashing && self.dash_cooldown == 0 {
            self.dash_timer = self.config.dash_duration;
            self.dash_direction = (horizontal, f64::from(u8::from(controls.up)));
        }
    }

    fn move_horizontally(&mut self) {
        self.position.x += self.velocity.x;
        let half = self.config.half_width;
        let edge = {
            let hits = self.map.cells_overlapping(self.body(), ContactKind::Platform);
            if self.velocity.x > 0.0 {
                hits.map(|cell| cell.left - half).reduce(f64::min)
            } else if self.velocity.x < 0.0 {
                hits.map(|cell| cell.right + half).reduce(f64::max)
            } else {
                None
            }
        };
        if let Some(x) = edge {
            self.position.x = x;
            self.velocity.x = 0.0;
        }
    }

    fn move_vertically(&mut self) {
        self.position.y += self.velocity.y;
        let half = self.config.half_height;
        let edge = {
            let hits = self.map.cells_overlapping(self.body(), ContactKind::Platform);
            if self.velocity.y > 0.0 {
                hits.map(|cell| cell.bottom - half).reduce(f64::min)
            } else if self.velocity.y < 0.0 {
                hits.map(|cell| cell.top + half).reduce(f64::max)
            } else {
                None
            }
        };
        if let Some(y) = edge {
            self.position.y = y;
            self.velocity.y = 0.0;
        }
    }

    fn update_dash(&mut self) {
        if self.dash_timer > 0 {
            self.dash_timer -= 1;
            let (dx, dy) = self.dash_direction;
            let length = dx.hypot(dy);
            if length > 0.0 {
                self.dash_direction = (dx / length, dy / length);
            }
            self.velocity.x = self.dash_direction.0 * self.config.dash_speed;
            self.velocity.y = self.dash_direction.1 * self.config.dash_speed;
            self.dashing = true;
            return;
        }

        if self.dashing {
            self.velocity.x = self.dash_direction.0 * self.config.movement_speed;
            self.velocity.y = self.dash_direction.1 * self.config.movement_speed;
            self.dashing = false;
            self.dash_cooldown = self.config.dash_cooldown;
        }
        self.dash_cooldown = self.dash_cooldown.saturating_sub(1);
        self.dash_direction = (0.0, 0.0);
    }

    fn wrap_and_clamp(&mut self) {
        let width = 2.0 * self.config.half_width;
        let left_warp = self.map.tile_size() - width;
        let right_warp = self.map.pixel_width() + width - self.map.tile_size();
        if self.position.x > right_warp {
            self.position.x = left_warp;
        } else if self.position.x < left_warp {
            self.position.x = right_warp;
        }

        let ceiling = self.map.pixel_height() - self.config.half_height;
        if self.position.y > ceiling {
            self.position.y = ceiling;
            self.velocity.y = self.velocity.y.min(0.0);
        }
    }

    fn check_events(&self) -> (Vec<RewardEvent>, Option<Terminal>) {
        let mut events = vec![RewardEvent::Step];
        let mut terminal = None;
        let body = self.body();

        if self.map.overlaps(body, ContactKind::Goal) {
            events.push(RewardEvent::Goal);
            terminal = Some(Terminal::Goal);
        }
        if self.position.y < 0.0 {
            events.push(RewardEvent::Death);
            terminal.get_or_insert(Terminal::OutOfBounds);
        } else if self.map.overlaps(body, ContactKind::Deathground) {
            events.push(RewardEvent::Death);
            terminal.get_or_insert(Terminal::Death);
        }
        (events, terminal)
    }

    fn tick(&mut self, action: Action) -> Step {
        self.apply_controls(action.controls());
        self.velocity.y -= self.config.gravity;
        self.move_horizontally();
        self.move_vertically();
        self.update_dash();
        self.wrap_and_clamp();

        let (events, terminal) = self.check_events();
        let reward = self.rewards.total(&events);
        if let Some(reason) = terminal {
            debug!(%reason, position = %self.position, reward = reward.value(), "terminal event");
            self.respawn();
        }

        Step {
            observation: self.observation(),
            reward,
            events,
            terminal,
        }
    }
}

#[async_trait]
impl Environment for PlatformerEnv {
    fn observation(&self) -> RawObservation {
        RawObservation::new(self.position, self.map.goal())
    }

    fn start_observation(&self) -> RawObservation {
        RawObservation::new(self.map.start(), self.map.goal())
    }

    fn bounds(&self) -> MapBounds {
        self.map.bounds()
    }

    fn collisions(&self) -> &dyn CollisionQuery {
        &self.map
    }

    async fn reset(&mut self) -> Result<RawObservation> {
        self.respawn();
        Ok(self.observation())
    }

    async fn step(&mut self, action: Action) -> Result<Step> {
        Ok(self.tick(action))
    }
}
