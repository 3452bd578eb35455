//! Value table backends
//!
//! Bounded discretizations use [`DenseTable`], a zero-filled array with one
//! row per enumerable grid position. Radar states are open-ended and go into
//! [`LazyTable`], which grows by one zero row per newly observed state and
//! never shrinks.
//!
//! Dense tables cost `(x/step + 1) * (y/step + 1) * actions` floats up front.
//! Pixel mode on a large map is therefore expensive; nothing here caps it.

use indexmap::IndexMap;
use ndarray::Array2;

use mephisto_rl_core::{
    ActionValueTable, AgentConfig, DiscretizationMode, MapBounds, RLError, Result, State,
};

/// Which position states a dense table is addressed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grid {
    /// One row per pixel
    Pixel,
    /// One row per tile origin
    Tiled {
        /// Tile edge length in pixels
        tile_size: i64,
    },
}

impl Grid {
    fn step(self) -> i64 {
        match self {
            Self::Pixel => 1,
            Self::Tiled { tile_size } => tile_size,
        }
    }

    fn state(self, x: i64, y: i64) -> State {
        match self {
            Self::Pixel => State::Pixel { x, y },
            Self::Tiled { .. } => State::Tiled { x, y },
        }
    }
}

/// Eagerly enumerated table over a bounded grid
#[derive(Debug, Clone)]
pub struct DenseTable {
    grid: Grid,
    bounds: MapBounds,
    /// Rows in the y direction
    rows_y: usize,
    q: Array2<f64>,
}

impl DenseTable {
    /// Enumerate every grid position within `bounds` and zero every action
    pub fn new(grid: Grid, bounds: MapBounds, num_actions: usize) -> Result<Self> {
        let step = grid.step();
        if step <= 0 || bounds.x < 0 || bounds.y < 0 {
            return Err(RLError::InvalidConfiguration(format!(
                "cannot enumerate {bounds} with step {step}"
            )));
        }
        let cells = |bound: i64| {
            (bound / step)
                .checked_add(1)
                .and_then(|n| usize::try_from(n).ok())
        };
        let size = cells(bounds.x)
            .zip(cells(bounds.y))
            .and_then(|(nx, ny)| nx.checked_mul(ny).map(|n| (n, ny)))
            .filter(|(n, _)| {
                n.checked_mul(num_actions)
                    .and_then(|len| len.checked_mul(std::mem::size_of::<f64>()))
                    .is_some_and(|bytes| isize::try_from(bytes).is_ok())
            });
        let Some((states, rows_y)) = size else {
            return Err(RLError::InvalidConfiguration(format!(
                "state space for {bounds} does not fit in memory"
            )));
        };

        Ok(Self {
            grid,
            bounds,
            rows_y,
            q: Array2::zeros((states, num_actions)),
        })
    }

    /// Bounds the table was enumerated for
    #[must_use]
    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    fn out_of_bounds(&self, state: &State) -> RLError {
        RLError::StateOutOfBounds {
            state: state.key(),
            bounds: self.bounds.to_string(),
        }
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn index(&self, state: &State) -> Result<usize> {
        let (x, y) = match (self.grid, state) {
            (Grid::Pixel, State::Pixel { x, y }) | (Grid::Tiled { .. }, State::Tiled { x, y }) => {
                (*x, *y)
            }
            _ => {
                return Err(RLError::InvalidState(format!(
                    "{state} does not belong to a {:?} table",
                    self.grid
                )))
            }
        };
        let step = self.grid.step();
        if !self.bounds.contains(x, y) || x % step != 0 || y % step != 0 {
            return Err(self.out_of_bounds(state));
        }
        Ok((x / step) as usize * self.rows_y + (y / step) as usize)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn state_at(&self, index: usize) -> State {
        let step = self.grid.step();
        let x = (index / self.rows_y) as i64 * step;
        let y = (index % self.rows_y) as i64 * step;
        self.grid.state(x, y)
    }
}

impl ActionValueTable for DenseTable {
    fn num_actions(&self) -> usize {
        self.q.ncols()
    }

    fn len(&self) -> usize {
        self.q.nrows()
    }

    fn is_lazy(&self) -> bool {
        false
    }

    fn ensure(&mut self, state: &State) -> Result<()> {
        self.index(state).map(|_| ())
    }

    fn row(&self, state: &State) -> Result<&[f64]> {
        let index = self.index(state)?;
        self.q
            .row(index)
            .to_slice()
            .ok_or_else(|| RLError::InvalidState(format!("row for {state} is not contiguous")))
    }

    fn row_mut(&mut self, state: &State) -> Result<&mut [f64]> {
        let index = self.index(state)?;
        self.q
            .row_mut(index)
            .into_slice()
            .ok_or_else(|| RLError::InvalidState(format!("row for {state} is not contiguous")))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (State, &[f64])> + '_> {
        Box::new(
            self.q
                .outer_iter()
                .enumerate()
                .filter_map(|(i, row)| row.to_slice().map(|values| (self.state_at(i), values))),
        )
    }
}

/// Table that creates a zero row the first time a state is seen
#[derive(Debug, Clone, Default)]
pub struct LazyTable {
    rows: IndexMap<State, Vec<f64>>,
    num_actions: usize,
}

impl LazyTable {
    /// Create an empty table
    #[must_use]
    pub fn new(num_actions: usize) -> Self {
        Self {
            rows: IndexMap::new(),
            num_actions,
        }
    }

    /// Insert a complete row, e.g. when restoring a snapshot
    pub fn insert_row(&mut self, state: State, values: Vec<f64>) -> Result<()> {
        if values.len() != self.num_actions {
            return Err(RLError::InvalidState(format!(
                "row for {state} has {} values, expected {}",
                values.len(),
                self.num_actions
            )));
        }
        self.rows.insert(state, values);
        Ok(())
    }

    /// Whether a state already has a row
    #[must_use]
    pub fn contains(&self, state: &State) -> bool {
        self.rows.contains_key(state)
    }
}

impl ActionValueTable for LazyTable {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn ensure(&mut self, state: &State) -> Result<()> {
        let n = self.num_actions;
        self.rows.entry(*state).or_insert_with(|| vec![0.0; n]);
        Ok(())
    }

    fn row(&self, state: &State) -> Result<&[f64]> {
        self.rows
            .get(state)
            .map(Vec::as_slice)
            .ok_or_else(|| RLError::InvalidState(format!("{state} has not been observed yet")))
    }

    fn row_mut(&mut self, state: &State) -> Result<&mut [f64]> {
        self.rows
            .get_mut(state)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| RLError::InvalidState(format!("{state} has not been observed yet")))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (State, &[f64])> + '_> {
        Box::new(self.rows.iter().map(|(state, row)| (*state, row.as_slice())))
    }
}

/// Build the backend the configured mode calls for
pub fn build_table(config: &AgentConfig) -> Result<Box<dyn ActionValueTable>> {
    let num_actions = config.actions.len();
    let table: Box<dyn ActionValueTable> = match config.mode {
        DiscretizationMode::Pixel => {
            Box::new(DenseTable::new(Grid::Pixel, config.bounds, num_actions)?)
        }
        DiscretizationMode::Tiled { tile_size } => Box::new(DenseTable::new(
            Grid::Tiled { tile_size },
            config.bounds,
            num_actions,
        )?),
        DiscretizationMode::Radar { .. } | DiscretizationMode::Random => {
            Box::new(LazyTable::new(num_actions))
        }
    };
    Ok(table)
}
