//! Deterministic value table snapshots
//!
//! A snapshot maps each state key to a map from action name to value. Both
//! levels are sorted, so saving the same table twice yields identical bytes.
//! Snapshots are taken and restored between episodes, never during an update.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use mephisto_rl_core::{
    Action, ActionSet, ActionValueTable, AgentConfig, DiscretizationMode, RLError, Result, State,
};

use crate::table::{build_table, LazyTable};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of a value table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Format version
    pub version: u32,
    /// Discretization mode the table was learned under
    pub mode: DiscretizationMode,
    /// Action names in the agent's order
    pub actions: Vec<String>,
    /// State key -> action name -> value
    pub entries: BTreeMap<String, BTreeMap<String, f64>>,
}

impl TableSnapshot {
    /// Copy a table.
    ///
    /// Eager tables only record rows that moved away from zero since the
    /// rest is rebuilt on restore. Lazy tables record every row, because a
    /// row's presence is itself part of the table.
    #[must_use]
    pub fn capture(
        table: &dyn ActionValueTable,
        mode: DiscretizationMode,
        actions: &ActionSet,
    ) -> Self {
        let lazy = table.is_lazy();
        let entries = table
            .entries()
            .filter(|(_, row)| lazy || row.iter().any(|v| *v != 0.0))
            .map(|(state, row)| {
                let values = actions
                    .iter()
                    .zip(row)
                    .map(|(action, value)| (action.name().to_string(), *value))
                    .collect();
                (state.key(), values)
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            mode,
            actions: actions.names(),
            entries,
        }
    }

    /// Rebuild a table for an agent configured as `config`.
    ///
    /// Eager tables are enumerated at the configured bounds and then filled;
    /// lazy tables contain exactly the snapshot's rows.
    pub fn restore(&self, config: &AgentConfig) -> Result<Box<dyn ActionValueTable>> {
        self.check_compatible(config)?;

        let mut table: Box<dyn ActionValueTable> = if config.mode.is_eager() {
            build_table(config)?
        } else {
            Box::new(LazyTable::new(config.actions.len()))
        };

        for (key, values) in &self.entries {
            let state: State = key.parse()?;
            table.ensure(&state)?;
            let row = table.row_mut(&state)?;
            for (name, value) in values {
                let action: Action = name.parse()?;
                let index = config.actions.require_index(action)?;
                row[index] = *value;
            }
        }
        Ok(table)
    }

    fn check_compatible(&self, config: &AgentConfig) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RLError::Persistence(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if self.mode != config.mode {
            return Err(RLError::Persistence(format!(
                "snapshot was learned in {:?} mode, agent runs {:?}",
                self.mode, config.mode
            )));
        }
        let mut saved = self.actions.clone();
        let mut configured = config.actions.names();
        saved.sort();
        configured.sort();
        if saved != configured {
            return Err(RLError::Persistence(format!(
                "snapshot actions {:?} differ from configured {:?}",
                self.actions,
                config.actions.names()
            )));
        }
        Ok(())
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to `path`, creating parent directories as needed
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json()?).await?;
        info!(path = %path.display(), states = self.entries.len(), "saved value table");
        Ok(())
    }

    /// Read from `path`
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let snapshot = Self::from_json(&json)?;
        info!(path = %path.display(), states = snapshot.entries.len(), "loaded value table");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mephisto_rl_core::{ContactKind, MapBounds, ProbeReading, RadarState, PROBE_COUNT};

    fn radar_state(closest: usize, contact: ContactKind) -> State {
        let mut readings = [ProbeReading {
            contact,
            closest_to_goal: false,
        }; PROBE_COUNT];
        readings[closest].closest_to_goal = true;
        State::Radar(RadarState(readings))
    }

    fn radar_config() -> AgentConfig {
        AgentConfig {
            mode: DiscretizationMode::Radar { probe_distance: 64.0 },
            ..Default::default()
        }
    }

    fn tiled_config() -> AgentConfig {
        AgentConfig {
            mode: DiscretizationMode::Tiled { tile_size: 64 },
            bounds: MapBounds::new(256, 128),
            ..Default::default()
        }
    }

    fn assert_tables_match(a: &dyn ActionValueTable, b: &dyn ActionValueTable) {
        assert_eq!(a.len(), b.len());
        for (state, row) in a.entries() {
            let other = b.row(&state).unwrap();
            for (x, y) in row.iter().zip(other) {
                assert_relative_eq!(*x, *y);
            }
        }
    }

    #[test]
    fn test_lazy_round_trip_single_entry() {
        let config = radar_config();
        let mut table = LazyTable::new(config.actions.len());
        table.ensure(&radar_state(2, ContactKind::Empty)).unwrap();

        let snapshot = TableSnapshot::capture(&table, config.mode, &config.actions);
        let json = snapshot.to_json().unwrap();
        let restored = TableSnapshot::from_json(&json).unwrap().restore(&config).unwrap();

        assert!(restored.is_lazy());
        assert_eq!(restored.len(), 1);
        assert_tables_match(&table, restored.as_ref());
    }

    #[test]
    fn test_lazy_round_trip_values() {
        let config = radar_config();
        let mut table = LazyTable::new(config.actions.len());
        table
            .insert_row(radar_state(0, ContactKind::Platform), vec![0.1, -0.2, 1e-9, 123.456_789])
            .unwrap();
        table
            .insert_row(radar_state(6, ContactKind::Goal), vec![-1000.0, 0.0, 1.0 / 3.0, 7.0])
            .unwrap();

        let json = TableSnapshot::capture(&table, config.mode, &config.actions)
            .to_json()
            .unwrap();
        let restored = TableSnapshot::from_json(&json).unwrap().restore(&config).unwrap();
        assert_tables_match(&table, restored.as_ref());
    }

    #[test]
    fn test_eager_round_trip_skips_zero_rows() {
        let config = tiled_config();
        let mut table = build_table(&config).unwrap();
        table.row_mut(&State::Tiled { x: 128, y: 64 }).unwrap()[2] = -0.75;

        let snapshot = TableSnapshot::capture(table.as_ref(), config.mode, &config.actions);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries["tile:128,64"]["JUMP_LEFT"], -0.75);

        let restored = snapshot.restore(&config).unwrap();
        assert!(!restored.is_lazy());
        assert_tables_match(table.as_ref(), restored.as_ref());
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let config = radar_config();
        let mut a = LazyTable::new(config.actions.len());
        let mut b = LazyTable::new(config.actions.len());
        let s1 = radar_state(1, ContactKind::Empty);
        let s2 = radar_state(4, ContactKind::Platform);
        a.insert_row(s1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        a.insert_row(s2, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        b.insert_row(s2, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        b.insert_row(s1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let json_a = TableSnapshot::capture(&a, config.mode, &config.actions).to_json().unwrap();
        let json_b = TableSnapshot::capture(&b, config.mode, &config.actions).to_json().unwrap();
        assert_eq!(json_a, json_b);
    }

    #[test]
    fn test_mismatched_snapshot_rejected() {
        let config = radar_config();
        let table = LazyTable::new(config.actions.len());
        let snapshot = TableSnapshot::capture(&table, config.mode, &config.actions);

        assert!(matches!(snapshot.restore(&tiled_config()), Err(RLError::Persistence(_))));

        let mut extended = radar_config();
        extended.actions = ActionSet::extended();
        assert!(matches!(snapshot.restore(&extended), Err(RLError::Persistence(_))));
    }

    #[test]
    fn test_eager_out_of_bounds_key_rejected() {
        let config = tiled_config();
        let mut snapshot = TableSnapshot::capture(
            build_table(&config).unwrap().as_ref(),
            config.mode,
            &config.actions,
        );
        snapshot
            .entries
            .insert("tile:1024,0".to_string(), BTreeMap::from([("LEFT".to_string(), 1.0)]));
        assert!(matches!(
            snapshot.restore(&config),
            Err(RLError::StateOutOfBounds { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("mephisto_snapshot_{}", uuid::Uuid::new_v4()));
        let path = dir.join("tables").join("q.json");
        let config = radar_config();
        let mut table = LazyTable::new(config.actions.len());
        table
            .insert_row(radar_state(3, ContactKind::Deathground), vec![-0.5, 0.25, 0.0, 9.0])
            .unwrap();

        let snapshot = TableSnapshot::capture(&table, config.mode, &config.actions);
        snapshot.save(&path).await.unwrap();
        let loaded = TableSnapshot::load(&path).await.unwrap();
        assert_eq!(loaded, snapshot);

        std::fs::remove_dir_all(dir).ok();
    }
}
