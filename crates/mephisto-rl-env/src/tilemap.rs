//! ASCII tile maps and collision queries

use ndarray::Array2;
use std::ops::Range;
use std::path::Path;

use mephisto_rl_core::{CollisionQuery, ContactKind, MapBounds, Point, RLError, Result};

/// Level shipped with the crate: a floor with a lava pit, two ledges and the
/// goal on the upper right.
pub const DEFAULT_LEVEL: &str = "\
................
...............G
...........#####
................
.......###......
................
.S..............
#######^^^######
";

/// Axis-aligned box in map pixels, `y` pointing up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Left edge
    pub left: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
    /// Top edge
    pub top: f64,
}

impl Aabb {
    /// Box centred on `centre`
    #[must_use]
    pub fn around(centre: Point, half_width: f64, half_height: f64) -> Self {
        Self {
            left: centre.x - half_width,
            right: centre.x + half_width,
            bottom: centre.y - half_height,
            top: centre.y + half_height,
        }
    }

    /// Same box moved by `(dx, dy)`
    #[must_use]
    pub fn shifted(self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            right: self.right + dx,
            bottom: self.bottom + dy,
            top: self.top + dy,
        }
    }
}

/// Grid of tiles parsed from text.
///
/// `#` is a platform, `^` deathground, `G` goal, `S` the start and `.` or a
/// space is empty. The first text row is the top of the map; rows are stored
/// bottom-up so that row 0 sits on `y = 0`.
#[derive(Debug, Clone)]
pub struct TileMap {
    tiles: Array2<ContactKind>,
    tile_size: f64,
    start: Point,
    goal: Point,
}

impl TileMap {
    /// Parse a map from text with square tiles of `tile_size` pixels
    #[allow(clippy::cast_precision_loss)]
    pub fn parse(text: &str, tile_size: f64) -> Result<Self> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(RLError::InvalidConfiguration(format!(
                "tile size must be positive, got {tile_size}"
            )));
        }

        // A row of spaces is a row of empty tiles
        let rows: Vec<&str> = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::trim_end)
            .collect();
        let height = rows.len();
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Err(RLError::InvalidConfiguration("tile map is empty".to_string()));
        }

        let centre = |row: usize, col: usize| {
            Point::new((col as f64 + 0.5) * tile_size, (row as f64 + 0.5) * tile_size)
        };

        let mut tiles = Array2::from_elem((height, width), ContactKind::Empty);
        let mut start = None;
        let mut goal = None;
        for (line_no, line) in rows.iter().enumerate() {
            let row = height - 1 - line_no;
            for (col, ch) in line.chars().enumerate() {
                tiles[[row, col]] = match ch {
                    '#' => ContactKind::Platform,
                    '^' => ContactKind::Deathground,
                    'G' => {
                        goal.get_or_insert_with(|| centre(row, col));
                        ContactKind::Goal
                    }
                    'S' => {
                        if start.replace(centre(row, col)).is_some() {
                            return Err(RLError::InvalidConfiguration(
                                "tile map has more than one start".to_string(),
                            ));
                        }
                        ContactKind::Empty
                    }
                    '.' | ' ' => ContactKind::Empty,
                    other => {
                        return Err(RLError::InvalidConfiguration(format!(
                            "unknown tile {other:?} at line {}, column {}",
                            line_no + 1,
                            col + 1
                        )))
                    }
                };
            }
        }

        let start = start
            .ok_or_else(|| RLError::InvalidConfiguration("tile map has no start".to_string()))?;
        let goal =
            goal.ok_or_else(|| RLError::InvalidConfiguration("tile map has no goal".to_string()))?;

        Ok(Self {
            tiles,
            tile_size,
            start,
            goal,
        })
    }

    /// Read and parse a map file
    pub async fn from_file(path: impl AsRef<Path>, tile_size: f64) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::parse(&text, tile_size)
    }

    /// Columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.tiles.ncols()
    }

    /// Rows
    #[must_use]
    pub fn height(&self) -> usize {
        self.tiles.nrows()
    }

    /// Tile edge in pixels
    #[must_use]
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Map width in pixels
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn pixel_width(&self) -> f64 {
        self.width() as f64 * self.tile_size
    }

    /// Map height in pixels
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn pixel_height(&self) -> f64 {
        self.height() as f64 * self.tile_size
    }

    /// Pixel extents
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn bounds(&self) -> MapBounds {
        MapBounds::new(self.pixel_width() as i64, self.pixel_height() as i64)
    }

    /// Centre of the start tile
    #[must_use]
    pub fn start(&self) -> Point {
        self.start
    }

    /// Centre of the first goal tile, reading top to bottom and left to right
    #[must_use]
    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Tile under `point`; anything outside the map is empty
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn kind_at(&self, point: Point) -> ContactKind {
        if point.x < 0.0 || point.y < 0.0 {
            return ContactKind::Empty;
        }
        let col = (point.x / self.tile_size) as usize;
        let row = (point.y / self.tile_size) as usize;
        self.tiles
            .get([row, col])
            .copied()
            .unwrap_or(ContactKind::Empty)
    }

    /// Cells of `kind` that overlap `area`, as boxes. Touching edges do not
    /// count as overlap.
    pub fn cells_overlapping(
        &self,
        area: Aabb,
        kind: ContactKind,
    ) -> impl Iterator<Item = Aabb> + '_ {
        let rows = span(area.bottom, area.top, self.tile_size, self.height());
        let cols = span(area.left, area.right, self.tile_size, self.width());
        rows.flat_map(move |row| cols.clone().map(move |col| (row, col)))
            .filter(move |&(row, col)| self.tiles[[row, col]] == kind)
            .map(move |(row, col)| self.cell(row, col))
    }

    /// Whether any cell of `kind` overlaps `area`
    #[must_use]
    pub fn overlaps(&self, area: Aabb, kind: ContactKind) -> bool {
        self.cells_overlapping(area, kind).next().is_some()
    }

    #[allow(clippy::cast_precision_loss)]
    fn cell(&self, row: usize, col: usize) -> Aabb {
        let size = self.tile_size;
        Aabb {
            left: col as f64 * size,
            right: (col + 1) as f64 * size,
            bottom: row as f64 * size,
            top: (row + 1) as f64 * size,
        }
    }
}

impl CollisionQuery for TileMap {
    fn collides(&self, point: Point, kind: ContactKind) -> bool {
        self.kind_at(point) == kind
    }
}

/// Indices of the cells covering the open interval `(lo, hi)`
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn span(lo: f64, hi: f64, size: f64, count: usize) -> Range<usize> {
    let first = (lo / size).floor().max(0.0);
    let last = (hi / size).ceil().min(count as f64);
    if last <= first {
        0..0
    } else {
        first as usize..last as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_level_parses() {
        let map = TileMap::parse(DEFAULT_LEVEL, 64.0).unwrap();
        assert_eq!((map.width(), map.height()), (16, 8));
        assert_eq!(map.bounds(), MapBounds::new(1024, 512));
        assert_eq!(map.start(), Point::new(96.0, 96.0));
        assert_eq!(map.goal(), Point::new(992.0, 416.0));
    }

    #[test]
    fn test_first_row_is_top() {
        let map = TileMap::parse("G..\n.S.\n#^#\n", 10.0).unwrap();
        assert_eq!(map.kind_at(Point::new(5.0, 5.0)), ContactKind::Platform);
        assert_eq!(map.kind_at(Point::new(15.0, 5.0)), ContactKind::Deathground);
        assert_eq!(map.kind_at(Point::new(5.0, 25.0)), ContactKind::Goal);
        assert_eq!(map.kind_at(Point::new(15.0, 15.0)), ContactKind::Empty);
        assert_relative_eq!(map.start().y, 15.0);
    }

    #[test]
    fn test_outside_is_empty() {
        let map = TileMap::parse("###\n#SG\n###\n", 10.0).unwrap();
        for point in [
            Point::new(-0.1, 5.0),
            Point::new(5.0, -3.0),
            Point::new(30.0, 5.0),
            Point::new(5.0, 31.0),
        ] {
            assert_eq!(map.kind_at(point), ContactKind::Empty);
            assert!(map.collides(point, ContactKind::Empty));
            assert!(!map.collides(point, ContactKind::Platform));
        }
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let map = TileMap::parse("S\n#####G\n", 64.0).unwrap();
        assert_eq!(map.width(), 6);
        assert_eq!(map.kind_at(Point::new(200.0, 100.0)), ContactKind::Empty);
    }

    #[test]
    fn test_row_of_spaces_is_kept() {
        let map = TileMap::parse("G...\n    \n.S..\n####\n", 64.0).unwrap();
        assert_eq!((map.width(), map.height()), (4, 4));
        assert_eq!(map.goal(), Point::new(32.0, 224.0));
        assert_eq!(map.start(), Point::new(96.0, 96.0));
        assert_eq!(map.kind_at(Point::new(32.0, 160.0)), ContactKind::Empty);
    }

    #[test]
    fn test_invalid_maps_rejected() {
        for text in ["", "....\n####\n", "S...\n####\n", "SG\nSG\n", "SG?\n###\n"] {
            assert!(
                matches!(TileMap::parse(text, 64.0), Err(RLError::InvalidConfiguration(_))),
                "{text:?}"
            );
        }
        assert!(TileMap::parse("SG", 0.0).is_err());
    }

    #[test]
    fn test_touching_is_not_overlapping() {
        let map = TileMap::parse("SG\n##\n", 64.0).unwrap();
        let standing = Aabb::around(Point::new(32.0, 96.0), 24.0, 32.0);
        assert!(!map.overlaps(standing, ContactKind::Platform));
        assert!(map.overlaps(standing.shifted(0.0, -1.0), ContactKind::Platform));

        let beside_goal = Aabb::around(Point::new(40.0, 96.0), 24.0, 32.0);
        assert!(!map.overlaps(beside_goal, ContactKind::Goal));
        assert!(map.overlaps(beside_goal.shifted(0.5, 0.0), ContactKind::Goal));
    }

    #[test]
    fn test_cells_overlapping_reports_boxes() {
        let map = TileMap::parse("S..G\n####\n", 64.0).unwrap();
        let area = Aabb::around(Point::new(120.0, 60.0), 24.0, 32.0);
        let cells: Vec<Aabb> = map.cells_overlapping(area, ContactKind::Platform).collect();
        assert_eq!(cells.len(), 2);
        assert_relative_eq!(cells[0].left, 64.0);
        assert_relative_eq!(cells[1].left, 128.0);
        assert_relative_eq!(cells[0].top, 64.0);
    }

    #[tokio::test]
    async fn test_from_file() {
        let path = std::env::temp_dir().join(format!("mephisto_level_{}.txt", std::process::id()));
        tokio::fs::write(&path, DEFAULT_LEVEL).await.unwrap();
        let map = TileMap::from_file(&path, 64.0).await.unwrap();
        assert_eq!(map.width(), 16);
        tokio::fs::remove_file(path).await.ok();
    }
}
