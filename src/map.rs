mod distance;

pub use distance::DistanceTable;

use std::fmt;
use std::fs;
use std::str::FromStr;

use tracing::debug;

use crate::error::MapError;

pub type Position = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Wall,
    Shelf,
    Free,
    // Free for planning, only meaningful to task generation.
    Marked,
}

impl TileKind {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '#' => Some(TileKind::Wall),
            '$' => Some(TileKind::Shelf),
            'o' => Some(TileKind::Free),
            'P' => Some(TileKind::Marked),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            TileKind::Wall => '#',
            TileKind::Shelf => '$',
            TileKind::Free => 'o',
            TileKind::Marked => 'P',
        }
    }

    pub fn is_passable(self) -> bool {
        matches!(self, TileKind::Free | TileKind::Marked)
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    kind: TileKind,
    pub neighbors: Vec<Position>, // Stores coordinates of accessible neighbors
}

impl Tile {
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn is_passable(&self) -> bool {
        self.kind.is_passable()
    }
}

#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    pub fn from_file(path: &str) -> Result<Self, MapError> {
        let content =
            fs::read_to_string(path).map_err(|err| MapError::ReadFile(path.to_string(), err))?;
        let map: Map = content.parse()?;
        debug!("Loaded map {path} ({}x{})", map.height, map.width);
        Ok(map)
    }

    fn initialize_neighbors(&mut self) {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.grid[x][y].is_passable() {
                    self.grid[x][y].neighbors = self.compute_neighbors(x, y);
                }
            }
        }
    }

    fn compute_neighbors(&self, x: usize, y: usize) -> Vec<Position> {
        // Right, down, left, up. No stay move.
        let directions = [(0, 1), (1, 0), (0, -1), (-1, 0)];

        directions
            .iter()
            .filter_map(|&(dx, dy)| {
                let new_x = x as isize + dx;
                let new_y = y as isize + dy;
                self.is_open(new_x, new_y)
                    .then_some((new_x as usize, new_y as usize))
            })
            .collect()
    }

    /// Accessible 4-connected neighbors of a passable cell. Empty for blocked
    /// or out-of-bounds positions.
    pub fn get_neighbors(&self, position: Position) -> &[Position] {
        if !self.in_bounds(position) {
            return &[];
        }
        &self.grid[position.0][position.1].neighbors
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.0 < self.height && position.1 < self.width
    }

    pub fn is_accessible(&self, position: Position) -> bool {
        self.in_bounds(position) && self.grid[position.0][position.1].is_passable()
    }

    // Signed lookup so callers can probe one cell past the border.
    fn is_open(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && self.is_accessible((x as usize, y as usize))
    }

    /// Approximates a one-wide doorway: both vertical neighbors agree, both
    /// horizontal neighbors agree, and some diagonal neighbor is open.
    pub fn is_narrow(&self, position: Position) -> bool {
        if !self.is_accessible(position) {
            return false;
        }
        let (x, y) = (position.0 as isize, position.1 as isize);

        let vertical = self.is_open(x - 1, y) == self.is_open(x + 1, y);
        let horizontal = self.is_open(x, y - 1) == self.is_open(x, y + 1);
        let diagonal = self.is_open(x - 1, y - 1)
            || self.is_open(x - 1, y + 1)
            || self.is_open(x + 1, y - 1)
            || self.is_open(x + 1, y + 1);

        vertical && horizontal && diagonal
    }

    pub fn num_cells(&self) -> usize {
        self.height * self.width
    }

    pub fn index(&self, position: Position) -> usize {
        position.0 * self.width + position.1
    }

    pub fn position(&self, index: usize) -> Position {
        (index / self.width, index % self.width)
    }
}

impl FromStr for Map {
    type Err = MapError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        let first_row = lines
            .iter()
            .position(|line| !line.is_empty())
            .ok_or(MapError::Empty)?;
        let last_row = lines
            .iter()
            .rposition(|line| !line.is_empty())
            .ok_or(MapError::Empty)?;

        // Leading blank lines are rows of width zero, reported as ragged.
        let width = lines[first_row].chars().count();

        let mut grid = Vec::with_capacity(last_row + 1);
        for (row, line) in lines[..=last_row].iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }

            let tiles_row = line
                .chars()
                .enumerate()
                .map(|(col, symbol)| {
                    TileKind::from_symbol(symbol)
                        .map(|kind| Tile {
                            kind,
                            neighbors: Vec::new(),
                        })
                        .ok_or(MapError::UnknownSymbol { symbol, row, col })
                })
                .collect::<Result<Vec<_>, _>>()?;
            grid.push(tiles_row);
        }

        let mut map = Map {
            height: grid.len(),
            width,
            grid,
        };
        map.initialize_neighbors();

        Ok(map)
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            let line: String = row.iter().map(|tile| tile.kind.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
