use crate::types::{CellState, Tile};

// Authored layout: '#' wall, '.' pickup, ' ' open floor. The single open
// floor cell at the middle of row 8 is the adversary holding area. The
// border must stay fully walled or agents walk off the grid.
pub const STANDARD_LAYOUT: [&str; 15] = [
    "#########################",
    "#...........#...........#",
    "#.###.#.###.#.###.#.###.#",
    "#.###.#.###.#.###.#.###.#",
    "#.......................#",
    "#.###.###.#####.###.###.#",
    "#.....#.....#.....#.....#",
    "#####.#####.#.#####.#####",
    "#........... ...........#",
    "#####.#####.#.#####.#####",
    "#...........#...........#",
    "#.###.#.###.#.###.#.###.#",
    "#.###.#.###.#.###.#.###.#",
    "#.......................#",
    "#########################",
];

#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    cells: Vec<CellState>,
    initial: Vec<CellState>,
}

impl Maze {
    pub fn standard() -> Self {
        Self::from_rows(&STANDARD_LAYOUT)
    }

    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map(|row| row.len()).unwrap_or(0) as i32;
        let mut cells = Vec::with_capacity((width * height).max(0) as usize);
        for row in rows {
            assert_eq!(row.len() as i32, width, "maze rows must share one width");
            for cell in row.chars() {
                cells.push(match cell {
                    '#' => CellState::Wall,
                    '.' => CellState::Pickup,
                    _ => CellState::Empty,
                });
            }
        }
        let initial = cells.clone();
        Self {
            width,
            height,
            cells,
            initial,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_wall(&self, tile_x: i32, tile_y: i32) -> bool {
        // Out of bounds counts as wall so no caller ever indexes outside
        // the grid.
        self.cell_at(tile_x, tile_y) == CellState::Wall
    }

    pub fn cell_at(&self, tile_x: i32, tile_y: i32) -> CellState {
        if tile_x < 0 || tile_x >= self.width || tile_y < 0 || tile_y >= self.height {
            return CellState::Wall;
        }
        self.cells[(tile_y * self.width + tile_x) as usize]
    }

    pub fn consume_pickup(&mut self, tile_x: i32, tile_y: i32) -> bool {
        if self.cell_at(tile_x, tile_y) != CellState::Pickup {
            return false;
        }
        self.cells[(tile_y * self.width + tile_x) as usize] = CellState::Empty;
        true
    }

    pub fn all_pickups_consumed(&self) -> bool {
        self.cells.iter().all(|cell| *cell != CellState::Pickup)
    }

    pub fn pickup_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == CellState::Pickup)
            .count()
    }

    pub fn reset_to_initial(&mut self) {
        self.cells.copy_from_slice(&self.initial);
    }

    pub fn pickup_tiles(&self) -> Vec<Tile> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cell_at(x, y) == CellState::Pickup {
                    out.push(Tile { x, y });
                }
            }
        }
        out
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| match self.cell_at(x, y) {
                        CellState::Wall => '#',
                        CellState::Pickup => '.',
                        CellState::Empty => ' ',
                    })
                    .collect()
            })
            .collect()
    }
}
