//! Woods2: a toroidal grid world with food hidden among rocks

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use xcsr_core::{
    Action, ActionSpace, Environment, Outcome, Result, Situation, SituationSpace, XcsError,
};

const BLOCK: usize = 5;
const ROWS: usize = BLOCK * 3;
const COLS: usize = BLOCK * 6;

/// Reward for stepping onto food
pub const FOOD_REWARD: f64 = 1000.0;
/// Reward for every other move
pub const STEP_REWARD: f64 = 0.01;

/// Row/column offset of each action: N, NE, E, SE, S, SW, W, NW
const MOVES: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Neighbour order of the sensed situation: NW, N, NE, W, E, SW, S, SE
const VISION: [usize; 8] = [7, 0, 1, 6, 2, 5, 4, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    RockO,
    RockQ,
    FoodF,
    FoodG,
}

impl Cell {
    fn code(self) -> [u8; 3] {
        match self {
            Cell::Empty => [0, 0, 0],
            Cell::RockO => [0, 1, 0],
            Cell::RockQ => [0, 1, 1],
            Cell::FoodF => [1, 1, 0],
            Cell::FoodG => [1, 1, 1],
        }
    }

    fn is_rock(self) -> bool {
        matches!(self, Cell::RockO | Cell::RockQ)
    }

    fn is_food(self) -> bool {
        matches!(self, Cell::FoodF | Cell::FoodG)
    }
}

/// Woods2 environment.
///
/// The world is a 15 x 30 torus tiled with 5 x 5 blocks. Each block holds a
/// 3 x 3 patch of rock with one food cell on its top edge. The animat senses
/// its eight neighbours, three bits each, and moves in one of eight
/// directions. Rocks block movement; reaching food pays 1000 and ends the
/// episode, any other move pays 0.01. Each reset redraws rock and food
/// kinds and drops the animat on a random empty cell.
pub struct Woods2 {
    grid: Vec<Cell>,
    row: usize,
    col: usize,
    episode_over: bool,
    space: SituationSpace,
    rng: StdRng,
}

impl Woods2 {
    /// World seeded with `seed`
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut world = Self {
            grid: vec![Cell::Empty; ROWS * COLS],
            row: 0,
            col: 0,
            episode_over: false,
            space: SituationSpace::uniform(24, 0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        };
        world.rebuild();
        world
    }

    /// Current animat position as `(row, column)`
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Render the world, `*` marking the animat
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((COLS + 1) * ROWS);
        for r in 0..ROWS {
            for c in 0..COLS {
                let ch = if (r, c) == (self.row, self.col) {
                    '*'
                } else {
                    match self.cell(r, c) {
                        Cell::Empty => '.',
                        Cell::RockO => 'O',
                        Cell::RockQ => 'Q',
                        Cell::FoodF => 'F',
                        Cell::FoodG => 'G',
                    }
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }

    fn rebuild(&mut self) {
        self.grid.fill(Cell::Empty);
        for top in (0..ROWS).step_by(BLOCK) {
            for left in (0..COLS).step_by(BLOCK) {
                for r in top + 1..top + BLOCK - 1 {
                    for c in left + 1..left + BLOCK - 1 {
                        let coin = self.rng.gen_bool(0.5);
                        let cell = match (r == top + 1 && c == left + 3, coin) {
                            (true, true) => Cell::FoodF,
                            (true, false) => Cell::FoodG,
                            (false, true) => Cell::RockO,
                            (false, false) => Cell::RockQ,
                        };
                        self.grid[r * COLS + c] = cell;
                    }
                }
            }
        }

        let empty: Vec<usize> = (0..self.grid.len())
            .filter(|&i| self.grid[i] == Cell::Empty)
            .collect();
        let start = empty[self.rng.gen_range(0..empty.len())];
        self.row = start / COLS;
        self.col = start % COLS;
        self.episode_over = false;
    }

    fn cell(&self, row: usize, col: usize) -> Cell {
        self.grid[row * COLS + col]
    }

    fn neighbour(&self, direction: usize) -> (usize, usize) {
        let (dr, dc) = MOVES[direction];
        (
            (self.row as isize + dr).rem_euclid(ROWS as isize) as usize,
            (self.col as isize + dc).rem_euclid(COLS as isize) as usize,
        )
    }
}

impl Environment for Woods2 {
    fn name(&self) -> &str {
        "woods2"
    }

    fn situation_space(&self) -> &SituationSpace {
        &self.space
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(MOVES.len())
    }

    fn situation(&self) -> Situation {
        let values = VISION
            .iter()
            .flat_map(|&d| {
                let (r, c) = self.neighbour(d);
                self.cell(r, c).code()
            })
            .map(f64::from)
            .collect();
        Situation(values)
    }

    fn commit(&mut self, action: Action) -> Result<Outcome> {
        if !self.action_space().contains(action) {
            return Err(XcsError::InvalidAction(format!("{action} in woods2")));
        }
        if self.episode_over {
            return Err(XcsError::Environment("woods2 episode already over".into()));
        }

        let (r, c) = self.neighbour(action.index());
        let target = self.cell(r, c);
        if !target.is_rock() {
            self.row = r;
            self.col = c;
        }
        if target.is_food() {
            self.episode_over = true;
            tracing::trace!(row = r, col = c, "food reached");
            Ok(Outcome::terminal(FOOD_REWARD))
        } else {
            Ok(Outcome::running(STEP_REWARD))
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.rebuild();
        Ok(())
    }

    fn is_terminated(&self) -> bool {
        self.episode_over
    }

    fn is_multi_step(&self) -> bool {
        true
    }
}
