//! 3x3 tic-tac-toe board.
//!
//! Cells are indexed row-major:
//!
//! ```text
//! 0 1 2
//! 3 4 5
//! 6 7 8
//! ```
//!
//! Player 0 plays `x` and always moves first; the player to move is derived
//! from the mark counts.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::cfr::game::{ActionId, PlayerId};

const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Result of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A player completed a line.
    Win(PlayerId),
    /// Full board, no line.
    Draw,
    /// Game still in progress.
    InProgress,
}

/// Errors from parsing a board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardParseError {
    /// A character that isn't a mark, an empty cell or a separator.
    #[error("unexpected character {0:?} in board")]
    UnexpectedChar(char),

    /// Not exactly nine cells.
    #[error("board has {0} cells, expected 9")]
    WrongCellCount(usize),
}

/// A tic-tac-toe position. Ordered cell by cell, empty before `x` before `o`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Board {
    cells: [Option<PlayerId>; 9],
}

impl Board {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Board from raw cells.
    pub fn from_cells(cells: [Option<PlayerId>; 9]) -> Self {
        Self { cells }
    }

    /// Mark at a cell.
    pub fn get(&self, index: usize) -> Option<PlayerId> {
        self.cells[index]
    }

    /// Whether a cell is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        self.cells[index].is_none()
    }

    /// The player to move: `x` unless it has more marks than `o`.
    pub fn current_player(&self) -> PlayerId {
        let count = |player| self.cells.iter().filter(|&&c| c == Some(player)).count();
        if count(0) <= count(1) {
            0
        } else {
            1
        }
    }

    /// Board after the current player marks `index`, or `None` if the cell
    /// is taken or out of range.
    pub fn play(&self, index: ActionId) -> Option<Self> {
        if index >= 9 || !self.is_empty(index) {
            return None;
        }
        let mut next = *self;
        next.cells[index] = Some(self.current_player());
        Some(next)
    }

    /// Winner, draw, or still in progress.
    pub fn outcome(&self) -> Outcome {
        for line in &LINES {
            if let Some(player) = self.cells[line[0]] {
                if self.cells[line[1]] == Some(player) && self.cells[line[2]] == Some(player) {
                    return Outcome::Win(player);
                }
            }
        }
        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    /// Whether every cell is marked.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Empty cells, ascending.
    pub fn possible_actions(&self) -> Vec<ActionId> {
        (0..9).filter(|&i| self.is_empty(i)).collect()
    }

    /// 90° clockwise rotation.
    pub fn rotate_clockwise(&self) -> Self {
        let mut cells = [None; 9];
        for row in 0..3 {
            for col in 0..3 {
                cells[col * 3 + (2 - row)] = self.cells[row * 3 + col];
            }
        }
        Self { cells }
    }

    /// Swap the top and bottom rows.
    pub fn vertical_flip(&self) -> Self {
        let mut cells = self.cells;
        cells.swap(0, 6);
        cells.swap(1, 7);
        cells.swap(2, 8);
        Self { cells }
    }

    /// All 8 rotations and reflections of the board.
    pub fn symmetries(&self) -> [Board; 8] {
        let r90 = self.rotate_clockwise();
        let r180 = r90.rotate_clockwise();
        let r270 = r180.rotate_clockwise();
        let flip = self.vertical_flip();
        let flip90 = flip.rotate_clockwise();
        let flip180 = flip90.rotate_clockwise();
        let flip270 = flip180.rotate_clockwise();
        [*self, r90, r180, r270, flip, flip90, flip180, flip270]
    }

    /// The smallest of the board's symmetries. Equal for boards that are
    /// rotations or reflections of each other.
    pub fn normal_form(&self) -> Self {
        self.symmetries().into_iter().min().unwrap_or(*self)
    }

    /// Legal moves, keeping only the first move leading to each normal form.
    pub fn unique_actions(&self) -> Vec<ActionId> {
        let mut seen = HashSet::new();
        self.possible_actions()
            .into_iter()
            .filter(|&action| {
                self.play(action)
                    .map(|next| seen.insert(next.normal_form()))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Base-10 encoding, one digit per cell (0 empty, 1 `x`, 2 `o`), offset
    /// by 10^11 so every board has the same width.
    pub fn numeric_key(&self) -> u64 {
        let mut key: u64 = 100_000_000_000;
        for (i, cell) in self.cells.iter().enumerate() {
            let digit = match cell {
                None => 0,
                Some(player) => *player as u64 + 1,
            };
            key += 10u64.pow(9 - i as u32) * digit;
        }
        key
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..3 {
                if col > 0 {
                    write!(f, " ")?;
                }
                let mark = match self.cells[row * 3 + col] {
                    None => '.',
                    Some(0) => 'x',
                    Some(_) => 'o',
                };
                write!(f, "{}", mark)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parse `x`, `o` and `.` marks; whitespace and `/` are ignored.
    ///
    /// ```
    /// use cfr_plus::games::tictactoe::Board;
    ///
    /// let board: Board = "xo./.x./..o".parse().unwrap();
    /// assert_eq!(board.to_string(), "x o .\n. x .\n. . o");
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut marks = Vec::with_capacity(9);
        for c in s.chars() {
            match c {
                ' ' | '\n' | '/' => continue,
                '.' | '-' => marks.push(None),
                'x' | 'X' | '0' => marks.push(Some(0)),
                'o' | 'O' | '1' => marks.push(Some(1)),
                other => return Err(BoardParseError::UnexpectedChar(other)),
            }
        }
        let cells: [Option<PlayerId>; 9] = marks
            .as_slice()
            .try_into()
            .map_err(|_| BoardParseError::WrongCellCount(marks.len()))?;
        Ok(Self { cells })
    }
}
