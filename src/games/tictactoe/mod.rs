//! Tic-tac-toe, a small perfect-information game for exercising the engines.
//!
//! - [`TicTacToeNode`]: the full game, 4520 non-terminal positions
//! - [`SymmetricNode`]: positions folded by rotation and reflection, 627
//!   non-terminal positions
//!
//! Info set keys are the rendered board (`"x . .\n. o .\n. . ."`), so keys
//! contain newlines. Hashed keys use [`Board::numeric_key`] instead of the
//! default string hash.
//!
//! With perfect play the game is a draw.

mod board;
mod node;

pub use board::{Board, BoardParseError, Outcome};
pub use node::{SymmetricNode, TicTacToeNode};
