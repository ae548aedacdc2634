//! Game implementations for the CFR solver.
//!
//! These serve as:
//!
//! 1. **Validation**: Games with known Nash equilibria (like Kuhn Poker) verify
//!    that the CFR implementation is correct.
//!
//! 2. **Examples**: Demonstrate how to implement [`GameNode`](crate::cfr::GameNode)
//!    for new games.
//!
//! 3. **Benchmarks**: Provide standardized games for performance testing.
//!
//! ## Available Games
//!
//! - [`kuhn`]: Kuhn Poker - A simplified 3-card poker game with known Nash equilibrium
//! - [`tictactoe`]: Tic-tac-toe, full and symmetry-reduced
//!
//! ## Adding New Games
//!
//! 1. Create a new module under `src/games/`
//! 2. Define a node type holding the position and its legal actions
//! 3. Implement `GameNode`: `node()`, `apply_action()` and `info_set_key()`
//! 4. Add tests that verify expected behavior
//!
//! See the [`kuhn`] module for a complete example.

pub mod kuhn;
pub mod tictactoe;
