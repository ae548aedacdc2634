use crate::cfr::game::{ActionId, GameError, GameNode, Node};

use super::board::{Board, Outcome};

/// A tic-tac-toe position as a game-tree node.
///
/// Perfect information: the info set key is the board itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TicTacToeNode {
    board: Board,
    actions: Vec<ActionId>,
    utilities: [f64; 2],
    terminal: bool,
}

impl Default for TicTacToeNode {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToeNode {
    /// Empty board, `x` to move.
    pub fn new() -> Self {
        Self::from_board(Board::new())
    }

    /// Node for an arbitrary position.
    pub fn from_board(board: Board) -> Self {
        Self::with_actions(board, Board::possible_actions)
    }

    fn with_actions(board: Board, actions: impl Fn(&Board) -> Vec<ActionId>) -> Self {
        let (terminal, utilities) = match board.outcome() {
            Outcome::Win(0) => (true, [1.0, -1.0]),
            Outcome::Win(_) => (true, [-1.0, 1.0]),
            Outcome::Draw => (true, [0.0, 0.0]),
            Outcome::InProgress => (false, [0.0, 0.0]),
        };
        let actions = if terminal { Vec::new() } else { actions(&board) };
        Self {
            board,
            actions,
            utilities,
            terminal,
        }
    }

    /// The position.
    pub fn board(&self) -> &Board {
        &self.board
    }

    fn check_decision(&self, operation: &'static str) -> Result<(), GameError> {
        if self.terminal {
            Err(GameError::wrong_kind::<Self>(self.kind(), operation))
        } else {
            Ok(())
        }
    }
}

impl GameNode for TicTacToeNode {
    fn node(&self) -> Node<'_> {
        if self.terminal {
            Node::Terminal {
                utilities: &self.utilities,
            }
        } else {
            Node::Decision {
                actions: &self.actions,
                player: self.board.current_player(),
            }
        }
    }

    fn apply_action(&self, action: ActionId) -> Result<Self, GameError> {
        self.check_decision("apply_action")?;
        let next = self.board.play(action).ok_or_else(|| GameError::illegal::<Self>(action))?;
        Ok(Self::from_board(next))
    }

    fn info_set_key(&self) -> Result<String, GameError> {
        self.check_decision("info_set_key")?;
        Ok(self.board.to_string())
    }

    fn info_set_hash(&self) -> Result<u64, GameError> {
        self.check_decision("info_set_hash")?;
        Ok(self.board.numeric_key())
    }

    fn action_label(&self, action: ActionId) -> String {
        format!("({}, {})", action / 3, action % 3)
    }

    fn describe(&self) -> String {
        self.board.to_string()
    }
}

/// Tic-tac-toe with rotations and reflections folded together.
///
/// Every position is kept in its normal form and only one move per
/// resulting normal form is offered, which shrinks the tree about tenfold.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricNode {
    inner: TicTacToeNode,
}

impl Default for SymmetricNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SymmetricNode {
    /// Empty board, `x` to move.
    pub fn new() -> Self {
        Self::from_board(Board::new())
    }

    /// Node for the normal form of `board`.
    pub fn from_board(board: Board) -> Self {
        Self {
            inner: TicTacToeNode::with_actions(board.normal_form(), Board::unique_actions),
        }
    }

    /// The (normalized) position.
    pub fn board(&self) -> &Board {
        self.inner.board()
    }
}

impl GameNode for SymmetricNode {
    fn node(&self) -> Node<'_> {
        self.inner.node()
    }

    fn apply_action(&self, action: ActionId) -> Result<Self, GameError> {
        self.inner.check_decision("apply_action")?;
        if !self.inner.actions.contains(&action) {
            return Err(GameError::illegal::<Self>(action));
        }
        let next = self.board().play(action).ok_or_else(|| GameError::illegal::<Self>(action))?;
        Ok(Self::from_board(next))
    }

    fn info_set_key(&self) -> Result<String, GameError> {
        self.inner.info_set_key()
    }

    fn info_set_hash(&self) -> Result<u64, GameError> {
        self.inner.info_set_hash()
    }

    fn action_label(&self, action: ActionId) -> String {
        self.inner.action_label(action)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::game::NodeKind;
    use crate::cfr::storage::InfoSetStore;
    use crate::cfr::{evaluate_average_strategy, CfrConfig, CfrError, CfrPlus};

    fn node(s: &str) -> TicTacToeNode {
        TicTacToeNode::from_board(s.parse().unwrap())
    }

    #[test]
    fn test_terminal_utilities() {
        let win = node("xxx/oo./...");
        assert_eq!(win.kind(), NodeKind::Terminal);
        assert_eq!(win.node().utilities(), Some(&[1.0, -1.0][..]));

        let draw = node("xox/xoo/oxx");
        assert_eq!(draw.node().utilities(), Some(&[0.0, 0.0][..]));

        let loss = node("xx./ooo/x..");
        assert_eq!(loss.node().utilities(), Some(&[-1.0, 1.0][..]));

        assert!(win.apply_action(8).is_err());
        assert!(win.info_set_key().is_err());
    }

    #[test]
    fn test_decision_node() {
        let root = TicTacToeNode::new();
        match root.node() {
            Node::Decision { actions, player } => {
                assert_eq!(actions, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
                assert_eq!(player, 0);
            }
            other => panic!("expected decision, got {:?}", other),
        }
        assert_eq!(root.info_set_key().unwrap(), ". . .\n. . .\n. . .");
        assert_eq!(root.info_set_hash().unwrap(), 100_000_000_000);

        let child = root.apply_action(4).unwrap();
        assert_eq!(child.info_set_key().unwrap(), ". . .\n. x .\n. . .");
        assert!(child.apply_action(4).is_err());
        assert_eq!(child.action_label(5), "(1, 2)");
    }

    #[test]
    fn test_discover_full_game() {
        let mut exact: InfoSetStore<String> = InfoSetStore::new();
        assert_eq!(exact.discover(&TicTacToeNode::new()).unwrap(), 4520);

        let mut hashed: InfoSetStore<u64> = InfoSetStore::new();
        assert_eq!(hashed.discover(&TicTacToeNode::new()).unwrap(), 4520);
    }

    #[test]
    fn test_board_keys_change_encoding_through_the_tree() {
        let root = TicTacToeNode::new();
        let mut exact: InfoSetStore<String> = InfoSetStore::new();
        exact.discover(&root).unwrap();
        let mut direct: InfoSetStore<u64> = InfoSetStore::new();
        direct.discover(&root).unwrap();

        // Board text hashes to something other than the numeric board key
        let by_text: InfoSetStore<u64> = exact.rekey();
        assert_eq!(by_text.len(), 4520);
        assert!(by_text.keys().iter().all(|key| !direct.contains(key)));

        let by_tree: InfoSetStore<u64> = exact.rekey_with(&root).unwrap();
        assert_eq!(by_tree.keys(), direct.keys());
        assert!(by_tree.contains(&Board::new().numeric_key()));

        // Keys from another game are not in the tree
        let mut kuhn: InfoSetStore<String> = InfoSetStore::new();
        kuhn.discover(&crate::games::kuhn::KuhnNode::root()).unwrap();
        assert!(kuhn.rekey_with::<u64, _>(&root).is_err());
    }

    #[test]
    fn test_text_hashed_store_is_rejected_by_the_engine() {
        let root = TicTacToeNode::new();
        let mut exact: InfoSetStore<String> = InfoSetStore::new();
        exact.discover(&root).unwrap();

        let config = CfrConfig::default().with_initial_evaluation(false);
        let result = CfrPlus::<TicTacToeNode, u64>::with_store(root.clone(), config.clone(), exact.rekey());
        assert!(matches!(result, Err(CfrError::UnreachableInfoSet(_))));

        let solver = CfrPlus::<TicTacToeNode, u64>::with_store(root.clone(), config, exact.rekey_with(&root).unwrap())
            .unwrap();
        assert_eq!(solver.store().len(), 4520);
    }

    #[test]
    fn test_symmetric_actions() {
        let root = SymmetricNode::new();
        assert_eq!(root.node().actions(), Some(&[0, 1, 4][..]));
        assert!(root.apply_action(2).is_err());

        // Children are normalized
        let corner = root.apply_action(0).unwrap();
        assert_eq!(corner.board().to_string(), ". . .\n. . .\n. . x");
    }

    #[test]
    fn test_discover_symmetric_game() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        assert_eq!(store.discover(&SymmetricNode::new()).unwrap(), 627);
    }

    #[test]
    fn test_symmetric_cfr_heads_to_draw() {
        let mut solver: CfrPlus<SymmetricNode, u64> = CfrPlus::new(SymmetricNode::new(), CfrConfig::default()).unwrap();
        let uniform = solver.stats().root_utilities[0];
        assert!(uniform > 0.3, "x is favoured under uniform play: {}", uniform);

        solver.train(20).unwrap();

        // Current strategies already play a draw
        let current = solver.evaluate().unwrap();
        assert!(current.abs() < 1e-6, "current value {}", current);

        let average = evaluate_average_strategy(solver.root(), solver.store()).unwrap();
        assert!(average > -0.05 && average < 0.15, "average value {}", average);
    }
}
