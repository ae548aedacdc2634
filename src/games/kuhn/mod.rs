//! Kuhn Poker as a game tree, for CFR validation.
//!
//! Kuhn Poker is a simplified poker game used to validate CFR implementations
//! because it has a known, mathematically proven Nash equilibrium.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack (0), Queen (1), King (2)
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card (the root is a chance node over the 6 deals)
//! - Player 1 acts first: Pass or Bet (1 chip)
//! - Player 2 responds based on P1's action
//! - Higher card wins at showdown
//!
//! ## Game Tree
//!
//! ```text
//! Deal (chance, 6 outcomes at 1/6)
//! └── P1
//!     ├── Pass
//!     │   └── P2
//!     │       ├── Pass → Showdown (pot = 2)
//!     │       └── Bet
//!     │           └── P1
//!     │               ├── Pass → P2 wins (pot = 3)
//!     │               └── Bet → Showdown (pot = 4)
//!     └── Bet
//!         └── P2
//!             ├── Pass → P1 wins (pot = 3)
//!             └── Bet → Showdown (pot = 4)
//! ```
//!
//! ## Known Nash Equilibrium
//!
//! - **Player 1 with Jack**: Bet with probability α ≤ 1/3
//! - **Player 1 with Queen**: Always Pass
//! - **Player 1 with King**: Bet with probability 3α
//! - **Player 2 facing Bet with Jack**: Always Fold
//! - **Player 2 facing Bet with Queen**: Call with probability 1/3
//! - **Player 2 facing Bet with King**: Always Call
//! - **Player 2 after Pass with Jack**: Bet with probability 1/3
//!
//! **Expected Value**: Player 1 EV = -1/18 ≈ -0.0556
//!
//! Info set keys are `"{card}:{history}"`, e.g. `"0:pb"` is the Jack facing
//! a bet after passing.

use std::fmt;

use crate::cfr::game::{ActionId, GameError, GameNode, Node, PlayerId};

/// Pass (check if no bet, fold if facing bet).
pub const PASS: ActionId = 0;

/// Bet (or call if facing bet).
pub const BET: ActionId = 1;

/// Equilibrium value of the game for player 1.
pub const GAME_VALUE: f64 = -1.0 / 18.0;

const BETTING_ACTIONS: [ActionId; 2] = [PASS, BET];

const DEALS: [[u8; 2]; 6] = [[0, 1], [0, 2], [1, 0], [1, 2], [2, 0], [2, 1]];
const DEAL_ACTIONS: [ActionId; 6] = [0, 1, 2, 3, 4, 5];
const DEAL_PROBABILITIES: [f64; 6] = [1.0 / 6.0; 6];

/// Actions in Kuhn Poker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KuhnAction {
    /// Pass (check if no bet, fold if facing bet)
    Pass,
    /// Bet (or call if facing bet)
    Bet,
}

impl KuhnAction {
    /// Decode an action id.
    pub fn from_id(action: ActionId) -> Option<Self> {
        match action {
            PASS => Some(KuhnAction::Pass),
            BET => Some(KuhnAction::Bet),
            _ => None,
        }
    }

    /// History character for this action.
    pub fn symbol(&self) -> char {
        match self {
            KuhnAction::Pass => 'p',
            KuhnAction::Bet => 'b',
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::Pass => write!(f, "Pass"),
            KuhnAction::Bet => write!(f, "Bet"),
        }
    }
}

/// Get card name for display.
pub fn card_name(card: u8) -> &'static str {
    match card {
        0 => "Jack",
        1 => "Queen",
        2 => "King",
        _ => "Unknown",
    }
}

/// A node of the Kuhn Poker tree.
#[derive(Debug, Clone, PartialEq)]
pub struct KuhnNode {
    /// Cards dealt to each player, `None` before the deal.
    cards: Option<[u8; 2]>,
    /// Action history, e.g. `"pb"` = pass then bet.
    history: String,
    /// Payoffs once the hand is over.
    utilities: [f64; 2],
}

impl KuhnNode {
    /// The deal (chance) node at the top of the tree.
    pub fn root() -> Self {
        Self {
            cards: None,
            history: String::new(),
            utilities: [0.0; 2],
        }
    }

    /// A node right after a specific deal, with the given history.
    ///
    /// Returns `None` for an invalid deal or history.
    pub fn dealt(cards: [u8; 2], history: &str) -> Option<Self> {
        if cards[0] == cards[1] || cards.iter().any(|&c| c > 2) {
            return None;
        }
        if !matches!(history, "" | "p" | "b" | "pb" | "pp" | "bp" | "bb" | "pbp" | "pbb") {
            return None;
        }
        Some(Self {
            cards: Some(cards),
            history: history.to_string(),
            utilities: payoffs(cards, history),
        })
    }

    /// Cards dealt, `None` before the deal.
    pub fn cards(&self) -> Option<[u8; 2]> {
        self.cards
    }

    /// Action history.
    pub fn history(&self) -> &str {
        &self.history
    }

    fn is_terminal(&self) -> bool {
        is_terminal(&self.history)
    }

    fn current_player(&self) -> PlayerId {
        // P1 acts at "" and "pb", P2 at "p" and "b"
        if self.history.len() % 2 == 0 {
            0
        } else {
            1
        }
    }
}

fn is_terminal(history: &str) -> bool {
    matches!(history, "pp" | "pbp" | "pbb" | "bp" | "bb")
}

/// Payoffs for a finished hand, `[0, 0]` otherwise.
fn payoffs(cards: [u8; 2], history: &str) -> [f64; 2] {
    let showdown = if cards[0] > cards[1] { 1.0 } else { -1.0 };
    let p0: f64 = match history {
        // Showdown after both pass - pot is 2 (1+1 ante)
        "pp" => showdown,
        // Player 1 bet, player 2 folded
        "bp" => 1.0,
        // Player 1 passed, player 2 bet, player 1 folded
        "pbp" => -1.0,
        // Showdown after bet-call - pot is 4 (2+2)
        "bb" | "pbb" => 2.0 * showdown,
        _ => 0.0,
    };
    [p0, -p0]
}

impl GameNode for KuhnNode {
    fn node(&self) -> Node<'_> {
        if self.cards.is_none() {
            Node::Chance {
                actions: &DEAL_ACTIONS,
                probabilities: &DEAL_PROBABILITIES,
            }
        } else if self.is_terminal() {
            Node::Terminal {
                utilities: &self.utilities,
            }
        } else {
            Node::Decision {
                actions: &BETTING_ACTIONS,
                player: self.current_player(),
            }
        }
    }

    fn apply_action(&self, action: ActionId) -> Result<Self, GameError> {
        let cards = match self.cards {
            None => {
                let cards = *DEALS.get(action).ok_or_else(|| GameError::illegal::<Self>(action))?;
                return Ok(Self {
                    cards: Some(cards),
                    history: String::new(),
                    utilities: [0.0; 2],
                });
            }
            Some(cards) => cards,
        };

        if self.is_terminal() {
            return Err(GameError::wrong_kind::<Self>(self.kind(), "apply_action"));
        }

        let action = KuhnAction::from_id(action).ok_or_else(|| GameError::illegal::<Self>(action))?;
        let mut history = self.history.clone();
        history.push(action.symbol());
        let utilities = payoffs(cards, &history);

        Ok(Self {
            cards: Some(cards),
            history,
            utilities,
        })
    }

    fn info_set_key(&self) -> Result<String, GameError> {
        match self.cards {
            Some(cards) if !self.is_terminal() => {
                Ok(format!("{}:{}", cards[self.current_player()], self.history))
            }
            _ => Err(GameError::wrong_kind::<Self>(self.kind(), "info_set_key")),
        }
    }

    fn action_label(&self, action: ActionId) -> String {
        match (self.cards, KuhnAction::from_id(action)) {
            (None, _) => match DEALS.get(action) {
                Some(deal) => format!("deal {}/{}", card_name(deal[0]), card_name(deal[1])),
                None => action.to_string(),
            },
            (Some(_), Some(kuhn_action)) => kuhn_action.to_string(),
            (Some(_), None) => action.to_string(),
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KuhnNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cards {
            None => write!(f, "Deal"),
            Some(cards) => write!(
                f,
                "P1:{} P2:{} History:{}",
                card_name(cards[0]),
                card_name(cards[1]),
                self.history
            ),
        }
    }
}
