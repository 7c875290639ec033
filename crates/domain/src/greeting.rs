//! Stateless greeting actions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

/// Games the greeter may suggest.
pub const GAMES: &[&str] = &[
    "chess",
    "checkers",
    "backgammon",
    "poker",
    "tic-tac-toe",
    "Global Thermonuclear War",
];

/// Request for a greeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    pub name: String,
}

/// Request for a game suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestGame {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSuggestion {
    pub game: String,
    pub text: String,
}

/// Action handlers that touch no entity state.
///
/// Any randomness comes from the injected [`RandomSource`].
pub struct GreetingAction {
    random: Arc<dyn RandomSource>,
}

impl GreetingAction {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Greets the caller by name.
    pub fn hello(&self, request: Hello) -> Greeting {
        Greeting {
            text: format!("Do you want to play a game, {}?", request.name),
        }
    }

    /// Picks a game for the caller.
    ///
    /// An out-of-range pick from the random source falls back to the first game.
    pub fn suggest_game(&self, request: SuggestGame) -> GameSuggestion {
        let game = GAMES
            .get(self.random.next_below(GAMES.len()))
            .copied()
            .unwrap_or(GAMES[0]);
        GameSuggestion {
            game: game.to_string(),
            text: format!("How about a nice game of {game}, {}?", request.name),
        }
    }
}
