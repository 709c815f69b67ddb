use anyhow::{Context, Result};
use railhand_core::{
    config::DemoConfig,
    models::{Board, CardColor, PlayerState, Route, TrackColor, TurnContext},
};
use tracing::info;

/// Board for the local game: the configured file, or the built-in map.
pub fn board(config: &DemoConfig) -> Result<Board> {
    if let Some(path) = &config.board_path {
        info!(path = %path.display(), "loading board");
        return Board::load(path);
    }
    builtin_board()
}

fn builtin_board() -> Result<Board> {
    use CardColor::*;
    let routes = [
        ("Lisboa - Porto", TrackColor::Gray, 3),
        ("Porto - Vigo", TrackColor::Fixed(Blue), 2),
        ("Lisboa - Madrid", TrackColor::Fixed(Green), 4),
        ("Madrid - Zaragoza", TrackColor::Gray, 2),
        ("Zaragoza - Barcelona", TrackColor::Fixed(Red), 3),
        ("Madrid - Sevilla", TrackColor::Fixed(Yellow), 3),
        ("Sevilla - Cadiz", TrackColor::Gray, 1),
    ];
    let routes = routes
        .into_iter()
        .map(|(name, color, length)| {
            Route::uniform(color, length)
                .map(|route| route.with_name(name))
                .with_context(|| format!("invalid built-in route {name}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Board::new(routes))
}

/// Opening context: our turn, nothing pinned, one idle opponent.
pub fn opening_context(config: &DemoConfig) -> TurnContext {
    TurnContext {
        my_turn: true,
        players: vec![
            PlayerState {
                name: "You".to_string(),
                color: config.player_color.clone(),
                coins: config.starting_coins,
                cards: config.starting_hand.clone(),
            },
            PlayerState {
                name: "Rival".to_string(),
                color: if config.player_color == "yellow" {
                    "purple".to_string()
                } else {
                    "yellow".to_string()
                },
                coins: config.starting_coins,
                cards: Vec::new(),
            },
        ],
        ..TurnContext::default()
    }
}
