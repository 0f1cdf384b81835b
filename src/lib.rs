/// ChainJump level toolkit.
///
/// Fixed-size platformer grids over a ten-symbol alphabet: validation and
/// repair, text and ledger encodings, AI generation, and the seams to the
/// on-chain game registry and the player's wallet.

pub mod codec;
pub mod config;
pub mod domain;
pub mod editor;
pub mod error;
pub mod generate;
pub mod ledger;
pub mod repair;
#[cfg(feature = "preview")]
pub mod ui;
pub mod wallet;

pub use domain::grid::{Dimensions, Grid, LevelProfile, Position};
pub use domain::level::{GameDraft, GameRecord, Level, Wei};
pub use domain::symbol::{Symbol, SymbolTable, ZeroMeaning};
pub use error::LevelError;
