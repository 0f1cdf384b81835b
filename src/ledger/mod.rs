/// Game persistence on the ledger.
///
/// The contract itself is an external collaborator reached through
/// `GameLedger`. This module owns the data shapes on either side of it:
/// building a submission from a `GameDraft`, parsing publish requests, and
/// reading a published game back into grids.
///
/// A game is submitted once, whole. Any level that fails preparation fails
/// the whole submission; nothing is sent.

pub mod memory;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{bracketed, rows};
use crate::domain::grid::{Dimensions, Grid, LevelProfile};
use crate::domain::level::{GameDraft, GameRecord, Wei};
use crate::domain::symbol::ZeroMeaning;
use crate::error::LevelError;
use crate::repair;

pub use memory::MemoryLedger;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("levels with `0` as {0:?} cannot be persisted, the ledger stores `0` as blank")]
    IncompatibleProfile(ZeroMeaning),

    #[error("game name is required")]
    EmptyName,

    #[error("a game needs at least one level")]
    NoLevels,

    #[error("level {index} is {}x{}, expected {}x{}", .actual.width, .actual.height, .expected.width, .expected.height)]
    DimensionMismatch {
        index: usize,
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("invalid cost of play {0:?}, expected an integer amount in wei")]
    InvalidCost(String),

    #[error("unknown game {0}")]
    UnknownGame(String),

    #[error("invalid publish request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error("ledger backend: {0}")]
    Backend(String),
}

// ══════════════════════════════════════════════════════════════
// Wire shapes
// ══════════════════════════════════════════════════════════════

/// Arguments of one create-game call: every level as persisted rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSubmission {
    pub game_name: String,
    pub levels: Vec<Vec<String>>,
    pub cost_of_play: Wei,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub game_address: String,
    pub transaction_hash: String,
}

/// Contract read/write surface.
#[async_trait]
pub trait GameLedger: Send + Sync {
    /// Addresses of every published game, in creation order.
    async fn all_games(&self) -> Result<Vec<String>, LedgerError>;

    async fn game_info(&self, game_id: u64) -> Result<GameRecord, LedgerError>;

    /// Stored rows of one level. `index` is zero-based.
    async fn game_level(&self, game_id: u64, index: usize) -> Result<Vec<String>, LedgerError>;

    async fn create_game(&self, submission: &GameSubmission) -> Result<Receipt, LedgerError>;
}

// ══════════════════════════════════════════════════════════════
// Publishing
// ══════════════════════════════════════════════════════════════

/// Turn a draft into a submission. Every level must match the profile's
/// dimensions and hold a portal and a surface; empty cells are written as
/// the explicit blank `0`.
pub fn prepare_submission(draft: &GameDraft, profile: &LevelProfile) -> Result<GameSubmission, LedgerError> {
    if profile.table.zero() != ZeroMeaning::Blank {
        return Err(LedgerError::IncompatibleProfile(profile.table.zero()));
    }
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    if draft.levels.is_empty() {
        return Err(LedgerError::NoLevels);
    }

    let mut levels = Vec::with_capacity(draft.levels.len());
    for (index, level) in draft.levels.iter().enumerate() {
        if level.grid.dims() != profile.dims {
            return Err(LedgerError::DimensionMismatch {
                index,
                expected: profile.dims,
                actual: level.grid.dims(),
            });
        }
        let plain = rows::to_rows(&level.grid);
        repair::validate(&plain, profile)?;
        let persisted = rows::substitute_blank(&plain);
        rows::ensure_persistable(&persisted)?;
        levels.push(persisted);
    }

    Ok(GameSubmission {
        game_name: name.to_string(),
        levels,
        cost_of_play: draft.cost_of_play,
    })
}

pub async fn publish<L: GameLedger + ?Sized>(
    ledger: &L,
    draft: &GameDraft,
    profile: &LevelProfile,
) -> Result<Receipt, LedgerError> {
    let submission = prepare_submission(draft, profile)?;
    tracing::info!(
        name = %submission.game_name,
        levels = submission.levels.len(),
        cost = %submission.cost_of_play,
        "publishing game"
    );
    let receipt = ledger.create_game(&submission).await?;
    tracing::info!(address = %receipt.game_address, tx = %receipt.transaction_hash, "game published");
    Ok(receipt)
}

/// `levels` as sent by a publish form: the legacy bracketed string or
/// already-split rows.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LevelsPayload {
    Encoded(String),
    Rows(Vec<Vec<String>>),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub game_name: String,
    pub levels: LevelsPayload,
    /// Decimal wei.
    pub cost_of_play: String,
}

impl PublishRequest {
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::InvalidRequest(e.to_string()))
    }

    /// Check the request against the profile and produce the submission.
    /// Rows are taken as already persisted: exact size, no raw spaces. Each
    /// level must be playable as sent, with a portal and a surface.
    pub fn into_submission(self, profile: &LevelProfile) -> Result<GameSubmission, LedgerError> {
        if profile.table.zero() != ZeroMeaning::Blank {
            return Err(LedgerError::IncompatibleProfile(profile.table.zero()));
        }
        let game_name = self.game_name.trim().to_string();
        if game_name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        let cost_of_play: Wei = self
            .cost_of_play
            .parse()
            .map_err(|_| LedgerError::InvalidCost(self.cost_of_play.clone()))?;

        let levels = match self.levels {
            LevelsPayload::Encoded(text) => bracketed::parse_bracketed(&text)?,
            LevelsPayload::Rows(levels) => levels,
        };
        if levels.is_empty() {
            return Err(LedgerError::NoLevels);
        }
        for level in &levels {
            repair::validate(level.as_slice(), profile)?;
            rows::ensure_persistable(level)?;
        }

        Ok(GameSubmission { game_name, levels, cost_of_play })
    }
}

// ══════════════════════════════════════════════════════════════
// Reading back
// ══════════════════════════════════════════════════════════════

/// A game named by its numeric id (1-based) or its contract address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameRef {
    Id(u64),
    Address(String),
}

impl FromStr for GameRef {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s.parse().map(GameRef::Id).map_err(|_| LedgerError::UnknownGame(s.to_string()));
        }
        match s.strip_prefix("0x") {
            Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                Ok(GameRef::Address(s.to_string()))
            }
            _ => Err(LedgerError::UnknownGame(s.to_string())),
        }
    }
}

impl fmt::Display for GameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameRef::Id(id) => write!(f, "#{id}"),
            GameRef::Address(a) => f.write_str(a),
        }
    }
}

/// Resolve a reference to the game id the contract is indexed by.
pub async fn resolve<L: GameLedger + ?Sized>(ledger: &L, game: &GameRef) -> Result<u64, LedgerError> {
    match game {
        GameRef::Id(0) => Err(LedgerError::UnknownGame(game.to_string())),
        GameRef::Id(id) => Ok(*id),
        GameRef::Address(address) => {
            let all = ledger.all_games().await?;
            all.iter()
                .position(|a| a.eq_ignore_ascii_case(address))
                .map(|i| i as u64 + 1)
                .ok_or_else(|| LedgerError::UnknownGame(address.clone()))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedGame {
    pub record: GameRecord,
    /// `(level index, grid)` for every level that loaded.
    pub levels: Vec<(usize, Grid)>,
}

/// Load a game and its levels. A level that cannot be read or decoded is
/// skipped with a warning; the rest still load.
pub async fn fetch_game<L: GameLedger + ?Sized>(
    ledger: &L,
    game: &GameRef,
    profile: &LevelProfile,
) -> Result<PublishedGame, LedgerError> {
    let id = resolve(ledger, game).await?;
    let record = ledger.game_info(id).await?;

    let mut levels = Vec::with_capacity(record.levels_count);
    for index in 0..record.levels_count {
        let loaded = match ledger.game_level(id, index).await {
            Ok(stored) => rows::from_rows(stored.as_slice(), profile.dims).map_err(LedgerError::from),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(grid) => levels.push((index, grid)),
            Err(e) => tracing::warn!(game = id, level = index, error = %e, "skipping level"),
        }
    }
    tracing::info!(game = id, loaded = levels.len(), total = record.levels_count, "fetched game");

    Ok(PublishedGame { record, levels })
}

/// Every published game's record. Games whose info fails to load are skipped.
pub async fn list_games<L: GameLedger + ?Sized>(ledger: &L) -> Result<Vec<GameRecord>, LedgerError> {
    let count = ledger.all_games().await?.len() as u64;
    let mut records = Vec::new();
    for id in 1..=count {
        match ledger.game_info(id).await {
            Ok(r) => records.push(r),
            Err(e) => tracing::warn!(game = id, error = %e, "skipping game"),
        }
    }
    Ok(records)
}
