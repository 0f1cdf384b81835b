/// In-process `GameLedger`.
///
/// Stores submissions as-is, the way the contract does: rows are not
/// re-validated on the way in. Addresses and transaction hashes are derived
/// from the game id.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::level::{GameRecord, Wei};

use super::{GameLedger, GameSubmission, LedgerError, Receipt};

struct StoredGame {
    record: GameRecord,
    levels: Vec<Vec<String>>,
}

pub struct MemoryLedger {
    owner: String,
    games: RwLock<Vec<StoredGame>>,
}

impl MemoryLedger {
    /// `owner` is recorded as the creator of every game.
    pub fn new(owner: impl Into<String>) -> Self {
        MemoryLedger { owner: owner.into(), games: RwLock::new(Vec::new()) }
    }

    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record one paid play: the cost goes into the prize pool.
    pub fn record_play(&self, game_id: u64) -> Result<(), LedgerError> {
        let mut games = self.games.write();
        let game = index(game_id)
            .and_then(|i| games.get_mut(i))
            .ok_or_else(|| LedgerError::UnknownGame(format!("#{game_id}")))?;
        game.record.total_players += 1;
        game.record.prize_pool = Wei(game.record.prize_pool.0.saturating_add(game.record.cost_of_play.0));
        Ok(())
    }
}

fn index(game_id: u64) -> Option<usize> {
    usize::try_from(game_id).ok()?.checked_sub(1)
}

fn game_address(game_id: u64) -> String {
    format!("0x{:040x}", 0xfeed_0000_u64 + game_id)
}

#[async_trait]
impl GameLedger for MemoryLedger {
    async fn all_games(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.games.read().iter().map(|g| g.record.game_address.clone()).collect())
    }

    async fn game_info(&self, game_id: u64) -> Result<GameRecord, LedgerError> {
        let games = self.games.read();
        index(game_id)
            .and_then(|i| games.get(i))
            .map(|g| g.record.clone())
            .ok_or_else(|| LedgerError::UnknownGame(format!("#{game_id}")))
    }

    async fn game_level(&self, game_id: u64, level: usize) -> Result<Vec<String>, LedgerError> {
        let games = self.games.read();
        let game = index(game_id)
            .and_then(|i| games.get(i))
            .ok_or_else(|| LedgerError::UnknownGame(format!("#{game_id}")))?;
        game.levels
            .get(level)
            .cloned()
            .ok_or_else(|| LedgerError::Backend(format!("game #{game_id} has no level {level}")))
    }

    async fn create_game(&self, submission: &GameSubmission) -> Result<Receipt, LedgerError> {
        let mut games = self.games.write();
        let game_id = games.len() as u64 + 1;
        let address = game_address(game_id);
        games.push(StoredGame {
            record: GameRecord {
                game_id,
                game_name: submission.game_name.clone(),
                owner: self.owner.clone(),
                levels_count: submission.levels.len(),
                game_address: address.clone(),
                cost_of_play: submission.cost_of_play,
                prize_pool: Wei::ZERO,
                total_players: 0,
            },
            levels: submission.levels.clone(),
        });
        Ok(Receipt {
            game_address: address,
            transaction_hash: format!("0x{:064x}", game_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str) -> GameSubmission {
        GameSubmission {
            game_name: name.into(),
            levels: vec![vec!["@0=".into()]],
            cost_of_play: Wei(7),
        }
    }

    #[tokio::test]
    async fn ids_are_one_based_and_sequential() {
        let ledger = MemoryLedger::new("0xowner");
        let a = ledger.create_game(&submission("a")).await.unwrap();
        let b = ledger.create_game(&submission("b")).await.unwrap();
        assert_ne!(a.game_address, b.game_address);
        assert_eq!(ledger.all_games().await.unwrap(), vec![a.game_address, b.game_address]);
        assert_eq!(ledger.game_info(2).await.unwrap().game_name, "b");
        assert!(ledger.game_info(0).await.is_err());
        assert!(ledger.game_info(3).await.is_err());
        assert_eq!(ledger.game_level(1, 0).await.unwrap(), vec!["@0="]);
        assert!(matches!(ledger.game_level(1, 1).await, Err(LedgerError::Backend(_))));
    }

    #[tokio::test]
    async fn plays_fill_the_prize_pool() {
        let ledger = MemoryLedger::new("0xowner");
        ledger.create_game(&submission("a")).await.unwrap();
        ledger.record_play(1).unwrap();
        ledger.record_play(1).unwrap();
        let info = ledger.game_info(1).await.unwrap();
        assert_eq!(info.total_players, 2);
        assert_eq!(info.prize_pool, Wei(14));
        assert!(ledger.record_play(9).is_err());
    }
}
