/// Wallet session.
///
/// The wallet itself (keys, signing, RPC) is external and reached through
/// `WalletProvider`. `Session` holds the connection state explicitly:
/// the shell owns one, connects it, and passes it to whatever needs to pay.
///
/// Connecting follows the browser-wallet flow: switch to the target chain,
/// add the chain if the wallet does not know it (code 4902), request
/// accounts, then confirm the wallet really is on the target chain.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::level::{short_address, GameRecord, Wei};

/// Provider error code for "unrecognized chain".
pub const CHAIN_NOT_ADDED: i64 = 4902;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("no wallet is installed")]
    NotInstalled,

    #[error("failed to add {chain} to the wallet: {reason}")]
    ChainNotAdded { chain: String, reason: String },

    #[error("failed to switch to {chain}: {reason}")]
    SwitchFailed { chain: String, reason: String },

    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("no account found")]
    NoAccount,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("wallet provider: {0}")]
    Provider(String),
}

/// Error reported by the wallet, with its numeric code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ProviderError { code, message: message.into() }
    }
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        WalletError::Provider(format!("{} (code {})", e.message, e.code))
    }
}

// ── Chain parameters ──

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    #[serde(rename = "chainId", serialize_with = "hex_id")]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

fn hex_id<S: serde::Serializer>(id: &u64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{id:#x}"))
}

impl ChainParams {
    pub fn monad_testnet() -> Self {
        ChainParams {
            chain_id: 10143,
            chain_name: "Monad Testnet".into(),
            native_currency: NativeCurrency { name: "Monad".into(), symbol: "MONAD".into(), decimals: 18 },
            rpc_urls: vec!["https://testnet-rpc.monad.xyz".into()],
            block_explorer_urls: vec![
                "https://testnet.monadexplorer.com/".into(),
                "https://monad-testnet.socialscan.io/".into(),
            ],
        }
    }

    /// `0x279f` style id, as wallets expect it.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

// ── Provider seam ──

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError>;
    async fn add_chain(&self, params: &ChainParams) -> Result<(), ProviderError>;
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;
    async fn chain_id(&self) -> Result<u64, ProviderError>;
    async fn balance(&self, address: &str) -> Result<Wei, ProviderError>;
    /// Send `amount` from `from` to `to`; returns the transaction hash.
    async fn send_payment(&self, from: &str, to: &str, amount: Wei) -> Result<String, ProviderError>;
}

// ── Session ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
    pub chain_id: u64,
    pub balance: Wei,
}

pub struct Session<P> {
    provider: Option<P>,
    chain: ChainParams,
    connection: Option<Connection>,
}

impl<P: WalletProvider> Session<P> {
    /// `provider` is `None` when no wallet is available at all.
    pub fn new(provider: Option<P>, chain: ChainParams) -> Self {
        Session { provider, chain, connection: None }
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub async fn connect(&mut self) -> Result<&Connection, WalletError> {
        let provider = self.provider.as_ref().ok_or(WalletError::NotInstalled)?;
        let chain_hex = self.chain.chain_id_hex();

        if let Err(e) = provider.switch_chain(&chain_hex).await {
            if e.code != CHAIN_NOT_ADDED {
                return Err(WalletError::SwitchFailed { chain: self.chain.chain_name.clone(), reason: e.message });
            }
            tracing::info!(chain = %self.chain.chain_name, "chain unknown to wallet, adding it");
            provider.add_chain(&self.chain).await.map_err(|e| WalletError::ChainNotAdded {
                chain: self.chain.chain_name.clone(),
                reason: e.message,
            })?;
        }

        let accounts = provider.request_accounts().await?;
        let address = accounts.into_iter().next().ok_or(WalletError::NoAccount)?;

        let actual = provider.chain_id().await?;
        if actual != self.chain.chain_id {
            return Err(WalletError::WrongNetwork { expected: self.chain.chain_id, actual });
        }

        let balance = fetch_balance(provider, &address).await;
        tracing::info!(address = %short_address(&address), balance = %format_balance(balance), "wallet connected");

        Ok(self.connection.insert(Connection { address, chain_id: actual, balance }))
    }

    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            tracing::info!("wallet disconnected");
        }
    }

    /// Re-read the balance. Read failures keep the session and report zero.
    pub async fn refresh_balance(&mut self) -> Result<Wei, WalletError> {
        let provider = self.provider.as_ref().ok_or(WalletError::NotInstalled)?;
        let conn = self.connection.as_mut().ok_or(WalletError::NotConnected)?;
        conn.balance = fetch_balance(provider, &conn.address).await;
        Ok(conn.balance)
    }

    /// Pay a game's entry cost to its owner. Returns the transaction hash.
    pub async fn pay_entry(&self, game: &GameRecord) -> Result<String, WalletError> {
        let provider = self.provider.as_ref().ok_or(WalletError::NotInstalled)?;
        let conn = self.connection.as_ref().ok_or(WalletError::NotConnected)?;
        tracing::info!(
            game = game.game_id,
            to = %short_address(&game.owner),
            amount = %game.cost_of_play.to_ether_string(),
            "paying entry"
        );
        let tx = provider.send_payment(&conn.address, &game.owner, game.cost_of_play).await?;
        tracing::info!(%tx, "entry paid");
        Ok(tx)
    }
}

async fn fetch_balance<P: WalletProvider>(provider: &P, address: &str) -> Wei {
    match provider.balance(address).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e.message, "failed to fetch balance");
            Wei::ZERO
        }
    }
}

/// Balance for display, in whole currency units.
pub fn format_balance(balance: Wei) -> String {
    let v = balance.as_ether_f64();
    if balance == Wei::ZERO {
        "0".to_string()
    } else if v < 0.001 {
        "< 0.001".to_string()
    } else if v < 1.0 {
        format!("{v:.3}")
    } else if v < 1000.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    const ETHER: u128 = 1_000_000_000_000_000_000;

    struct FakeWallet {
        known_chains: Mutex<Vec<u64>>,
        on_chain: Mutex<u64>,
        accounts: Vec<String>,
        balance: Result<Wei, ProviderError>,
        refuse_add: bool,
        payments: Mutex<Vec<(String, String, Wei)>>,
    }

    impl FakeWallet {
        fn new() -> Self {
            FakeWallet {
                known_chains: Mutex::new(vec![1]),
                on_chain: Mutex::new(1),
                accounts: vec!["0x1111222233334444555566667777888899990000".into()],
                balance: Ok(Wei(ETHER * 3 / 2)),
                refuse_add: false,
                payments: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for FakeWallet {
        async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
            let id = u64::from_str_radix(chain_id_hex.trim_start_matches("0x"), 16)
                .map_err(|_| ProviderError::new(-32602, "bad chain id"))?;
            if !self.known_chains.lock().contains(&id) {
                return Err(ProviderError::new(CHAIN_NOT_ADDED, "Unrecognized chain ID"));
            }
            *self.on_chain.lock() = id;
            Ok(())
        }

        async fn add_chain(&self, params: &ChainParams) -> Result<(), ProviderError> {
            if self.refuse_add {
                return Err(ProviderError::new(4001, "User rejected the request"));
            }
            self.known_chains.lock().push(params.chain_id);
            *self.on_chain.lock() = params.chain_id;
            Ok(())
        }

        async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
            Ok(self.accounts.clone())
        }

        async fn chain_id(&self) -> Result<u64, ProviderError> {
            Ok(*self.on_chain.lock())
        }

        async fn balance(&self, _address: &str) -> Result<Wei, ProviderError> {
            self.balance.clone()
        }

        async fn send_payment(&self, from: &str, to: &str, amount: Wei) -> Result<String, ProviderError> {
            let mut p = self.payments.lock();
            p.push((from.to_string(), to.to_string(), amount));
            Ok(format!("0x{:064x}", p.len()))
        }
    }

    fn game() -> GameRecord {
        GameRecord {
            game_id: 1,
            game_name: "Sky Run".into(),
            owner: "0xowner".into(),
            levels_count: 3,
            game_address: "0xgame".into(),
            cost_of_play: Wei(ETHER / 100),
            prize_pool: Wei::ZERO,
            total_players: 0,
        }
    }

    #[test]
    fn monad_testnet_params() {
        let p = ChainParams::monad_testnet();
        assert_eq!(p.chain_id_hex(), "0x279f");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["chainId"], "0x279f");
        assert_eq!(json["nativeCurrency"]["decimals"], 18);
        assert_eq!(json["blockExplorerUrls"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn connect_adds_unknown_chain() {
        let mut s = Session::new(Some(FakeWallet::new()), ChainParams::monad_testnet());
        let conn = s.connect().await.unwrap().clone();
        assert_eq!(conn.chain_id, 10143);
        assert_eq!(conn.balance, Wei(ETHER * 3 / 2));
        assert!(s.is_connected());

        s.disconnect();
        assert!(!s.is_connected());
        assert!(matches!(s.pay_entry(&game()).await, Err(WalletError::NotConnected)));
    }

    #[tokio::test]
    async fn connect_failures() {
        let mut none: Session<FakeWallet> = Session::new(None, ChainParams::monad_testnet());
        assert!(matches!(none.connect().await, Err(WalletError::NotInstalled)));

        let mut refusing = FakeWallet::new();
        refusing.refuse_add = true;
        let mut s = Session::new(Some(refusing), ChainParams::monad_testnet());
        assert!(matches!(s.connect().await, Err(WalletError::ChainNotAdded { .. })));

        let mut empty = FakeWallet::new();
        empty.accounts.clear();
        let mut s = Session::new(Some(empty), ChainParams::monad_testnet());
        assert!(matches!(s.connect().await, Err(WalletError::NoAccount)));
        assert!(!s.is_connected());
    }

    #[tokio::test]
    async fn balance_errors_read_as_zero() {
        let mut w = FakeWallet::new();
        w.balance = Err(ProviderError::new(-32000, "rpc down"));
        let mut s = Session::new(Some(w), ChainParams::monad_testnet());
        assert_eq!(s.connect().await.unwrap().balance, Wei::ZERO);
        assert_eq!(s.refresh_balance().await.unwrap(), Wei::ZERO);
    }

    #[tokio::test]
    async fn entry_is_paid_to_owner() {
        let mut s = Session::new(Some(FakeWallet::new()), ChainParams::monad_testnet());
        s.connect().await.unwrap();
        let tx = s.pay_entry(&game()).await.unwrap();
        assert!(tx.starts_with("0x"));

        let payments = s.provider.as_ref().unwrap().payments.lock().clone();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].1, "0xowner");
        assert_eq!(payments[0].2, Wei(ETHER / 100));
    }

    #[test]
    fn balance_display_rules() {
        assert_eq!(format_balance(Wei::ZERO), "0");
        assert_eq!(format_balance(Wei(ETHER / 10_000)), "< 0.001");
        assert_eq!(format_balance(Wei(ETHER / 4)), "0.250");
        assert_eq!(format_balance(Wei(ETHER * 3 / 2)), "1.50");
        assert_eq!(format_balance(Wei(ETHER * 12_345)), "12345.0");
    }
}
