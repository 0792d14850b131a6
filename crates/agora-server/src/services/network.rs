//! Network-facing collaborators: currency contract verification and the
//! follow-up work of linking wallets and social accounts.

use std::sync::Arc;
use std::time::Duration;

use agora_store::{NewCurrency, Network, Store, Wallet};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};

/// Currency fields accepted from a client before verification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCurrency {
    pub name: String,
    pub symbol: String,
    pub decimal: u8,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub native: bool,
    /// Contract address, required for non-native currencies.
    #[serde(default)]
    pub reference_id: Option<String>,
}

/// Reads deployed contract code from a chain node.
#[async_trait]
pub trait CurrencyVerifier: Send + Sync {
    /// Bytecode at `address` as a hex string; `"0x"` when nothing is
    /// deployed there.
    async fn contract_code(&self, rpc_url: &str, address: &str) -> ApiResult<String>;
}

/// [`CurrencyVerifier`] that issues an `eth_getCode` JSON-RPC call.
pub struct RpcCurrencyVerifier {
    http_client: reqwest::Client,
}

impl RpcCurrencyVerifier {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http_client })
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

#[async_trait]
impl CurrencyVerifier for RpcCurrencyVerifier {
    async fn contract_code(&self, rpc_url: &str, address: &str) -> ApiResult<String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getCode",
            "params": [address, "latest"],
        });

        let response: RpcResponse = self
            .http_client
            .post(rpc_url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::Upstream(format!("RPC request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Invalid RPC response: {e}")))?;

        if let Some(error) = response.error {
            return Err(ApiError::Upstream(format!("RPC error: {}", error.message)));
        }
        response
            .result
            .ok_or_else(|| ApiError::Upstream("RPC response without result".into()))
    }
}

#[derive(Clone)]
pub struct NetworkService {
    store: Store,
    verifier: Arc<dyn CurrencyVerifier>,
}

impl NetworkService {
    pub fn new(store: Store, verifier: Arc<dyn CurrencyVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Check a currency against its network and produce the record to store.
    /// Native currencies have no contract; anything else must name a
    /// contract address with code deployed on the network.
    pub async fn verify_contract_address(
        &self,
        network: &Network,
        raw: RawCurrency,
    ) -> ApiResult<NewCurrency> {
        let reference_id = if raw.native {
            None
        } else {
            let address = raw
                .reference_id
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .ok_or_else(|| ApiError::validation("Contract address must included"))?;
            let address = normalize_address(address)
                .ok_or_else(|| ApiError::validation("Invalid contract address"))?;

            let code = self.verifier.contract_code(&network.rpc_url, &address).await?;
            if code == "0x" || code == "0x0" {
                return Err(ApiError::Verification("Contract address not found".into()));
            }
            debug!(network = %network.id, address = %address, "contract verified");
            Some(address)
        };

        Ok(NewCurrency {
            network_id: network.id.clone(),
            name: raw.name,
            symbol: raw.symbol.to_uppercase(),
            decimal: raw.decimal,
            image: raw.image,
            native: raw.native,
            reference_id,
        })
    }

    /// A user's first wallet becomes their primary one.
    pub fn connect_account(&self, wallet: &Wallet) -> ApiResult<bool> {
        let promoted = self.store.with(|db| {
            let wallets = db.list_user_wallets(&wallet.user_id)?;
            if wallets.iter().any(|w| w.primary) {
                return Ok(false);
            }
            db.set_primary_wallet(&wallet.user_id, &wallet.id)?;
            Ok(true)
        })?;
        if promoted {
            info!(user = %wallet.user_id, wallet = %wallet.id, "primary wallet set");
        }
        Ok(promoted)
    }

    /// Mark an imported identity as belonging to a user.
    pub fn connect_social_media(&self, user_id: &str, people_id: &str) -> ApiResult<()> {
        self.store
            .with(|db| db.link_people_to_user(people_id, user_id))?;
        debug!(user = %user_id, people = %people_id, "social account connected");
        Ok(())
    }
}

/// `0x` followed by 40 hex digits, lowercased.
fn normalize_address(address: &str) -> Option<String> {
    let digits = address.strip_prefix("0x")?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", digits.to_lowercase()))
}
