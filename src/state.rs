use crate::access::{AccessVerifier, MatchRules, VerifierConfig};
use crate::address::ContractId;
use crate::bridge::RecipientCoder;
use crate::client::HiroClient;
use crate::error::Result;
use crate::storage::Storage;
use crate::utils::constants::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub listen_addr: String,
    pub db_path: String,
    pub paywall_contract: String,
    pub access_function: String,
    pub content_info_function: String,
    pub history_window: u32,
    pub amount_tolerance: u64, // Inclusive, smallest units
    pub request_timeout_secs: u64,
    pub remote_domain: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            db_path: DEFAULT_DB_PATH.to_string(),
            paywall_contract: DEFAULT_PAYWALL_CONTRACT.to_string(),
            access_function: DEFAULT_ACCESS_FUNCTION.to_string(),
            content_info_function: DEFAULT_CONTENT_INFO_FUNCTION.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            amount_tolerance: DEFAULT_AMOUNT_TOLERANCE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            remote_domain: DEFAULT_REMOTE_DOMAIN,
        }
    }
}

impl Settings {
    /// Settings file (if present) with environment overrides applied on top.
    /// A missing or broken file falls back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut settings = match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str::<Settings>(&json).unwrap_or_else(|e| {
                log::error!("Invalid settings in {}: {}", path.display(), e);
                Settings::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                log::error!("Cannot read {}: {}", path.display(), e);
                Settings::default()
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("PAYWALL_API_URL") {
            self.api_url = url;
        }
        if let Some(addr) = var("PAYWALL_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
    }

    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        let contract: ContractId = self.paywall_contract.parse()?;
        Ok(VerifierConfig {
            contract,
            access_function: self.access_function.clone(),
            content_info_function: self.content_info_function.clone(),
            rules: MatchRules {
                window: self.history_window,
                amount_tolerance: self.amount_tolerance,
            },
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub type NodeVerifier = AccessVerifier<Arc<HiroClient>, Arc<HiroClient>>;

// Shared state for API handlers
pub struct ApiState {
    pub settings: Settings,
    pub storage: Arc<Storage>,
    pub verifier: NodeVerifier,
    pub coder: RecipientCoder,
}

impl ApiState {
    pub fn new(settings: Settings, storage: Arc<Storage>) -> Result<Self> {
        let client = Arc::new(HiroClient::new(
            settings.api_url.clone(),
            settings.request_timeout(),
        )?);
        let verifier = AccessVerifier::new(client.clone(), client, settings.verifier_config()?);

        Ok(ApiState {
            settings,
            storage,
            verifier,
            coder: RecipientCoder::new(),
        })
    }
}
