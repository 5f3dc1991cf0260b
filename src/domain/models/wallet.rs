use serde::{Deserialize, Serialize};

/// A tracked multisig wallet, as declared in the static treasury
/// configuration. Immutable for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Stable slug used as the wallet reference in stored rows
    pub id: String,
    /// Display name
    pub name: String,
    /// Chain address; None for wallets that are not yet deployed
    pub address: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Ordered list of category names transactions may be tagged with
    pub categories: Vec<String>,
    /// Budget grouping tag
    #[serde(default)]
    pub group: Option<String>,
}

impl WalletConfig {
    /// Returns true if the given category is allowed for this wallet
    pub fn allows_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
