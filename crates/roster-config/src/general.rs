//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default number of search results shown per reply.
const fn default_result_limit() -> usize {
    10
}

/// Default distance cutoff for `/fuzzy`.
#[allow(clippy::unnecessary_wraps)]
const fn default_fuzzy_max_distance() -> Option<usize> {
    Some(3)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Maximum rows rendered for one search reply.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Rows further than this from the query are dropped from `/fuzzy`
    /// results. `None` keeps every row.
    #[serde(default = "default_fuzzy_max_distance")]
    pub fuzzy_max_distance: Option<usize>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            fuzzy_max_distance: default_fuzzy_max_distance(),
        }
    }
}
