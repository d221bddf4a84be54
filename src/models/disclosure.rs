use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-symbol slot of an aggregated disclosure lookup. A failed symbol is
/// reported here instead of failing the whole request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SymbolDisclosures {
    pub success: bool,
    pub disclosures: Vec<Value>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymbolDisclosures {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            disclosures: Vec::new(),
            total_count: 0,
            error: Some(error.into()),
        }
    }

    /// Reads a `fetch_disclosure.py` payload.
    pub fn from_script(payload: &Value) -> Self {
        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            let error = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Failed to fetch disclosure data");
            return Self::failed(error);
        }
        let disclosures = payload
            .get("disclosures")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total_count = payload
            .get("total_count")
            .and_then(Value::as_u64)
            .unwrap_or(disclosures.len() as u64);
        Self {
            success: true,
            disclosures,
            total_count,
            error: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistDisclosureRequest {
    pub watchlist_symbols: Option<Vec<String>>,
    pub days: Option<u32>,
}
