use std::path::Path;

use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    data: Vec<ListedStock>,
}

#[derive(Deserialize)]
struct ListedStock {
    symbol: String,
    name: String,
}

/// Looks up the local-language name of `symbol` in the stock listing file
/// written by the search script. Any problem with the file means "no name".
pub async fn display_name(path: &Path, symbol: &str) -> Option<String> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Stock listing {} unavailable: {}", path.display(), e);
            return None;
        }
    };
    let listing: Listing = match serde_json::from_str(&raw) {
        Ok(listing) => listing,
        Err(e) => {
            debug!("Stock listing {} unreadable: {}", path.display(), e);
            return None;
        }
    };
    listing
        .data
        .into_iter()
        .find(|stock| stock.symbol == symbol)
        .map(|stock| stock.name)
        .filter(|name| !name.trim().is_empty())
}
