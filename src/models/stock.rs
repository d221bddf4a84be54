use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// KRX trades in Korea Standard Time; scripts emit naive local timestamps.
const KST_OFFSET_SECS: i32 = 9 * 3600;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
    pub volume: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    pub timestamp: DateTime<Utc>,
    /// Exchange, sector, data source and whatever else the script reports.
    #[serde(rename = "extra_info", default)]
    pub extra_info: Map<String, Value>,
}

/// Raw payload of `fetch_stock_data.py`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScriptQuote {
    #[serde(default = "default_true")]
    pub success: bool,
    pub error: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_amount: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub previous_close: Option<f64>,
    pub timestamp: Option<String>,
    #[serde(rename = "extra_info", default)]
    pub extra_info: Option<Map<String, Value>>,
}

fn default_true() -> bool {
    true
}

impl ScriptQuote {
    /// Normalizes the script output. `display_name` wins over the script's
    /// own name when the listing knows the symbol.
    pub fn into_quote(
        self,
        requested_symbol: &str,
        display_name: Option<String>,
    ) -> Result<Quote, String> {
        if !self.success {
            return Err(self
                .error
                .unwrap_or_else(|| "script reported failure".to_string()));
        }
        let price = self
            .price
            .ok_or_else(|| "quote payload has no price".to_string())?;
        let symbol = self
            .symbol
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| requested_symbol.to_string());
        let name = display_name
            .or(self.name)
            .unwrap_or_else(|| symbol.clone());

        Ok(Quote {
            symbol,
            name,
            price,
            change_amount: self.change_amount.unwrap_or(0.0),
            change_percent: self.change_percent.unwrap_or(0.0),
            volume: self.volume.map(to_count).unwrap_or(0),
            market_cap: self.market_cap.map(to_count).filter(|cap| *cap > 0),
            open: self.open,
            high: self.high,
            low: self.low,
            previous_close: self.previous_close,
            timestamp: self
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            extra_info: self.extra_info.unwrap_or_default(),
        })
    }
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS)?;
    kst.from_local_datetime(&naive)
        .single()
        .map(|ts| ts.with_timezone(&Utc))
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct StockSearchResult {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub market: String,
}

/// Raw payload of `fetch_all_stocks.py --search`.
#[derive(Deserialize, Debug)]
pub struct ScriptSearch {
    #[serde(default = "default_true")]
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub results: Vec<StockSearchResult>,
}
