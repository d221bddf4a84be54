use std::collections::HashMap;

use crate::models::error::ApiError;

pub const MAX_LIMIT: u32 = 100;
pub const MAX_DAYS: u32 = 365;
pub const MAX_SYMBOLS: usize = 20;

/// Trimmed symbol of 1 to 12 ASCII alphanumerics. Keeps path input from
/// reaching a script as something that looks like a flag.
pub fn validate_symbol(raw: &str) -> Result<String, ApiError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(ApiError::validation("Symbol parameter is required"));
    }
    if symbol.len() > 12 || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation(format!("Invalid symbol: {}", symbol)));
    }
    Ok(symbol.to_string())
}

/// Absent means `default`; present must be an integer in `1..=max`.
pub fn positive_param(
    params: &HashMap<String, String>,
    key: &str,
    default: u32,
    max: u32,
) -> Result<u32, ApiError> {
    let Some(raw) = params.get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(value) if (1..=max).contains(&value) => Ok(value),
        _ => Err(ApiError::validation(format!(
            "{} must be an integer between 1 and {}",
            key, max
        ))),
    }
}

pub fn validate_symbol_list<I, S>(symbols: I) -> Result<Vec<String>, ApiError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for raw in symbols {
        if raw.as_ref().trim().is_empty() {
            continue;
        }
        let symbol = validate_symbol(raw.as_ref())?;
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    if out.len() > MAX_SYMBOLS {
        return Err(ApiError::validation(format!(
            "At most {} symbols per request",
            MAX_SYMBOLS
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn symbols_are_trimmed_and_checked() {
        assert_eq!(validate_symbol(" 005930 ").unwrap(), "005930");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("--output").is_err());
        assert!(validate_symbol("005930;rm").is_err());
        assert!(validate_symbol("삼성전자").is_err());
    }

    #[test]
    fn numeric_params_default_and_bound() {
        let empty = params(&[]);
        assert_eq!(positive_param(&empty, "limit", 10, MAX_LIMIT).unwrap(), 10);

        let ok = params(&[("limit", "25")]);
        assert_eq!(positive_param(&ok, "limit", 10, MAX_LIMIT).unwrap(), 25);

        for bad in ["0", "-1", "abc", "101"] {
            let p = params(&[("limit", bad)]);
            assert!(positive_param(&p, "limit", 10, MAX_LIMIT).is_err(), "{bad}");
        }
    }

    #[test]
    fn symbol_lists_skip_blanks_and_duplicates() {
        let symbols = validate_symbol_list(["005930", " ", "000660", "005930"]).unwrap();
        assert_eq!(symbols, vec!["005930", "000660"]);

        let too_many: Vec<String> = (0..=MAX_SYMBOLS).map(|i| format!("{:06}", i)).collect();
        assert!(validate_symbol_list(&too_many).is_err());
    }
}
