pub mod disclosures;
pub mod health;
pub mod news;
pub mod stocks;
pub mod watchlist;
