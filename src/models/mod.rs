pub mod cache;
pub mod disclosure;
pub mod error;
pub mod response;
pub mod stock;
pub mod watchlist;
