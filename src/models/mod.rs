pub mod market;
pub mod metrics;
pub mod watchlist;

pub use market::*;
pub use metrics::*;
pub use watchlist::*;
