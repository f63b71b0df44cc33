pub mod engine;
pub mod executor;
pub mod scanner;
pub mod types;

pub use engine::Engine;
pub use executor::TradeExecutor;
pub use scanner::OpportunityScanner;
pub use types::{Opportunity, RoundTrip, TradeResult};
