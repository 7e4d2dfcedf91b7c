pub mod cache;
pub mod league;
pub mod mock_data;
pub mod predictor;
pub mod provider;
pub mod report;

pub use cache::*;
pub use league::*;
pub use mock_data::*;
pub use predictor::*;
pub use provider::*;
pub use report::*;
