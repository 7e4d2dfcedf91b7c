pub mod matches;
pub mod factors;
pub mod predictions;
pub mod market;
pub mod error;

pub use matches::*;
pub use factors::*;
pub use predictions::*;
pub use market::*;
pub use error::*;
