pub mod rating;
pub mod goal_model;
pub mod odds;
pub mod features;

pub use rating::*;
pub use goal_model::*;
pub use odds::*;
pub use features::*;
