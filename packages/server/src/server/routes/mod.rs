// HTTP routes
pub mod generator;
pub mod health;

pub use generator::*;
pub use health::*;
