pub mod market;
pub mod prediction;
pub mod strategy;

pub use market::*;
pub use prediction::*;
pub use strategy::*;
