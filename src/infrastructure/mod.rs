pub mod generators;
pub mod identity;
pub mod stores;
