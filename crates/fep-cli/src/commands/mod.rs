pub mod map;
pub mod setup;
