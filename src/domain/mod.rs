//! Domain layer - core business logic and entities

pub mod dex;
pub mod execution;
pub mod math;
pub mod pool;
pub mod protection;
