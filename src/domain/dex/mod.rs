//! DEX domain - the external pool service boundary

mod dex_interface;

pub use dex_interface::PoolService;
