//! Numeric core - fixed-point roots and path amount distribution
//!
//! Pure integer arithmetic only; no state and no I/O.

mod path_split;
mod roots;

pub use path_split::{optimal_amount, split_amount, PHI, PHI_SQUARED};
pub use roots::{cbrt_u512, geometric_mean, integer_cbrt, integer_sqrt, sqrt_u512};
