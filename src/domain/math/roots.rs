//! Integer roots via Newton-Raphson
//!
//! All iterations run on 512-bit integers so products of two 256-bit
//! amounts never overflow.

use primitive_types::{U256, U512};

/// Floor of the square root of a 512-bit value
pub fn sqrt_u512(x: U512) -> U512 {
    if x.is_zero() {
        return U512::zero();
    }

    // 2^ceil(bits/2) is always >= sqrt(x), so the sequence decreases
    // monotonically onto the floor
    let mut y = U512::one() << ((x.bits() + 1) / 2);
    loop {
        let next = (y + x / y) >> 1;
        if next >= y {
            return y;
        }
        y = next;
    }
}

/// Floor of the cube root of a 512-bit value
pub fn cbrt_u512(x: U512) -> U512 {
    if x.is_zero() {
        return U512::zero();
    }

    let three = U512::from(3u8);
    let mut y = U512::one() << ((x.bits() + 2) / 3);
    loop {
        let next = ((y << 1) + x / (y * y)) / three;
        if next >= y {
            return y;
        }
        y = next;
    }
}

/// `floor(sqrt(x))`
pub fn integer_sqrt(x: U256) -> U256 {
    narrow(sqrt_u512(U512::from(x)))
}

/// `floor(cbrt(x))`
pub fn integer_cbrt(x: U256) -> U256 {
    narrow(cbrt_u512(U512::from(x)))
}

/// `floor(sqrt(a * b))` with the product taken at double width
pub fn geometric_mean(a: U256, b: U256) -> U256 {
    narrow(sqrt_u512(a.full_mul(b)))
}

// Roots of 256-bit inputs always fit back into 256 bits
fn narrow(value: U512) -> U256 {
    U256::try_from(value).unwrap_or(U256::MAX)
}
