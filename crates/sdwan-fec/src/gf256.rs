//! # GF(2^8) Arithmetic
//!
//! Byte-wise field arithmetic for the Reed-Solomon codec. All operations use
//! the irreducible polynomial x^8 + x^4 + x^3 + x + 1 (0x11B).
//!
//! Full product and inverse tables are computed at compile time from the
//! log/antilog tables of generator 3 and live in one read-only `static`.

use crate::error::FecError;

/// Irreducible polynomial for the field.
pub const POLYNOMIAL: u16 = 0x11B;

/// Multiply by the field generator `x + 1` modulo the polynomial.
const fn times_generator(v: u8) -> u8 {
    let shifted = (v as u16) << 1;
    let reduced = if shifted & 0x100 != 0 {
        shifted ^ POLYNOMIAL
    } else {
        shifted
    };
    reduced as u8 ^ v
}

/// Discrete log and antilog over generator 3.
///
/// The antilog table is doubled so `exp[log a + log b]` needs no `% 255`.
const fn log_exp() -> ([u8; 256], [u8; 512]) {
    let mut log = [0u8; 256];
    let mut exp = [0u8; 512];
    let mut power = 1u8;
    let mut e = 0;
    while e < 510 {
        exp[e] = power;
        if e < 255 {
            log[power as usize] = e as u8;
        }
        power = times_generator(power);
        e += 1;
    }
    (log, exp)
}

struct FieldTables {
    /// `product[a][b] = a * b`; row `c` scales a whole slice by `c`.
    product: [[u8; 256]; 256],
    /// `inverse[0]` is unused.
    inverse: [u8; 256],
}

const fn field_tables() -> FieldTables {
    let (log, exp) = log_exp();
    let mut product = [[0u8; 256]; 256];
    let mut inverse = [0u8; 256];

    let mut a = 1;
    while a < 256 {
        inverse[a] = exp[255 - log[a] as usize];
        let mut b = 1;
        while b < 256 {
            product[a][b] = exp[log[a] as usize + log[b] as usize];
            b += 1;
        }
        a += 1;
    }
    FieldTables { product, inverse }
}

static GF: FieldTables = field_tables();

/// Field addition (and subtraction): XOR.
#[inline]
pub fn gf_add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication.
#[inline]
pub fn gf_mul(a: u8, b: u8) -> u8 {
    GF.product[a as usize][b as usize]
}

/// Multiplicative inverse. Zero has none.
#[inline]
pub fn gf_inv(a: u8) -> Result<u8, FecError> {
    if a == 0 {
        return Err(FecError::DivisionByZero);
    }
    Ok(GF.inverse[a as usize])
}

/// Field division `a / b`.
#[inline]
pub fn gf_div(a: u8, b: u8) -> Result<u8, FecError> {
    Ok(gf_mul(a, gf_inv(b)?))
}

/// `dst[i] ^= c * src[i]` over the shorter of the two slices.
pub fn mul_add_slice(dst: &mut [u8], src: &[u8], c: u8) {
    match c {
        0 => {}
        1 => {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d ^= s;
            }
        }
        _ => {
            let row = &GF.product[c as usize];
            for (d, &s) in dst.iter_mut().zip(src) {
                *d ^= row[s as usize];
            }
        }
    }
}
