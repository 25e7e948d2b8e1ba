//! GF(2^m) arithmetic with log/antilog tables

use alloc::vec;
use alloc::vec::Vec;

/// Smallest supported field degree
pub const MIN_M: u32 = 5;
/// Largest supported field degree
pub const MAX_M: u32 = 15;

/// Primitive polynomials for m = 5..=15
const PRIMITIVE_POLYS: [u32; 11] = [
    0x25, 0x43, 0x83, 0x11d, 0x211, 0x409, 0x805, 0x1053, 0x201b, 0x402b, 0x8003,
];

/// The field GF(2^m)
///
/// Elements are stored as `u16` in polynomial basis. Non-zero elements are
/// also addressed by their discrete log with respect to the primitive
/// element alpha.
#[derive(Debug, Clone)]
pub struct GaloisField {
    m: u32,
    n: u32,
    alpha_to: Vec<u16>,
    index_of: Vec<u16>,
}

impl GaloisField {
    /// Build the field of degree `m`, `None` if `m` is out of range
    pub fn new(m: u32) -> Option<Self> {
        if !(MIN_M..=MAX_M).contains(&m) {
            return None;
        }
        let poly = PRIMITIVE_POLYS[(m - MIN_M) as usize];
        let n = (1u32 << m) - 1;

        let mut alpha_to = vec![0u16; n as usize];
        let mut index_of = vec![0u16; n as usize + 1];
        let mut x: u32 = 1;
        for i in 0..n {
            alpha_to[i as usize] = x as u16;
            index_of[x as usize] = i as u16;
            x <<= 1;
            if x & (1 << m) != 0 {
                x ^= poly;
            }
        }

        Some(Self {
            m,
            n,
            alpha_to,
            index_of,
        })
    }

    /// Field degree m
    pub fn degree(&self) -> u32 {
        self.m
    }

    /// Multiplicative order 2^m - 1
    pub fn order(&self) -> u32 {
        self.n
    }

    /// alpha^e
    pub fn exp(&self, e: u32) -> u16 {
        self.alpha_to[(e % self.n) as usize]
    }

    /// Discrete log of a non-zero element
    pub fn log(&self, a: u16) -> u32 {
        debug_assert!(a != 0);
        self.index_of[a as usize] as u32
    }

    /// a * b
    pub fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp(self.log(a) + self.log(b))
    }

    /// Multiplicative inverse of a non-zero element
    pub fn inv(&self, a: u16) -> u16 {
        self.exp(self.n - self.log(a))
    }

    /// a / b for non-zero b
    pub fn div(&self, a: u16, b: u16) -> u16 {
        self.mul(a, self.inv(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range() {
        assert!(GaloisField::new(4).is_none());
        assert!(GaloisField::new(16).is_none());
    }

    #[test]
    fn test_alpha_generates_field() {
        for m in MIN_M..=MAX_M {
            let gf = GaloisField::new(m).unwrap();
            let mut seen = vec![false; gf.order() as usize + 1];
            for e in 0..gf.order() {
                let a = gf.exp(e) as usize;
                assert!(a != 0 && !seen[a], "m={} poly not primitive", m);
                seen[a] = true;
            }
        }
    }

    #[test]
    fn test_mul_div_inverse() {
        let gf = GaloisField::new(12).unwrap();
        for a in [1u16, 2, 3, 0x123, 0xABC, 0xFFF] {
            assert_eq!(gf.mul(a, gf.inv(a)), 1);
            for b in [1u16, 7, 0x800, 0xFFE] {
                assert_eq!(gf.div(gf.mul(a, b), b), a);
            }
            assert_eq!(gf.mul(a, 0), 0);
        }
    }
}
