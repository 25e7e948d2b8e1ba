//! Binary BCH codec
//!
//! Systematic, shortened, narrow-sense binary BCH code over GF(2^m). Data
//! bits are fed MSB first; the parity (the remainder of `d(x) * x^deg`
//! modulo the generator) is emitted MSB first into the ECC bytes.
//! Shortening is implicit: the unused leading positions of the full-length
//! codeword are zero and do not contribute to the parity.

use alloc::vec;
use alloc::vec::Vec;

use super::gf::GaloisField;

/// Outcome of decoding one ECC step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccStatus {
    /// Data and parity matched
    Clean,
    /// This many bit errors were corrected (data and parity combined)
    Corrected(u8),
    /// More errors than the code can correct
    Uncorrectable,
}

impl EccStatus {
    /// Number of corrected bits, `None` if uncorrectable
    pub fn bitflips(self) -> Option<u8> {
        match self {
            Self::Clean => Some(0),
            Self::Corrected(n) => Some(n),
            Self::Uncorrectable => None,
        }
    }
}

/// BCH encoder/decoder for a fixed data length
#[derive(Debug, Clone)]
pub struct Bch {
    gf: GaloisField,
    t: u32,
    data_len: usize,
    deg: usize,
    words: usize,
    top_mask: u64,
    generator: Vec<u64>,
}

impl Bch {
    /// Build a code over GF(2^m) correcting `t` bits in `data_len` bytes
    ///
    /// Returns `None` if the field degree is unsupported or the shortened
    /// codeword does not fit in `2^m - 1` bits.
    pub fn new(m: u32, t: u32, data_len: usize) -> Option<Self> {
        if t == 0 || data_len == 0 {
            return None;
        }
        let gf = GaloisField::new(m)?;
        let n = gf.order() as usize;

        // Roots: union of the cyclotomic cosets of alpha^1 .. alpha^2t
        let mut is_root = vec![false; n];
        for i in 1..=(2 * t as usize) {
            let mut j = i % n;
            while !is_root[j] {
                is_root[j] = true;
                j = (2 * j) % n;
            }
        }

        // g(x) = product of (x + alpha^r), coefficients low to high
        let mut g: Vec<u16> = vec![1];
        for r in (0..n).filter(|&r| is_root[r]) {
            let root = gf.exp(r as u32);
            let mut next = vec![0u16; g.len() + 1];
            for (k, &c) in g.iter().enumerate() {
                next[k + 1] ^= c;
                next[k] ^= gf.mul(c, root);
            }
            g = next;
        }
        if g.iter().any(|&c| c > 1) {
            return None;
        }

        let deg = g.len() - 1;
        if data_len * 8 + deg > n {
            return None;
        }

        let words = deg.div_ceil(64);
        let top_bit = (deg - 1) % 64;
        let top_mask = if top_bit == 63 {
            u64::MAX
        } else {
            (1u64 << (top_bit + 1)) - 1
        };
        let mut generator = vec![0u64; words];
        for (k, &c) in g.iter().take(deg).enumerate() {
            if c == 1 {
                generator[k / 64] |= 1 << (k % 64);
            }
        }

        Some(Self {
            gf,
            t,
            data_len,
            deg,
            words,
            top_mask,
            generator,
        })
    }

    /// Correction capability in bits
    pub fn strength(&self) -> u32 {
        self.t
    }

    /// Number of parity bits (degree of the generator)
    pub fn parity_bits(&self) -> usize {
        self.deg
    }

    /// Minimum number of bytes needed to hold the parity
    pub fn parity_bytes(&self) -> usize {
        self.deg.div_ceil(8)
    }

    /// Data length this code was built for
    pub fn data_len(&self) -> usize {
        self.data_len
    }

    fn remainder(&self, data: &[u8]) -> Vec<u64> {
        let top_word = self.words - 1;
        let top_bit = (self.deg - 1) % 64;
        let mut reg = vec![0u64; self.words];

        for &byte in data {
            for bit in (0..8).rev() {
                let feedback = ((byte >> bit) & 1) as u64 ^ ((reg[top_word] >> top_bit) & 1);
                let mut carry = 0u64;
                for word in reg.iter_mut() {
                    let out = *word >> 63;
                    *word = (*word << 1) | carry;
                    carry = out;
                }
                reg[top_word] &= self.top_mask;
                if feedback != 0 {
                    for (word, g) in reg.iter_mut().zip(&self.generator) {
                        *word ^= g;
                    }
                }
            }
        }
        reg
    }

    fn pack(&self, reg: &[u64], ecc: &mut [u8]) {
        ecc.fill(0);
        for p in 0..self.deg {
            if (reg[p / 64] >> (p % 64)) & 1 != 0 {
                let o = self.deg - 1 - p;
                ecc[o / 8] |= 0x80 >> (o % 8);
            }
        }
    }

    fn unpack(&self, ecc: &[u8]) -> Vec<u64> {
        let mut reg = vec![0u64; self.words];
        for p in 0..self.deg {
            let o = self.deg - 1 - p;
            if ecc[o / 8] & (0x80 >> (o % 8)) != 0 {
                reg[p / 64] |= 1 << (p % 64);
            }
        }
        reg
    }

    /// Compute the parity of `data` into the first
    /// [`parity_bytes`](Self::parity_bytes) bytes of `ecc`
    ///
    /// Unused trailing bits are zero.
    pub fn encode(&self, data: &[u8], ecc: &mut [u8]) {
        debug_assert_eq!(data.len(), self.data_len);
        let reg = self.remainder(data);
        self.pack(&reg, &mut ecc[..self.parity_bytes()]);
    }

    /// Check `data` against the received parity and correct it in place
    ///
    /// Errors in the parity bits are counted but not written back.
    pub fn decode(&self, data: &mut [u8], ecc: &[u8]) -> EccStatus {
        debug_assert_eq!(data.len(), self.data_len);
        let calc = self.remainder(data);
        let recv = self.unpack(ecc);

        let mut error = calc;
        for (e, r) in error.iter_mut().zip(&recv) {
            *e ^= r;
        }
        if error.iter().all(|&w| w == 0) {
            return EccStatus::Clean;
        }

        let syndromes = self.syndromes(&error);
        let (locator, degree) = self.berlekamp_massey(&syndromes);
        if degree == 0 || degree > self.t as usize {
            return EccStatus::Uncorrectable;
        }
        if locator[degree] == 0 || locator[degree + 1..].iter().any(|&c| c != 0) {
            return EccStatus::Uncorrectable;
        }

        let n = self.gf.order() as usize;
        let total_bits = self.data_len * 8 + self.deg;
        let mut positions: Vec<usize> = Vec::with_capacity(degree);
        for p in 0..total_bits {
            let mut sum = 0u16;
            for (i, &c) in locator.iter().enumerate().take(degree + 1) {
                if c != 0 {
                    let e = (n - (p * i) % n) % n;
                    sum ^= self.gf.mul(c, self.gf.exp(e as u32));
                }
            }
            if sum == 0 {
                positions.push(p);
                if positions.len() > degree {
                    return EccStatus::Uncorrectable;
                }
            }
        }
        if positions.len() != degree {
            return EccStatus::Uncorrectable;
        }

        for p in positions {
            if p >= self.deg {
                let i = total_bits - 1 - p;
                data[i / 8] ^= 0x80 >> (i % 8);
            }
        }
        EccStatus::Corrected(degree as u8)
    }

    /// S_1 .. S_2t of the error remainder
    fn syndromes(&self, error: &[u64]) -> Vec<u16> {
        let two_t = 2 * self.t as usize;
        let mut s = vec![0u16; two_t];
        for k in 0..self.deg {
            if (error[k / 64] >> (k % 64)) & 1 == 0 {
                continue;
            }
            for (j, sj) in s.iter_mut().enumerate() {
                *sj ^= self.gf.exp(((j + 1) * k) as u32);
            }
        }
        s
    }

    /// Error locator polynomial and its expected degree
    fn berlekamp_massey(&self, s: &[u16]) -> (Vec<u16>, usize) {
        let gf = &self.gf;
        let len = s.len() + 1;
        let mut c = vec![0u16; len];
        c[0] = 1;
        let mut b = c.clone();
        let mut l = 0usize;
        let mut shift = 1usize;
        let mut last_d = 1u16;

        for k in 0..s.len() {
            let mut d = s[k];
            for i in 1..=l {
                d ^= gf.mul(c[i], s[k - i]);
            }
            if d == 0 {
                shift += 1;
                continue;
            }

            let coef = gf.div(d, last_d);
            let prev = if 2 * l <= k { Some(c.clone()) } else { None };
            for i in 0..len.saturating_sub(shift) {
                c[i + shift] ^= gf.mul(coef, b[i]);
            }
            match prev {
                Some(prev) => {
                    l = k + 1 - l;
                    b = prev;
                    last_d = d;
                    shift = 1;
                }
                None => shift += 1,
            }
        }
        (c, l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, RngCore, SeedableRng};

    const STEP: usize = 410;

    fn codec() -> Bch {
        Bch::new(12, 8, STEP).unwrap()
    }

    fn random_step(rng: &mut SmallRng) -> Vec<u8> {
        let mut data = vec![0u8; STEP];
        rng.fill_bytes(&mut data);
        data
    }

    fn distinct_positions(rng: &mut SmallRng, count: usize, limit: usize) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        while out.len() < count {
            let p = rng.gen_range(0..limit);
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }

    #[test]
    fn test_generator_degree() {
        let bch = codec();
        assert_eq!(bch.parity_bits(), 96);
        assert_eq!(bch.parity_bytes(), 12);
        assert_eq!(bch.strength(), 8);
    }

    #[test]
    fn test_rejects_overlong_code() {
        // 600 bytes = 4800 bits does not fit in a 4095-bit codeword
        assert!(Bch::new(12, 8, 600).is_none());
        assert!(Bch::new(12, 0, STEP).is_none());
    }

    #[test]
    fn test_clean_decode() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bch = codec();
        let mut data = random_step(&mut rng);
        let mut ecc = [0u8; 12];
        bch.encode(&data, &mut ecc);
        assert_eq!(bch.decode(&mut data, &ecc), EccStatus::Clean);
    }

    #[test]
    fn test_corrects_up_to_strength() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let bch = codec();
        for flips in 1..=8 {
            let original = random_step(&mut rng);
            let mut ecc = [0u8; 12];
            bch.encode(&original, &mut ecc);

            let mut data = original.clone();
            for p in distinct_positions(&mut rng, flips, STEP * 8) {
                data[p / 8] ^= 0x80 >> (p % 8);
            }
            assert_eq!(bch.decode(&mut data, &ecc), EccStatus::Corrected(flips as u8));
            assert_eq!(data, original);
        }
    }

    #[test]
    fn test_parity_bit_errors_are_counted() {
        let mut rng = SmallRng::seed_from_u64(7);
        let bch = codec();
        let original = random_step(&mut rng);
        let mut ecc = [0u8; 12];
        bch.encode(&original, &mut ecc);

        let mut data = original.clone();
        data[100] ^= 0x01;
        ecc[0] ^= 0x80;
        ecc[11] ^= 0x01;
        assert_eq!(bch.decode(&mut data, &ecc), EccStatus::Corrected(3));
        assert_eq!(data, original);
    }

    #[test]
    fn test_beyond_strength_is_uncorrectable() {
        let mut rng = SmallRng::seed_from_u64(42);
        let bch = codec();
        for _ in 0..4 {
            let original = random_step(&mut rng);
            let mut ecc = [0u8; 12];
            bch.encode(&original, &mut ecc);

            let mut data = original.clone();
            for p in distinct_positions(&mut rng, 12, STEP * 8) {
                data[p / 8] ^= 0x80 >> (p % 8);
            }
            assert_eq!(bch.decode(&mut data, &ecc), EccStatus::Uncorrectable);
        }
    }

    #[test]
    fn test_small_field() {
        // m = 8, t = 2: 16 parity bits over 16 data bytes
        let bch = Bch::new(8, 2, 16).unwrap();
        assert_eq!(bch.parity_bits(), 16);
        let original: Vec<u8> = (0..16u8).collect();
        let mut ecc = [0u8; 2];
        bch.encode(&original, &mut ecc);

        let mut data = original.clone();
        data[0] ^= 0x80;
        data[15] ^= 0x01;
        assert_eq!(bch.decode(&mut data, &ecc), EccStatus::Corrected(2));
        assert_eq!(data, original);
    }
}
