// RSA Big Integer Operations
// Modular arithmetic on top of num-bigint, written without its modpow/modinv helpers

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

use super::error::{Result, RsaError};

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// Create a big integer from bytes (big-endian)
pub fn from_bytes(bytes: &[u8]) -> RsaBigInt {
    RsaBigInt::from_bytes_be(bytes)
}

/// Convert big integer to exactly `len` big-endian bytes, left padded with zeros.
///
/// Values wider than `len` keep their low-order `len` bytes; callers only pass
/// values already reduced below a modulus of that byte length.
pub fn to_bytes_padded(n: &RsaBigInt, len: usize) -> Vec<u8> {
    let bytes = n.to_bytes_be();
    if n.is_zero() {
        return vec![0u8; len];
    }
    if bytes.len() >= len {
        return bytes[bytes.len() - len..].to_vec();
    }

    let mut result = vec![0u8; len];
    result[len - bytes.len()..].copy_from_slice(&bytes);
    result
}

/// Number of significant bits
pub fn bit_length(n: &RsaBigInt) -> u64 {
    n.bits()
}

/// Number of bytes needed to hold `n`: ceil(bits / 8)
pub fn byte_length(n: &RsaBigInt) -> usize {
    ((n.bits() + 7) / 8) as usize
}

/// Modular exponentiation: base^exp mod modulus
/// Uses square-and-multiply, consuming the exponent by repeated halving
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> Result<RsaBigInt> {
    if modulus.is_zero() {
        return Err(RsaError::InvalidModulus);
    }
    if modulus.is_one() {
        return Ok(RsaBigInt::zero());
    }

    let mut result = RsaBigInt::one();
    let mut base = base % modulus;
    let mut exp = exp.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }

    Ok(result)
}

/// Extended Euclidean Algorithm
/// Returns (gcd, x, y) such that a*x + b*y = gcd = gcd(a, b)
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        return (b.clone(), BigInt::zero(), BigInt::one());
    }

    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    (old_r, old_s, old_t)
}

/// Compute modular inverse: a^(-1) mod m, normalized into [0, m)
pub fn mod_inverse(a: &RsaBigInt, m: &RsaBigInt) -> Result<RsaBigInt> {
    if m.is_zero() {
        return Err(RsaError::NoModularInverse);
    }

    let m_signed = BigInt::from_biguint(Sign::Plus, m.clone());
    let a_signed = BigInt::from_biguint(Sign::Plus, a % m);
    let (gcd, x, _) = extended_gcd(&a_signed, &m_signed);

    if !gcd.is_one() {
        return Err(RsaError::NoModularInverse);
    }

    let normalized = x.mod_floor(&m_signed);
    normalized.to_biguint().ok_or(RsaError::NoModularInverse)
}

/// Greatest common divisor
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    a.gcd(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mod_pow() {
        // 3^5 mod 7 = 243 mod 7 = 5
        let result = mod_pow(&from_u64(3), &from_u64(5), &from_u64(7)).unwrap();
        assert_eq!(result, from_u64(5));
    }

    #[test]
    fn test_mod_pow_zero_exponent() {
        for n in [2u64, 7, 100, 65537] {
            for a in [0u64, 1, 5, 99] {
                assert_eq!(mod_pow(&from_u64(a), &from_u64(0), &from_u64(n)).unwrap(), from_u64(1));
            }
        }
    }

    #[test]
    fn test_mod_pow_unit_modulus() {
        for a in [0u64, 1, 12345] {
            for b in [0u64, 1, 17] {
                assert!(mod_pow(&from_u64(a), &from_u64(b), &from_u64(1)).unwrap().is_zero());
            }
        }
    }

    #[test]
    fn test_mod_pow_zero_modulus_rejected() {
        let err = mod_pow(&from_u64(2), &from_u64(3), &from_u64(0)).unwrap_err();
        assert_eq!(err, RsaError::InvalidModulus);
    }

    #[test]
    fn test_extended_gcd() {
        let (g, x, y) = extended_gcd(&BigInt::from(240), &BigInt::from(46));
        assert_eq!(g, BigInt::from(2));
        assert_eq!(BigInt::from(240) * x + BigInt::from(46) * y, BigInt::from(2));
    }

    #[test]
    fn test_extended_gcd_zero_first() {
        let (g, x, y) = extended_gcd(&BigInt::zero(), &BigInt::from(17));
        assert_eq!((g, x, y), (BigInt::from(17), BigInt::zero(), BigInt::one()));
    }

    #[test]
    fn test_mod_inverse() {
        // 3 * 5 = 15 ≡ 1 mod 7, so inverse of 3 mod 7 is 5
        let a = from_u64(3);
        let m = from_u64(7);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!(inv, from_u64(5));
        assert_eq!((a * inv) % m, from_u64(1));
    }

    #[test]
    fn test_mod_inverse_negative_coefficient() {
        // 17 * 2753 ≡ 1 mod 3120; the raw Bezout coefficient is negative
        let inv = mod_inverse(&from_u64(17), &from_u64(3120)).unwrap();
        assert_eq!(inv, from_u64(2753));
    }

    #[test]
    fn test_mod_inverse_missing() {
        assert_eq!(mod_inverse(&from_u64(6), &from_u64(9)), Err(RsaError::NoModularInverse));
        assert_eq!(mod_inverse(&from_u64(3), &from_u64(0)), Err(RsaError::NoModularInverse));
    }

    #[test]
    fn test_to_bytes_padded() {
        assert_eq!(to_bytes_padded(&from_u64(0x0102), 4), vec![0, 0, 1, 2]);
        assert_eq!(to_bytes_padded(&from_u64(0), 3), vec![0, 0, 0]);
        assert_eq!(byte_length(&from_u64(0x01ff)), 2);
        assert_eq!(byte_length(&from_u64(0xff)), 1);
    }

    proptest! {
        #[test]
        fn mod_pow_matches_library(a in any::<u64>(), b in 0u64..10_000, m in 1u64..u64::MAX) {
            let expected = from_u64(a).modpow(&from_u64(b), &from_u64(m));
            prop_assert_eq!(mod_pow(&from_u64(a), &from_u64(b), &from_u64(m)).unwrap(), expected);
        }

        #[test]
        fn bezout_identity_holds(a in any::<u64>(), b in any::<u64>()) {
            let (a, b) = (BigInt::from(a), BigInt::from(b));
            let (g, x, y) = extended_gcd(&a, &b);
            prop_assert_eq!(&a * x + &b * y, g);
        }

        #[test]
        fn inverse_multiplies_to_one(a in 1u64..1_000_000, m in 2u64..1_000_000) {
            let (a, m) = (from_u64(a), from_u64(m));
            match mod_inverse(&a, &m) {
                Ok(inv) => {
                    prop_assert!(inv < m);
                    prop_assert_eq!((&a * &inv) % &m, from_u64(1));
                }
                Err(e) => {
                    prop_assert_eq!(e, RsaError::NoModularInverse);
                    prop_assert!(!gcd(&a, &m).is_one());
                }
            }
        }
    }
}
