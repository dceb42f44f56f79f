// RSA Random Big Integers
// Draws big integers from a cryptographically secure byte source

use rand::{CryptoRng, RngCore};

use super::bigint::{bit_length, from_bytes, RsaBigInt};
use super::error::{Result, RsaError};

/// Fill `len` bytes from the secure source.
///
/// A failing source is reported, never replaced by a weaker one.
pub fn secure_bytes<R>(rng: &mut R, len: usize) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut bytes = vec![0u8; len];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| RsaError::SecureRandomUnavailable(e.to_string()))?;
    Ok(bytes)
}

/// Draw a single non-zero byte, redrawing zeros
pub fn nonzero_byte<R>(rng: &mut R) -> Result<u8>
where
    R: RngCore + CryptoRng + ?Sized,
{
    loop {
        let mut byte = [0u8; 1];
        rng.try_fill_bytes(&mut byte)
            .map_err(|e| RsaError::SecureRandomUnavailable(e.to_string()))?;
        if byte[0] != 0 {
            return Ok(byte[0]);
        }
    }
}

/// Uniform integer in [0, 2^bits)
fn uniform_bits<R>(rng: &mut R, bits: u64) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let len = ((bits + 7) / 8) as usize;
    let mut bytes = secure_bytes(rng, len)?;

    let excess = (len as u64) * 8 - bits;
    if let Some(first) = bytes.first_mut() {
        *first &= 0xFFu8 >> excess;
    }

    Ok(from_bytes(&bytes))
}

/// Random integer with exactly `bits` significant bits.
///
/// The top bit is forced to 1, so the result lies in [2^(bits-1), 2^bits).
pub fn random_bits<R>(rng: &mut R, bits: u64) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if bits == 0 {
        return Err(RsaError::InvalidBitLength);
    }

    let mut value = uniform_bits(rng, bits)?;
    value.set_bit(bits - 1, true);
    Ok(value)
}

/// Uniform integer in the closed range [min, max].
///
/// Draws of `bit_length(max - min + 1)` bits that land outside the range are
/// discarded, so every value is equally likely.
pub fn random_in_range<R>(rng: &mut R, min: &RsaBigInt, max: &RsaBigInt) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if min > max {
        return Err(RsaError::InvalidRange);
    }

    let range = max - min + 1u8;
    let bits = bit_length(&range);

    loop {
        let draw = uniform_bits(rng, bits)?;
        if draw < range {
            return Ok(min + draw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Source whose backend always fails
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy source offline",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_random_bits_exact_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for bits in [1u64, 7, 8, 9, 63, 64, 65, 256, 1000] {
            for _ in 0..20 {
                let value = random_bits(&mut rng, bits).unwrap();
                assert_eq!(value.bits(), bits, "bits = {}", bits);
            }
        }
    }

    #[test]
    fn test_random_bits_zero_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_bits(&mut rng, 0), Err(RsaError::InvalidBitLength));
    }

    #[test]
    fn test_random_in_range_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let min = from_u64(2);
        let max = from_u64(9);
        let mut seen = [false; 10];

        for _ in 0..500 {
            let value = random_in_range(&mut rng, &min, &max).unwrap();
            assert!(value >= min && value <= max);
            let idx: usize = value.to_string().parse().unwrap();
            seen[idx] = true;
        }

        assert!(seen[2..=9].iter().all(|&s| s));
    }

    #[test]
    fn test_random_in_range_single_value() {
        let mut rng = StdRng::seed_from_u64(3);
        let v = from_u64(5);
        assert_eq!(random_in_range(&mut rng, &v, &v).unwrap(), v);
    }

    #[test]
    fn test_random_in_range_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = random_in_range(&mut rng, &from_u64(5), &from_u64(4)).unwrap_err();
        assert_eq!(err, RsaError::InvalidRange);
    }

    #[test]
    fn test_nonzero_byte() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            assert_ne!(nonzero_byte(&mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_unavailable_source_is_fatal() {
        let mut rng = BrokenRng;
        assert!(matches!(
            random_bits(&mut rng, 64),
            Err(RsaError::SecureRandomUnavailable(_))
        ));
        assert!(matches!(
            nonzero_byte(&mut rng),
            Err(RsaError::SecureRandomUnavailable(_))
        ));
    }
}
