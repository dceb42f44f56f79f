// RSA Primality Testing
// Miller-Rabin probabilistic test and random prime search

use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use super::bigint::{from_u64, mod_pow, RsaBigInt};
use super::error::{Result, RsaError};
use super::random::{random_bits, random_in_range};

/// Witness rounds used by key generation; error probability ≤ 4^-5 per test
pub const DEFAULT_PRIMALITY_ROUNDS: u32 = 5;

/// Primes below 1000, used to discard most candidates before Miller-Rabin
const SMALL_PRIMES: &[u32] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797,
    809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929,
    937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

/// Miller-Rabin primality test
/// Returns true if n is probably prime after `rounds` random witnesses
pub fn miller_rabin<R>(n: &RsaBigInt, rounds: u32, rng: &mut R) -> Result<bool>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let two = from_u64(2);
    let three = from_u64(3);

    if n <= &RsaBigInt::one() {
        return Ok(false);
    }
    if n == &two || n == &three {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }

    // Write n-1 as 2^r * d with d odd
    let n_minus_one = n - 1u8;
    let r = n_minus_one
        .trailing_zeros()
        .ok_or(RsaError::InvalidModulus)?;
    let d = &n_minus_one >> r;
    let n_minus_two = n - 2u8;

    'witness: for _ in 0..rounds {
        let a = random_in_range(rng, &two, &n_minus_two)?;
        let mut x = mod_pow(&a, &d, n)?;

        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..r {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
            if x.is_one() {
                return Ok(false);
            }
        }

        // Composite
        return Ok(false);
    }

    // Probably prime
    Ok(true)
}

/// Trial division by small primes, then Miller-Rabin
pub fn is_probable_prime<R>(n: &RsaBigInt, rounds: u32, rng: &mut R) -> Result<bool>
where
    R: RngCore + CryptoRng + ?Sized,
{
    for &p in SMALL_PRIMES {
        if *n == from_u64(p as u64) {
            return Ok(true);
        }
        if (n % p).is_zero() {
            return Ok(false);
        }
    }

    miller_rabin(n, rounds, rng)
}

/// Generate a random prime of exactly `bits` bits
pub fn random_prime<R>(bits: u64, rounds: u32, rng: &mut R) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    random_prime_observed(bits, rounds, rng, |_| {}).map(|(prime, _)| prime)
}

/// Prime search reporting every rejected candidate to `on_reject`.
///
/// Returns the prime and the number of candidates drawn to find it.
pub fn random_prime_observed<R, F>(
    bits: u64,
    rounds: u32,
    rng: &mut R,
    mut on_reject: F,
) -> Result<(RsaBigInt, u64)>
where
    R: RngCore + CryptoRng + ?Sized,
    F: FnMut(u64),
{
    if bits < 2 {
        return Err(RsaError::InvalidBitLength);
    }

    let mut attempts = 0u64;
    loop {
        attempts += 1;

        // Setting the low bit keeps the top bit, and so the bit length, intact
        let mut candidate = random_bits(rng, bits)?;
        candidate.set_bit(0, true);

        if is_probable_prime(&candidate, rounds, rng)? {
            return Ok((candidate, attempts));
        }
        on_reject(attempts);
    }
}
