// RSA Key Generation
// Implements RSA key pair generation (public and private keys)

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use super::bigint::{bit_length, byte_length, from_u64, gcd, mod_inverse, RsaBigInt};
use super::ciphertext::Ciphertext;
use super::decrypt::{decrypt_bytes, Decryption};
use super::encrypt::encrypt_bytes;
use super::error::{Result, RsaError};
use super::padding::max_chunk_len;
use super::primality::{random_prime_observed, DEFAULT_PRIMALITY_ROUNDS};

/// Smallest modulus whose block still fits PKCS#1 overhead plus payload
pub const MIN_KEY_SIZE: u64 = 128;

/// Modulus sizes below this are accepted but logged as insecure
pub const RECOMMENDED_MIN_KEY_SIZE: u64 = 1024;

pub const DEFAULT_KEY_SIZE: u64 = 2048;
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65537;
pub const DEFAULT_MAX_EXPONENT_ATTEMPTS: u32 = 10_000;

/// RSA Public Key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    pub(crate) n: RsaBigInt, // Modulus
    pub(crate) e: RsaBigInt, // Public exponent
}

/// RSA Private Key
///
/// The prime factors are retained for export; decryption only uses `n` and `d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    pub(crate) n: RsaBigInt, // Modulus (same as public)
    pub(crate) d: RsaBigInt, // Private exponent
    pub(crate) p: RsaBigInt, // First prime factor
    pub(crate) q: RsaBigInt, // Second prime factor
}

/// RSA Key Pair (both public and private keys, derived from the same primes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyPair {
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
}

impl RsaPublicKey {
    /// Build a public key from imported components.
    pub fn new(n: RsaBigInt, e: RsaBigInt) -> Result<Self> {
        if n <= RsaBigInt::one() || n.is_even() {
            return Err(RsaError::InvalidKeyFormat("modulus must be odd and greater than 1".into()));
        }
        if e <= RsaBigInt::one() || e.is_even() || e >= n {
            return Err(RsaError::InvalidKeyFormat(
                "public exponent must be odd and in (1, n)".into(),
            ));
        }

        Ok(Self { n, e })
    }

    pub fn n(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn e(&self) -> &RsaBigInt {
        &self.e
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        bit_length(&self.n)
    }

    /// Bytes per cipher block
    pub fn block_size(&self) -> usize {
        byte_length(&self.n)
    }

    /// Largest plaintext chunk carried by one block
    pub fn max_chunk_len(&self) -> usize {
        max_chunk_len(self.block_size())
    }

    /// Encrypt a message using this public key and the OS random source
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphertext> {
        encrypt_bytes(plaintext, self, &mut OsRng)
    }

    /// Encrypt with a caller-provided random source
    pub fn encrypt_with<R>(&self, plaintext: &[u8], rng: &mut R) -> Result<Ciphertext>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        encrypt_bytes(plaintext, self, rng)
    }
}

impl RsaPrivateKey {
    /// Build a private key from imported components.
    ///
    /// The factors must reproduce the modulus.
    pub fn new(n: RsaBigInt, d: RsaBigInt, p: RsaBigInt, q: RsaBigInt) -> Result<Self> {
        if n <= RsaBigInt::one() || d.is_zero() {
            return Err(RsaError::InvalidKeyFormat("modulus and exponent must be positive".into()));
        }
        if p <= RsaBigInt::one() || q <= RsaBigInt::one() || &p * &q != n {
            return Err(RsaError::InvalidKeyFormat("prime factors do not match modulus".into()));
        }

        Ok(Self { n, d, p, q })
    }

    pub fn n(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn d(&self) -> &RsaBigInt {
        &self.d
    }

    pub fn p(&self) -> &RsaBigInt {
        &self.p
    }

    pub fn q(&self) -> &RsaBigInt {
        &self.q
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        bit_length(&self.n)
    }

    /// Bytes per cipher block
    pub fn block_size(&self) -> usize {
        byte_length(&self.n)
    }

    /// Decrypt a ciphertext using this private key
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Decryption> {
        decrypt_bytes(ciphertext, self)
    }
}

impl RsaKeyPair {
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Get the bit length of the key
    pub fn bit_length(&self) -> u64 {
        self.public_key.bit_length()
    }

    pub fn into_parts(self) -> (RsaPublicKey, RsaPrivateKey) {
        (self.public_key, self.private_key)
    }
}

/// Key generation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGenConfig {
    /// Target modulus size in bits; each prime gets half
    pub key_size: u64,
    /// Miller-Rabin witness rounds per candidate
    pub primality_rounds: u32,
    /// First public exponent tried, odd and at least 65537; the search moves up by 2
    pub public_exponent: u64,
    /// Upper bound on exponents tried before giving up
    pub max_exponent_attempts: u32,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        Self {
            key_size: DEFAULT_KEY_SIZE,
            primality_rounds: DEFAULT_PRIMALITY_ROUNDS,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            max_exponent_attempts: DEFAULT_MAX_EXPONENT_ATTEMPTS,
        }
    }
}

impl KeyGenConfig {
    pub fn new(key_size: u64) -> Self {
        Self {
            key_size,
            ..Self::default()
        }
    }

    pub fn with_primality_rounds(mut self, rounds: u32) -> Self {
        self.primality_rounds = rounds;
        self
    }

    pub fn with_public_exponent(mut self, e: u64) -> Self {
        self.public_exponent = e;
        self
    }

    pub fn with_max_exponent_attempts(mut self, attempts: u32) -> Self {
        self.max_exponent_attempts = attempts;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.key_size < MIN_KEY_SIZE || self.key_size % 2 != 0 {
            return Err(RsaError::InvalidKeySize {
                min: MIN_KEY_SIZE,
                actual: self.key_size,
            });
        }
        if self.public_exponent < DEFAULT_PUBLIC_EXPONENT || self.public_exponent % 2 == 0 {
            return Err(RsaError::InvalidPublicExponent(self.public_exponent));
        }
        Ok(())
    }
}

/// Milestones reported while a key pair is being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenProgress {
    /// Search for prime number `index` (1 or 2) started
    SearchingPrime { index: u8 },
    /// A candidate for prime `index` failed the primality test
    CandidateRejected { index: u8, attempts: u64 },
    /// Prime `index` found after `attempts` candidates
    PrimeFound { index: u8, attempts: u64 },
    /// Public exponent chosen after `attempts` coprimality checks
    ExponentSelected { attempts: u32 },
    Finished,
}

type ProgressFn<'a> = Box<dyn FnMut(KeyGenProgress) + 'a>;

/// One key generation request.
///
/// Runs synchronously to completion once started; callers in interactive
/// contexts should run it on a worker thread.
pub struct KeyGenTask<'a> {
    config: KeyGenConfig,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> KeyGenTask<'a> {
    pub fn new(config: KeyGenConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    pub fn config(&self) -> &KeyGenConfig {
        &self.config
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(KeyGenProgress) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Generate the key pair
    pub fn run<R>(mut self, rng: &mut R) -> Result<RsaKeyPair>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        self.config.validate()?;

        let key_size = self.config.key_size;
        if key_size < RECOMMENDED_MIN_KEY_SIZE {
            warn!(key_size, "generating an RSA key below {} bits", RECOMMENDED_MIN_KEY_SIZE);
        }

        let prime_bits = key_size / 2;

        // Step 1: Generate two distinct random primes p and q
        let p = self.search_prime(1, prime_bits, rng)?;
        let q = loop {
            let q = self.search_prime(2, prime_bits, rng)?;
            if q != p {
                break q;
            }
            debug!("second prime equals the first, retrying");
        };

        // Step 2: n = p * q, φ(n) = (p-1)(q-1)
        let n = &p * &q;
        let phi_n = (&p - 1u8) * (&q - 1u8);

        // Step 3: smallest odd e >= the configured start that is coprime with φ(n)
        let (e, attempts) = select_exponent(
            self.config.public_exponent,
            self.config.max_exponent_attempts,
            &phi_n,
        )?;
        self.emit(KeyGenProgress::ExponentSelected { attempts });

        // Step 4: d = e^(-1) mod φ(n)
        let d = mod_inverse(&e, &phi_n)?;

        info!(bits = n.bits(), e = %e, "generated RSA key pair");
        self.emit(KeyGenProgress::Finished);

        Ok(RsaKeyPair {
            public_key: RsaPublicKey { n: n.clone(), e },
            private_key: RsaPrivateKey { n, d, p, q },
        })
    }

    fn search_prime<R>(&mut self, index: u8, bits: u64, rng: &mut R) -> Result<RsaBigInt>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        self.emit(KeyGenProgress::SearchingPrime { index });

        let rounds = self.config.primality_rounds;
        let progress = &mut self.progress;
        let (prime, attempts) = random_prime_observed(bits, rounds, rng, |attempts| {
            if let Some(callback) = progress.as_mut() {
                callback(KeyGenProgress::CandidateRejected { index, attempts });
            }
        })?;

        debug!(index, bits, attempts, "found prime");
        self.emit(KeyGenProgress::PrimeFound { index, attempts });
        Ok(prime)
    }

    fn emit(&mut self, event: KeyGenProgress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(event);
        }
    }
}

/// Walk odd exponents upward from `start` until one is coprime with φ(n)
fn select_exponent(start: u64, max_attempts: u32, phi_n: &BigUint) -> Result<(RsaBigInt, u32)> {
    let mut e = from_u64(start);

    for attempt in 1..=max_attempts {
        if gcd(&e, phi_n).is_one() {
            return Ok((e, attempt));
        }
        e += 2u8;
    }

    Err(RsaError::ExponentSearchExhausted {
        attempts: max_attempts,
    })
}

/// Generate RSA key pair with the given modulus size and default settings
pub fn generate_keypair(key_size: u64) -> Result<RsaKeyPair> {
    generate_keypair_with(KeyGenConfig::new(key_size), &mut OsRng)
}

/// Generate RSA key pair from an explicit configuration and random source
pub fn generate_keypair_with<R>(config: KeyGenConfig, rng: &mut R) -> Result<RsaKeyPair>
where
    R: RngCore + CryptoRng + ?Sized,
{
    KeyGenTask::new(config).run(rng)
}
