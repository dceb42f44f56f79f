// RSA Decryption Implementation
// Raises each block to d mod n and strips PKCS#1 v1.5 padding

use tracing::{debug, warn};

use super::bigint::{mod_pow, to_bytes_padded};
use super::ciphertext::Ciphertext;
use super::error::{Result, RsaError};
use super::keygen::RsaPrivateKey;
use super::padding::unpad_pkcs1_v15;

/// How one block was turned back into plaintext
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Padding was valid and removed
    Unpadded,
    /// Padding was invalid; the raw block bytes were kept
    RawFallback { reason: RsaError },
}

/// Decrypted bytes together with the outcome of every block.
///
/// A block with broken padding does not abort decryption, so callers decide
/// whether a result with fallback blocks is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decryption {
    plaintext: Vec<u8>,
    outcomes: Vec<BlockOutcome>,
}

impl Decryption {
    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    pub fn outcomes(&self) -> &[BlockOutcome] {
        &self.outcomes
    }

    /// Number of blocks whose padding could not be removed
    pub fn fallback_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BlockOutcome::RawFallback { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.fallback_count() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.plaintext
    }

    /// Decode as UTF-8, accepting fallback blocks
    pub fn into_string(self) -> Result<String> {
        Ok(String::from_utf8(self.plaintext)?)
    }

    /// Decode as UTF-8, failing if any block fell back to raw bytes
    pub fn into_strict_string(self) -> Result<String> {
        let fallback_blocks = self.fallback_count();
        if fallback_blocks > 0 {
            return Err(RsaError::DegradedDecryption { fallback_blocks });
        }
        self.into_string()
    }
}

/// Decrypt ciphertext blocks using RSA private key
pub fn decrypt_bytes(ciphertext: &Ciphertext, private_key: &RsaPrivateKey) -> Result<Decryption> {
    let block_size = private_key.block_size();
    let mut plaintext = Vec::new();
    let mut outcomes = Vec::with_capacity(ciphertext.len());

    for (index, c) in ciphertext.blocks().iter().enumerate() {
        if c >= &private_key.n {
            return Err(RsaError::InvalidCiphertext(format!(
                "block {} is not smaller than the modulus",
                index
            )));
        }

        // Compute m = c^d mod n
        let m = mod_pow(c, &private_key.d, &private_key.n)?;
        let block = to_bytes_padded(&m, block_size);

        match unpad_pkcs1_v15(&block) {
            Ok(data) => {
                plaintext.extend_from_slice(data);
                outcomes.push(BlockOutcome::Unpadded);
            }
            Err(reason) => {
                debug!(index, %reason, "keeping raw block");
                plaintext.extend_from_slice(&block);
                outcomes.push(BlockOutcome::RawFallback { reason });
            }
        }
    }

    let decryption = Decryption { plaintext, outcomes };
    let fallback_blocks = decryption.fallback_count();
    if fallback_blocks > 0 {
        warn!(fallback_blocks, "decryption completed with {} blocks unpadded", fallback_blocks);
    }

    Ok(decryption)
}

/// Decrypt ciphertext to a string
pub fn decrypt_to_string(ciphertext: &Ciphertext, private_key: &RsaPrivateKey) -> Result<String> {
    decrypt_bytes(ciphertext, private_key)?.into_string()
}
