// RSA Encryption Implementation
// Splits plaintext into blocks, pads each with PKCS#1 v1.5 and raises it to e mod n

use rand::{CryptoRng, RngCore};
use tracing::debug;

use super::bigint::{from_bytes, mod_pow};
use super::ciphertext::Ciphertext;
use super::error::{Result, RsaError};
use super::keygen::RsaPublicKey;
use super::padding::pad_pkcs1_v15;

/// Encrypt bytes using RSA public key
/// Returns one ciphertext integer per chunk of at most `block_size - 11` bytes
pub fn encrypt_bytes<R>(plaintext: &[u8], public_key: &RsaPublicKey, rng: &mut R) -> Result<Ciphertext>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let block_size = public_key.block_size();
    let max_chunk = public_key.max_chunk_len();

    if max_chunk == 0 && !plaintext.is_empty() {
        return Err(RsaError::DataTooLong {
            len: plaintext.len(),
            max: 0,
        });
    }

    let mut blocks = Vec::with_capacity(plaintext.len().div_ceil(max_chunk.max(1)));
    for chunk in plaintext.chunks(max_chunk.max(1)) {
        let padded = pad_pkcs1_v15(chunk, block_size, rng)?;

        // Compute c = m^e mod n
        let m = from_bytes(&padded);
        blocks.push(mod_pow(&m, &public_key.e, &public_key.n)?);
    }

    debug!(blocks = blocks.len(), block_size, "encrypted plaintext");
    Ok(Ciphertext::new(blocks))
}

/// Encrypt a string using RSA public key
pub fn encrypt_string<R>(plaintext: &str, public_key: &RsaPublicKey, rng: &mut R) -> Result<Ciphertext>
where
    R: RngCore + CryptoRng + ?Sized,
{
    encrypt_bytes(plaintext.as_bytes(), public_key, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;
    use crate::rsa::keygen::{generate_keypair_with, KeyGenConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    #[test]
    fn test_encrypt_bytes() {
        let mut rng = rng();
        let keypair = generate_keypair_with(KeyGenConfig::new(512), &mut rng).unwrap();
        let message = b"Hello, RSA!";

        let ciphertext = encrypt_bytes(message, keypair.public_key(), &mut rng).unwrap();
        assert_eq!(ciphertext.len(), 1);
        assert!(&ciphertext.blocks()[0] < keypair.public_key().n());
    }

    #[test]
    fn test_encrypt_is_randomized() {
        let mut rng = rng();
        let keypair = generate_keypair_with(KeyGenConfig::new(512), &mut rng).unwrap();

        let first = encrypt_string("same text", keypair.public_key(), &mut rng).unwrap();
        let second = encrypt_string("same text", keypair.public_key(), &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_encrypt_splits_into_blocks() {
        let mut rng = rng();
        let keypair = generate_keypair_with(KeyGenConfig::new(512), &mut rng).unwrap();
        let max_chunk = keypair.public_key().max_chunk_len();
        assert_eq!(max_chunk, 64 - 11);

        let message = vec![0x41u8; max_chunk * 2 + 1];
        let ciphertext = encrypt_bytes(&message, keypair.public_key(), &mut rng).unwrap();
        assert_eq!(ciphertext.len(), 3);

        let exact = vec![0x42u8; max_chunk];
        assert_eq!(encrypt_bytes(&exact, keypair.public_key(), &mut rng).unwrap().len(), 1);
    }

    #[test]
    fn test_encrypt_empty() {
        let mut rng = rng();
        let keypair = generate_keypair_with(KeyGenConfig::new(256), &mut rng).unwrap();
        let ciphertext = encrypt_bytes(b"", keypair.public_key(), &mut rng).unwrap();
        assert!(ciphertext.is_empty());
    }

    #[test]
    fn test_encrypt_with_undersized_modulus() {
        // n = 3233 gives 2 byte blocks, too small for any padded chunk
        let key = RsaPublicKey::new(from_u64(3233), from_u64(17)).unwrap();
        let err = encrypt_bytes(b"x", &key, &mut rng()).unwrap_err();
        assert_eq!(err, RsaError::DataTooLong { len: 1, max: 0 });
    }
}
