// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod bigint;
pub mod ciphertext;
pub mod codec;
pub mod decrypt;
pub mod encrypt;
pub mod error;
pub mod keygen;
pub mod padding;
pub mod primality;
pub mod random;

pub use ciphertext::Ciphertext;
pub use codec::{
    decode_key, decode_private_key, decode_public_key, encode_private_key, encode_public_key,
    DecodedKey,
};
pub use decrypt::{decrypt_bytes, decrypt_to_string, BlockOutcome, Decryption};
pub use encrypt::{encrypt_bytes, encrypt_string};
pub use error::{Result, RsaError};
pub use keygen::{
    generate_keypair, generate_keypair_with, KeyGenConfig, KeyGenProgress, KeyGenTask,
    RsaKeyPair, RsaPrivateKey, RsaPublicKey,
};
pub use padding::{pad_pkcs1_v15, unpad_pkcs1_v15};
pub use primality::{is_probable_prime, miller_rabin, random_prime};
