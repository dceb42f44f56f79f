//! From-scratch RSA: big-integer modular arithmetic, Miller-Rabin prime
//! search, key generation, PKCS#1 v1.5 block encryption and a PEM-style key
//! container.
//!
//! ```rust,no_run
//! use rsa_tool::rsa::{decode_public_key, encode_public_key, generate_keypair};
//!
//! let keypair = generate_keypair(1024).expect("key generation failed");
//! let pem = encode_public_key(keypair.public_key()).expect("encode failed");
//! let public = decode_public_key(&pem).expect("decode failed");
//!
//! let ciphertext = public.encrypt(b"Hello, RSA!").expect("encryption failed");
//! let decrypted = keypair.private_key().decrypt(&ciphertext).expect("decryption failed");
//! assert!(decrypted.is_clean());
//! assert_eq!(decrypted.plaintext(), b"Hello, RSA!");
//! ```

pub mod rsa;
pub mod util;
