// RSA Error Types
// Failure kinds shared by every stage of the RSA pipeline

/// Errors produced by key generation, the key codec and the block cipher.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RsaError {
    #[error("Secure random source unavailable: {0}")]
    SecureRandomUnavailable(String),

    #[error("Modular inverse does not exist")]
    NoModularInverse,

    #[error("Data too long: max {max} bytes, got {len}")]
    DataTooLong { len: usize, max: usize },

    #[error("Invalid padding: {0}")]
    InvalidPadding(&'static str),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid key size: must be even and at least {min} bits, got {actual}")]
    InvalidKeySize { min: u64, actual: u64 },

    #[error("Public exponent must be odd and at least 3, got {0}")]
    InvalidPublicExponent(u64),

    #[error("Bit length must be positive")]
    InvalidBitLength,

    #[error("Empty range: min is greater than max")]
    InvalidRange,

    #[error("Modulus must be positive")]
    InvalidModulus,

    #[error("No public exponent coprime with phi(n) after {attempts} attempts")]
    ExponentSearchExhausted { attempts: u32 },

    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("Invalid UTF-8 in decrypted data: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Decryption completed with {fallback_blocks} blocks unpadded")]
    DegradedDecryption { fallback_blocks: usize },
}

pub type Result<T> = std::result::Result<T, RsaError>;
