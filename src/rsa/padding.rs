// PKCS#1 v1.5 Padding
// Implements RSA PKCS#1 v1.5 encryption padding (block type 2)

use rand::{CryptoRng, RngCore};

use super::error::{Result, RsaError};
use super::random::nonzero_byte;

/// Bytes of fixed overhead per block: 0x00 0x02, 8 padding bytes, 0x00 separator
pub const PKCS1_OVERHEAD: usize = 11;

/// Largest chunk of data that fits one block of `block_size` bytes
pub fn max_chunk_len(block_size: usize) -> usize {
    block_size.saturating_sub(PKCS1_OVERHEAD)
}

/// PKCS#1 v1.5 Padding for encryption
/// Format: 0x00 || 0x02 || PS || 0x00 || data
/// PS = padding string of non-zero random bytes (at least 8 bytes)
pub fn pad_pkcs1_v15<R>(data: &[u8], block_size: usize, rng: &mut R) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let max = max_chunk_len(block_size);
    if block_size < PKCS1_OVERHEAD || data.len() > max {
        return Err(RsaError::DataTooLong { len: data.len(), max });
    }

    let ps_len = block_size - data.len() - 3;

    let mut block = Vec::with_capacity(block_size);
    block.push(0x00);
    block.push(0x02);
    for _ in 0..ps_len {
        block.push(nonzero_byte(rng)?);
    }
    block.push(0x00);
    block.extend_from_slice(data);

    debug_assert_eq!(block.len(), block_size);
    Ok(block)
}

/// Remove PKCS#1 v1.5 padding from a decrypted block
/// Returns the bytes following the first zero separator after the header
pub fn unpad_pkcs1_v15(block: &[u8]) -> Result<&[u8]> {
    if block.len() < 2 {
        return Err(RsaError::InvalidPadding("block too short"));
    }

    if block[0] != 0x00 {
        return Err(RsaError::InvalidPadding("first byte must be 0x00"));
    }

    if block[1] != 0x02 {
        return Err(RsaError::InvalidPadding("second byte must be 0x02"));
    }

    let separator_pos = block[2..]
        .iter()
        .position(|&b| b == 0x00)
        .map(|pos| pos + 2)
        .ok_or(RsaError::InvalidPadding("no separator byte found"))?;

    Ok(&block[separator_pos + 1..])
}
