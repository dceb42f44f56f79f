// File Operations for RSA keys and ciphertexts
// Handles reading and writing key files, ciphertext and plaintext

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::rsa::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key, RsaError,
    RsaKeyPair, RsaPrivateKey, RsaPublicKey,
};

pub const PUBLIC_KEY_FILE: &str = "public_key.pem";
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    NotText { path: String },

    #[error("Crypto error: {0}")]
    Crypto(#[from] RsaError),
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

fn io_error(path: &Path, source: io::Error) -> FileError {
    FileError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Read entire file into memory
pub fn read_file(path: &Path) -> FileResult<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(|e| io_error(path, e))?;
    Ok(data)
}

/// Read a UTF-8 text file such as a key or ciphertext
pub fn read_text(path: &Path) -> FileResult<String> {
    let data = read_file(path)?;
    String::from_utf8(data).map_err(|_| FileError::NotText {
        path: path.display().to_string(),
    })
}

/// Write data to file, replacing any previous content
pub fn write_file(path: &Path, data: &[u8]) -> FileResult<()> {
    let mut file = File::create(path).map_err(|e| io_error(path, e))?;
    file.write_all(data).map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Write text, ending it with a newline
pub fn write_text(path: &Path, text: &str) -> FileResult<()> {
    let mut data = text.as_bytes().to_vec();
    if !text.ends_with('\n') {
        data.push(b'\n');
    }
    write_file(path, &data)
}

/// Create a directory and its parents if missing
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    fs::create_dir_all(path).map_err(|e| io_error(path, e))
}

/// Write both halves of a key pair into `dir`, returning (public, private) paths
pub fn save_keypair(dir: &Path, keypair: &RsaKeyPair) -> FileResult<(PathBuf, PathBuf)> {
    ensure_dir(dir)?;

    let public_path = dir.join(PUBLIC_KEY_FILE);
    let private_path = dir.join(PRIVATE_KEY_FILE);
    write_text(&public_path, &encode_public_key(keypair.public_key())?)?;
    write_text(&private_path, &encode_private_key(keypair.private_key())?)?;

    Ok((public_path, private_path))
}

pub fn load_public_key(path: &Path) -> FileResult<RsaPublicKey> {
    Ok(decode_public_key(&read_text(path)?)?)
}

pub fn load_private_key(path: &Path) -> FileResult<RsaPrivateKey> {
    Ok(decode_private_key(&read_text(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::{generate_keypair_with, KeyGenConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_save_and_load_keypair() {
        let dir = tempfile::tempdir().unwrap();
        let keypair =
            generate_keypair_with(KeyGenConfig::new(256), &mut StdRng::seed_from_u64(8)).unwrap();

        let (public_path, private_path) = save_keypair(&dir.path().join("keys"), &keypair).unwrap();
        assert!(public_path.ends_with(PUBLIC_KEY_FILE));
        assert_eq!(&load_public_key(&public_path).unwrap(), keypair.public_key());
        assert_eq!(&load_private_key(&private_path).unwrap(), keypair.private_key());

        // A public key file is not accepted where a private key is expected
        let err = load_private_key(&public_path).unwrap_err();
        assert!(matches!(err, FileError::Crypto(RsaError::InvalidKeyFormat(_))));
    }

    #[test]
    fn test_text_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.pem");

        write_text(&path, "-----BEGIN RSA PUBLIC KEY-----").unwrap();
        assert_eq!(read_text(&path).unwrap(), "-----BEGIN RSA PUBLIC KEY-----\n");
    }

    #[test]
    fn test_binary_is_not_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");

        write_file(&path, &[0xFF, 0x00, 0xFE]).unwrap();
        assert_eq!(read_file(&path).unwrap(), vec![0xFF, 0x00, 0xFE]);
        assert!(matches!(read_text(&path), Err(FileError::NotText { .. })));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, FileError::Io { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_ensure_dir_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
