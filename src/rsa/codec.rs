// RSA Key Codec
// PEM-style text container: base64 of a JSON object of decimal strings,
// sealed with a truncated SHA-256 fingerprint of the fields

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::bigint::RsaBigInt;
use super::error::{Result, RsaError};
use super::keygen::{RsaPrivateKey, RsaPublicKey};

/// Body lines are folded to this many characters
pub const LINE_WIDTH: usize = 64;

pub const PUBLIC_LABEL: &str = "PUBLIC";
pub const PRIVATE_LABEL: &str = "PRIVATE";

/// Leading SHA-256 bytes kept in the `check` field
const CHECK_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
struct PublicKeyBody {
    n: String,
    e: String,
    check: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PrivateKeyBody {
    n: String,
    d: String,
    p: String,
    q: String,
    check: String,
}

/// A key read back from its text form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedKey {
    Public(RsaPublicKey),
    Private(RsaPrivateKey),
}

fn header(label: &str) -> String {
    format!("-----BEGIN RSA {} KEY-----", label)
}

fn footer(label: &str) -> String {
    format!("-----END RSA {} KEY-----", label)
}

/// Lowercase hex of the first `CHECK_LEN` bytes of SHA-256 over the label
/// and the named field strings
fn fingerprint(label: &str, fields: &[(&str, &str)]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    for (name, value) in fields {
        hasher.update(b"\n");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hex::encode(&hasher.finalize()[..CHECK_LEN])
}

fn verify_check(check: &str, label: &str, fields: &[(&str, &str)]) -> Result<()> {
    if check != fingerprint(label, fields) {
        return Err(RsaError::InvalidKeyFormat("key body checksum mismatch".into()));
    }
    Ok(())
}

/// Wrap a serialized body in header/footer lines, folding the base64 text
fn armor<T: Serialize>(label: &str, body: &T) -> Result<String> {
    let json = serde_json::to_string(body)
        .map_err(|e| RsaError::InvalidKeyFormat(format!("cannot serialize key: {}", e)))?;
    let encoded = STANDARD.encode(json.as_bytes());

    let mut out = header(label);
    out.push('\n');
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        let line = std::str::from_utf8(line)
            .map_err(|_| RsaError::InvalidKeyFormat("base64 output is not ASCII".into()))?;
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&footer(label));
    Ok(out)
}

/// Locate the markers and return (label, base64 body)
fn dearmor(text: &str) -> Result<(String, String)> {
    let mut lines = text.lines().map(str::trim);

    let label = lines
        .by_ref()
        .find_map(|line| {
            line.strip_prefix("-----BEGIN RSA ")
                .and_then(|rest| rest.strip_suffix(" KEY-----"))
        })
        .ok_or_else(|| RsaError::InvalidKeyFormat("missing BEGIN marker".into()))?
        .to_string();

    let end = footer(&label);
    let mut body = String::new();
    let mut closed = false;
    for line in lines {
        if line == end {
            closed = true;
            break;
        }
        if line.starts_with("-----") {
            return Err(RsaError::InvalidKeyFormat(format!("unexpected marker '{}'", line)));
        }
        body.push_str(line);
    }

    if !closed {
        return Err(RsaError::InvalidKeyFormat("missing END marker".into()));
    }
    if body.is_empty() {
        return Err(RsaError::InvalidKeyFormat("empty key body".into()));
    }

    Ok((label, body))
}

/// Decode base64 and JSON, accepting only the exact bytes `armor` emits
fn decode_body<T: DeserializeOwned + Serialize>(body: &str) -> Result<T> {
    let json = STANDARD
        .decode(body)
        .map_err(|e| RsaError::InvalidKeyFormat(format!("bad base64: {}", e)))?;
    let fields: T = serde_json::from_slice(&json)
        .map_err(|e| RsaError::InvalidKeyFormat(format!("bad key body: {}", e)))?;

    let canonical = serde_json::to_vec(&fields)
        .map_err(|e| RsaError::InvalidKeyFormat(format!("bad key body: {}", e)))?;
    if canonical != json {
        return Err(RsaError::InvalidKeyFormat("key body is not in canonical form".into()));
    }

    Ok(fields)
}

fn parse_field(name: &str, value: &str) -> Result<RsaBigInt> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RsaError::InvalidKeyFormat(format!(
            "field '{}' is not a decimal integer",
            name
        )));
    }
    RsaBigInt::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| RsaError::InvalidKeyFormat(format!("field '{}' is not a decimal integer", name)))
}

pub fn encode_public_key(key: &RsaPublicKey) -> Result<String> {
    let n = key.n().to_str_radix(10);
    let e = key.e().to_str_radix(10);
    let check = fingerprint(PUBLIC_LABEL, &[("n", &n), ("e", &e)]);
    armor(PUBLIC_LABEL, &PublicKeyBody { n, e, check })
}

pub fn encode_private_key(key: &RsaPrivateKey) -> Result<String> {
    let n = key.n().to_str_radix(10);
    let d = key.d().to_str_radix(10);
    let p = key.p().to_str_radix(10);
    let q = key.q().to_str_radix(10);
    let check = fingerprint(PRIVATE_LABEL, &[("n", &n), ("d", &d), ("p", &p), ("q", &q)]);
    armor(PRIVATE_LABEL, &PrivateKeyBody { n, d, p, q, check })
}

fn public_from_body(body: &str) -> Result<RsaPublicKey> {
    let fields: PublicKeyBody = decode_body(body)?;
    verify_check(&fields.check, PUBLIC_LABEL, &[("n", &fields.n), ("e", &fields.e)])?;
    RsaPublicKey::new(parse_field("n", &fields.n)?, parse_field("e", &fields.e)?)
}

fn private_from_body(body: &str) -> Result<RsaPrivateKey> {
    let fields: PrivateKeyBody = decode_body(body)?;
    verify_check(
        &fields.check,
        PRIVATE_LABEL,
        &[("n", &fields.n), ("d", &fields.d), ("p", &fields.p), ("q", &fields.q)],
    )?;
    RsaPrivateKey::new(
        parse_field("n", &fields.n)?,
        parse_field("d", &fields.d)?,
        parse_field("p", &fields.p)?,
        parse_field("q", &fields.q)?,
    )
}

/// Decode a key of either kind, as named by its header
pub fn decode_key(text: &str) -> Result<DecodedKey> {
    let (label, body) = dearmor(text)?;
    match label.as_str() {
        PUBLIC_LABEL => public_from_body(&body).map(DecodedKey::Public),
        PRIVATE_LABEL => private_from_body(&body).map(DecodedKey::Private),
        other => Err(RsaError::InvalidKeyFormat(format!("unknown key label '{}'", other))),
    }
}

pub fn decode_public_key(text: &str) -> Result<RsaPublicKey> {
    match decode_key(text)? {
        DecodedKey::Public(key) => Ok(key),
        DecodedKey::Private(_) => Err(RsaError::InvalidKeyFormat(
            "expected a public key, found a private key".into(),
        )),
    }
}

pub fn decode_private_key(text: &str) -> Result<RsaPrivateKey> {
    match decode_key(text)? {
        DecodedKey::Private(key) => Ok(key),
        DecodedKey::Public(_) => Err(RsaError::InvalidKeyFormat(
            "expected a private key, found a public key".into(),
        )),
    }
}
