//! Command line front end: key generation, encryption, decryption and key
//! inspection over PEM-style key files.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use rsa_tool::rsa::{decode_key, DecodedKey, KeyGenConfig, KeyGenProgress, KeyGenTask, RsaError};
use rsa_tool::rsa::Ciphertext;
use rsa_tool::util::{
    load_private_key, load_public_key, read_file, read_text, save_keypair, write_file, write_text,
};

/// RSA key generation and PKCS#1 v1.5 block encryption
#[derive(Parser, Debug)]
#[command(name = "rsa_tool")]
#[command(version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        global = true,
        env = "RSA_TOOL_LOG_LEVEL",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        ignore_case = true
    )]
    log_level: String,

    /// Log format (plain, json)
    #[arg(
        long,
        global = true,
        env = "RSA_TOOL_LOG_FORMAT",
        default_value = "plain",
        value_parser = ["plain", "json"],
        ignore_case = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a key pair and write public_key.pem / private_key.pem
    Keygen {
        /// Modulus size in bits
        #[arg(short, long, env = "RSA_TOOL_KEY_SIZE", default_value_t = 2048)]
        bits: u64,

        /// Miller-Rabin rounds per prime candidate
        #[arg(long, default_value_t = 5)]
        rounds: u32,

        /// Directory receiving the key files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Encrypt text or a file with a public key
    Encrypt {
        /// Public key file
        #[arg(short, long)]
        key: PathBuf,

        /// Plaintext given inline
        #[arg(short, long, conflicts_with = "input")]
        text: Option<String>,

        /// Plaintext file (stdin when neither --text nor --input is given)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Ciphertext destination (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt a ciphertext with a private key
    Decrypt {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// Ciphertext file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Plaintext destination (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail instead of emitting blocks whose padding was invalid
        #[arg(long)]
        strict: bool,
    },

    /// Show the parameters of a key file
    Inspect {
        /// Public or private key file
        #[arg(short, long)]
        key: PathBuf,
    },
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level: Level = log_level
        .parse()
        .with_context(|| format!("Unknown log level '{}'", log_level))?;

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr; stdout carries keys and ciphertext
    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .json()
                .flatten_event(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        "plain" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        other => bail!("Unknown log format '{}'", other),
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level, &args.log_format)?;

    match args.command {
        Commands::Keygen {
            bits,
            rounds,
            out_dir,
        } => keygen(bits, rounds, &out_dir),
        Commands::Encrypt {
            key,
            text,
            input,
            output,
        } => encrypt(&key, text, input.as_deref(), output.as_deref()),
        Commands::Decrypt {
            key,
            input,
            output,
            strict,
        } => decrypt(&key, input.as_deref(), output.as_deref(), strict),
        Commands::Inspect { key } => inspect(&key),
    }
}

fn keygen(bits: u64, rounds: u32, out_dir: &Path) -> Result<()> {
    eprintln!("Generating {}-bit key pair, this may take a while...", bits);

    let config = KeyGenConfig::new(bits).with_primality_rounds(rounds);
    let keypair = KeyGenTask::new(config)
        .with_progress(|event| match event {
            KeyGenProgress::CandidateRejected { .. } => {}
            other => debug!(?other, "key generation progress"),
        })
        .run(&mut OsRng)
        .context("Key generation failed")?;

    let (public_path, private_path) = save_keypair(out_dir, &keypair)?;
    info!(bits = keypair.bit_length(), "key pair written");
    eprintln!("Public key:  {}", public_path.display());
    eprintln!("Private key: {}", private_path.display());
    Ok(())
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut data = Vec::new();
    io::stdin()
        .read_to_end(&mut data)
        .context("Failed to read stdin")?;
    Ok(data)
}

fn encrypt(key: &Path, text: Option<String>, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let public_key = load_public_key(key)
        .with_context(|| format!("Failed to load public key {}", key.display()))?;

    let plaintext = match (text, input) {
        (Some(text), _) => text.into_bytes(),
        (None, Some(path)) => read_file(path)?,
        (None, None) => read_stdin()?,
    };
    if plaintext.is_empty() {
        bail!("Nothing to encrypt");
    }

    let ciphertext = public_key.encrypt(&plaintext)?;
    info!(blocks = ciphertext.len(), "encrypted");

    match output {
        Some(path) => write_text(path, &ciphertext.to_json())?,
        None => println!("{}", ciphertext),
    }
    Ok(())
}

fn decrypt(key: &Path, input: Option<&Path>, output: Option<&Path>, strict: bool) -> Result<()> {
    let private_key = load_private_key(key)
        .with_context(|| format!("Failed to load private key {}", key.display()))?;

    let raw = match input {
        Some(path) => read_text(path)?,
        None => String::from_utf8(read_stdin()?).context("Ciphertext is not text")?,
    };
    if raw.trim().is_empty() {
        bail!("Nothing to decrypt");
    }

    let ciphertext: Ciphertext = raw.parse()?;
    let decryption = private_key.decrypt(&ciphertext)?;

    let fallback_blocks = decryption.fallback_count();
    if fallback_blocks > 0 {
        if strict {
            return Err(RsaError::DegradedDecryption { fallback_blocks }.into());
        }
        eprintln!(
            "Warning: decryption completed with {} of {} blocks unpadded",
            fallback_blocks,
            decryption.outcomes().len()
        );
    }

    match output {
        Some(path) => write_file(path, decryption.plaintext())?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(decryption.plaintext())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn inspect(key: &Path) -> Result<()> {
    let text = read_text(key)?;
    let decoded = decode_key(&text).with_context(|| format!("Failed to parse {}", key.display()))?;

    let (kind, n) = match &decoded {
        DecodedKey::Public(k) => ("public", k.n()),
        DecodedKey::Private(k) => ("private", k.n()),
    };
    let block_size = rsa_tool::rsa::bigint::byte_length(n);
    let modulus_hex = hex::encode(n.to_bytes_be());
    let preview = &modulus_hex[..modulus_hex.len().min(32)];

    println!("Kind:          {}", kind);
    println!("Modulus bits:  {}", n.bits());
    println!("Block size:    {} bytes", block_size);
    println!(
        "Max chunk:     {} bytes",
        rsa_tool::rsa::padding::max_chunk_len(block_size)
    );
    println!("Modulus (hex): {}...", preview);
    if let DecodedKey::Public(k) = &decoded {
        println!("Exponent e:    {}", k.e());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_typo_rejected() {
        let result = Args::try_parse_from(["rsa_tool", "--log-level", "wran", "inspect", "--key", "k.pem"]);
        assert!(result.is_err());

        let args =
            Args::try_parse_from(["rsa_tool", "--log-level", "DEBUG", "inspect", "--key", "k.pem"]).unwrap();
        assert_eq!(args.log_level.parse::<Level>().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_log_format_typo_rejected() {
        let result = Args::try_parse_from(["rsa_tool", "--log-format", "xml", "inspect", "--key", "k.pem"]);
        assert!(result.is_err());
        assert!(setup_logging("info", "xml").is_err());
        assert!(setup_logging("loud", "plain").is_err());
    }
}
