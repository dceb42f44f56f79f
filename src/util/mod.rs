// Utility Module
// File helpers used by the command line front end

pub mod file_ops;

pub use file_ops::{
    ensure_dir, load_private_key, load_public_key, read_file, read_text, save_keypair,
    write_file, write_text, FileError, FileResult, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE,
};
