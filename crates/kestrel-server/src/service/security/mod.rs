//! Key material for the credential vault.

mod master_key;

pub use master_key::{MasterKey, MasterKeyConfig};
