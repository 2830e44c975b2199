//! # CLI Interface
//!
//! Defines the command-line argument structure for `velo` using `clap`
//! derive. One subcommand per account operation, plus `challenge` for
//! the provisioning path and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// VELO payment client demo harness.
///
/// Drives the credential engine against the built-in mock provider:
/// lists accounts, runs balance inquiries and payments through the full
/// credential pipeline, sends collect requests, and issues device
/// challenges. Without `--params`, throwaway RSA switch keys are
/// generated per invocation -- fine for watching the machinery, useless
/// for talking to a real verifier.
#[derive(Parser, Debug)]
#[command(name = "velo", about = "VELO payment client demo harness", version)]
pub struct VeloCli {
    /// Path to the persistent device store (sled database directory).
    ///
    /// Created on first use. Holds the device secrets; delete it and the
    /// device is a stranger to the verifier again.
    #[arg(long, short = 's', env = "VELO_STORE", default_value = ".velo")]
    pub store: PathBuf,

    /// Path to a JSON file of provisioned switch parameters
    /// (version, signer certificate PEM, switch public key PEM, key
    /// code, key index). Omit for throwaway demo keys.
    #[arg(long, short = 'p', env = "VELO_PARAMS")]
    pub params: Option<PathBuf>,

    /// Transaction PIN used for credential construction.
    ///
    /// A flag is acceptable for a demo harness; a real app wires an
    /// interactive provider instead.
    #[arg(long, env = "VELO_PIN", default_value = "4521")]
    pub pin: String,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "VELO_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `velo` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List linked bank accounts.
    Accounts,
    /// Run a balance inquiry through the credential pipeline.
    Balance(AccountArg),
    /// Resolve a payment address.
    Lookup {
        /// The address to resolve (name@provider).
        address: String,
    },
    /// Pay an address through the credential pipeline.
    Pay {
        /// Account to pay from.
        #[arg(long, default_value = "account1")]
        account: String,
        /// Payee address (name@provider).
        address: String,
        /// Amount with two fractional digits, e.g. 250.00.
        amount: String,
    },
    /// Send a collect (pull) request to a payer address.
    Collect {
        /// Account to collect into.
        #[arg(long, default_value = "account1")]
        account: String,
        /// Payer address (name@provider).
        address: String,
        /// Amount with two fractional digits, e.g. 99.00.
        amount: String,
        /// Optional note shown to the payer.
        #[arg(long)]
        note: Option<String>,
        /// Minutes until the request lapses.
        #[arg(long, default_value_t = 30)]
        expiry_mins: i64,
    },
    /// Show transaction history.
    History,
    /// Show a single transaction by id.
    Txn {
        /// The transaction id.
        id: String,
    },
    /// Issue a device authentication challenge.
    Challenge {
        /// Device identifier: exactly 32 hex characters.
        #[arg(long)]
        device_id: String,
        /// Challenge type: "initial" (or the unimplemented "rotate").
        #[arg(long, default_value = "initial")]
        challenge_type: String,
    },
    /// Print version information and exit.
    Version,
}

/// Shared account selector.
#[derive(Parser, Debug)]
pub struct AccountArg {
    /// Account id, as listed by `velo accounts`.
    #[arg(long, default_value = "account1")]
    pub account: String,
}
