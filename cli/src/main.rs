// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # VELO Demo Harness
//!
//! Entry point for the `velo` binary. Parses CLI arguments, initializes
//! logging, wires the credential engine to the mock provider, and runs
//! one account operation per invocation.
//!
//! Structured results go to stdout as pretty JSON; logs go to stderr.
//! The credential blocks an operation produces are verifier-opaque and
//! safe to print. The PIN is neither, and never is.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;
use std::sync::Arc;

use velo_client::{
    Account, Amount, ChallengeType, CollectRequest, MockPsp, SledStore, StaticPin, SwitchParams,
    VeloClient, Vpa,
};

use cli::{Commands, VeloCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let args = VeloCli::parse();
    logging::init_logging(
        "velo=info,velo_client=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    if let Commands::Version = args.command {
        print_version();
        return Ok(());
    }

    let params = load_params(args.params.as_deref())?;
    let store = SledStore::open(&args.store)
        .with_context(|| format!("failed to open device store at {}", args.store.display()))?;

    let psp = Arc::new(MockPsp::new());
    let client = VeloClient::init(
        Arc::new(store),
        Arc::clone(&psp),
        params,
        Arc::new(StaticPin::new(args.pin.clone())),
    )
    .await
    .context("failed to initialize the credential engine")?;

    match args.command {
        Commands::Accounts => {
            let accounts = client.get_accounts().await?;
            print_json(&accounts)?;
        }
        Commands::Balance(sel) => {
            let account = resolve_account(&client, &sel.account).await?;
            let balance = client.get_balance(&account).await?;
            println!("{balance}");
        }
        Commands::Lookup { address } => {
            let address = Vpa::parse(&address)?;
            let lookup = client.lookup_address(&address).await?;
            print_json(&lookup)?;
        }
        Commands::Pay {
            account,
            address,
            amount,
        } => {
            let account = resolve_account(&client, &account).await?;
            let payee = Vpa::parse(&address)?;
            let amount = Amount::inr(&amount)?;
            let outcome = client.pay(&account, &payee, &amount).await?;
            print_json(&outcome)?;
        }
        Commands::Collect {
            account,
            address,
            amount,
            note,
            expiry_mins,
        } => {
            let account = resolve_account(&client, &account).await?;
            let request = CollectRequest {
                address: Vpa::parse(&address)?,
                amount: Amount::inr(&amount)?,
                note,
                expiry: Utc::now() + Duration::minutes(expiry_mins),
            };
            let outcome = client.collect(&account, &request).await?;
            print_json(&outcome)?;
        }
        Commands::History => {
            let history = client.get_txn_history().await?;
            print_json(&history)?;
        }
        Commands::Txn { id } => match client.get_txn_by_id(&id).await? {
            Some(record) => print_json(&record)?,
            None => bail!("no transaction with id {id}"),
        },
        Commands::Challenge {
            device_id,
            challenge_type,
        } => {
            let challenge_type: ChallengeType = challenge_type.parse()?;
            let challenge = client.challenge(challenge_type, &device_id).await?;
            println!("{challenge}");
        }
        Commands::Version => unreachable!("handled before engine init"),
    }

    Ok(())
}

/// Load provisioned switch parameters from a JSON file, or mint
/// throwaway demo keys when no file is given.
fn load_params(path: Option<&std::path::Path>) -> Result<SwitchParams> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read params file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("malformed params file {}", path.display()))
        }
        None => {
            tracing::warn!(
                "no --params given; generating throwaway demo keys (challenges and \
                 credentials will not verify against any real switch)"
            );
            let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048)
                .context("demo key generation failed")?;
            let pem = private
                .to_public_key()
                .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
                .context("demo key encoding failed")?;
            Ok(SwitchParams {
                version: "2.0".to_string(),
                signer_certificate_pem: pem.clone(),
                switch_public_key_pem: pem,
                key_code: "DEMO".to_string(),
                key_index: "00000000".to_string(),
            })
        }
    }
}

/// Find an account by id via the provider's listing.
async fn resolve_account(
    client: &VeloClient<MockPsp>,
    id: &str,
) -> Result<Account> {
    let accounts = client.get_accounts().await?;
    accounts
        .into_iter()
        .find(|a| a.id == id)
        .with_context(|| format!("no account with id '{id}' (try `velo accounts`)"))
}

/// Pretty-print a serializable result to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("velo {}", env!("CARGO_PKG_VERSION"));
    println!(
        "protocol  {}",
        velo_client::config::DEFAULT_PROTOCOL_VERSION
    );
}
