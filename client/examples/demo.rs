//! Walkthrough of the full VELO credential lifecycle against the mock
//! provider: cold-start secret generation, a device challenge, a balance
//! inquiry and a payment through the four-phase credential pipeline, and
//! the resulting history.
//!
//! Everything runs in memory with throwaway RSA keys -- nothing persists
//! and nothing leaves the process.
//!
//! Run with:
//!   cargo run --example demo --release

use std::sync::Arc;

use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;

use velo_client::{
    Amount, ChallengeType, MemoryStore, MockPsp, StaticPin, SwitchParams, VeloClient, Vpa,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("== VELO credential engine demo ==\n");

    // Throwaway switch provisioning. A real deployment gets these from
    // the payment network; here we just need keys that parse.
    println!("provisioning throwaway 2048-bit switch keys...");
    let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048)?;
    let pem = private
        .to_public_key()
        .to_public_key_pem(rsa::pkcs8::LineEnding::LF)?;
    let params = SwitchParams {
        version: "2.0".to_string(),
        signer_certificate_pem: pem.clone(),
        switch_public_key_pem: pem,
        key_code: "DEMO".to_string(),
        key_index: "00000000".to_string(),
    };

    // Cold start: the engine generates Token and K0 on first init.
    let psp = Arc::new(MockPsp::new());
    let client = VeloClient::init(
        Arc::new(MemoryStore::new()),
        Arc::clone(&psp),
        params,
        Arc::new(StaticPin::new("4521")),
    )
    .await?;
    println!("device secrets generated and persisted\n");

    // Out-of-band provisioning: the initial device challenge.
    let device_id = "5f".repeat(16);
    let challenge = client.challenge(ChallengeType::Initial, &device_id).await?;
    println!("device challenge: {}...\n", &challenge[..48]);

    // Account surface.
    let accounts = client.get_accounts().await?;
    println!("linked accounts:");
    for account in &accounts {
        println!("  {} ({})", account.id, account.label);
    }

    // Balance inquiry: descriptor -> PIN -> credential -> completion.
    let balance = client.get_balance(&accounts[0]).await?;
    println!("\nbalance of {}: {} INR", accounts[0].id, balance);

    // Pay someone the directory knows.
    let payee = Vpa::parse("asha@velobank")?;
    if let velo_client::AddressLookup::Found { name } = client.lookup_address(&payee).await? {
        println!("paying {name} at {payee}...");
    }
    let outcome = client
        .pay(&accounts[0], &payee, &Amount::inr("250.00")?)
        .await?;
    println!("payment {}: rrn {}", outcome.txn_id, outcome.rrn);

    // Everything that settled, newest first.
    println!("\nhistory:");
    for record in client.get_txn_history().await? {
        println!("  {:?}  {}", record.status, record.txn_id);
    }

    Ok(())
}
