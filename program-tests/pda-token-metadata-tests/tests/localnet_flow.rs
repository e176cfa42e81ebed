//! Flows (a)-(c) against a running cluster with the program already deployed.
//!
//! Run with `cargo test -p pda-token-metadata-tests --test localnet_flow -- --ignored`.
//! `RPC_URL` (default `http://127.0.0.1:8899`) may come from `.env`.

use std::time::Duration;

use pda_token_metadata_sdk::{
    TokenMetadataClient, TokenMetadataReader, TxAddFieldParams, TxClearFieldParams,
    TxCreateTokenWithMetadataParams,
};
use serial_test::serial;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";

fn rpc_client() -> RpcClient {
    dotenvy::dotenv().ok();
    let url = std::env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
    RpcClient::new_with_commitment(url, CommitmentConfig::confirmed())
}

async fn funded_payer(rpc: &RpcClient) -> anyhow::Result<Keypair> {
    let payer = Keypair::new();
    let signature = rpc
        .request_airdrop(&payer.pubkey(), 2 * LAMPORTS_PER_SOL)
        .await?;
    for _ in 0..60 {
        if rpc.confirm_transaction(&signature).await? {
            return Ok(payer);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    anyhow::bail!("airdrop {signature} not confirmed")
}

async fn send(
    rpc: &RpcClient,
    payer: &Keypair,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> anyhow::Result<()> {
    let blockhash = rpc.get_latest_blockhash().await?;
    let mut all_signers = vec![payer];
    all_signers.extend(signers.iter().copied().filter(|s| s.pubkey() != payer.pubkey()));
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &all_signers,
        blockhash,
    );
    let signature = rpc.send_and_confirm_transaction(&tx).await?;
    tracing::info!(%signature, "confirmed");
    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a local validator with the program deployed"]
async fn localnet_create_add_clear_flow() -> anyhow::Result<()> {
    pda_token_metadata_tests::init_tracing();
    let rpc = rpc_client();
    let client = TokenMetadataClient::new(pda_token_metadata::id());
    let payer = funded_payer(&rpc).await?;
    let mint = Keypair::new();

    // (a) mint with metadata pointer, then the metadata record via CPI
    let (ixs, pdas) = client.create_token_with_metadata_tx_with_pdas(
        TxCreateTokenWithMetadataParams {
            payer: payer.pubkey(),
            mint: mint.pubkey(),
            mint_authority: payer.pubkey(),
            freeze_authority: None,
            decimals: 9,
            name: "Solana Gold".into(),
            symbol: "GOLDSOL".into(),
            uri: "https://example.com/gold.json".into(),
            immutable: false,
        },
    )?;
    send(&rpc, &payer, &ixs, &[&mint]).await?;

    let reader = TokenMetadataReader::new(client.program_id, rpc);
    let metadata = reader
        .get_metadata(mint.pubkey())
        .await?
        .ok_or_else(|| anyhow::anyhow!("metadata missing at {}", pdas.metadata_pda))?;
    tracing::info!(?metadata, "created");
    anyhow::ensure!(metadata.name == "Solana Gold", "unexpected name {}", metadata.name);

    // (b) add a field
    let ixs = client.add_field_tx(TxAddFieldParams {
        mint: mint.pubkey(),
        update_authority: payer.pubkey(),
        payer: payer.pubkey(),
        key: "new_field".into(),
        value: "new_value".into(),
    })?;
    send(reader.fetcher(), &payer, &ixs, &[]).await?;
    let metadata = reader
        .get_metadata(mint.pubkey())
        .await?
        .ok_or_else(|| anyhow::anyhow!("metadata missing"))?;
    tracing::info!(?metadata, "field added");
    anyhow::ensure!(
        metadata.additional_metadata == vec![("new_field".to_string(), "new_value".to_string())],
        "field not added"
    );

    // (c) clear the field by writing an empty value
    let ixs = client.clear_field_tx(TxClearFieldParams {
        mint: mint.pubkey(),
        update_authority: payer.pubkey(),
        key: "new_field".into(),
    })?;
    send(reader.fetcher(), &payer, &ixs, &[]).await?;
    let metadata = reader
        .get_metadata(mint.pubkey())
        .await?
        .ok_or_else(|| anyhow::anyhow!("metadata missing"))?;
    tracing::info!(?metadata, "field cleared");
    anyhow::ensure!(metadata.additional_metadata.is_empty(), "field not cleared");
    Ok(())
}
