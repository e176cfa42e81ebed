use std::time::Duration;

use anyhow::Context;
use pda_token_metadata_sdk::{
    TokenMetadata, TokenMetadataClient, TokenMetadataReader, TxAddFieldParams,
    TxClearFieldParams, TxCreateTokenWithMetadataParams,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};

const MIN_PAYER_BALANCE: u64 = LAMPORTS_PER_SOL / 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8899".to_string());
    let program_id = match std::env::var("PDA_TOKEN_METADATA_PROGRAM_ID") {
        Ok(value) => value
            .parse::<Pubkey>()
            .context("PDA_TOKEN_METADATA_PROGRAM_ID must be a base58 pubkey")?,
        Err(_) => pda_token_metadata::id(),
    };
    let payer = match std::env::var("PAYER_KEYPAIR_PATH") {
        Ok(path) => read_keypair_file(&path)
            .map_err(|err| anyhow::anyhow!("read payer keypair {path}: {err}"))?,
        Err(_) => Keypair::new(),
    };

    let rpc = RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed());
    let client = TokenMetadataClient::new(program_id);
    let mint = Keypair::new();
    let metadata_pda = client.metadata_pda(&mint.pubkey());

    println!("Metadata program ID: {program_id}");
    println!("Payer: {}", payer.pubkey());
    println!("Mint: {}", mint.pubkey());
    println!("Metadata PDA: {metadata_pda}");

    ensure_funded(&rpc, &payer.pubkey()).await?;

    // (a) mint with metadata pointer + metadata record
    let create = TxCreateTokenWithMetadataParams {
        payer: payer.pubkey(),
        mint: mint.pubkey(),
        mint_authority: payer.pubkey(),
        freeze_authority: None,
        decimals: 9,
        name: "Solana Gold".into(),
        symbol: "GOLDSOL".into(),
        uri: "https://example.com/gold.json".into(),
        immutable: false,
    };
    println!("Building instructions: [create_mint_account, initialize_metadata_pointer, initialize_mint2(decimals=9), initialize_metadata]");
    let ixs = client.create_token_with_metadata_tx(create.clone())?;
    submit(&rpc, &payer, &ixs, &[&mint]).await?;

    let reader = TokenMetadataReader::new(program_id, rpc);
    let mint_details = reader
        .get_mint(mint.pubkey())
        .await?
        .context("mint not found")?;
    let pointer = mint_details
        .metadata_pointer
        .and_then(|pointer| pointer.metadata_address);
    anyhow::ensure!(
        pointer == Some(metadata_pda),
        "metadata pointer mismatch; expected={} actual={:?}",
        metadata_pda,
        pointer
    );

    let metadata = fetch(&reader, &mint.pubkey()).await?;
    anyhow::ensure!(
        metadata.mint == mint.pubkey(),
        "mint mismatch; expected={} actual={}",
        mint.pubkey(),
        metadata.mint
    );
    anyhow::ensure!(
        metadata.name == create.name,
        "name mismatch; expected={} actual={}",
        create.name,
        metadata.name
    );
    anyhow::ensure!(
        metadata.symbol == create.symbol,
        "symbol mismatch; expected={} actual={}",
        create.symbol,
        metadata.symbol
    );
    anyhow::ensure!(
        metadata.uri == create.uri,
        "uri mismatch; expected={} actual={}",
        create.uri,
        metadata.uri
    );
    println!("Metadata: {metadata:?}");

    // (b) add a field
    let ixs = client.add_field_tx(TxAddFieldParams {
        mint: mint.pubkey(),
        update_authority: payer.pubkey(),
        payer: payer.pubkey(),
        key: "new_field".into(),
        value: "new_value".into(),
    })?;
    submit(reader.fetcher(), &payer, &ixs, &[]).await?;
    let metadata = fetch(&reader, &mint.pubkey()).await?;
    let expected = vec![("new_field".to_string(), "new_value".to_string())];
    anyhow::ensure!(
        metadata.additional_metadata == expected,
        "additional metadata mismatch; expected={:?} actual={:?}",
        expected,
        metadata.additional_metadata
    );
    println!("Metadata after add: {metadata:?}");

    // (c) clear it with an empty value
    let ixs = client.clear_field_tx(TxClearFieldParams {
        mint: mint.pubkey(),
        update_authority: payer.pubkey(),
        key: "new_field".into(),
    })?;
    submit(reader.fetcher(), &payer, &ixs, &[]).await?;
    let metadata = fetch(&reader, &mint.pubkey()).await?;
    anyhow::ensure!(
        metadata.additional_metadata.is_empty(),
        "field not cleared; actual={:?}",
        metadata.additional_metadata
    );
    println!("Metadata after clear: {metadata:?}");
    Ok(())
}

async fn ensure_funded(rpc: &RpcClient, payer: &Pubkey) -> anyhow::Result<()> {
    let balance = rpc.get_balance(payer).await?;
    println!("Payer lamports: {balance}");
    if balance >= MIN_PAYER_BALANCE {
        return Ok(());
    }
    println!("Requesting airdrop...");
    let signature = rpc.request_airdrop(payer, LAMPORTS_PER_SOL).await?;
    for _ in 0..60 {
        if rpc.confirm_transaction(&signature).await? {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    anyhow::bail!("airdrop {signature} not confirmed")
}

async fn submit(
    rpc: &RpcClient,
    payer: &Keypair,
    ixs: &[Instruction],
    signers: &[&Keypair],
) -> anyhow::Result<()> {
    let recent_blockhash = rpc.get_latest_blockhash().await?;
    let mut all_signers = vec![payer];
    all_signers.extend_from_slice(signers);
    let tx = Transaction::new_signed_with_payer(ixs, Some(&payer.pubkey()), &all_signers, recent_blockhash);

    println!("Submitting transaction...");
    match rpc.send_and_confirm_transaction(&tx).await {
        Ok(signature) => {
            println!("Confirmed signature={signature}");
            Ok(())
        }
        Err(err) => {
            tracing::error!(%err, "transaction failed");
            Err(err).context("tx not confirmed")
        }
    }
}

async fn fetch(
    reader: &TokenMetadataReader<RpcClient>,
    mint: &Pubkey,
) -> anyhow::Result<TokenMetadata> {
    reader
        .get_metadata(*mint)
        .await?
        .context("metadata not found")
}
