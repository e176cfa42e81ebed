use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pda_token_metadata_sdk::{
    Field, InitializeMetadataParams, MakeImmutableParams, MintDetails, RemoveKeyParams,
    TokenMetadata, TokenMetadataClient, TokenMetadataReader, TxClearFieldParams,
    TxCreateMintWithPointerParams, TxCreateTokenWithMetadataParams, UpdateAuthorityParams,
    UpdateFieldParams,
};
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use zeroize::Zeroize;

#[derive(Clone, Debug)]
enum SignerSourceKind {
    Prompt,
    Stdin,
    File(String),
    Env(String),
}

impl SignerSourceKind {
    fn parse(spec: &str) -> Self {
        if let Some(path) = spec.strip_prefix("file:") {
            Self::File(path.to_string())
        } else if let Some(var) = spec.strip_prefix("env:") {
            Self::Env(var.to_string())
        } else if spec == "stdin" {
            Self::Stdin
        } else {
            Self::Prompt
        }
    }
}

#[derive(Clone, Debug, Args)]
struct SignerArg {
    /// Signer source: prompt|stdin|file:/path|env:VAR
    #[arg(long = "payer", alias = "signer", env = "PAYER_KEYPAIR", default_value = "prompt")]
    signer: String,
}

/// Reads a solana-keygen style keypair (JSON array of 64 bytes).
fn keypair_from_source(spec: &str) -> anyhow::Result<Keypair> {
    use std::io::Read as _;
    let mut text = match SignerSourceKind::parse(spec) {
        SignerSourceKind::Prompt => rpassword::prompt_password("enter keypair json: ")?,
        SignerSourceKind::Stdin => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        SignerSourceKind::File(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("read {path}"))?
        }
        SignerSourceKind::Env(var) => {
            std::env::var(&var).with_context(|| format!("env {var} not set"))?
        }
    };
    let parsed = serde_json::from_str::<Vec<u8>>(text.trim());
    text.zeroize();
    let mut bytes = parsed.context("keypair must be a JSON array of bytes")?;
    let keypair = Keypair::from_bytes(&bytes);
    bytes.zeroize();
    keypair.map_err(|err| anyhow::anyhow!("invalid keypair: {err}"))
}

fn optional_keypair(spec: Option<&String>) -> anyhow::Result<Option<Keypair>> {
    spec.map(|spec| keypair_from_source(spec)).transpose()
}

#[derive(Parser, Debug)]
#[command(
    name = "pda-metadata",
    version,
    about = "PDA Token Metadata CLI",
    long_about = "Command-line interface for creating Token-2022 mints with a metadata pointer and managing their PDA metadata records.\nJSON is always printed to stdout; logs/status to stderr."
)]
struct Cli {
    /// RPC endpoint URL
    #[arg(
        default_value = "http://127.0.0.1:8899",
        env = "RPC_URL",
        global = true,
        long
    )]
    rpc: String,

    /// Metadata program id (defaults to the canonical deployment)
    #[arg(env = "PDA_TOKEN_METADATA_PROGRAM_ID", global = true, long)]
    program_id: Option<Pubkey>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        alias = "inspect",
        alias = "info",
        about = "Show mint, metadata pointer and metadata record (if present)"
    )]
    Show {
        #[arg(long)]
        mint: Pubkey,
    },
    #[command(subcommand, alias = "m", about = "Token-2022 mint operations (create, show)")]
    Mint(MintCmd),
    #[command(subcommand, alias = "md", about = "Metadata record operations")]
    Metadata(MetadataCmd),
}

#[derive(Subcommand, Debug)]
enum MintCmd {
    #[command(
        alias = "new",
        about = "Create a Token-2022 mint whose metadata pointer targets the metadata PDA"
    )]
    Create {
        /// Number of decimals for the mint
        #[arg(long, default_value_t = 9)]
        decimals: u8,

        #[command(flatten)]
        payer: SignerArg,

        /// Optional freeze authority
        #[arg(long)]
        freeze_authority: Option<Pubkey>,

        /// Mint authority address (defaults to payer)
        #[arg(long)]
        mint_authority: Option<Pubkey>,

        /// Mint keypair source (a fresh keypair when omitted)
        #[arg(long)]
        mint_keypair: Option<String>,
    },

    #[command(alias = "get", about = "Show the mint account fields")]
    Show {
        #[arg(long)]
        mint: Pubkey,
    },
}

#[derive(Subcommand, Debug)]
enum MetadataCmd {
    #[command(alias = "new", about = "Create the metadata record for an existing mint")]
    Create {
        #[arg(long)]
        mint: Pubkey,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        uri: String,
        /// Create without an update authority
        #[arg(long, default_value_t = false)]
        immutable: bool,
        #[command(flatten)]
        payer: SignerArg,
        /// Mint authority signer source (defaults to payer)
        #[arg(long)]
        mint_authority: Option<String>,
    },

    #[command(about = "Create a mint with metadata pointer and its metadata record in one transaction")]
    CreateToken {
        #[arg(long, default_value_t = 9)]
        decimals: u8,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        uri: String,
        #[arg(long, default_value_t = false)]
        immutable: bool,
        #[arg(long)]
        freeze_authority: Option<Pubkey>,
        #[command(flatten)]
        payer: SignerArg,
        /// Mint authority signer source (defaults to payer)
        #[arg(long)]
        mint_authority: Option<String>,
        /// Mint keypair source (a fresh keypair when omitted)
        #[arg(long)]
        mint_keypair: Option<String>,
    },

    #[command(
        alias = "set",
        about = "Set a field; name, symbol and uri address the base fields, any other key an additional field"
    )]
    SetField {
        #[arg(long)]
        mint: Pubkey,
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: String,
        #[command(flatten)]
        payer: SignerArg,
        /// Update authority signer source (defaults to payer)
        #[arg(long)]
        update_authority: Option<String>,
    },

    #[command(alias = "clear", about = "Clear an additional field by writing an empty value")]
    ClearField {
        #[arg(long)]
        mint: Pubkey,
        #[arg(long)]
        key: String,
        #[command(flatten)]
        payer: SignerArg,
        #[arg(long)]
        update_authority: Option<String>,
    },

    #[command(about = "Remove an additional field")]
    RemoveKey {
        #[arg(long)]
        mint: Pubkey,
        #[arg(long)]
        key: String,
        /// Succeed even if the key is absent
        #[arg(long, default_value_t = false)]
        idempotent: bool,
        #[command(flatten)]
        payer: SignerArg,
        #[arg(long)]
        update_authority: Option<String>,
    },

    #[command(
        alias = "authority-transfer",
        alias = "auth-transfer",
        about = "Transfer metadata update authority"
    )]
    TransferAuthority {
        #[arg(long)]
        mint: Pubkey,
        #[arg(long)]
        new_authority: Pubkey,
        #[command(flatten)]
        payer: SignerArg,
        /// Current update authority signer source (defaults to payer)
        #[arg(long)]
        current_update_authority: Option<String>,
    },

    #[command(alias = "lock", about = "Make metadata immutable (clear update authority)")]
    MakeImmutable {
        #[arg(long)]
        mint: Pubkey,
        #[command(flatten)]
        payer: SignerArg,
        #[arg(long)]
        current_update_authority: Option<String>,
    },
}

#[derive(Serialize)]
struct MintView {
    address: String,
    token_program: String,
    decimals: u8,
    supply: u64,
    mint_authority: Option<String>,
    freeze_authority: Option<String>,
    metadata_pointer: Option<PointerView>,
}

#[derive(Serialize)]
struct PointerView {
    authority: Option<String>,
    metadata_address: Option<String>,
}

#[derive(Serialize)]
struct MetadataView {
    mint: String,
    update_authority: Option<String>,
    name: String,
    symbol: String,
    uri: String,
    additional_metadata: Vec<(String, String)>,
}

impl From<&MintDetails> for MintView {
    fn from(details: &MintDetails) -> Self {
        Self {
            address: details.address.to_string(),
            token_program: details.token_program_id.to_string(),
            decimals: details.decimals,
            supply: details.supply,
            mint_authority: details.mint_authority.map(|p| p.to_string()),
            freeze_authority: details.freeze_authority.map(|p| p.to_string()),
            metadata_pointer: details.metadata_pointer.map(|pointer| PointerView {
                authority: pointer.authority.map(|p| p.to_string()),
                metadata_address: pointer.metadata_address.map(|p| p.to_string()),
            }),
        }
    }
}

impl From<&TokenMetadata> for MetadataView {
    fn from(metadata: &TokenMetadata) -> Self {
        Self {
            mint: metadata.mint.to_string(),
            update_authority: Option::<Pubkey>::from(metadata.update_authority)
                .map(|p| p.to_string()),
            name: metadata.name.clone(),
            symbol: metadata.symbol.clone(),
            uri: metadata.uri.clone(),
            additional_metadata: metadata.additional_metadata.clone(),
        }
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn field_for_key(key: &str) -> Field {
    match key {
        "name" => Field::Name,
        "symbol" => Field::Symbol,
        "uri" => Field::Uri,
        other => Field::Key(other.to_string()),
    }
}

async fn send(
    rpc: &RpcClient,
    ixs: &[Instruction],
    payer: &Keypair,
    signers: &[&Keypair],
) -> anyhow::Result<Signature> {
    let recent = rpc.get_latest_blockhash().await?;
    let mut all_signers = vec![payer];
    for signer in signers.iter().copied() {
        if !all_signers.iter().any(|s| s.pubkey() == signer.pubkey()) {
            all_signers.push(signer);
        }
    }
    let tx = Transaction::new_signed_with_payer(ixs, Some(&payer.pubkey()), &all_signers, recent);
    let signature = rpc
        .send_and_confirm_transaction(&tx)
        .await
        .context("send transaction")?;
    Ok(signature)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let rpc = RpcClient::new_with_commitment(args.rpc.clone(), CommitmentConfig::confirmed());
    let program_id = args.program_id.unwrap_or_else(pda_token_metadata::id);
    let client = TokenMetadataClient::new(program_id);
    tracing::debug!(rpc = %args.rpc, %program_id, "configured");

    match args.command {
        Commands::Show { mint } => {
            let reader = TokenMetadataReader::new(program_id, rpc);
            let (mint_details, metadata) = reader.get_token_details(mint).await?;
            print_json(&serde_json::json!({
                "mint": mint_details.as_ref().map(MintView::from),
                "metadata_pda": client.metadata_pda(&mint).to_string(),
                "metadata": metadata.as_ref().map(MetadataView::from),
            }))?;
        }
        Commands::Mint(MintCmd::Create {
            decimals,
            payer,
            freeze_authority,
            mint_authority,
            mint_keypair,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let mint_kp = optional_keypair(mint_keypair.as_ref())?.unwrap_or_else(Keypair::new);
            let mint_pk = mint_kp.pubkey();

            let ixs = client.create_mint_with_metadata_pointer_tx(TxCreateMintWithPointerParams {
                payer: payer_kp.pubkey(),
                mint: mint_pk,
                mint_authority: mint_authority.unwrap_or_else(|| payer_kp.pubkey()),
                freeze_authority,
                decimals,
            })?;
            let signature = send(&rpc, &ixs, &payer_kp, &[&mint_kp]).await?;

            eprintln!("mint.create: signature={signature} mint={mint_pk}");
            print_json(&serde_json::json!({
                "signature": signature.to_string(),
                "mint": mint_pk.to_string(),
                "metadata_pda": client.metadata_pda(&mint_pk).to_string(),
            }))?;
        }
        Commands::Mint(MintCmd::Show { mint }) => {
            let reader = TokenMetadataReader::new(program_id, rpc);
            let details = reader.get_mint(mint).await?;
            print_json(&serde_json::json!({ "mint": details.as_ref().map(MintView::from) }))?;
        }
        Commands::Metadata(MetadataCmd::Create {
            mint,
            name,
            symbol,
            uri,
            immutable,
            payer,
            mint_authority,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let auth_kp = optional_keypair(mint_authority.as_ref())?;
            let auth = auth_kp.as_ref().unwrap_or(&payer_kp);

            let ix = client.initialize_metadata_ix(InitializeMetadataParams {
                payer: payer_kp.pubkey(),
                mint,
                mint_authority: auth.pubkey(),
                update_authority: (!immutable).then(|| auth.pubkey()),
                name,
                symbol,
                uri,
            })?;
            let signature = send(&rpc, &[ix], &payer_kp, &[auth]).await?;

            eprintln!("metadata.create: signature={signature}");
            print_json(&serde_json::json!({
                "signature": signature.to_string(),
                "metadata_pda": client.metadata_pda(&mint).to_string(),
            }))?;
        }
        Commands::Metadata(MetadataCmd::CreateToken {
            decimals,
            name,
            symbol,
            uri,
            immutable,
            freeze_authority,
            payer,
            mint_authority,
            mint_keypair,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let auth_kp = optional_keypair(mint_authority.as_ref())?;
            let auth = auth_kp.as_ref().unwrap_or(&payer_kp);
            let mint_kp = optional_keypair(mint_keypair.as_ref())?.unwrap_or_else(Keypair::new);

            let (ixs, pdas) =
                client.create_token_with_metadata_tx_with_pdas(TxCreateTokenWithMetadataParams {
                    payer: payer_kp.pubkey(),
                    mint: mint_kp.pubkey(),
                    mint_authority: auth.pubkey(),
                    freeze_authority,
                    decimals,
                    name,
                    symbol,
                    uri,
                    immutable,
                })?;
            let signature = send(&rpc, &ixs, &payer_kp, &[&mint_kp, auth]).await?;

            eprintln!(
                "metadata.create-token: signature={signature} mint={}",
                mint_kp.pubkey()
            );
            print_json(&serde_json::json!({
                "signature": signature.to_string(),
                "mint": mint_kp.pubkey().to_string(),
                "metadata_pda": pdas.metadata_pda.to_string(),
                "metadata_bump": pdas.metadata_bump,
            }))?;
        }
        Commands::Metadata(MetadataCmd::SetField {
            mint,
            key,
            value,
            payer,
            update_authority,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let auth_kp = optional_keypair(update_authority.as_ref())?;
            let auth = auth_kp.as_ref().unwrap_or(&payer_kp);

            let ix = client.update_field_ix(UpdateFieldParams {
                mint,
                update_authority: auth.pubkey(),
                payer: Some(payer_kp.pubkey()),
                field: field_for_key(&key),
                value,
            })?;
            let signature = send(&rpc, &[ix], &payer_kp, &[auth]).await?;

            eprintln!("metadata.set-field: signature={signature} key={key}");
            print_json(&serde_json::json!({ "signature": signature.to_string() }))?;
        }
        Commands::Metadata(MetadataCmd::ClearField {
            mint,
            key,
            payer,
            update_authority,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let auth_kp = optional_keypair(update_authority.as_ref())?;
            let auth = auth_kp.as_ref().unwrap_or(&payer_kp);

            let ixs = client.clear_field_tx(TxClearFieldParams {
                mint,
                update_authority: auth.pubkey(),
                key: key.clone(),
            })?;
            let signature = send(&rpc, &ixs, &payer_kp, &[auth]).await?;

            eprintln!("metadata.clear-field: signature={signature} key={key}");
            print_json(&serde_json::json!({ "signature": signature.to_string() }))?;
        }
        Commands::Metadata(MetadataCmd::RemoveKey {
            mint,
            key,
            idempotent,
            payer,
            update_authority,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let auth_kp = optional_keypair(update_authority.as_ref())?;
            let auth = auth_kp.as_ref().unwrap_or(&payer_kp);

            let ixs = client.remove_key_tx(RemoveKeyParams {
                mint,
                update_authority: auth.pubkey(),
                key: key.clone(),
                idempotent,
            })?;
            let signature = send(&rpc, &ixs, &payer_kp, &[auth]).await?;

            eprintln!("metadata.remove-key: signature={signature} key={key}");
            print_json(&serde_json::json!({ "signature": signature.to_string() }))?;
        }
        Commands::Metadata(MetadataCmd::TransferAuthority {
            mint,
            new_authority,
            payer,
            current_update_authority,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let current_kp = optional_keypair(current_update_authority.as_ref())?;
            let current = current_kp.as_ref().unwrap_or(&payer_kp);

            let ix = client.update_authority_ix(UpdateAuthorityParams {
                mint,
                current_update_authority: current.pubkey(),
                new_authority,
            })?;
            let signature = send(&rpc, &[ix], &payer_kp, &[current]).await?;

            eprintln!("metadata.transfer-authority: signature={signature}");
            print_json(&serde_json::json!({
                "signature": signature.to_string(),
                "new_authority": new_authority.to_string(),
            }))?;
        }
        Commands::Metadata(MetadataCmd::MakeImmutable {
            mint,
            payer,
            current_update_authority,
        }) => {
            let payer_kp = keypair_from_source(&payer.signer)?;
            let current_kp = optional_keypair(current_update_authority.as_ref())?;
            let current = current_kp.as_ref().unwrap_or(&payer_kp);

            let ixs = client.make_immutable_tx(MakeImmutableParams {
                mint,
                current_update_authority: current.pubkey(),
            })?;
            let signature = send(&rpc, &ixs, &payer_kp, &[current]).await?;

            eprintln!("metadata.make-immutable: signature={signature}");
            print_json(&serde_json::json!({ "signature": signature.to_string() }))?;
        }
    }

    Ok(())
}
