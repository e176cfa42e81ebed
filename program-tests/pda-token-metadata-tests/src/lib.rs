use std::collections::HashSet;

use async_trait::async_trait;
use pda_token_metadata_sdk::{
    AccountData, AccountFetcher, TokenMetadata, TokenMetadataClient, TxCreateMintWithPointerParams,
    TxCreateTokenWithMetadataParams,
};
use solana_program_test::{processor, BanksClient, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

pub const TOKEN_NAME: &str = "Solana Gold";
pub const TOKEN_SYMBOL: &str = "GOLDSOL";
pub const TOKEN_URI: &str = "https://example.com/gold.json";

/// Program test with the metadata program and Token-2022 running natively.
pub fn program_test() -> ProgramTest {
    let mut program_test = ProgramTest::default();
    program_test.prefer_bpf(false);
    program_test.add_program(
        "pda_token_metadata",
        pda_token_metadata::id(),
        processor!(pda_token_metadata::processor::Processor::process),
    );
    program_test.add_program(
        "spl_token_2022",
        spl_token_2022::id(),
        processor!(spl_token_2022::processor::Processor::process),
    );
    program_test
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Started test context plus a client bound to the canonical program id.
pub struct TestEnv {
    pub context: ProgramTestContext,
    pub client: TokenMetadataClient,
}

impl TestEnv {
    pub async fn start() -> Self {
        init_tracing();
        let context = program_test().start_with_context().await;
        Self {
            context,
            client: TokenMetadataClient::new(pda_token_metadata::id()),
        }
    }

    pub fn payer(&self) -> &Keypair {
        &self.context.payer
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.context.payer.pubkey()
    }

    /// Sign with the context payer plus `signers` and submit.
    ///
    /// A fresh blockhash is fetched for every transaction so that repeating
    /// an identical instruction is not rejected as already processed.
    pub async fn process(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<(), BanksClientError> {
        let blockhash = self.context.get_new_latest_blockhash().await?;
        let mut seen = HashSet::new();
        let all_signers: Vec<&Keypair> = std::iter::once(&self.context.payer)
            .chain(signers.iter().copied())
            .filter(|kp| seen.insert(kp.pubkey()))
            .collect();
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.context.payer.pubkey()),
            &all_signers,
            blockhash,
        );
        self.context
            .banks_client
            .process_transaction(transaction)
            .await
    }

    /// Create a Token-2022 mint pointing at its metadata PDA, without metadata.
    pub async fn create_mint_with_pointer(
        &mut self,
        mint: &Keypair,
        mint_authority: &Pubkey,
    ) -> Result<(), BanksClientError> {
        let ixs = self
            .client
            .create_mint_with_metadata_pointer_tx(TxCreateMintWithPointerParams {
                payer: self.payer_pubkey(),
                mint: mint.pubkey(),
                mint_authority: *mint_authority,
                freeze_authority: None,
                decimals: 9,
            })
            .expect("build create mint tx");
        self.process(&ixs, &[mint]).await
    }

    /// Create the mint, its pointer and the metadata record in one transaction.
    /// Returns the metadata PDA.
    pub async fn create_token_with_metadata(
        &mut self,
        mint: &Keypair,
        mint_authority: &Keypair,
        immutable: bool,
    ) -> Result<Pubkey, BanksClientError> {
        let (ixs, pdas) = self
            .client
            .create_token_with_metadata_tx_with_pdas(TxCreateTokenWithMetadataParams {
                payer: self.payer_pubkey(),
                mint: mint.pubkey(),
                mint_authority: mint_authority.pubkey(),
                freeze_authority: None,
                decimals: 9,
                name: TOKEN_NAME.into(),
                symbol: TOKEN_SYMBOL.into(),
                uri: TOKEN_URI.into(),
                immutable,
            })
            .expect("build create token tx");
        self.process(&ixs, &[mint, mint_authority]).await?;
        Ok(pdas.metadata_pda)
    }

    pub async fn fetch_account(&mut self, address: Pubkey) -> solana_sdk::account::Account {
        self.context
            .banks_client
            .get_account(address)
            .await
            .expect("get_account")
            .expect("account exists")
    }

    pub async fn fetch_metadata(&mut self, address: Pubkey) -> TokenMetadata {
        let account = self.fetch_account(address).await;
        pda_token_metadata_sdk::decode_metadata(&account.data).expect("decode metadata")
    }
}

/// Asserts that a transaction failed with `code` at instruction `index`.
pub fn assert_instruction_error(
    result: Result<impl std::fmt::Debug, BanksClientError>,
    index: u8,
    expected: InstructionError,
) {
    let error = result.expect_err("transaction should fail").unwrap();
    assert_eq!(error, TransactionError::InstructionError(index, expected));
}

/// Asserts that a transaction failed with a program custom error.
pub fn assert_custom_error(
    result: Result<impl std::fmt::Debug, BanksClientError>,
    index: u8,
    code: u32,
) {
    assert_instruction_error(result, index, InstructionError::Custom(code));
}

/// [`AccountFetcher`] over a `BanksClient`, for exercising the SDK reader in-process.
pub struct BanksFetcher(pub BanksClient);

#[async_trait]
impl AccountFetcher for BanksFetcher {
    async fn fetch_account(&self, address: &Pubkey) -> anyhow::Result<Option<AccountData>> {
        let account = self.0.clone().get_account(*address).await?;
        Ok(account.map(|account| AccountData {
            owner: account.owner,
            lamports: account.lamports,
            data: account.data,
        }))
    }
}
