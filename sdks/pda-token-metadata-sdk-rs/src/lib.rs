//! PDA Token Metadata – Rust SDK (client-side helpers)
//!
//! This crate provides:
//! - PDA helpers for the per-mint metadata account
//! - Instruction builders with correct account ordering and client-side validation
//! - Transaction builders for common flows (compose Vec<Instruction>)
//! - A reader that follows a mint's metadata pointer and decodes the record
//!
//! Signers, recent blockhashes, and submission are left to the caller.

mod reader;

pub use reader::{AccountData, AccountFetcher, MetadataPointerDetails, MintDetails, TokenMetadataReader};
pub use spl_token_metadata_interface::state::{Field, TokenMetadata};

use borsh::BorshDeserialize;
use solana_program::{
    instruction::Instruction, program::MAX_RETURN_DATA, pubkey::Pubkey, rent::Rent,
    system_instruction,
};
use spl_token_2022::{
    extension::{metadata_pointer, ExtensionType},
    state::Mint,
};

use pda_token_metadata as program;
use program::state::{
    MAX_KEY_LENGTH, MAX_VALUE_LENGTH, NAME_MAX_LEN, SYMBOL_MAX_LEN, URI_MAX_LEN,
};

/// Thin client for building PDAs and instructions for the PDA Token Metadata program.
///
/// The `program_id` must be the deployed metadata program id. Mints are
/// created under `token_program_id`, Token-2022 by default, since the
/// metadata pointer is a Token-2022 extension.
#[derive(Clone, Debug)]
pub struct TokenMetadataClient {
    pub program_id: Pubkey,
    pub token_program_id: Pubkey,
}

impl TokenMetadataClient {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            token_program_id: spl_token_2022::id(),
        }
    }

    /// Derive the metadata PDA for a given mint.
    pub fn metadata_pda(&self, mint: &Pubkey) -> Pubkey {
        let (pda, _bump) = program::find_metadata_pda_with_program(&self.program_id, mint);
        pda
    }

    /// Derive the metadata PDA for a given mint, with the bump.
    pub fn metadata_pda_and_bump(&self, mint: &Pubkey) -> (Pubkey, u8) {
        program::find_metadata_pda_with_program(&self.program_id, mint)
    }

    /// Account length of a mint carrying the metadata-pointer extension.
    pub fn mint_with_pointer_len(&self) -> anyhow::Result<usize> {
        Ok(ExtensionType::try_calculate_account_len::<Mint>(&[
            ExtensionType::MetadataPointer,
        ])?)
    }

    // Upstream Token-2022 helpers
    /// Build a SystemProgram create_account allocating a mint with room for the metadata pointer.
    pub fn create_mint_account_ix(&self, payer: Pubkey, mint: Pubkey) -> anyhow::Result<Instruction> {
        let space = self.mint_with_pointer_len()?;
        Ok(system_instruction::create_account(
            &payer,
            &mint,
            Rent::default().minimum_balance(space),
            space as u64,
            &self.token_program_id,
        ))
    }

    /// Build a MetadataPointer initialize instruction pointing the mint at its metadata PDA.
    ///
    /// Must run after allocation and before `initialize_mint2`.
    pub fn initialize_metadata_pointer_ix(
        &self,
        mint: Pubkey,
        authority: Option<Pubkey>,
    ) -> anyhow::Result<Instruction> {
        let ix = metadata_pointer::instruction::initialize(
            &self.token_program_id,
            &mint,
            authority,
            Some(self.metadata_pda(&mint)),
        )?;
        Ok(ix)
    }

    /// Build a Token-2022 initialize_mint2 instruction.
    pub fn initialize_mint2_ix(
        &self,
        mint: Pubkey,
        mint_authority: Pubkey,
        freeze_authority: Option<Pubkey>,
        decimals: u8,
    ) -> anyhow::Result<Instruction> {
        let ix = spl_token_2022::instruction::initialize_mint2(
            &self.token_program_id,
            &mint,
            &mint_authority,
            freeze_authority.as_ref(),
            decimals,
        )?;
        Ok(ix)
    }

    /// Build an Initialize instruction; the program creates the metadata PDA via CPI.
    ///
    /// Accounts (strict order):
    /// - metadata_pda (writable)
    /// - update_authority (readonly; program id when none)
    /// - mint (readonly)
    /// - mint_authority (readonly, signer)
    /// - payer (writable, signer)
    /// - system_program (readonly)
    pub fn initialize_metadata_ix(
        &self,
        params: InitializeMetadataParams,
    ) -> anyhow::Result<Instruction> {
        self.validate_metadata_fields(&params.name, &params.symbol, &params.uri)?;

        Ok(program::instruction::initialize(
            &self.program_id,
            &params.mint,
            params.update_authority.as_ref(),
            &params.mint_authority,
            &params.payer,
            params.name,
            params.symbol,
            params.uri,
        ))
    }

    /// Build an UpdateField instruction. An empty value on a key removes it.
    ///
    /// Accounts (strict order):
    /// - metadata_pda (writable)
    /// - update_authority (readonly, signer)
    /// - payer (writable, signer) and system_program, when `payer` is set
    pub fn update_field_ix(&self, params: UpdateFieldParams) -> anyhow::Result<Instruction> {
        self.validate_field(&params.field, &params.value)?;

        Ok(program::instruction::update_field(
            &self.program_id,
            &params.mint,
            &params.update_authority,
            params.payer.as_ref(),
            params.field,
            params.value,
        ))
    }

    /// Build a RemoveKey instruction.
    ///
    /// Accounts (strict order):
    /// - metadata_pda (writable)
    /// - update_authority (readonly, signer)
    pub fn remove_key_ix(&self, params: RemoveKeyParams) -> anyhow::Result<Instruction> {
        anyhow::ensure!(!params.key.is_empty(), "key must not be empty");
        anyhow::ensure!(params.key.len() <= MAX_KEY_LENGTH, "key too long");

        Ok(program::instruction::remove_key(
            &self.program_id,
            &params.mint,
            &params.update_authority,
            params.key,
            params.idempotent,
        ))
    }

    /// Build an UpdateAuthority instruction handing the metadata to a new authority.
    ///
    /// Accounts (strict order):
    /// - metadata_pda (writable)
    /// - current_update_authority (readonly, signer)
    pub fn update_authority_ix(&self, params: UpdateAuthorityParams) -> anyhow::Result<Instruction> {
        let ix = program::instruction::update_authority(
            &self.program_id,
            &params.mint,
            &params.current_update_authority,
            Some(params.new_authority),
        )?;
        Ok(ix)
    }

    /// Build an UpdateAuthority(None) instruction, making the metadata immutable.
    pub fn make_immutable_ix(&self, params: MakeImmutableParams) -> anyhow::Result<Instruction> {
        let ix = program::instruction::update_authority(
            &self.program_id,
            &params.mint,
            &params.current_update_authority,
            None,
        )?;
        Ok(ix)
    }

    /// Build an Emit instruction. The slice comes back as return data; see [`decode_emitted`].
    ///
    /// Accounts (strict order):
    /// - metadata_pda (readonly)
    pub fn emit_ix(&self, params: EmitParams) -> anyhow::Result<Instruction> {
        if let (Some(start), Some(end)) = (params.start, params.end) {
            anyhow::ensure!(start <= end, "start must not exceed end");
        }
        Ok(program::instruction::emit(
            &self.program_id,
            &params.mint,
            params.start,
            params.end,
        ))
    }

    // Transaction patterns (compose instructions; signing and submission left to caller)
    /// Create a Token-2022 mint whose metadata pointer targets the metadata PDA.
    ///
    /// Returns: [create_mint_account, initialize_metadata_pointer, initialize_mint2].
    pub fn create_mint_with_metadata_pointer_tx(
        &self,
        params: TxCreateMintWithPointerParams,
    ) -> anyhow::Result<Vec<Instruction>> {
        Ok(vec![
            self.create_mint_account_ix(params.payer, params.mint)?,
            self.initialize_metadata_pointer_ix(params.mint, Some(params.mint_authority))?,
            self.initialize_mint2_ix(
                params.mint,
                params.mint_authority,
                params.freeze_authority,
                params.decimals,
            )?,
        ])
    }

    /// Create the mint with its metadata pointer and initialize the metadata record.
    ///
    /// Returns: [create_mint_account, initialize_metadata_pointer, initialize_mint2, initialize_metadata].
    pub fn create_token_with_metadata_tx(
        &self,
        params: TxCreateTokenWithMetadataParams,
    ) -> anyhow::Result<Vec<Instruction>> {
        let mut tx = self.create_mint_with_metadata_pointer_tx(TxCreateMintWithPointerParams {
            payer: params.payer,
            mint: params.mint,
            mint_authority: params.mint_authority,
            freeze_authority: params.freeze_authority,
            decimals: params.decimals,
        })?;

        tx.push(self.initialize_metadata_ix(InitializeMetadataParams {
            payer: params.payer,
            mint: params.mint,
            mint_authority: params.mint_authority,
            update_authority: (!params.immutable).then_some(params.mint_authority),
            name: params.name,
            symbol: params.symbol,
            uri: params.uri,
        })?);

        Ok(tx)
    }

    /// Same as `create_token_with_metadata_tx` but also returns derived PDAs for ergonomics.
    pub fn create_token_with_metadata_tx_with_pdas(
        &self,
        params: TxCreateTokenWithMetadataParams,
    ) -> anyhow::Result<(Vec<Instruction>, DerivedPdas)> {
        let (metadata_pda, metadata_bump) = self.metadata_pda_and_bump(&params.mint);
        let tx = self.create_token_with_metadata_tx(params)?;
        Ok((
            tx,
            DerivedPdas {
                metadata_pda,
                metadata_bump,
            },
        ))
    }

    /// Add (or overwrite) an additional metadata field. The payer covers the extra rent.
    pub fn add_field_tx(&self, params: TxAddFieldParams) -> anyhow::Result<Vec<Instruction>> {
        anyhow::ensure!(
            !params.value.is_empty(),
            "value must not be empty; use clear_field_tx to remove a key"
        );
        Ok(vec![self.update_field_ix(UpdateFieldParams {
            mint: params.mint,
            update_authority: params.update_authority,
            payer: Some(params.payer),
            field: Field::Key(params.key),
            value: params.value,
        })?])
    }

    /// Clear an additional metadata field by writing an empty value.
    pub fn clear_field_tx(&self, params: TxClearFieldParams) -> anyhow::Result<Vec<Instruction>> {
        Ok(vec![self.update_field_ix(UpdateFieldParams {
            mint: params.mint,
            update_authority: params.update_authority,
            payer: None,
            field: Field::Key(params.key),
            value: String::new(),
        })?])
    }

    /// Convenience wrapper returning one-instruction Vec for remove_key.
    pub fn remove_key_tx(&self, params: RemoveKeyParams) -> anyhow::Result<Vec<Instruction>> {
        Ok(vec![self.remove_key_ix(params)?])
    }

    /// Convenience wrapper returning one-instruction Vec for make_immutable.
    pub fn make_immutable_tx(
        &self,
        params: MakeImmutableParams,
    ) -> anyhow::Result<Vec<Instruction>> {
        Ok(vec![self.make_immutable_ix(params)?])
    }
}

// === Params ===
/// Parameters for the Initialize instruction.
#[derive(Clone, Debug)]
pub struct InitializeMetadataParams {
    /// Account that pays for the metadata PDA creation
    pub payer: Pubkey,
    /// Token mint the metadata is associated with
    pub mint: Pubkey,
    /// Signer that must match the mint authority
    pub mint_authority: Pubkey,
    /// Update authority to record; None creates immutable metadata
    pub update_authority: Option<Pubkey>,
    /// Token name (<= NAME_MAX_LEN)
    pub name: String,
    /// Token symbol (<= SYMBOL_MAX_LEN)
    pub symbol: String,
    /// Token URI (<= URI_MAX_LEN)
    pub uri: String,
}

/// Parameters for the UpdateField instruction.
#[derive(Clone, Debug)]
pub struct UpdateFieldParams {
    /// Token mint whose metadata is being updated
    pub mint: Pubkey,
    /// Current update authority (must sign)
    pub update_authority: Pubkey,
    /// Funds extra rent if the account grows; required for growth beyond the current balance
    pub payer: Option<Pubkey>,
    /// Field to update
    pub field: Field,
    /// New value; empty removes an additional key
    pub value: String,
}

/// Parameters for the RemoveKey instruction.
#[derive(Clone, Debug)]
pub struct RemoveKeyParams {
    /// Token mint whose metadata is being updated
    pub mint: Pubkey,
    /// Current update authority (must sign)
    pub update_authority: Pubkey,
    /// Additional metadata key to remove
    pub key: String,
    /// If true, removing a missing key succeeds
    pub idempotent: bool,
}

/// Parameters for the UpdateAuthority instruction.
#[derive(Clone, Debug)]
pub struct UpdateAuthorityParams {
    /// Token mint whose metadata authority is being transferred
    pub mint: Pubkey,
    /// Current update authority (must sign)
    pub current_update_authority: Pubkey,
    /// New authority to set
    pub new_authority: Pubkey,
}

/// Parameters for making metadata immutable.
#[derive(Clone, Debug)]
pub struct MakeImmutableParams {
    /// Token mint whose metadata is being made immutable
    pub mint: Pubkey,
    /// Current update authority (must sign)
    pub current_update_authority: Pubkey,
}

/// Parameters for the Emit instruction.
#[derive(Clone, Debug, Default)]
pub struct EmitParams {
    /// Token mint whose metadata is emitted
    pub mint: Pubkey,
    /// Start offset into the borsh-encoded record; None means 0
    pub start: Option<u64>,
    /// End offset (exclusive); None means the end of the record
    pub end: Option<u64>,
}

/// Parameters for the create_mint_with_metadata_pointer transaction pattern.
#[derive(Clone, Debug)]
pub struct TxCreateMintWithPointerParams {
    /// Payer that funds the mint account
    pub payer: Pubkey,
    /// Mint account public key
    pub mint: Pubkey,
    /// Mint authority, also set as the metadata pointer authority
    pub mint_authority: Pubkey,
    /// Optional freeze authority for the mint
    pub freeze_authority: Option<Pubkey>,
    /// Number of decimals for the mint
    pub decimals: u8,
}

/// Parameters for the create_token_with_metadata transaction pattern.
#[derive(Clone, Debug)]
pub struct TxCreateTokenWithMetadataParams {
    /// Payer that funds the mint account and metadata PDA
    pub payer: Pubkey,
    /// Mint account public key
    pub mint: Pubkey,
    /// Mint authority (and update authority unless `immutable`)
    pub mint_authority: Pubkey,
    /// Optional freeze authority for the mint
    pub freeze_authority: Option<Pubkey>,
    /// Number of decimals for the mint
    pub decimals: u8,
    /// Metadata fields
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Whether metadata should be immutable at creation
    pub immutable: bool,
}

/// Parameters for adding an additional metadata field.
#[derive(Clone, Debug)]
pub struct TxAddFieldParams {
    /// Token mint
    pub mint: Pubkey,
    /// Current update authority (must sign)
    pub update_authority: Pubkey,
    /// Payer for the extra rent (must sign)
    pub payer: Pubkey,
    pub key: String,
    pub value: String,
}

/// Parameters for clearing an additional metadata field.
#[derive(Clone, Debug)]
pub struct TxClearFieldParams {
    /// Token mint
    pub mint: Pubkey,
    /// Current update authority (must sign)
    pub update_authority: Pubkey,
    pub key: String,
}

/// Convenience return type when a builder returns derived PDAs too.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedPdas {
    /// Derived metadata PDA for the mint
    pub metadata_pda: Pubkey,
    /// Bump seed of the metadata PDA
    pub metadata_bump: u8,
}

// === Decoding ===
/// Decode a metadata account's TLV data.
pub fn decode_metadata(data: &[u8]) -> anyhow::Result<TokenMetadata> {
    Ok(program::state::unpack_metadata(data)?)
}

/// Decode the return data of a full-range Emit.
///
/// The runtime strips trailing zero bytes from return data, so the buffer is
/// padded back before deserializing.
pub fn decode_emitted(return_data: &[u8]) -> anyhow::Result<TokenMetadata> {
    let mut buffer = return_data.to_vec();
    buffer.resize(MAX_RETURN_DATA.max(return_data.len()), 0);
    let token_metadata = TokenMetadata::deserialize(&mut buffer.as_slice())?;
    Ok(token_metadata)
}

// === Validation helpers ===
impl TokenMetadataClient {
    fn validate_metadata_fields(&self, name: &str, symbol: &str, uri: &str) -> anyhow::Result<()> {
        anyhow::ensure!(name.len() <= NAME_MAX_LEN, "name too long");
        anyhow::ensure!(symbol.len() <= SYMBOL_MAX_LEN, "symbol too long");
        anyhow::ensure!(uri.len() <= URI_MAX_LEN, "uri too long");
        Ok(())
    }

    fn validate_field(&self, field: &Field, value: &str) -> anyhow::Result<()> {
        match field {
            Field::Name => anyhow::ensure!(value.len() <= NAME_MAX_LEN, "name too long"),
            Field::Symbol => anyhow::ensure!(value.len() <= SYMBOL_MAX_LEN, "symbol too long"),
            Field::Uri => anyhow::ensure!(value.len() <= URI_MAX_LEN, "uri too long"),
            Field::Key(key) => {
                anyhow::ensure!(!key.is_empty(), "key must not be empty");
                anyhow::ensure!(key.len() <= MAX_KEY_LENGTH, "key too long");
                anyhow::ensure!(value.len() <= MAX_VALUE_LENGTH, "value too long");
            }
        }
        Ok(())
    }
}
