//! Instruction builders
//!
//! The program speaks the SPL Token Metadata interface wire format. These
//! builders derive the metadata PDA from the mint and append the extra
//! accounts this program needs (payer and system program) after the
//! interface accounts.

use {
    crate::find_metadata_pda_with_program,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program_error::ProgramError,
        pubkey::Pubkey,
        system_program,
    },
    spl_pod::optional_keys::OptionalNonZeroPubkey,
    spl_token_metadata_interface::{instruction as interface, state::Field},
};

/// Creates an `Initialize` instruction.
///
/// Accounts (strict order):
/// - metadata_pda (writable)
/// - update_authority (readonly); the program id itself means "none"
/// - mint (readonly)
/// - mint_authority (readonly, signer)
/// - payer (writable, signer)
/// - system_program (readonly)
#[allow(clippy::too_many_arguments)]
pub fn initialize(
    program_id: &Pubkey,
    mint: &Pubkey,
    update_authority: Option<&Pubkey>,
    mint_authority: &Pubkey,
    payer: &Pubkey,
    name: String,
    symbol: String,
    uri: String,
) -> Instruction {
    let (metadata_pda, _bump) = find_metadata_pda_with_program(program_id, mint);
    let mut ix = interface::initialize(
        program_id,
        &metadata_pda,
        update_authority.unwrap_or(program_id),
        mint,
        mint_authority,
        name,
        symbol,
        uri,
    );
    ix.accounts.push(AccountMeta::new(*payer, true));
    ix.accounts
        .push(AccountMeta::new_readonly(system_program::id(), false));
    ix
}

/// Creates an `UpdateField` instruction.
///
/// Accounts (strict order):
/// - metadata_pda (writable)
/// - update_authority (readonly, signer)
/// - payer (writable, signer), optional; funds rent when the account grows
/// - system_program (readonly), present with payer
///
/// An empty `value` on a `Field::Key` removes that key.
pub fn update_field(
    program_id: &Pubkey,
    mint: &Pubkey,
    update_authority: &Pubkey,
    payer: Option<&Pubkey>,
    field: Field,
    value: String,
) -> Instruction {
    let (metadata_pda, _bump) = find_metadata_pda_with_program(program_id, mint);
    let mut ix = interface::update_field(program_id, &metadata_pda, update_authority, field, value);
    if let Some(payer) = payer {
        ix.accounts.push(AccountMeta::new(*payer, true));
        ix.accounts
            .push(AccountMeta::new_readonly(system_program::id(), false));
    }
    ix
}

/// Creates a `RemoveKey` instruction.
///
/// Accounts (strict order):
/// - metadata_pda (writable)
/// - update_authority (readonly, signer)
pub fn remove_key(
    program_id: &Pubkey,
    mint: &Pubkey,
    update_authority: &Pubkey,
    key: String,
    idempotent: bool,
) -> Instruction {
    let (metadata_pda, _bump) = find_metadata_pda_with_program(program_id, mint);
    interface::remove_key(program_id, &metadata_pda, update_authority, key, idempotent)
}

/// Creates an `UpdateAuthority` instruction. `None` makes the metadata immutable.
///
/// Accounts (strict order):
/// - metadata_pda (writable)
/// - current_update_authority (readonly, signer)
pub fn update_authority(
    program_id: &Pubkey,
    mint: &Pubkey,
    current_update_authority: &Pubkey,
    new_authority: Option<Pubkey>,
) -> Result<Instruction, ProgramError> {
    let (metadata_pda, _bump) = find_metadata_pda_with_program(program_id, mint);
    Ok(interface::update_authority(
        program_id,
        &metadata_pda,
        current_update_authority,
        OptionalNonZeroPubkey::try_from(new_authority)?,
    ))
}

/// Creates an `Emit` instruction returning the `[start, end)` slice of the
/// borsh-encoded record as return data.
pub fn emit(program_id: &Pubkey, mint: &Pubkey, start: Option<u64>, end: Option<u64>) -> Instruction {
    let (metadata_pda, _bump) = find_metadata_pda_with_program(program_id, mint);
    interface::emit(program_id, &metadata_pda, start, end)
}
