//! Program state processor

use {
    crate::{error::MetadataError, find_metadata_pda_with_program, state, METADATA_SEED},
    solana_program::{
        account_info::{next_account_info, AccountInfo},
        entrypoint::ProgramResult,
        msg,
        program::{invoke, invoke_signed, set_return_data},
        program_error::ProgramError,
        program_option::COption,
        pubkey::Pubkey,
        rent::Rent,
        system_instruction, system_program,
        sysvar::Sysvar,
    },
    spl_pod::optional_keys::OptionalNonZeroPubkey,
    spl_token_2022::{extension::StateWithExtensions, state::Mint},
    spl_token_metadata_interface::{
        error::TokenMetadataError,
        instruction::{
            Emit, Initialize, RemoveKey, TokenMetadataInstruction, UpdateAuthority, UpdateField,
        },
        state::TokenMetadata,
    },
    spl_type_length_value::state::{TlvState, TlvStateBorrowed},
};

/// Program state handler.
pub struct Processor {}

impl Processor {
    /// Process a single instruction
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], input: &[u8]) -> ProgramResult {
        let instruction = TokenMetadataInstruction::unpack(input)?;

        match instruction {
            TokenMetadataInstruction::Initialize(data) => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, data)
            }
            TokenMetadataInstruction::UpdateField(data) => {
                msg!("Instruction: UpdateField");
                Self::process_update_field(program_id, accounts, data)
            }
            TokenMetadataInstruction::RemoveKey(data) => {
                msg!("Instruction: RemoveKey");
                Self::process_remove_key(program_id, accounts, data)
            }
            TokenMetadataInstruction::UpdateAuthority(data) => {
                msg!("Instruction: UpdateAuthority");
                Self::process_update_authority(program_id, accounts, data)
            }
            TokenMetadataInstruction::Emit(data) => {
                msg!("Instruction: Emit");
                Self::process_emit(program_id, accounts, data)
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        data: Initialize,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let metadata_info = next_account_info(account_info_iter)?;
        let update_authority_info = next_account_info(account_info_iter)?;
        let mint_info = next_account_info(account_info_iter)?;
        let mint_authority_info = next_account_info(account_info_iter)?;
        let payer_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !mint_authority_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        if spl_token_2022::check_spl_token_program_account(mint_info.owner).is_err() {
            return Err(MetadataError::InvalidMint.into());
        }
        if !system_program::check_id(system_program_info.key) {
            return Err(ProgramError::IncorrectProgramId);
        }

        // scope the mint borrow
        {
            let mint_data = mint_info.try_borrow_data()?;
            let mint = StateWithExtensions::<Mint>::unpack(&mint_data)
                .map_err(|_| MetadataError::InvalidMint)?;
            match mint.base.mint_authority {
                COption::Some(authority) if authority == *mint_authority_info.key => {}
                COption::Some(_) => return Err(TokenMetadataError::IncorrectMintAuthority.into()),
                COption::None => return Err(TokenMetadataError::MintHasNoMintAuthority.into()),
            }
        }

        let (metadata_pda, bump) = find_metadata_pda_with_program(program_id, mint_info.key);
        if metadata_pda != *metadata_info.key {
            return Err(MetadataError::InvalidMetadataAccount.into());
        }
        if !metadata_info.data_is_empty() || !system_program::check_id(metadata_info.owner) {
            return Err(MetadataError::MetadataAlreadyExists.into());
        }

        // the program id stands in for an absent update authority
        let update_authority = if update_authority_info.key == program_id {
            None
        } else {
            Some(*update_authority_info.key)
        };
        let token_metadata = TokenMetadata {
            update_authority: OptionalNonZeroPubkey::try_from(update_authority)?,
            mint: *mint_info.key,
            name: data.name,
            symbol: data.symbol,
            uri: data.uri,
            additional_metadata: vec![],
        };
        state::validate(&token_metadata)?;

        let space = token_metadata.tlv_size_of()?;
        let rent = Rent::get()?;
        let signer_seeds: &[&[u8]] = &[METADATA_SEED, mint_info.key.as_ref(), &[bump]];
        Self::create_pda_account(
            payer_info,
            &rent,
            space,
            program_id,
            system_program_info,
            metadata_info,
            signer_seeds,
        )?;

        let mut buffer = metadata_info.try_borrow_mut_data()?;
        state::init_metadata(&mut buffer, &token_metadata)?;
        Ok(())
    }

    fn process_update_field(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        data: UpdateField,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let metadata_info = next_account_info(account_info_iter)?;
        let update_authority_info = next_account_info(account_info_iter)?;
        let funding = Self::optional_funding_accounts(account_info_iter)?;

        let mut token_metadata = Self::load_metadata(program_id, metadata_info)?;
        Self::check_update_authority(update_authority_info, &token_metadata.update_authority)?;

        state::apply_update(&mut token_metadata, data.field, data.value);
        state::validate(&token_metadata)?;

        Self::store_metadata(metadata_info, &token_metadata, funding)
    }

    fn process_remove_key(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        data: RemoveKey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let metadata_info = next_account_info(account_info_iter)?;
        let update_authority_info = next_account_info(account_info_iter)?;

        let mut token_metadata = Self::load_metadata(program_id, metadata_info)?;
        Self::check_update_authority(update_authority_info, &token_metadata.update_authority)?;

        if !token_metadata.remove_key(&data.key) && !data.idempotent {
            return Err(TokenMetadataError::KeyNotFound.into());
        }

        Self::store_metadata(metadata_info, &token_metadata, None)
    }

    fn process_update_authority(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        data: UpdateAuthority,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let metadata_info = next_account_info(account_info_iter)?;
        let update_authority_info = next_account_info(account_info_iter)?;

        let mut token_metadata = Self::load_metadata(program_id, metadata_info)?;
        Self::check_update_authority(update_authority_info, &token_metadata.update_authority)?;

        token_metadata.update_authority = data.new_authority;

        // fixed-size field, no realloc
        Self::store_metadata(metadata_info, &token_metadata, None)
    }

    fn process_emit(program_id: &Pubkey, accounts: &[AccountInfo], data: Emit) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let metadata_info = next_account_info(account_info_iter)?;

        if metadata_info.owner != program_id {
            return Err(ProgramError::IllegalOwner);
        }

        let buffer = metadata_info.try_borrow_data()?;
        let state = TlvStateBorrowed::unpack(&buffer)?;
        let metadata_bytes = state.get_first_bytes::<TokenMetadata>()?;

        if let Some(range) = TokenMetadata::get_slice(metadata_bytes, data.start, data.end) {
            set_return_data(range);
        }
        Ok(())
    }

    fn check_update_authority(
        update_authority_info: &AccountInfo,
        expected_update_authority: &OptionalNonZeroPubkey,
    ) -> ProgramResult {
        if !update_authority_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        let update_authority = Option::<Pubkey>::from(*expected_update_authority)
            .ok_or(TokenMetadataError::ImmutableMetadata)?;
        if update_authority != *update_authority_info.key {
            return Err(TokenMetadataError::IncorrectUpdateAuthority.into());
        }
        Ok(())
    }

    fn load_metadata(
        program_id: &Pubkey,
        metadata_info: &AccountInfo,
    ) -> Result<TokenMetadata, ProgramError> {
        if metadata_info.owner != program_id {
            return Err(ProgramError::IllegalOwner);
        }
        // scope the borrow, the account may be reallocated afterwards
        let buffer = metadata_info.try_borrow_data()?;
        state::unpack_metadata(&buffer)
    }

    fn optional_funding_accounts<'a, 'b, I>(
        account_info_iter: &mut I,
    ) -> Result<Option<(&'a AccountInfo<'b>, &'a AccountInfo<'b>)>, ProgramError>
    where
        I: Iterator<Item = &'a AccountInfo<'b>>,
    {
        let Some(payer_info) = account_info_iter.next() else {
            return Ok(None);
        };
        let system_program_info = next_account_info(account_info_iter)?;
        if !payer_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        if !system_program::check_id(system_program_info.key) {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(Some((payer_info, system_program_info)))
    }

    // Resizes the account to fit the record, topping up rent from the payer
    // when it grows, then writes the TLV entry.
    fn store_metadata<'a>(
        metadata_info: &AccountInfo<'a>,
        token_metadata: &TokenMetadata,
        funding: Option<(&AccountInfo<'a>, &AccountInfo<'a>)>,
    ) -> ProgramResult {
        let new_size = token_metadata.tlv_size_of()?;
        let previous_size = metadata_info.data_len();

        if new_size > previous_size {
            let required_lamports = Rent::get()?
                .minimum_balance(new_size)
                .saturating_sub(metadata_info.lamports());
            if required_lamports > 0 {
                let (payer_info, system_program_info) =
                    funding.ok_or(MetadataError::InsufficientFundsForRent)?;
                invoke(
                    &system_instruction::transfer(
                        payer_info.key,
                        metadata_info.key,
                        required_lamports,
                    ),
                    &[
                        payer_info.clone(),
                        metadata_info.clone(),
                        system_program_info.clone(),
                    ],
                )?;
            }
            // account first, then the TLV entry
            metadata_info.realloc(new_size, false)?;
            let mut buffer = metadata_info.try_borrow_mut_data()?;
            state::write_metadata(&mut buffer, token_metadata)?;
        } else {
            // TLV entry first, then the account
            {
                let mut buffer = metadata_info.try_borrow_mut_data()?;
                state::write_metadata(&mut buffer, token_metadata)?;
            }
            if new_size < previous_size {
                metadata_info.realloc(new_size, false)?;
            }
        }
        Ok(())
    }

    fn create_pda_account<'a>(
        payer: &AccountInfo<'a>,
        rent: &Rent,
        space: usize,
        owner: &Pubkey,
        system_program: &AccountInfo<'a>,
        new_pda_account: &AccountInfo<'a>,
        new_pda_signer_seeds: &[&[u8]],
    ) -> ProgramResult {
        if new_pda_account.lamports() > 0 {
            // someone pre-funded the address, create_account would fail
            let required_lamports = rent
                .minimum_balance(space)
                .max(1)
                .saturating_sub(new_pda_account.lamports());

            if required_lamports > 0 {
                invoke(
                    &system_instruction::transfer(payer.key, new_pda_account.key, required_lamports),
                    &[
                        payer.clone(),
                        new_pda_account.clone(),
                        system_program.clone(),
                    ],
                )?;
            }

            invoke_signed(
                &system_instruction::allocate(new_pda_account.key, space as u64),
                &[new_pda_account.clone(), system_program.clone()],
                &[new_pda_signer_seeds],
            )?;

            invoke_signed(
                &system_instruction::assign(new_pda_account.key, owner),
                &[new_pda_account.clone(), system_program.clone()],
                &[new_pda_signer_seeds],
            )
        } else {
            invoke_signed(
                &system_instruction::create_account(
                    payer.key,
                    new_pda_account.key,
                    rent.minimum_balance(space).max(1),
                    space as u64,
                    owner,
                ),
                &[
                    payer.clone(),
                    new_pda_account.clone(),
                    system_program.clone(),
                ],
                &[new_pda_signer_seeds],
            )
        }
    }
}
