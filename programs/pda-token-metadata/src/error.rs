//! Error types

use {
    num_derive::FromPrimitive,
    solana_program::{
        decode_error::DecodeError,
        msg,
        program_error::{PrintProgramError, ProgramError},
    },
    spl_token_metadata_interface::error::TokenMetadataError,
    thiserror::Error,
};

/// Errors that may be returned by the PDA Token Metadata program.
///
/// Interface-level failures (wrong update authority, missing key, ...) are
/// reported with `spl_token_metadata_interface::error::TokenMetadataError`
/// instead, so generic clients can decode them.
#[derive(Clone, Copy, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum MetadataError {
    // 0
    /// Mint is not owned by an SPL token program
    #[error("Invalid mint")]
    InvalidMint,
    /// Metadata already exists
    #[error("Metadata already exists")]
    MetadataAlreadyExists,
    /// Metadata account is not the PDA derived from the mint
    #[error("Invalid metadata account")]
    InvalidMetadataAccount,
    /// String too long
    #[error("String too long")]
    StringTooLong,
    /// Additional metadata key is empty
    #[error("Empty key")]
    EmptyKey,

    // 5
    /// Too many additional metadata fields
    #[error("Too many fields")]
    TooManyFields,
    /// Metadata account grew and no payer was supplied to cover rent
    #[error("Insufficient funds for rent")]
    InsufficientFundsForRent,
}

impl From<MetadataError> for ProgramError {
    fn from(e: MetadataError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for MetadataError {
    fn type_of() -> &'static str {
        "MetadataError"
    }
}

impl PrintProgramError for MetadataError {
    fn print<E>(&self)
    where
        E: 'static
            + std::error::Error
            + DecodeError<E>
            + PrintProgramError
            + num_traits::FromPrimitive,
    {
        match self {
            MetadataError::InvalidMint => msg!("Error: Invalid mint"),
            MetadataError::MetadataAlreadyExists => msg!("Error: Metadata already exists"),
            MetadataError::InvalidMetadataAccount => msg!("Error: Invalid metadata account"),
            MetadataError::StringTooLong => msg!("Error: String too long"),
            MetadataError::EmptyKey => msg!("Error: Empty key"),
            MetadataError::TooManyFields => msg!("Error: Too many fields"),
            MetadataError::InsufficientFundsForRent => {
                msg!("Error: Insufficient funds for rent")
            }
        }
    }
}

/// Logs a failed instruction's error. Interface codes are printed as
/// `TokenMetadataError`, everything else as `MetadataError`.
pub fn print_error(error: &ProgramError) {
    match interface_error(error) {
        Some(interface) => msg!("Error: {}", interface),
        None => error.print::<MetadataError>(),
    }
}

fn interface_error(error: &ProgramError) -> Option<TokenMetadataError> {
    match error {
        ProgramError::Custom(code) => num_traits::FromPrimitive::from_u32(*code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, num_traits::FromPrimitive};

    #[test]
    fn custom_codes_round_trip() {
        let err: ProgramError = MetadataError::TooManyFields.into();
        assert_eq!(err, ProgramError::Custom(5));
        assert_eq!(
            MetadataError::from_u32(6),
            Some(MetadataError::InsufficientFundsForRent)
        );
        assert_eq!(MetadataError::from_u32(7), None);
    }

    #[test]
    fn interface_codes_are_not_metadata_errors() {
        let err: ProgramError = TokenMetadataError::MintHasNoMintAuthority.into();
        assert_eq!(
            interface_error(&err),
            Some(TokenMetadataError::MintHasNoMintAuthority)
        );
        let ProgramError::Custom(code) = err else {
            panic!("interface errors are custom codes");
        };
        assert_eq!(MetadataError::from_u32(code), None);

        let err: ProgramError = MetadataError::EmptyKey.into();
        assert_eq!(interface_error(&err), None);
        assert_eq!(interface_error(&ProgramError::IllegalOwner), None);
    }
}
