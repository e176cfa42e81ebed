//! State helpers for the TLV-encoded metadata account

use {
    crate::error::MetadataError,
    solana_program::program_error::ProgramError,
    spl_token_metadata_interface::state::{Field, TokenMetadata},
    spl_type_length_value::{
        state::{TlvState, TlvStateBorrowed, TlvStateMut},
        variable_len_pack::VariableLenPack,
    },
};

/// Maximum length of the token name, in bytes
pub const NAME_MAX_LEN: usize = 32;
/// Maximum length of the token symbol, in bytes
pub const SYMBOL_MAX_LEN: usize = 10;
/// Maximum length of the token URI, in bytes
pub const URI_MAX_LEN: usize = 200;
/// Maximum length of an additional metadata key, in bytes
pub const MAX_KEY_LENGTH: usize = 64;
/// Maximum length of an additional metadata value, in bytes
pub const MAX_VALUE_LENGTH: usize = 240;
/// Maximum number of additional metadata pairs
pub const MAX_ADDITIONAL_FIELDS: usize = 32;

/// Checks the record against the per-field limits.
pub fn validate(token_metadata: &TokenMetadata) -> Result<(), MetadataError> {
    if token_metadata.name.len() > NAME_MAX_LEN
        || token_metadata.symbol.len() > SYMBOL_MAX_LEN
        || token_metadata.uri.len() > URI_MAX_LEN
    {
        return Err(MetadataError::StringTooLong);
    }
    if token_metadata.additional_metadata.len() > MAX_ADDITIONAL_FIELDS {
        return Err(MetadataError::TooManyFields);
    }
    for (key, value) in token_metadata.additional_metadata.iter() {
        if key.is_empty() {
            return Err(MetadataError::EmptyKey);
        }
        if key.len() > MAX_KEY_LENGTH || value.len() > MAX_VALUE_LENGTH {
            return Err(MetadataError::StringTooLong);
        }
    }
    Ok(())
}

/// Applies an `UpdateField` to the record.
///
/// An empty value for an additional key removes that key; setting an empty
/// value on a missing key is a no-op. Base fields are always overwritten.
pub fn apply_update(token_metadata: &mut TokenMetadata, field: Field, value: String) {
    match field {
        Field::Key(key) if value.is_empty() => {
            token_metadata.remove_key(&key);
        }
        field => token_metadata.update(field, value),
    }
}

/// Reads the metadata record out of a TLV account buffer.
pub fn unpack_metadata(data: &[u8]) -> Result<TokenMetadata, ProgramError> {
    let state = TlvStateBorrowed::unpack(data)?;
    state.get_first_variable_len_value::<TokenMetadata>()
}

/// Allocates the TLV entry in a freshly created buffer and writes the record.
pub fn init_metadata(data: &mut [u8], token_metadata: &TokenMetadata) -> Result<(), ProgramError> {
    let mut state = TlvStateMut::unpack(data)?;
    state.alloc::<TokenMetadata>(token_metadata.get_packed_len()?, false)?;
    state.pack_first_variable_len_value(token_metadata)
}

/// Resizes the existing TLV entry to fit the record and writes it.
///
/// The buffer must already be large enough for the new entry.
pub fn write_metadata(data: &mut [u8], token_metadata: &TokenMetadata) -> Result<(), ProgramError> {
    let mut state = TlvStateMut::unpack(data)?;
    state.realloc_first::<TokenMetadata>(token_metadata.get_packed_len()?)?;
    state.pack_first_variable_len_value(token_metadata)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        solana_program::pubkey::Pubkey,
        spl_pod::optional_keys::OptionalNonZeroPubkey,
    };

    fn sample() -> TokenMetadata {
        TokenMetadata {
            update_authority: OptionalNonZeroPubkey::try_from(Some(Pubkey::new_unique()))
                .unwrap(),
            mint: Pubkey::new_unique(),
            name: "Solana Gold".to_string(),
            symbol: "GOLDSOL".to_string(),
            uri: "https://example.com/gold.json".to_string(),
            additional_metadata: vec![],
        }
    }

    #[test]
    fn add_then_clear_field_with_empty_value() {
        let mut md = sample();
        apply_update(&mut md, Field::Key("color".into()), "red".into());
        apply_update(&mut md, Field::Key("size".into()), "xl".into());
        assert_eq!(
            md.additional_metadata,
            vec![
                ("color".to_string(), "red".to_string()),
                ("size".to_string(), "xl".to_string())
            ]
        );

        // replacing keeps position
        apply_update(&mut md, Field::Key("color".into()), "blue".into());
        assert_eq!(md.additional_metadata[0], ("color".into(), "blue".into()));

        apply_update(&mut md, Field::Key("color".into()), String::new());
        assert_eq!(md.additional_metadata, vec![("size".into(), "xl".into())]);

        // clearing a missing key does nothing
        apply_update(&mut md, Field::Key("missing".into()), String::new());
        assert_eq!(md.additional_metadata.len(), 1);
    }

    #[test]
    fn empty_value_on_base_field_is_written() {
        let mut md = sample();
        apply_update(&mut md, Field::Uri, String::new());
        assert_eq!(md.uri, "");
    }

    #[test]
    fn validate_limits() {
        let mut md = sample();
        assert_eq!(validate(&md), Ok(()));

        md.name = "n".repeat(NAME_MAX_LEN + 1);
        assert_eq!(validate(&md), Err(MetadataError::StringTooLong));

        let mut md = sample();
        md.additional_metadata = vec![(String::new(), "v".into())];
        assert_eq!(validate(&md), Err(MetadataError::EmptyKey));

        let mut md = sample();
        md.additional_metadata = vec![("k".into(), "v".repeat(MAX_VALUE_LENGTH + 1))];
        assert_eq!(validate(&md), Err(MetadataError::StringTooLong));

        let mut md = sample();
        md.additional_metadata = (0..=MAX_ADDITIONAL_FIELDS)
            .map(|i| (format!("k{i}"), "v".to_string()))
            .collect();
        assert_eq!(validate(&md), Err(MetadataError::TooManyFields));
    }

    #[test]
    fn write_grows_and_shrinks_entry() {
        let mut md = sample();
        let mut buffer = vec![0u8; md.tlv_size_of().unwrap()];
        init_metadata(&mut buffer, &md).unwrap();
        assert_eq!(unpack_metadata(&buffer).unwrap(), md);

        // grow: caller extends the buffer first
        apply_update(&mut md, Field::Key("edition".into()), "first".into());
        buffer.resize(md.tlv_size_of().unwrap(), 0);
        write_metadata(&mut buffer, &md).unwrap();
        assert_eq!(unpack_metadata(&buffer).unwrap(), md);

        // shrink: entry first, then the caller truncates
        apply_update(&mut md, Field::Key("edition".into()), String::new());
        write_metadata(&mut buffer, &md).unwrap();
        buffer.truncate(md.tlv_size_of().unwrap());
        assert_eq!(unpack_metadata(&buffer).unwrap(), md);
    }

    #[test]
    fn tlv_value_is_borsh_record() {
        let md = sample();
        let mut buffer = vec![0u8; md.tlv_size_of().unwrap()];
        init_metadata(&mut buffer, &md).unwrap();

        let state = TlvStateBorrowed::unpack(&buffer).unwrap();
        let value = state.get_first_bytes::<TokenMetadata>().unwrap();
        assert_eq!(value, borsh::to_vec(&md).unwrap().as_slice());
    }
}
