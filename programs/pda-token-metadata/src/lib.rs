#![deny(missing_docs)]
#![cfg_attr(not(test), forbid(unsafe_code))]

//! SPL Token Metadata stored in a program-derived account per mint

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

// Exclude the on-chain entrypoint when building unit tests or when the
// consumer opts into the "no-entrypoint" feature (host-side contexts).
#[cfg(all(not(feature = "no-entrypoint"), not(test)))]
mod entrypoint;

use solana_program::pubkey::Pubkey;

solana_program::declare_id!("9G9qb4bwYTywRLwXevYBMZ2AErdxAYUTnkaNf2t3RsgE");

/// PDA seed for the metadata account
pub const METADATA_SEED: &[u8] = b"metadata";

/// Helper to derive the metadata PDA for a given mint
pub fn find_metadata_pda_with_program(program_id: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[METADATA_SEED, mint.as_ref()], program_id)
}

/// Helper to derive the metadata PDA for a given mint under the canonical program id
pub fn find_metadata_pda(mint: &Pubkey) -> (Pubkey, u8) {
    find_metadata_pda_with_program(&id(), mint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_pda_is_deterministic_per_mint() {
        let program_id = Pubkey::new_unique();
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();

        let (a1, bump_a1) = find_metadata_pda_with_program(&program_id, &mint_a);
        let (a2, bump_a2) = find_metadata_pda_with_program(&program_id, &mint_a);
        let (b, _) = find_metadata_pda_with_program(&program_id, &mint_b);

        assert_eq!(a1, a2);
        assert_eq!(bump_a1, bump_a2);
        assert_ne!(a1, b);
        assert!(!a1.is_on_curve());

        let seeds: &[&[u8]] = &[METADATA_SEED, mint_a.as_ref(), &[bump_a1]];
        assert_eq!(Pubkey::create_program_address(seeds, &program_id).unwrap(), a1);
    }

    #[test]
    fn canonical_pda_uses_declared_id() {
        let mint = Pubkey::new_unique();
        assert_eq!(
            find_metadata_pda(&mint),
            find_metadata_pda_with_program(&id(), &mint)
        );
    }
}
