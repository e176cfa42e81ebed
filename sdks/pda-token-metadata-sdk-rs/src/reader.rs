//! Read-side helpers: fetch a mint, follow its metadata pointer, decode the record.

use anyhow::Context;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_program::pubkey::Pubkey;
use spl_token_2022::{
    extension::{metadata_pointer::MetadataPointer, BaseStateWithExtensions, StateWithExtensions},
    state::Mint,
};
use spl_token_metadata_interface::state::TokenMetadata;

/// Raw account contents as returned by a fetcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountData {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// Source of account data: an RPC node, a BanksClient, a cache...
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    /// Returns `None` when the account does not exist.
    async fn fetch_account(&self, address: &Pubkey) -> anyhow::Result<Option<AccountData>>;
}

#[async_trait]
impl AccountFetcher for RpcClient {
    async fn fetch_account(&self, address: &Pubkey) -> anyhow::Result<Option<AccountData>> {
        let response = self
            .get_account_with_commitment(address, self.commitment())
            .await
            .with_context(|| format!("get_account {address}"))?;
        Ok(response.value.map(|account| AccountData {
            owner: account.owner,
            lamports: account.lamports,
            data: account.data,
        }))
    }
}

/// Metadata pointer extension values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataPointerDetails {
    pub authority: Option<Pubkey>,
    pub metadata_address: Option<Pubkey>,
}

/// Decoded mint fields relevant to metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintDetails {
    pub address: Pubkey,
    /// Owning token program
    pub token_program_id: Pubkey,
    pub decimals: u8,
    pub supply: u64,
    pub mint_authority: Option<Pubkey>,
    pub freeze_authority: Option<Pubkey>,
    /// Present only when the mint carries the extension
    pub metadata_pointer: Option<MetadataPointerDetails>,
}

impl MintDetails {
    fn decode(address: Pubkey, account: &AccountData) -> anyhow::Result<Self> {
        let state = StateWithExtensions::<Mint>::unpack(&account.data)
            .with_context(|| format!("account {address} is not a mint"))?;
        let metadata_pointer = state
            .get_extension::<MetadataPointer>()
            .ok()
            .map(|pointer| MetadataPointerDetails {
                authority: Option::<Pubkey>::from(pointer.authority),
                metadata_address: Option::<Pubkey>::from(pointer.metadata_address),
            });
        Ok(Self {
            address,
            token_program_id: account.owner,
            decimals: state.base.decimals,
            supply: state.base.supply,
            mint_authority: state.base.mint_authority.into(),
            freeze_authority: state.base.freeze_authority.into(),
            metadata_pointer,
        })
    }
}

/// Reads mints and their metadata through any [`AccountFetcher`].
pub struct TokenMetadataReader<F> {
    program_id: Pubkey,
    fetcher: F,
}

impl<F: AccountFetcher> TokenMetadataReader<F> {
    pub fn new(program_id: Pubkey, fetcher: F) -> Self {
        Self {
            program_id,
            fetcher,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and decode a mint. `None` if the account does not exist.
    pub async fn get_mint(&self, mint: Pubkey) -> anyhow::Result<Option<MintDetails>> {
        let Some(account) = self.fetcher.fetch_account(&mint).await? else {
            return Ok(None);
        };
        spl_token_2022::check_spl_token_program_account(&account.owner)
            .with_context(|| format!("mint {mint} is owned by {}", account.owner))?;
        MintDetails::decode(mint, &account).map(Some)
    }

    /// Fetch the metadata record for a mint.
    ///
    /// Follows the mint's metadata pointer when present, falling back to the
    /// derived PDA. A pointer to the mint itself reads the Token-2022
    /// embedded metadata extension.
    pub async fn get_metadata(&self, mint: Pubkey) -> anyhow::Result<Option<TokenMetadata>> {
        let mint_details = self.get_mint(mint).await?;
        self.metadata_for(mint, mint_details.as_ref()).await
    }

    /// Fetch mint and metadata in one call.
    pub async fn get_token_details(
        &self,
        mint: Pubkey,
    ) -> anyhow::Result<(Option<MintDetails>, Option<TokenMetadata>)> {
        let mint_details = self.get_mint(mint).await?;
        let metadata = self.metadata_for(mint, mint_details.as_ref()).await?;
        Ok((mint_details, metadata))
    }

    async fn metadata_for(
        &self,
        mint: Pubkey,
        mint_details: Option<&MintDetails>,
    ) -> anyhow::Result<Option<TokenMetadata>> {
        let pointed = mint_details
            .and_then(|details| details.metadata_pointer)
            .and_then(|pointer| pointer.metadata_address);
        let address = match pointed {
            Some(address) => address,
            None => {
                let (pda, _bump) =
                    pda_token_metadata::find_metadata_pda_with_program(&self.program_id, &mint);
                pda
            }
        };
        tracing::debug!(%mint, %address, "reading token metadata");

        let Some(account) = self.fetcher.fetch_account(&address).await? else {
            return Ok(None);
        };

        if address == mint {
            let state = StateWithExtensions::<Mint>::unpack(&account.data)
                .with_context(|| format!("account {mint} is not a mint"))?;
            let metadata = state
                .get_variable_len_extension::<TokenMetadata>()
                .context("mint has no embedded metadata")?;
            return Ok(Some(metadata));
        }

        if account.owner != self.program_id {
            tracing::warn!(%address, owner = %account.owner, "metadata owned by another program");
        }
        let metadata = crate::decode_metadata(&account.data)
            .with_context(|| format!("decode metadata account {address}"))?;
        anyhow::ensure!(
            metadata.mint == mint,
            "metadata at {address} belongs to mint {}, expected {mint}",
            metadata.mint
        );
        Ok(Some(metadata))
    }
}
