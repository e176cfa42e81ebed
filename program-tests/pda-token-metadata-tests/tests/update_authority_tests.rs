use pda_token_metadata_sdk::{Field, MakeImmutableParams, UpdateAuthorityParams, UpdateFieldParams};
use pda_token_metadata_tests::{assert_custom_error, TestEnv};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use spl_token_metadata_interface::error::TokenMetadataError;

fn rename_ix(
    env: &TestEnv,
    mint: &Keypair,
    authority: &Keypair,
    name: &str,
) -> anyhow::Result<solana_sdk::instruction::Instruction> {
    env.client.update_field_ix(UpdateFieldParams {
        mint: mint.pubkey(),
        update_authority: authority.pubkey(),
        payer: Some(env.payer_pubkey()),
        field: Field::Name,
        value: name.into(),
    })
}

#[tokio::test]
async fn update_authority_transfer_success() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    let next_authority = Keypair::new();
    let metadata_pda = env.create_token_with_metadata(&mint, &authority, false).await?;

    let ix = env.client.update_authority_ix(UpdateAuthorityParams {
        mint: mint.pubkey(),
        current_update_authority: authority.pubkey(),
        new_authority: next_authority.pubkey(),
    })?;
    env.process(&[ix], &[&authority]).await?;

    let metadata = env.fetch_metadata(metadata_pda).await;
    assert_eq!(
        Option::<Pubkey>::from(metadata.update_authority),
        Some(next_authority.pubkey())
    );

    // the old authority is locked out, the new one can edit
    let ix = rename_ix(&env, &mint, &authority, "Old Gold")?;
    let result = env.process(&[ix], &[&authority]).await;
    assert_custom_error(result, 0, TokenMetadataError::IncorrectUpdateAuthority as u32);

    let ix = rename_ix(&env, &mint, &next_authority, "New Gold")?;
    env.process(&[ix], &[&next_authority]).await?;
    assert_eq!(env.fetch_metadata(metadata_pda).await.name, "New Gold");
    Ok(())
}

#[tokio::test]
async fn update_authority_make_immutable_success() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    let metadata_pda = env.create_token_with_metadata(&mint, &authority, false).await?;
    let size_before = env.fetch_account(metadata_pda).await.data.len();

    let ixs = env.client.make_immutable_tx(MakeImmutableParams {
        mint: mint.pubkey(),
        current_update_authority: authority.pubkey(),
    })?;
    env.process(&ixs, &[&authority]).await?;

    let account = env.fetch_account(metadata_pda).await;
    assert_eq!(account.data.len(), size_before);
    let metadata = env.fetch_metadata(metadata_pda).await;
    assert_eq!(Option::<Pubkey>::from(metadata.update_authority), None);

    // nobody can hand it back out
    let ix = env.client.update_authority_ix(UpdateAuthorityParams {
        mint: mint.pubkey(),
        current_update_authority: authority.pubkey(),
        new_authority: authority.pubkey(),
    })?;
    let result = env.process(&[ix], &[&authority]).await;
    assert_custom_error(result, 0, TokenMetadataError::ImmutableMetadata as u32);
    Ok(())
}

#[tokio::test]
async fn update_authority_wrong_authority_fails() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    let impostor = Keypair::new();
    env.create_token_with_metadata(&mint, &authority, false).await?;

    let ix = env.client.update_authority_ix(UpdateAuthorityParams {
        mint: mint.pubkey(),
        current_update_authority: impostor.pubkey(),
        new_authority: impostor.pubkey(),
    })?;
    let result = env.process(&[ix], &[&impostor]).await;

    assert_custom_error(result, 0, TokenMetadataError::IncorrectUpdateAuthority as u32);
    Ok(())
}
