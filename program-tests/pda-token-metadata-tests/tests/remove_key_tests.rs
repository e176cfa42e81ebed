use pda_token_metadata_sdk::{RemoveKeyParams, TxAddFieldParams};
use pda_token_metadata_tests::{assert_custom_error, assert_instruction_error, TestEnv};
use solana_sdk::{
    instruction::InstructionError,
    signature::{Keypair, Signer},
};
use spl_token_metadata_interface::error::TokenMetadataError;

async fn token_with_fields(
    env: &mut TestEnv,
    mint: &Keypair,
    authority: &Keypair,
    fields: &[(&str, &str)],
) -> anyhow::Result<()> {
    env.create_token_with_metadata(mint, authority, false).await?;
    for (key, value) in fields {
        let ixs = env.client.add_field_tx(TxAddFieldParams {
            mint: mint.pubkey(),
            update_authority: authority.pubkey(),
            payer: env.payer_pubkey(),
            key: key.to_string(),
            value: value.to_string(),
        })?;
        env.process(&ixs, &[authority]).await?;
    }
    Ok(())
}

fn remove_params(mint: &Keypair, authority: &Keypair, key: &str, idempotent: bool) -> RemoveKeyParams {
    RemoveKeyParams {
        mint: mint.pubkey(),
        update_authority: authority.pubkey(),
        key: key.into(),
        idempotent,
    }
}

#[tokio::test]
async fn remove_key_success() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    token_with_fields(&mut env, &mint, &authority, &[("color", "gold"), ("rarity", "rare")])
        .await?;
    let metadata_pda = env.client.metadata_pda(&mint.pubkey());
    let before = env.fetch_account(metadata_pda).await;

    let ixs = env
        .client
        .remove_key_tx(remove_params(&mint, &authority, "color", false))?;
    env.process(&ixs, &[&authority]).await?;

    let metadata = env.fetch_metadata(metadata_pda).await;
    assert_eq!(
        metadata.additional_metadata,
        vec![("rarity".to_string(), "rare".to_string())]
    );
    let after = env.fetch_account(metadata_pda).await;
    assert!(after.data.len() < before.data.len());
    // surplus rent stays with the account
    assert_eq!(after.lamports, before.lamports);
    Ok(())
}

#[tokio::test]
async fn remove_key_missing_fails() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    token_with_fields(&mut env, &mint, &authority, &[]).await?;

    let ixs = env
        .client
        .remove_key_tx(remove_params(&mint, &authority, "color", false))?;
    let result = env.process(&ixs, &[&authority]).await;

    assert_custom_error(result, 0, TokenMetadataError::KeyNotFound as u32);
    Ok(())
}

#[tokio::test]
async fn remove_key_missing_idempotent_success() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    token_with_fields(&mut env, &mint, &authority, &[("color", "gold")]).await?;

    let ixs = env
        .client
        .remove_key_tx(remove_params(&mint, &authority, "size", true))?;
    env.process(&ixs, &[&authority]).await?;

    let metadata = env.fetch_metadata(env.client.metadata_pda(&mint.pubkey())).await;
    assert_eq!(metadata.additional_metadata.len(), 1);
    Ok(())
}

#[tokio::test]
async fn remove_key_wrong_authority_fails() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    let impostor = Keypair::new();
    token_with_fields(&mut env, &mint, &authority, &[("color", "gold")]).await?;

    let ixs = env
        .client
        .remove_key_tx(remove_params(&mint, &impostor, "color", false))?;
    let result = env.process(&ixs, &[&impostor]).await;

    assert_custom_error(result, 0, TokenMetadataError::IncorrectUpdateAuthority as u32);
    Ok(())
}

#[tokio::test]
async fn remove_key_uninitialized_metadata_fails() -> anyhow::Result<()> {
    let mut env = TestEnv::start().await;
    let mint = Keypair::new();
    let authority = Keypair::new();
    env.create_mint_with_pointer(&mint, &authority.pubkey()).await?;

    let ixs = env
        .client
        .remove_key_tx(remove_params(&mint, &authority, "color", true))?;
    let result = env.process(&ixs, &[&authority]).await;

    assert_instruction_error(result, 0, InstructionError::IllegalOwner);
    Ok(())
}
