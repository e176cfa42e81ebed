use anyhow::Context;
use pda_token_metadata::{find_metadata_pda_with_program, id as program_id_fn, instruction};
use serde_json::json;
use solana_program::{pubkey::Pubkey, system_program};
use spl_token_metadata_interface::state::Field;

fn main() -> anyhow::Result<()> {
    let program_id = program_id_fn();
    let token_program_id = spl_token_2022::id();

    // Deterministic example inputs
    let payer = Pubkey::new_from_array([1u8; 32]);
    let mint_a = Pubkey::new_from_array([2u8; 32]);
    let mint_b = Pubkey::new_from_array([3u8; 32]);
    let new_auth = Pubkey::new_from_array([7u8; 32]);
    let (md_a, bump_a) = find_metadata_pda_with_program(&program_id, &mint_a);
    let (md_b, bump_b) = find_metadata_pda_with_program(&program_id, &mint_b);

    let initialize = instruction::initialize(
        &program_id,
        &mint_a,
        Some(&payer),
        &payer,
        &payer,
        "Name".into(),
        "SYM".into(),
        "https://i".into(),
    );
    let update_name = instruction::update_field(
        &program_id,
        &mint_a,
        &payer,
        Some(&payer),
        Field::Name,
        "New".into(),
    );
    let add_field = instruction::update_field(
        &program_id,
        &mint_a,
        &payer,
        Some(&payer),
        Field::Key("k1".into()),
        "v1".into(),
    );
    let clear_field = instruction::update_field(
        &program_id,
        &mint_a,
        &payer,
        None,
        Field::Key("k1".into()),
        String::new(),
    );
    let remove_key = instruction::remove_key(&program_id, &mint_a, &payer, "k1".into(), true);
    let transfer = instruction::update_authority(&program_id, &mint_a, &payer, Some(new_auth))?;
    let make_immutable = instruction::update_authority(&program_id, &mint_a, &payer, None)?;
    let emit_all = instruction::emit(&program_id, &mint_a, None, None);
    let emit_range = instruction::emit(&program_id, &mint_a, Some(32), Some(64));

    // Upstream fixtures: token-2022 mint with metadata pointer
    let init_pointer = spl_token_2022::extension::metadata_pointer::instruction::initialize(
        &token_program_id,
        &mint_a,
        Some(payer),
        Some(md_a),
    )?;
    let init_mint2 = spl_token_2022::instruction::initialize_mint2(
        &token_program_id,
        &mint_a,
        &payer,
        None,
        9,
    )?;

    let fixtures = json!({
        "Initialize": hex::encode(&initialize.data),
        "UpdateFieldName": hex::encode(&update_name.data),
        "UpdateFieldKey": hex::encode(&add_field.data),
        "UpdateFieldClearKey": hex::encode(&clear_field.data),
        "RemoveKeyIdempotent": hex::encode(&remove_key.data),
        "UpdateAuthority": hex::encode(&transfer.data),
        "MakeImmutable": hex::encode(&make_immutable.data),
        "EmitAll": hex::encode(&emit_all.data),
        "EmitRange": hex::encode(&emit_range.data),
        "SystemProgram": system_program::id().to_string(),
        "ProgramId": program_id.to_string(),
        "TokenProgramId": token_program_id.to_string(),
        "PdaSamples": [
            { "mint": mint_a.to_string(), "metadata": md_a.to_string(), "bump": bump_a },
            { "mint": mint_b.to_string(), "metadata": md_b.to_string(), "bump": bump_b }
        ],
        "TokenInitializeMetadataPointer": hex::encode(&init_pointer.data),
        "TokenInitializeMint2": hex::encode(&init_mint2.data)
    });

    let out_dir = std::env::var("OUT_FIXTURES_DIR")
        .unwrap_or_else(|_| "sdks/pda-token-metadata-sdk-rs/tests/fixtures".to_string());
    std::fs::create_dir_all(&out_dir).context("create fixtures dir")?;
    let path = format!("{}/metadata_instructions.json", out_dir);
    std::fs::write(&path, serde_json::to_vec_pretty(&fixtures)?)
        .with_context(|| format!("write {}", path))?;

    println!("wrote fixtures to {}", path);
    Ok(())
}
