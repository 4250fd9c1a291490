//! The `perlan validate` command.

use std::path::PathBuf;

use anyhow::Result;

use perlan_core::parser::{load_content_directory, parse_content_pack, validate_content_pack};

pub fn execute(path: PathBuf) -> Result<()> {
    let packs = if path.is_dir() {
        load_content_directory(&path)?
    } else {
        vec![parse_content_pack(&path)?]
    };

    let mut total_warnings = 0;

    for pack in &packs {
        println!(
            "Content pack: {} ({} questions, {} modules)",
            pack.name,
            pack.questions.len(),
            pack.modules.len()
        );

        let warnings = validate_content_pack(pack);
        for w in &warnings {
            let prefix = w
                .entity_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All content packs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
