//! The `perlan reset` command.

use std::path::Path;

use anyhow::Result;

use crate::app::App;

pub fn execute(config_path: Option<&Path>, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("reset deletes all local questions, modules, results and stats; pass --yes to confirm");
    }
    let app = App::open(config_path)?;
    app.cache().clear()?;
    println!(
        "Cleared local data in {}. The bundled content is restored on next use.",
        app.config.data_dir.display()
    );
    Ok(())
}
