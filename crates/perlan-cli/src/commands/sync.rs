//! The `perlan sync` command.

use std::path::Path;

use anyhow::Result;

use crate::app::App;

pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let app = App::open(config_path)?;
    let report = app.sync.sync_all().await;

    match app.sync.remote() {
        Some(remote) => println!("Remote: {}", remote.name()),
        None => println!("Remote: none (offline)"),
    }
    println!("  questions: {}", report.questions);
    println!("  modules:   {}", report.modules);

    let cache = app.cache();
    println!(
        "Local cache holds {} questions and {} modules.",
        cache.get::<perlan_core::model::Question>()?.len(),
        cache.get::<perlan_core::model::CourseModule>()?.len(),
    );

    app.finish().await;
    Ok(())
}
