//! The `perlan stats` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use perlan_core::model::PlayerStats;

use crate::app::App;

pub fn execute(config_path: Option<&Path>, user: Option<String>) -> Result<()> {
    let app = App::open(config_path)?;
    let book = app.recorder.stats()?;

    if let Some(user) = user {
        let Some(stats) = book.get(&user) else {
            anyhow::bail!("no games recorded for '{user}'");
        };
        print_player(stats);
        return Ok(());
    }

    if book.is_empty() {
        println!("No games played yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Player", "Games", "Score", "Accuracy", "Best streak", "Best category",
    ]);
    for (rank, stats) in book.leaderboard().into_iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&stats.username),
            Cell::new(stats.total_games),
            Cell::new(stats.total_score),
            Cell::new(format!("{:.1}%", stats.accuracy() * 100.0)),
            Cell::new(stats.streak_record),
            Cell::new(
                stats
                    .best_category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_player(stats: &PlayerStats) {
    println!("Player:        {}", stats.username);
    println!("Games played:  {}", stats.total_games);
    println!("Total score:   {}", stats.total_score);
    println!(
        "Correct:       {}/{} ({:.1}%)",
        stats.total_correct,
        stats.total_questions_answered,
        stats.accuracy() * 100.0
    );
    println!("Best streak:   {}", stats.streak_record);
    if let Some(category) = stats.best_category {
        println!("Best category: {category}");
    }
    if let Some(last) = stats.last_played {
        println!("Last played:   {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
}
