//! The `perlan play` command.

use std::io::BufRead;
use std::path::Path;

use anyhow::Result;
use tokio::sync::mpsc;

use perlan_core::clock::{drive, DriveOutcome, PlayerInput, SessionObserver, SessionUpdate};
use perlan_core::engine::{QuizSession, SessionSnapshot};
use perlan_core::model::{Category, Difficulty, GameConfig};

use crate::app::App;

pub async fn execute(
    config_path: Option<&Path>,
    user: String,
    category: String,
    difficulty: String,
    challenge: bool,
) -> Result<()> {
    let category: Category = category.parse().map_err(anyhow::Error::msg)?;
    let difficulty: Difficulty = difficulty.parse().map_err(anyhow::Error::msg)?;
    let username = user.trim().to_string();
    if username.is_empty() {
        anyhow::bail!("player name must not be empty");
    }

    let app = App::open_synced(config_path).await?;
    let config = GameConfig {
        username,
        category,
        difficulty,
        is_challenge_mode: challenge,
    };
    let session = QuizSession::start(config, app.cache(), app.config.game.clone())?;

    println!(
        "{} questions on {category}{}. Type 1-3 to answer, Enter to continue, q to quit.",
        session.round().len(),
        if challenge { ", challenge mode" } else { "" },
    );

    let (tx, rx) = mpsc::channel(16);
    spawn_input_reader(tx);

    let outcome = drive(session, rx, &mut TerminalObserver).await;
    match outcome {
        DriveOutcome::Completed(result) => {
            let stats = app.recorder.record(&result)?;
            println!();
            println!("Final score: {}/{}", result.score, result.total_questions);
            println!("Best streak: {}", result.streak_max);
            println!(
                "{}: {} games, {} points, {:.0}% correct overall",
                stats.username,
                stats.total_games,
                stats.total_score,
                stats.accuracy() * 100.0
            );
        }
        DriveOutcome::Cancelled => println!("\nRound cancelled. Nothing was recorded."),
    }

    app.finish().await;
    Ok(())
}

/// Read stdin lines on a dedicated thread. Dropping the sender at EOF
/// cancels the round.
fn spawn_input_reader(tx: mpsc::Sender<PlayerInput>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let Some(input) = parse_input(&line) else {
                eprintln!("Type 1-3 to answer, Enter to continue, q to quit.");
                continue;
            };
            if tx.blocking_send(input).is_err() {
                break;
            }
        }
    });
}

fn parse_input(line: &str) -> Option<PlayerInput> {
    match line.trim() {
        "" => Some(PlayerInput::Advance),
        "q" | "quit" => Some(PlayerInput::Cancel),
        s => match s.parse::<usize>() {
            Ok(n) if n >= 1 => Some(PlayerInput::Select(n - 1)),
            _ => None,
        },
    }
}

struct TerminalObserver;

impl SessionObserver for TerminalObserver {
    fn on_update(&mut self, update: &SessionUpdate, snapshot: &SessionSnapshot) {
        match update {
            SessionUpdate::Countdown(n) => println!("Starting in {n}..."),
            SessionUpdate::QuestionShown(_) => {
                println!();
                println!(
                    "Question {}/{} [{}]",
                    snapshot.question_number, snapshot.total_questions, snapshot.category
                );
                println!("{}", snapshot.text);
                for (i, option) in snapshot.options.iter().enumerate() {
                    println!("  {}. {option}", i + 1);
                }
                if let Some(seconds) = snapshot.time_remaining {
                    println!("  ({seconds}s)");
                }
            }
            SessionUpdate::Tick {
                remaining: Some(left),
            } if *left <= 5 || *left % 5 == 0 => println!("  {left}s"),
            SessionUpdate::Tick { .. } => {}
            SessionUpdate::Answered(_) | SessionUpdate::TimedOut(_) => {
                let Some(reveal) = &snapshot.reveal else {
                    return;
                };
                let verdict = match update {
                    SessionUpdate::TimedOut(_) => "Time's up!",
                    _ if reveal.is_correct => "Correct!",
                    _ => "Wrong.",
                };
                let answer = snapshot
                    .options
                    .get(reveal.correct_presentation_index)
                    .map(String::as_str)
                    .unwrap_or_default();
                println!("{verdict} The answer is {answer}. Streak: {}", snapshot.streak);
                if !reveal.fact.is_empty() {
                    println!("Did you know? {}", reveal.fact);
                }
                println!("(Enter to continue)");
            }
            SessionUpdate::Rejected(message) => eprintln!("  {message}"),
        }
    }
}
