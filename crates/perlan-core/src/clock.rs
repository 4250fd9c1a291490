//! Async driver that runs a [`QuizSession`] against wall-clock time.
//!
//! One `tokio::time::interval` supplies the ticks. It is only polled while
//! the session is in a timed phase and is reset whenever a question becomes
//! active, so a tick scheduled for an earlier question can never reach the
//! next one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::engine::{Advance, Phase, QuizSession, SessionSnapshot, TickEvent};
use crate::error::QuizError;
use crate::model::{GameResult, PlayerAnswer};

/// Input from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Choose the option at this on-screen position.
    Select(usize),
    /// Move on after the answer was revealed.
    Advance,
    /// Abandon the round.
    Cancel,
}

/// What changed in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Countdown(u32),
    /// The question at this index is now active.
    QuestionShown(usize),
    /// A second passed on the active question.
    Tick { remaining: Option<u32> },
    Answered(PlayerAnswer),
    TimedOut(PlayerAnswer),
    /// The input was not accepted.
    Rejected(String),
}

/// Receives every session update along with a fresh snapshot.
pub trait SessionObserver {
    fn on_update(&mut self, update: &SessionUpdate, snapshot: &SessionSnapshot);
}

/// How a driven session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveOutcome {
    Completed(GameResult),
    /// Cancelled by the player or the input channel closed. No result.
    Cancelled,
}

/// Run a session to completion or cancellation.
pub async fn drive<O>(
    mut session: QuizSession,
    mut inputs: mpsc::Receiver<PlayerInput>,
    observer: &mut O,
) -> DriveOutcome
where
    O: SessionObserver + ?Sized,
{
    let period = Duration::from_millis(session.settings().tick_millis.max(1));
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let opening = match session.phase() {
        Phase::Countdown(n) => SessionUpdate::Countdown(n),
        _ => SessionUpdate::QuestionShown(0),
    };
    observer.on_update(&opening, &session.snapshot());

    loop {
        let timed = session.is_timed();
        tokio::select! {
            _ = ticker.tick(), if timed => {
                let update = match session.tick() {
                    Ok(TickEvent::Countdown(n)) => SessionUpdate::Countdown(n),
                    Ok(TickEvent::Started) => {
                        ticker.reset();
                        SessionUpdate::QuestionShown(0)
                    }
                    Ok(TickEvent::Elapsed { remaining }) => SessionUpdate::Tick { remaining },
                    Ok(TickEvent::TimedOut(answer)) => SessionUpdate::TimedOut(answer),
                    Ok(TickEvent::Idle) => continue,
                    Err(e) => SessionUpdate::Rejected(e.to_string()),
                };
                observer.on_update(&update, &session.snapshot());
            }
            input = inputs.recv() => {
                let update = match input {
                    None | Some(PlayerInput::Cancel) => {
                        session.cancel();
                        return DriveOutcome::Cancelled;
                    }
                    Some(PlayerInput::Select(index)) => match session.select(index) {
                        Ok(Some(answer)) => SessionUpdate::Answered(answer),
                        Ok(None) => continue,
                        Err(e) => SessionUpdate::Rejected(e.to_string()),
                    },
                    Some(PlayerInput::Advance) => match session.advance() {
                        Ok(Advance::Next(index)) => {
                            ticker.reset();
                            SessionUpdate::QuestionShown(index)
                        }
                        Ok(Advance::Completed(result)) => return DriveOutcome::Completed(result),
                        Err(QuizError::InvalidPhase { .. }) => continue,
                        Err(e) => SessionUpdate::Rejected(e.to_string()),
                    },
                };
                observer.on_update(&update, &session.snapshot());
            }
        }
    }
}
