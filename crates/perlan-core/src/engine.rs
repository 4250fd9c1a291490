//! The quiz session state machine.
//!
//! A session moves through `Countdown(n) -> Active -> Answered -> (Active |
//! Completed)`. Time is advanced explicitly with [`QuizSession::tick`], one
//! call per second; the async driver in [`crate::clock`] supplies the ticks.
//! Gameplay never touches the network.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::QuizError;
use crate::model::{Category, Difficulty, GameConfig, GameResult, PlayerAnswer, Question};
use crate::random::{select_round, OptionOrder};
use crate::scoring::{finalize, record_answer, Selection, StreakState};
use crate::traits::ContentRepository;

/// Questions per round.
pub const ROUND_SIZE: usize = 10;
/// Lead-in ticks before the first question.
pub const COUNTDOWN_TICKS: u32 = 3;
/// Per-question limit in challenge mode, in ticks.
pub const QUESTION_TIME_LIMIT: u32 = 15;

/// Timing and size knobs for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub round_size: usize,
    pub countdown_ticks: u32,
    pub question_time_limit: u32,
    /// Wall-clock length of one tick, used by the async driver.
    pub tick_millis: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            round_size: ROUND_SIZE,
            countdown_ticks: COUNTDOWN_TICKS,
            question_time_limit: QUESTION_TIME_LIMIT,
            tick_millis: 1000,
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Lead-in; the value is the number of ticks left.
    Countdown(u32),
    /// A question is displayed and accepts one answer.
    Active,
    /// The current question has been answered; waiting for `advance`.
    Answered,
    /// The round produced its result.
    Completed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Countdown(n) => write!(f, "counting down ({n})"),
            Phase::Active => write!(f, "active"),
            Phase::Answered => write!(f, "answered"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// A question as it appears in a round, with its shuffled option order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundQuestion {
    pub question: Question,
    pub order: OptionOrder,
}

impl RoundQuestion {
    pub fn presented_options(&self) -> Vec<String> {
        self.order
            .present(&self.question.options)
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// On-screen position of the correct option.
    pub fn presented_correct_index(&self) -> usize {
        self.order
            .to_presentation(self.question.correct_index)
            .unwrap_or(self.question.correct_index)
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    /// The lead-in continues; ticks left.
    Countdown(u32),
    /// The lead-in finished and question 0 is active.
    Started,
    /// A question is active; challenge-mode seconds left, if any.
    Elapsed { remaining: Option<u32> },
    /// The challenge timer ran out and a timeout answer was recorded.
    TimedOut(PlayerAnswer),
    /// Nothing is timed in the current phase.
    Idle,
}

/// Result of [`QuizSession::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The question at this index is now active.
    Next(usize),
    /// The last question was answered; the round is over.
    Completed(GameResult),
}

/// Revealed after a question is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reveal {
    pub correct_presentation_index: usize,
    /// `None` for a timeout.
    pub selected_presentation_index: Option<usize>,
    pub is_correct: bool,
    pub fact: String,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: String,
    pub countdown: Option<u32>,
    pub question_number: usize,
    pub total_questions: usize,
    pub category: Category,
    pub difficulty: Difficulty,
    pub text: String,
    pub options: Vec<String>,
    pub streak: u32,
    pub max_streak: u32,
    /// Seconds left in challenge mode.
    pub time_remaining: Option<u32>,
    pub reveal: Option<Reveal>,
}

/// One player's round.
#[derive(Debug)]
pub struct QuizSession {
    config: GameConfig,
    settings: SessionSettings,
    phase: Phase,
    round: Vec<RoundQuestion>,
    current: usize,
    answers: Vec<PlayerAnswer>,
    streak: StreakState,
    /// Ticks spent on the current question while Active.
    elapsed: u32,
    last_selection: Option<Selection>,
}

impl QuizSession {
    /// Build a round from the repository's question bank.
    pub fn start(
        config: GameConfig,
        repository: &dyn ContentRepository,
        settings: SessionSettings,
    ) -> Result<Self, QuizError> {
        let pool = repository.list_questions()?;
        Self::from_pool(config, &pool, settings, &mut rand::thread_rng())
    }

    /// Build a round from an explicit pool.
    ///
    /// Questions that fail validation are left out. Fails with
    /// `InsufficientContent` before entering the countdown if no question can
    /// be selected.
    pub fn from_pool<R: Rng + ?Sized>(
        config: GameConfig,
        pool: &[Question],
        settings: SessionSettings,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        let playable: Vec<Question> = pool
            .iter()
            .filter(|q| match q.check() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("leaving out {e}");
                    false
                }
            })
            .cloned()
            .collect();
        let selected = select_round(&playable, config.category, settings.round_size, rng);
        if selected.is_empty() {
            return Err(QuizError::InsufficientContent {
                category: config.category,
            });
        }

        let round = selected
            .into_iter()
            .map(|question| RoundQuestion {
                question,
                order: OptionOrder::shuffled(rng),
            })
            .collect();

        Self::with_round(config, round, settings)
    }

    /// Use a prepared round as-is.
    ///
    /// Fails with `InsufficientContent` if `round` is empty.
    pub fn with_round(
        config: GameConfig,
        round: Vec<RoundQuestion>,
        settings: SessionSettings,
    ) -> Result<Self, QuizError> {
        if round.is_empty() {
            return Err(QuizError::InsufficientContent {
                category: config.category,
            });
        }
        let phase = if settings.countdown_ticks == 0 {
            Phase::Active
        } else {
            Phase::Countdown(settings.countdown_ticks)
        };
        tracing::debug!(
            user = %config.username,
            questions = round.len(),
            "session created"
        );
        Ok(Self {
            config,
            settings,
            phase,
            round,
            current: 0,
            answers: Vec::new(),
            streak: StreakState::default(),
            elapsed: 0,
            last_selection: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn round(&self) -> &[RoundQuestion] {
        &self.round
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question at the cursor. A session always holds at least one.
    pub fn current_question(&self) -> &RoundQuestion {
        &self.round[self.current]
    }

    pub fn answers(&self) -> &[PlayerAnswer] {
        &self.answers
    }

    pub fn streak(&self) -> StreakState {
        self.streak
    }

    /// Challenge-mode seconds left on the current question.
    pub fn time_remaining(&self) -> Option<u32> {
        self.config
            .is_challenge_mode
            .then(|| self.settings.question_time_limit.saturating_sub(self.elapsed))
    }

    /// Whether ticks have any effect in the current phase.
    pub fn is_timed(&self) -> bool {
        matches!(self.phase, Phase::Countdown(_) | Phase::Active)
    }

    /// Advance time by one tick.
    ///
    /// In `Answered` this is a no-op, so a timer firing after the player
    /// answered can never produce a second answer.
    pub fn tick(&mut self) -> Result<TickEvent, QuizError> {
        match self.phase {
            Phase::Completed => Err(QuizError::SessionClosed),
            Phase::Answered => Ok(TickEvent::Idle),
            Phase::Countdown(n) => {
                let left = n.saturating_sub(1);
                if left == 0 {
                    self.activate(0);
                    Ok(TickEvent::Started)
                } else {
                    self.phase = Phase::Countdown(left);
                    Ok(TickEvent::Countdown(left))
                }
            }
            Phase::Active => {
                self.elapsed += 1;
                if self.config.is_challenge_mode
                    && self.elapsed >= self.settings.question_time_limit
                {
                    let answer = self.answer(Selection::TimedOut);
                    Ok(TickEvent::TimedOut(answer))
                } else {
                    Ok(TickEvent::Elapsed {
                        remaining: self.time_remaining(),
                    })
                }
            }
        }
    }

    /// Record the player's choice for the current question.
    ///
    /// Returns `Ok(None)` when input is not accepted right now (during the
    /// countdown, or after the question was already answered).
    pub fn select(&mut self, presentation_index: usize) -> Result<Option<PlayerAnswer>, QuizError> {
        match self.phase {
            Phase::Completed => Err(QuizError::SessionClosed),
            Phase::Countdown(_) | Phase::Answered => Ok(None),
            Phase::Active => {
                let available = self.current_question().question.options.len();
                if presentation_index >= available {
                    return Err(QuizError::InvalidOption {
                        index: presentation_index,
                        available,
                    });
                }
                Ok(Some(self.answer(Selection::Presented(presentation_index))))
            }
        }
    }

    /// Move past an answered question.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        match self.phase {
            Phase::Completed => Err(QuizError::SessionClosed),
            Phase::Answered if self.current + 1 < self.round.len() => {
                self.activate(self.current + 1);
                Ok(Advance::Next(self.current))
            }
            Phase::Answered => {
                self.phase = Phase::Completed;
                Ok(Advance::Completed(self.build_result()))
            }
            phase => Err(QuizError::InvalidPhase {
                operation: "advance",
                phase: phase.to_string(),
            }),
        }
    }

    /// Abandon the round. No result is produced.
    pub fn cancel(self) {
        tracing::debug!(
            user = %self.config.username,
            answered = self.answers.len(),
            "session cancelled"
        );
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let rq = self.current_question();
        let reveal = match (self.phase, self.answers.last()) {
            (Phase::Answered | Phase::Completed, Some(answer)) => Some(Reveal {
                correct_presentation_index: rq.presented_correct_index(),
                selected_presentation_index: match self.last_selection {
                    Some(Selection::Presented(i)) => Some(i),
                    _ => None,
                },
                is_correct: answer.is_correct,
                fact: rq.question.fact.clone(),
            }),
            _ => None,
        };

        SessionSnapshot {
            phase: self.phase.to_string(),
            countdown: match self.phase {
                Phase::Countdown(n) => Some(n),
                _ => None,
            },
            question_number: self.current + 1,
            total_questions: self.round.len(),
            category: rq.question.category,
            difficulty: rq.question.difficulty,
            text: rq.question.text.clone(),
            options: rq.presented_options(),
            streak: self.streak.current,
            max_streak: self.streak.max,
            time_remaining: self.time_remaining(),
            reveal,
        }
    }

    fn activate(&mut self, index: usize) {
        self.current = index;
        self.elapsed = 0;
        self.last_selection = None;
        self.phase = Phase::Active;
    }

    fn answer(&mut self, selection: Selection) -> PlayerAnswer {
        let (answer, streak) = record_answer(
            &self.round[self.current],
            selection,
            self.streak,
            self.elapsed,
        );
        self.streak = streak;
        self.last_selection = Some(selection);
        self.answers.push(answer.clone());
        self.phase = Phase::Answered;
        answer
    }

    fn build_result(&self) -> GameResult {
        GameResult {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            username: self.config.username.clone(),
            config: self.config.clone(),
            score: finalize(&self.answers),
            total_questions: self.round.len() as u32,
            answers: self.answers.clone(),
            streak_max: self.streak.max,
        }
    }
}
