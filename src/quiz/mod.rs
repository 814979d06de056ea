use std::fmt;

use thiserror::Error;
use uuid::Uuid;

pub mod engine;
pub mod scoring;

pub use engine::{Phase, QuizSession};

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("quiz has no questions")]
    EmptyQuiz,

    #[error("selected option does not belong to the current question")]
    InvalidSelection,

    #[error("quiz was already passed with the maximum score")]
    AlreadyPerfect,

    #[error("quiz has no finished attempt to restart")]
    RestartUnavailable,

    #[error("quiz session is already finished")]
    SessionClosed,

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Presentation(#[from] teloxide::RequestError),
}

/// Position of the presented question, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub number: usize,
    pub total: usize,
}

/// Final state of a finished attempt, rendered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReport {
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub score: u8,
    pub errors: u8,
    pub is_passed: bool,
    pub phase: Phase,
}

impl fmt::Display for QuizReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.phase == Phase::Aborted {
            writeln!(
                f,
                "Quiz '{}' stopped: too many mistakes ({}).",
                self.quiz_title, self.errors
            )?;
        } else {
            writeln!(f, "You completed the quiz '{}'!", self.quiz_title)?;
        }
        write!(
            f,
            "Your result is {}/{}. {}",
            self.score,
            scoring::MAX_SCORE,
            if self.is_passed { "Passed ✅" } else { "Not passed ❌" }
        )
    }
}
