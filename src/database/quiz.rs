use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Quiz {
    uuid: Uuid,
    article_id: Uuid,
    title: String,
    pass_threshold: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Question {
    uuid: Uuid,
    quiz_id: Uuid,
    position: i32,
    text: String,
    weight: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AnswerOption {
    uuid: Uuid,
    question_id: Uuid,
    text: String,
    is_correct: bool,
}

/// One user's run through a quiz. `finished_at` stays empty until the
/// attempt is finalized; abandoned attempts keep their provisional values.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Attempt {
    uuid: Uuid,
    user_id: i64,
    quiz_id: Uuid,
    score: i16,
    is_passed: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AnswerRecord {
    uuid: Uuid,
    attempt_id: Uuid,
    question_id: Uuid,
    option_id: Uuid,
    is_correct: bool,
    answered_at: DateTime<Utc>,
}

/// Attempt joined with its quiz title, used for the "my results" listing.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptSummary {
    pub quiz_title: String,
    pub score: i16,
    pub is_passed: bool,
    pub finished_at: Option<DateTime<Utc>>,
}

impl fmt::Display for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\nPass threshold: {}%", self.title, self.pass_threshold)
    }
}

impl fmt::Display for AttemptSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.is_passed { "✅" } else { "❌" };
        match self.finished_at {
            Some(at) => write!(
                f,
                "{} {}: {}/10 ({})",
                mark,
                self.quiz_title,
                self.score,
                at.format("%d.%m.%Y")
            ),
            None => write!(f, "⏳ {}: not finished", self.quiz_title),
        }
    }
}

impl Quiz {
    pub fn new(article_id: Uuid, title: impl Into<String>, pass_threshold: u8) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            article_id,
            title: title.into(),
            pass_threshold: i16::from(pass_threshold.min(100)),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn article_id(&self) -> &Uuid {
        &self.article_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Percentage of the maximum score needed to pass, always within `0..=100`.
    pub fn pass_threshold(&self) -> u8 {
        // The column carries a CHECK constraint; clamp anyway for rows built by hand.
        self.pass_threshold.clamp(0, 100) as u8
    }
}

impl Question {
    pub fn new(quiz_id: Uuid, position: i32, text: impl Into<String>, weight: i16) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            quiz_id,
            position,
            text: text.into(),
            weight,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn quiz_id(&self) -> &Uuid {
        &self.quiz_id
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn weight(&self) -> i16 {
        self.weight
    }
}

impl AnswerOption {
    pub fn new(question_id: Uuid, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            question_id,
            text: text.into(),
            is_correct,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn question_id(&self) -> &Uuid {
        &self.question_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

impl Attempt {
    pub fn new(user_id: i64, quiz_id: Uuid, score: i16, is_passed: bool) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            quiz_id,
            score,
            is_passed,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn quiz_id(&self) -> &Uuid {
        &self.quiz_id
    }

    pub fn score(&self) -> i16 {
        self.score
    }

    pub fn is_passed(&self) -> bool {
        self.is_passed
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Writes the final score and pass flag. Has no effect on an attempt
    /// that was already finalized.
    pub fn finalize(&mut self, score: i16, is_passed: bool) {
        if self.finished_at.is_some() {
            return;
        }
        self.score = score;
        self.is_passed = is_passed;
        self.finished_at = Some(Utc::now());
    }
}

impl AnswerRecord {
    pub fn new(attempt_id: Uuid, question_id: Uuid, option_id: Uuid, is_correct: bool) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            attempt_id,
            question_id,
            option_id,
            is_correct,
            answered_at: Utc::now(),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn attempt_id(&self) -> &Uuid {
        &self.attempt_id
    }

    pub fn question_id(&self) -> &Uuid {
        &self.question_id
    }

    pub fn option_id(&self) -> &Uuid {
        &self.option_id
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn answered_at(&self) -> DateTime<Utc> {
        self.answered_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_is_written_once() {
        let mut attempt = Attempt::new(7, Uuid::new_v4(), 10, false);
        assert!(!attempt.is_finalized());

        attempt.finalize(8, true);
        attempt.finalize(0, false);

        assert!(attempt.is_finalized());
        assert_eq!(attempt.score(), 8);
        assert!(attempt.is_passed());
    }

    #[test]
    fn threshold_is_clamped_to_percent() {
        let quiz = Quiz::new(Uuid::new_v4(), "Cash desk", 250);
        assert_eq!(quiz.pass_threshold(), 100);
    }
}
