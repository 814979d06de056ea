//! Fixed scoring policy for quiz attempts.
//!
//! Every attempt starts at [`MAX_SCORE`] and loses [`PENALTY`] points per
//! wrong answer, never dropping below zero. The attempt is aborted once
//! [`MAX_ERRORS`] wrong answers have been given. Question weights do not
//! take part in scoring.

pub const MAX_SCORE: u8 = 10;
pub const PENALTY: u8 = 2;
pub const MAX_ERRORS: u8 = 5;

/// Running score and error count of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorecard {
    score: u8,
    errors: u8,
}

impl Default for Scorecard {
    fn default() -> Self {
        Self {
            score: MAX_SCORE,
            errors: 0,
        }
    }
}

impl Scorecard {
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn errors(&self) -> u8 {
        self.errors
    }

    /// Applies the outcome of one answer.
    pub fn register(&mut self, is_correct: bool) {
        if !is_correct {
            self.errors = self.errors.saturating_add(1);
            self.score = self.score.saturating_sub(PENALTY);
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.errors >= MAX_ERRORS
    }

    pub fn is_perfect(&self) -> bool {
        self.score == MAX_SCORE
    }
}

/// `score >= MAX_SCORE * threshold / 100`, evaluated without rounding.
pub fn is_passing(score: u8, pass_threshold: u8) -> bool {
    u32::from(score) * 100 >= u32::from(MAX_SCORE) * u32::from(pass_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_answers_cost_two_points_and_count_once() {
        let mut card = Scorecard::default();
        card.register(true);
        assert_eq!((card.score(), card.errors()), (10, 0));

        card.register(false);
        assert_eq!((card.score(), card.errors()), (8, 1));
    }

    #[test]
    fn score_never_goes_below_zero() {
        let mut card = Scorecard::default();
        for _ in 0..8 {
            card.register(false);
            assert!(card.score() <= MAX_SCORE);
        }
        assert_eq!(card.score(), 0);
        assert_eq!(card.errors(), 8);
    }

    #[test]
    fn exhausted_after_five_errors() {
        let mut card = Scorecard::default();
        for _ in 0..4 {
            card.register(false);
        }
        assert!(!card.is_exhausted());
        card.register(false);
        assert!(card.is_exhausted());
    }

    #[test]
    fn pass_threshold_eighty_percent() {
        assert!(is_passing(8, 80));
        assert!(!is_passing(7, 80));
        assert!(is_passing(10, 100));
        assert!(is_passing(0, 0));
        assert!(!is_passing(6, 80));
    }
}
