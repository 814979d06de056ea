use uuid::Uuid;

use crate::broadcast::Audience;
use crate::database::quiz::{AnswerOption, Question, Quiz};
use crate::quiz::QuizSession;

/// Answer collected while authoring a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub(crate) text: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub(crate) text: String,
    pub(crate) options: Vec<OptionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub(crate) article_id: Uuid,
    pub(crate) title: String,
    pub(crate) pass_threshold: u8,
    pub(crate) questions: Vec<QuestionDraft>,
}

impl QuestionDraft {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }

    pub(crate) fn has_correct_option(&self) -> bool {
        self.options.iter().any(|option| option.is_correct)
    }
}

impl QuizDraft {
    pub(crate) fn new(article_id: Uuid, title: impl Into<String>, pass_threshold: u8) -> Self {
        Self {
            article_id,
            title: title.into(),
            pass_threshold,
            questions: Vec::new(),
        }
    }

    /// Turns the draft into rows, numbering questions in the order they
    /// were entered.
    pub(crate) fn build(&self) -> (Quiz, Vec<(Question, Vec<AnswerOption>)>) {
        let quiz = Quiz::new(self.article_id, self.title.clone(), self.pass_threshold);
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(position, draft)| {
                let question = Question::new(*quiz.uuid(), position as i32, draft.text.clone(), 1);
                let options = draft
                    .options
                    .iter()
                    .map(|option| {
                        AnswerOption::new(*question.uuid(), option.text.clone(), option.is_correct)
                    })
                    .collect();
                (question, options)
            })
            .collect();

        (quiz, questions)
    }
}

#[derive(Debug, Clone, Default)]
pub enum BotState {
    #[default]
    Start,

    // PART FOR --- REGISTRATION ---
    ReceiveFullName,
    ReceiveCity {
        full_name: String,
    },
    ReceiveStore {
        full_name: String,
        city_id: Uuid,
    },

    // PART FOR --- BROWSING ---
    BrowseCategories,

    // PART FOR --- RUNNING QUIZ ---
    TakingQuiz {
        session: QuizSession,
    },

    // PART FOR --- ADMIN ---
    AdminMenu,
    ReceiveCategoryName,
    ReceiveArticleCategory,
    ReceiveArticleTitle {
        category_id: Uuid,
    },
    ReceiveArticleBody {
        category_id: Uuid,
        title: String,
    },
    ReceiveArticlePhoto {
        category_id: Uuid,
        title: String,
        body: String,
    },
    ReceiveCityName,
    ReceiveStoreCity,
    ReceiveStoreName {
        city_id: Uuid,
    },

    // PART FOR --- CREATING QUIZ ---
    ReceiveQuizArticle,
    ReceiveQuizThreshold {
        article_id: Uuid,
        title: String,
    },
    ReceiveNewQuestion {
        draft: QuizDraft,
    },
    ReceiveNewAnswer {
        draft: QuizDraft,
        question: QuestionDraft,
    },
    ReceiveAnswerIsCorrect {
        draft: QuizDraft,
        question: QuestionDraft,
        answer: String,
    },
    ReceiveAddAnotherAnswer {
        draft: QuizDraft,
        question: QuestionDraft,
    },
    ReceiveAddAnotherQuestion {
        draft: QuizDraft,
    },

    // PART FOR --- BROADCAST ---
    ReceiveBroadcastArticle,
    ReceiveBroadcastAudience {
        article_id: Uuid,
    },
    ReceiveBroadcastCity {
        article_id: Uuid,
    },
    ReceiveBroadcastStoreCity {
        article_id: Uuid,
    },
    ReceiveBroadcastStore {
        article_id: Uuid,
        city_id: Uuid,
    },
    ReceiveBroadcastUser {
        article_id: Uuid,
    },
    ConfirmBroadcast {
        article_id: Uuid,
        audience: Audience,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_keeps_question_order_and_links_rows() {
        let mut draft = QuizDraft::new(Uuid::new_v4(), "Returns policy", 80);
        for text in ["First", "Second"] {
            let mut question = QuestionDraft::new(text);
            question.options.push(OptionDraft {
                text: "ok".into(),
                is_correct: true,
            });
            draft.questions.push(question);
        }

        let (quiz, questions) = draft.build();

        assert_eq!(quiz.title(), "Returns policy");
        assert_eq!(quiz.pass_threshold(), 80);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].0.text(), "First");
        assert_eq!(questions[1].0.position(), 1);
        assert!(questions
            .iter()
            .all(|(q, options)| q.quiz_id() == quiz.uuid()
                && options.iter().all(|o| o.question_id() == q.uuid())));
    }

    #[test]
    fn question_without_correct_option_is_detected() {
        let mut question = QuestionDraft::new("Which shelf?");
        question.options.push(OptionDraft {
            text: "Top".into(),
            is_correct: false,
        });
        assert!(!question.has_correct_option());

        question.options.push(OptionDraft {
            text: "Eye level".into(),
            is_correct: true,
        });
        assert!(question.has_correct_option());
    }
}
