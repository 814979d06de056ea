use std::sync::Arc;

use teloxide::types::ReplyMarkup;
use teloxide::{payloads::SendMessageSetters, prelude::Requester, types::Message, Bot};
use tracing::instrument;
use uuid::Uuid;

use crate::database::connection::{CreateQuiz, ManageCatalog, RetrieveQuiz};
use crate::keyboard::{admin_keyboard, is_no, is_yes, yes_no_keyboard, BACK};
use crate::state::{BotState, OptionDraft, QuestionDraft, QuizDraft};
use crate::{HandlerResult, UserDialogue};

const DEFAULT_THRESHOLD: u8 = 80;

/// Parses a pass threshold such as `80` or `80%`.
pub(crate) fn parse_threshold(text: &str) -> Option<u8> {
    let value: u8 = text.trim().trim_end_matches('%').trim().parse().ok()?;
    (value <= 100).then_some(value)
}

#[instrument(level = "info", skip(connection, bot, dialogue))]
pub(crate) async fn receive_quiz_article<DbConnection: ManageCatalog + RetrieveQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    connection: Arc<DbConnection>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => {
            bot.send_message(msg.chat.id, "Returning back.")
                .reply_markup(admin_keyboard())
                .await?;
            dialogue.update(BotState::AdminMenu).await?;
        }
        Some(title) => match connection.find_article_by_title(title).await? {
            Some(article) => {
                if connection
                    .find_quiz_by_article(article.uuid())
                    .await?
                    .is_some()
                {
                    bot.send_message(msg.chat.id, "This article already has a quiz. Choose another one.")
                        .await?;
                    return Ok(());
                }
                log::info!("{} creates a quiz for '{}'", msg.chat.id, title);
                bot.send_message(
                    msg.chat.id,
                    format!("OK. What's the pass threshold in percent? (default {DEFAULT_THRESHOLD})"),
                )
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
                dialogue
                    .update(BotState::ReceiveQuizThreshold {
                        article_id: *article.uuid(),
                        title: article.title().to_owned(),
                    })
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("Article '{}' not found.", title))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, choose an article.").await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_quiz_threshold(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (article_id, title): (Uuid, String),
) -> HandlerResult {
    match msg.text().and_then(parse_threshold) {
        Some(threshold) => {
            bot.send_message(msg.chat.id, "Great. Please enter the first question.")
                .await?;
            dialogue
                .update(BotState::ReceiveNewQuestion {
                    draft: QuizDraft::new(article_id, title, threshold),
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please, send a number from 0 to 100.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_new_question(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    draft: QuizDraft,
) -> HandlerResult {
    match msg.text() {
        Some(question) => {
            log::info!(
                "{} adds a new question '{}' to quiz '{}'",
                msg.chat.id,
                question,
                draft.title
            );
            bot.send_message(msg.chat.id, "OK. What's the answer to your question?")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue
                .update(BotState::ReceiveNewAnswer {
                    draft,
                    question: QuestionDraft::new(question),
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please, send the question text.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_new_answer(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (draft, question): (QuizDraft, QuestionDraft),
) -> HandlerResult {
    match msg.text() {
        Some(answer) => {
            bot.send_message(msg.chat.id, "Got it. Is that answer correct?(Yes/No)")
                .reply_markup(yes_no_keyboard())
                .await?;
            dialogue
                .update(BotState::ReceiveAnswerIsCorrect {
                    draft,
                    question,
                    answer: answer.to_owned(),
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please, enter a valid answer.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_answer_is_correct(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (draft, mut question, answer): (QuizDraft, QuestionDraft, String),
) -> HandlerResult {
    let is_correct = match msg.text() {
        Some(text) if is_yes(text) => true,
        Some(text) if is_no(text) => false,
        _ => {
            bot.send_message(msg.chat.id, "Please, enter a valid answer Yes or No.")
                .reply_markup(yes_no_keyboard())
                .await?;
            return Ok(());
        }
    };

    log::info!(
        "Answer '{}' in question '{}' is correct: {}",
        answer,
        question.text,
        is_correct
    );
    question.options.push(OptionDraft {
        text: answer,
        is_correct,
    });
    bot.send_message(msg.chat.id, "Saved. Do you want to add another answer?(Yes/No)")
        .reply_markup(yes_no_keyboard())
        .await?;
    dialogue
        .update(BotState::ReceiveAddAnotherAnswer { draft, question })
        .await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_add_another_answer(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (mut draft, question): (QuizDraft, QuestionDraft),
) -> HandlerResult {
    match msg.text() {
        Some(text) if is_yes(text) => {
            bot.send_message(msg.chat.id, "Great. What's the another answer?")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue
                .update(BotState::ReceiveNewAnswer { draft, question })
                .await?;
        }
        Some(text) if is_no(text) => {
            if !question.has_correct_option() {
                bot.send_message(
                    msg.chat.id,
                    "A question needs at least one correct answer. Please add one.",
                )
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
                dialogue
                    .update(BotState::ReceiveNewAnswer { draft, question })
                    .await?;
                return Ok(());
            }

            log::info!("{} saves question in quiz '{}'", msg.chat.id, draft.title);
            draft.questions.push(question);
            bot.send_message(
                msg.chat.id,
                "OK. Saving question. Do you want to add another question? (Yes/No)",
            )
            .reply_markup(yes_no_keyboard())
            .await?;
            dialogue
                .update(BotState::ReceiveAddAnotherQuestion { draft })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, enter a valid answer Yes or No.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(connection, bot, dialogue))]
pub(crate) async fn receive_add_another_question<DbConnection: CreateQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    draft: QuizDraft,
    connection: Arc<DbConnection>,
) -> HandlerResult {
    match msg.text() {
        Some(text) if is_yes(text) => {
            bot.send_message(msg.chat.id, "Great. Please enter a question.")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue
                .update(BotState::ReceiveNewQuestion { draft })
                .await?;
        }
        Some(text) if is_no(text) => {
            let (quiz, questions) = draft.build();
            let title = connection.create_quiz(&quiz, &questions).await?;
            log::info!(
                "{} saves quiz '{}' with {} questions",
                msg.chat.id,
                title,
                questions.len()
            );
            bot.send_message(
                msg.chat.id,
                format!("OK. Quiz saved:\n{}\nQuestions: {}", quiz, questions.len()),
            )
            .reply_markup(admin_keyboard())
            .await?;
            dialogue.update(BotState::AdminMenu).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, enter a valid answer Yes or No.")
                .reply_markup(yes_no_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_accepts_percent_sign() {
        assert_eq!(parse_threshold("80"), Some(80));
        assert_eq!(parse_threshold(" 75% "), Some(75));
        assert_eq!(parse_threshold("100"), Some(100));
    }

    #[test]
    fn threshold_rejects_out_of_range() {
        assert_eq!(parse_threshold("101"), None);
        assert_eq!(parse_threshold("-5"), None);
        assert_eq!(parse_threshold("eighty"), None);
    }
}
