use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message},
    Bot,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::{ensure_registered, leave_running_quiz},
    config::Config,
    database::connection::{ManageUsers, RecordAttempt, RetrieveQuiz},
    keyboard::main_menu_keyboard,
    presenter::ChatPresenter,
    quiz::{engine, QuizError, QuizSession},
    state::BotState,
    HandlerResult, UserDialogue,
};

/// Text shown to the user when a quiz step fails.
pub(crate) fn user_message(error: &QuizError) -> &'static str {
    match error {
        QuizError::EmptyQuiz => "Sorry, no questions for that quiz available.",
        QuizError::AlreadyPerfect => {
            "You have already passed this quiz with the maximum score 🎉"
        }
        QuizError::RestartUnavailable => "There is no finished attempt to restart.",
        QuizError::InvalidSelection => "Please choose one of the offered answers.",
        QuizError::SessionClosed => "This quiz is already over.",
        QuizError::NotFound(_) | QuizError::Store(_) | QuizError::Presentation(_) => {
            "Something went wrong. Please try again later."
        }
    }
}

async fn report_failure(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    error: &QuizError,
    config: &Config,
) -> HandlerResult {
    match error {
        QuizError::EmptyQuiz | QuizError::AlreadyPerfect | QuizError::RestartUnavailable => {
            log::info!("{}: quiz refused: {}", chat_id, error)
        }
        other => log::error!("{}: quiz session aborted: {:?}", chat_id, other),
    }

    bot.send_message(chat_id, user_message(error))
        .reply_markup(main_menu_keyboard(config.is_admin(chat_id)))
        .await?;
    dialogue.update(BotState::Start).await?;

    Ok(())
}

async fn back_to_menu(bot: &Bot, chat_id: ChatId, config: &Config) -> HandlerResult {
    bot.send_message(chat_id, "What do you want to do now?")
        .reply_markup(main_menu_keyboard(config.is_admin(chat_id)))
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q, connection, config))]
pub(crate) async fn start_quiz<Store: RetrieveQuiz + RecordAttempt + ManageUsers>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    quiz_id: Uuid,
    connection: Arc<Store>,
    config: Arc<Config>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    leave_running_quiz(&dialogue).await?;
    if !ensure_registered(&bot, chat_id, &dialogue, &*connection, &config).await? {
        return Ok(());
    }

    let presenter = ChatPresenter::new(bot.clone(), chat_id);
    match engine::start(&*connection, &presenter, chat_id.0, quiz_id).await {
        Ok(session) => dialogue.update(BotState::TakingQuiz { session }).await?,
        Err(e) => report_failure(&bot, chat_id, &dialogue, &e, &config).await?,
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q, connection, config))]
pub(crate) async fn restart_quiz<Store: RetrieveQuiz + RecordAttempt + ManageUsers>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    quiz_id: Uuid,
    connection: Arc<Store>,
    config: Arc<Config>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    leave_running_quiz(&dialogue).await?;
    if !ensure_registered(&bot, chat_id, &dialogue, &*connection, &config).await? {
        return Ok(());
    }

    let presenter = ChatPresenter::new(bot.clone(), chat_id);
    match engine::restart(&*connection, &presenter, chat_id.0, quiz_id).await {
        Ok(session) => dialogue.update(BotState::TakingQuiz { session }).await?,
        Err(e) => report_failure(&bot, chat_id, &dialogue, &e, &config).await?,
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q, session, connection, config))]
pub(crate) async fn take_answer<Store: RetrieveQuiz + RecordAttempt>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    option_id: Uuid,
    mut session: QuizSession,
    connection: Arc<Store>,
    config: Arc<Config>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    if let Some(message) = &q.message {
        bot.edit_message_reply_markup(chat_id, message.id()).await?;
    }

    let presenter = ChatPresenter::new(bot.clone(), chat_id);
    match engine::submit_answer(&*connection, &presenter, &mut session, option_id).await {
        Ok(phase) if phase.is_terminal() => {
            dialogue.update(BotState::Start).await?;
            back_to_menu(&bot, chat_id, &config).await?;
        }
        Ok(_) => dialogue.update(BotState::TakingQuiz { session }).await?,
        Err(QuizError::InvalidSelection) => {
            log::info!("{}: answer {} ignored", chat_id, option_id);
        }
        Err(e) => report_failure(&bot, chat_id, &dialogue, &e, &config).await?,
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q, session, config))]
pub(crate) async fn abandon_quiz(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    session: QuizSession,
    config: Arc<Config>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    if let Some(message) = &q.message {
        bot.edit_message_reply_markup(chat_id, message.id()).await?;
    }

    engine::abandon(session);
    dialogue.update(BotState::Start).await?;
    bot.send_message(chat_id, "OK. Quitting quiz...").await?;
    back_to_menu(&bot, chat_id, &config).await?;

    Ok(())
}

/// Text typed while a question is pending.
pub(crate) async fn awaiting_answer(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Please pick one of the answers above, or send /cancel to leave the quiz.",
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusals_have_specific_messages() {
        assert_eq!(
            user_message(&QuizError::EmptyQuiz),
            "Sorry, no questions for that quiz available."
        );
        assert!(user_message(&QuizError::AlreadyPerfect).contains("maximum score"));
    }

    #[test]
    fn lookup_failures_get_generic_retry() {
        assert_eq!(
            user_message(&QuizError::NotFound("question")),
            "Something went wrong. Please try again later."
        );
        assert_eq!(
            user_message(&QuizError::Store(sqlx::Error::RowNotFound)),
            "Something went wrong. Please try again later."
        );
    }
}
