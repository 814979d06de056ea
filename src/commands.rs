use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, Message, ReplyMarkup},
    utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    config::Config,
    database::{connection::ManageUsers, content::BotUser},
    keyboard::main_menu_keyboard,
    quiz::engine,
    state::BotState,
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "open the main menu (registers new users).")]
    Start,
    #[command(description = "leave the current action or quiz.")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn start<Users: ManageUsers>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Users>,
    config: Arc<Config>,
) -> HandlerResult {
    leave_running_quiz(&dialogue).await?;

    if !ensure_registered(&bot, msg.chat.id, &dialogue, &*connection, &config).await? {
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Please choose what to do:")
        .reply_markup(main_menu_keyboard(config.is_admin(msg.chat.id)))
        .await?;
    dialogue.update(BotState::Start).await?;

    Ok(())
}

/// Admins may use the bot without registering.
pub(crate) fn can_use_bot(user: Option<&BotUser>, is_admin: bool) -> bool {
    is_admin || user.is_some_and(BotUser::is_registered)
}

/// Sends an unregistered user into registration. Returns `true` when the
/// user may go on.
pub(crate) async fn ensure_registered<Users: ManageUsers>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    connection: &Users,
    config: &Config,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let user = connection.find_user(chat_id.0).await?;
    if can_use_bot(user.as_ref(), config.is_admin(chat_id)) {
        return Ok(true);
    }

    log::info!("{}: starting registration", chat_id);
    bot.send_message(
        chat_id,
        "Welcome to the training bot! Please send your full name.",
    )
    .reply_markup(ReplyMarkup::kb_remove())
    .await?;
    dialogue.update(BotState::ReceiveFullName).await?;

    Ok(false)
}

pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    config: Arc<Config>,
) -> HandlerResult {
    leave_running_quiz(&dialogue).await?;
    bot.send_message(msg.chat.id, "Cancelling. What do you want to do now?")
        .reply_markup(main_menu_keyboard(config.is_admin(msg.chat.id)))
        .await?;
    dialogue.update(BotState::Start).await?;
    Ok(())
}

/// Abandons the quiz the user is in, if any.
pub(crate) async fn leave_running_quiz(dialogue: &UserDialogue) -> HandlerResult {
    if let Some(BotState::TakingQuiz { session }) = dialogue.get().await? {
        engine::abandon(session);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn unknown_users_must_register() {
        assert!(!can_use_bot(None, false));
    }

    #[test]
    fn registered_users_and_admins_pass() {
        let user = BotUser::new(7, "Olena Petrenko", Uuid::new_v4(), Uuid::new_v4());

        assert!(can_use_bot(Some(&user), false));
        assert!(can_use_bot(None, true));
    }
}
