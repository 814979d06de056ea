use std::{fmt, future::Future, sync::Arc, time::Duration};

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    admin::back_to_admin_menu,
    catalog::{article_message_count, render_article},
    config::Config,
    database::connection::{ManageCatalog, ManageDirectory, ManageUsers, RetrieveQuiz},
    keyboard::{
        audience_keyboard, is_no, is_yes, names_keyboard, yes_no_keyboard,
        AUDIENCE_CITY, AUDIENCE_EVERYONE, AUDIENCE_STORE, AUDIENCE_USER, BACK,
    },
    state::BotState,
    HandlerResult, UserDialogue,
};

/// Who receives a broadcast article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    City(Uuid),
    Store(Uuid),
    User(i64),
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::Everyone => write!(f, "all users"),
            Audience::City(_) => write!(f, "users of the selected city"),
            Audience::Store(_) => write!(f, "users of the selected store"),
            Audience::User(chat_id) => write!(f, "user {chat_id}"),
        }
    }
}

/// Telegram throttles bots that send too many messages at once, so recipients
/// are served in chunks with a pause in between. `chunk_size` counts messages,
/// not recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastSettings {
    pub chunk_size: usize,
    pub pause: Duration,
}

impl BroadcastSettings {
    /// Recipients served between two pauses. Never zero.
    pub fn recipients_per_chunk(&self, messages_per_recipient: usize) -> usize {
        (self.chunk_size / messages_per_recipient.max(1)).max(1)
    }
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            chunk_size: 25,
            pause: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl fmt::Display for BroadcastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Broadcast finished: {} delivered, {} failed.",
            self.delivered, self.failed
        )
    }
}

/// Calls `send` for every recipient. A failed delivery is logged and counted,
/// it never stops the rest of the broadcast.
pub(crate) async fn fan_out<F, Fut, E>(
    recipients: &[i64],
    settings: BroadcastSettings,
    messages_per_recipient: usize,
    mut send: F,
) -> BroadcastReport
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    let mut report = BroadcastReport::default();
    let per_chunk = settings.recipients_per_chunk(messages_per_recipient);

    for (index, chunk) in recipients.chunks(per_chunk).enumerate() {
        if index > 0 {
            tokio::time::sleep(settings.pause).await;
        }

        for &chat_id in chunk {
            match send(chat_id).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    log::warn!("Broadcast to {} failed: {}", chat_id, e);
                    report.failed += 1;
                }
            }
        }
    }

    report
}

async fn ask_confirmation(
    bot: &Bot,
    msg: &Message,
    dialogue: &UserDialogue,
    article_id: Uuid,
    audience: Audience,
) -> HandlerResult {
    bot.send_message(msg.chat.id, format!("Send the article to {audience}? (Yes/No)"))
        .reply_markup(yes_no_keyboard())
        .await?;
    dialogue
        .update(BotState::ConfirmBroadcast {
            article_id,
            audience,
        })
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_broadcast_article<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Catalog>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        Some(title) => match connection.find_article_by_title(title).await? {
            Some(article) => {
                bot.send_message(msg.chat.id, "Who should receive it?")
                    .reply_markup(audience_keyboard())
                    .await?;
                dialogue
                    .update(BotState::ReceiveBroadcastAudience {
                        article_id: *article.uuid(),
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

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_broadcast_audience<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    article_id: Uuid,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text() {
        Some(AUDIENCE_EVERYONE) => {
            ask_confirmation(&bot, &msg, &dialogue, article_id, Audience::Everyone).await?;
        }
        Some(choice @ (AUDIENCE_CITY | AUDIENCE_STORE)) => {
            let cities: Vec<String> = connection
                .list_cities()
                .await?
                .iter()
                .map(|city| city.name().to_owned())
                .collect();
            if cities.is_empty() {
                bot.send_message(msg.chat.id, "No cities configured yet.").await?;
                return Ok(());
            }

            bot.send_message(msg.chat.id, "Choose a city:")
                .reply_markup(names_keyboard(&cities))
                .await?;
            let next = if choice == AUDIENCE_CITY {
                BotState::ReceiveBroadcastCity { article_id }
            } else {
                BotState::ReceiveBroadcastStoreCity { article_id }
            };
            dialogue.update(next).await?;
        }
        Some(AUDIENCE_USER) => {
            bot.send_message(msg.chat.id, "Send the full name of the user.")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue
                .update(BotState::ReceiveBroadcastUser { article_id })
                .await?;
        }
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        _ => {
            bot.send_message(msg.chat.id, "Please, choose who receives the article.")
                .reply_markup(audience_keyboard())
                .await?;
        }
    }

    Ok(())
}

pub(crate) async fn receive_broadcast_city<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    article_id: Uuid,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        Some(name) => match connection.find_city_by_name(name).await? {
            Some(city) => {
                ask_confirmation(&bot, &msg, &dialogue, article_id, Audience::City(*city.uuid()))
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("City '{}' not found. Try again.", name))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, select a city.").await?;
        }
    }

    Ok(())
}

pub(crate) async fn receive_broadcast_store_city<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    article_id: Uuid,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        Some(name) => match connection.find_city_by_name(name).await? {
            Some(city) => {
                let stores: Vec<String> = connection
                    .list_stores(city.uuid())
                    .await?
                    .iter()
                    .map(|store| store.name().to_owned())
                    .collect();
                if stores.is_empty() {
                    bot.send_message(msg.chat.id, "No stores in this city. Choose another one.")
                        .await?;
                    return Ok(());
                }

                bot.send_message(msg.chat.id, "Choose a store:")
                    .reply_markup(names_keyboard(&stores))
                    .await?;
                dialogue
                    .update(BotState::ReceiveBroadcastStore {
                        article_id,
                        city_id: *city.uuid(),
                    })
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("City '{}' not found. Try again.", name))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, select a city.").await?;
        }
    }

    Ok(())
}

pub(crate) async fn receive_broadcast_store<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    (article_id, city_id): (Uuid, Uuid),
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        Some(name) => match connection.find_store_by_name(&city_id, name).await? {
            Some(store) => {
                ask_confirmation(&bot, &msg, &dialogue, article_id, Audience::Store(*store.uuid()))
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("Store '{}' not found. Try again.", name))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, select a store.").await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_broadcast_user<Users: ManageUsers>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    article_id: Uuid,
    connection: Arc<Users>,
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(name) if !name.is_empty() => match connection.find_user_by_name(name).await? {
            Some(user) => {
                ask_confirmation(&bot, &msg, &dialogue, article_id, Audience::User(user.chat_id()))
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("User '{}' not found. Try again.", name))
                    .await?;
            }
        },
        _ => {
            bot.send_message(msg.chat.id, "Please, send the full name of the user.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn confirm_broadcast<Connect>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    (article_id, audience): (Uuid, Audience),
    connection: Arc<Connect>,
    config: Arc<Config>,
) -> HandlerResult
where
    Connect: ManageCatalog + RetrieveQuiz + ManageUsers,
{
    match msg.text() {
        Some(text) if is_yes(text) => {
            let Some(article) = connection.find_article(&article_id).await? else {
                back_to_admin_menu(&bot, &msg, &dialogue, "This article is no longer available.")
                    .await?;
                return Ok(());
            };
            let quiz = connection.find_quiz_by_article(&article_id).await?;
            let recipients = connection.list_recipients(&audience).await?;

            if recipients.is_empty() {
                back_to_admin_menu(&bot, &msg, &dialogue, "Nobody matches this audience.").await?;
                return Ok(());
            }

            log::info!(
                "{} broadcasts '{}' to {} recipients",
                msg.chat.id,
                article.title(),
                recipients.len()
            );
            back_to_admin_menu(
                &bot,
                &msg,
                &dialogue,
                &format!("Sending to {} recipients...", recipients.len()),
            )
            .await?;

            let admin = msg.chat.id;
            let settings = config.broadcast;
            let messages = article_message_count(&article);
            tokio::spawn(async move {
                let report = fan_out(&recipients, settings, messages, |chat_id| {
                    let bot = bot.clone();
                    let article = article.clone();
                    let quiz = quiz.clone();
                    async move { render_article(&bot, ChatId(chat_id), &article, quiz.as_ref()).await }
                })
                .await;

                log::info!("{}", report);
                if let Err(e) = bot.send_message(admin, report.to_string()).await {
                    log::error!("Failed to report broadcast to {}: {}", admin, e);
                }
            });
        }
        Some(text) if is_no(text) => {
            back_to_admin_menu(&bot, &msg, &dialogue, "Broadcast cancelled.").await?;
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
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pauses_between_chunks_only() {
        let settings = BroadcastSettings {
            chunk_size: 2,
            pause: Duration::from_secs(1),
        };
        let started = Instant::now();
        let sent = Mutex::new(Vec::new());

        let report = fan_out(&[1, 2, 3, 4, 5], settings, 1, |chat_id| {
            sent.lock().unwrap().push((chat_id, started.elapsed()));
            async { Ok::<(), String>(()) }
        })
        .await;

        assert_eq!(report, BroadcastReport { delivered: 5, failed: 0 });
        let sent = sent.into_inner().unwrap();
        let offsets: Vec<u64> = sent.iter().map(|(_, at)| at.as_secs()).collect();
        assert_eq!(offsets, vec![0, 0, 1, 1, 2]);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_delivery() {
        let report = fan_out(&[10, 11, 12], BroadcastSettings::default(), 1, |chat_id| async move {
            if chat_id == 11 {
                Err("bot was blocked by the user".to_owned())
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn zero_chunk_size_still_delivers() {
        let settings = BroadcastSettings {
            chunk_size: 0,
            pause: Duration::from_millis(10),
        };

        let report = fan_out(&[1, 2], settings, 1, |_| async { Ok::<(), String>(()) }).await;

        assert_eq!(report.delivered, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn two_messages_per_recipient_halve_the_chunk() {
        let settings = BroadcastSettings {
            chunk_size: 4,
            pause: Duration::from_secs(1),
        };
        let started = Instant::now();
        let sent = Mutex::new(Vec::new());

        let report = fan_out(&[1, 2, 3, 4, 5], settings, 2, |_| {
            sent.lock().unwrap().push(started.elapsed().as_secs());
            async { Ok::<(), String>(()) }
        })
        .await;

        assert_eq!(report.delivered, 5);
        assert_eq!(sent.into_inner().unwrap(), vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn recipients_per_chunk_is_never_zero() {
        let settings = BroadcastSettings {
            chunk_size: 25,
            pause: Duration::from_secs(1),
        };

        assert_eq!(settings.recipients_per_chunk(1), 25);
        assert_eq!(settings.recipients_per_chunk(2), 12);
        assert_eq!(settings.recipients_per_chunk(0), 25);
        assert_eq!(BroadcastSettings { chunk_size: 1, ..settings }.recipients_per_chunk(2), 1);
    }

    #[test]
    fn audience_describes_itself() {
        assert_eq!(Audience::Everyone.to_string(), "all users");
        assert_eq!(Audience::User(42).to_string(), "user 42");
    }
}
