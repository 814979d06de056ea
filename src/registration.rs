use std::sync::Arc;

use teloxide::{payloads::SendMessageSetters, prelude::Requester, types::Message, Bot};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    config::Config,
    database::{
        connection::{ManageDirectory, ManageUsers},
        content::BotUser,
    },
    keyboard::{main_menu_keyboard, names_keyboard, BACK},
    state::BotState,
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_full_name<Directory: ManageDirectory>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(full_name) if !full_name.is_empty() && !full_name.starts_with('/') => {
            let cities: Vec<String> = connection
                .list_cities()
                .await?
                .iter()
                .map(|city| city.name().to_owned())
                .collect();
            if cities.is_empty() {
                log::warn!("Registration of {} blocked: no cities", msg.chat.id);
                bot.send_message(
                    msg.chat.id,
                    "Registration is not open yet: no cities are configured. Please try again later.",
                )
                .await?;
                return Ok(());
            }

            bot.send_message(msg.chat.id, format!("Nice to meet you, {full_name}! Choose your city:"))
                .reply_markup(names_keyboard(&cities))
                .await?;
            dialogue
                .update(BotState::ReceiveCity {
                    full_name: full_name.to_owned(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, send your full name as text.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_city<Directory: ManageDirectory>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    full_name: String,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => {
            bot.send_message(msg.chat.id, "Please, send your full name.")
                .await?;
            dialogue.update(BotState::ReceiveFullName).await?;
        }
        Some(name) => match connection.find_city_by_name(name).await? {
            Some(city) => {
                let stores: Vec<String> = connection
                    .list_stores(city.uuid())
                    .await?
                    .iter()
                    .map(|store| store.name().to_owned())
                    .collect();
                if stores.is_empty() {
                    bot.send_message(
                        msg.chat.id,
                        format!("There are no stores in {} yet. Choose another city.", city.name()),
                    )
                    .await?;
                    return Ok(());
                }

                bot.send_message(msg.chat.id, "Choose your store:")
                    .reply_markup(names_keyboard(&stores))
                    .await?;
                dialogue
                    .update(BotState::ReceiveStore {
                        full_name,
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
            bot.send_message(msg.chat.id, "Please, choose a city.").await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn receive_store<Connect: ManageDirectory + ManageUsers>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (full_name, city_id): (String, Uuid),
    connection: Arc<Connect>,
    config: Arc<Config>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => {
            bot.send_message(msg.chat.id, "Please, send your full name.")
                .await?;
            dialogue.update(BotState::ReceiveFullName).await?;
        }
        Some(name) => match connection.find_store_by_name(&city_id, name).await? {
            Some(store) => {
                let user = BotUser::new(msg.chat.id.0, full_name, city_id, *store.uuid());
                connection.upsert_user(&user).await?;
                log::info!(
                    "{} registered as '{}' at store '{}'",
                    msg.chat.id,
                    user.full_name(),
                    store.name()
                );

                bot.send_message(msg.chat.id, "You are registered! What do you want to do?")
                    .reply_markup(main_menu_keyboard(config.is_admin(msg.chat.id)))
                    .await?;
                dialogue.update(BotState::Start).await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("Store '{}' not found. Try again.", name))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, choose a store.").await?;
        }
    }

    Ok(())
}
