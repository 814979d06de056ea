use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    catalog::fits_in_message,
    config::Config,
    database::{
        connection::{ManageCatalog, ManageDirectory},
        content::{Article, Category, City, Store},
    },
    keyboard::{
        admin_keyboard, main_menu_keyboard, names_keyboard, skip_keyboard, BACK, BROADCAST,
        NEW_ARTICLE, NEW_CATEGORY, NEW_CITY, NEW_QUIZ, NEW_STORE, SKIP,
    },
    state::BotState,
    HandlerResult, UserDialogue,
};

pub(crate) async fn back_to_admin_menu(
    bot: &Bot,
    msg: &Message,
    dialogue: &UserDialogue,
    text: &str,
) -> HandlerResult {
    bot.send_message(msg.chat.id, text)
        .reply_markup(admin_keyboard())
        .await?;
    dialogue.update(BotState::AdminMenu).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn admin_menu<Connect: ManageCatalog + ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Connect>,
    config: Arc<Config>,
) -> HandlerResult {
    if !config.is_admin(msg.chat.id) {
        log::warn!("{} is not an admin", msg.chat.id);
        dialogue.update(BotState::Start).await?;
        return Ok(());
    }

    match msg.text() {
        Some(NEW_CATEGORY) => {
            bot.send_message(msg.chat.id, "What's the name of the new category?")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue.update(BotState::ReceiveCategoryName).await?;
        }
        Some(NEW_ARTICLE) => {
            let categories: Vec<String> = connection
                .list_categories()
                .await?
                .iter()
                .map(|category| category.name().to_owned())
                .collect();
            if categories.is_empty() {
                bot.send_message(msg.chat.id, "Create a category first.").await?;
            } else {
                bot.send_message(msg.chat.id, "Choose a category for the article:")
                    .reply_markup(names_keyboard(&categories))
                    .await?;
                dialogue.update(BotState::ReceiveArticleCategory).await?;
            }
        }
        Some(NEW_QUIZ) | Some(BROADCAST) => {
            let articles: Vec<String> = connection
                .list_all_articles()
                .await?
                .iter()
                .map(|article| article.title().to_owned())
                .collect();
            if articles.is_empty() {
                bot.send_message(msg.chat.id, "No available articles.").await?;
            } else if msg.text() == Some(NEW_QUIZ) {
                bot.send_message(msg.chat.id, "Which article is the quiz for?")
                    .reply_markup(names_keyboard(&articles))
                    .await?;
                dialogue.update(BotState::ReceiveQuizArticle).await?;
            } else {
                bot.send_message(msg.chat.id, "Which article do you want to send?")
                    .reply_markup(names_keyboard(&articles))
                    .await?;
                dialogue.update(BotState::ReceiveBroadcastArticle).await?;
            }
        }
        Some(NEW_CITY) => {
            bot.send_message(msg.chat.id, "What's the name of the city?")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue.update(BotState::ReceiveCityName).await?;
        }
        Some(NEW_STORE) => {
            let cities: Vec<String> = connection
                .list_cities()
                .await?
                .iter()
                .map(|city| city.name().to_owned())
                .collect();
            if cities.is_empty() {
                bot.send_message(msg.chat.id, "Create a city first.").await?;
            } else {
                bot.send_message(msg.chat.id, "Which city is the store in?")
                    .reply_markup(names_keyboard(&cities))
                    .await?;
                dialogue.update(BotState::ReceiveStoreCity).await?;
            }
        }
        Some(BACK) => {
            bot.send_message(msg.chat.id, "Returning back.")
                .reply_markup(main_menu_keyboard(true))
                .await?;
            dialogue.update(BotState::Start).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Invalid input. Try again.")
                .reply_markup(admin_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_category_name<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Catalog>,
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(name) if !name.is_empty() => {
            if connection.find_category_by_name(name).await?.is_some() {
                bot.send_message(msg.chat.id, "Category already exists. Try again.")
                    .await?;
                return Ok(());
            }
            connection.create_category(&Category::new(name)).await?;
            log::info!("{} creates category '{}'", msg.chat.id, name);
            back_to_admin_menu(&bot, &msg, &dialogue, &format!("Category '{}' created.", name)).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Nothing entered. Try again.").await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_article_category<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Catalog>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        Some(name) => match connection.find_category_by_name(name).await? {
            Some(category) => {
                bot.send_message(msg.chat.id, "OK. What's the article title?")
                    .reply_markup(ReplyMarkup::kb_remove())
                    .await?;
                dialogue
                    .update(BotState::ReceiveArticleTitle {
                        category_id: *category.uuid(),
                    })
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, format!("Category '{}' not found. Try again.", name))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, select a category.").await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_article_title<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    category_id: Uuid,
    connection: Arc<Catalog>,
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(title) if !title.is_empty() => {
            if connection.find_article_by_title(title).await?.is_some() {
                bot.send_message(msg.chat.id, "Article with that title already exists. Try again.")
                    .await?;
                return Ok(());
            }
            bot.send_message(msg.chat.id, "Now send the article text.").await?;
            dialogue
                .update(BotState::ReceiveArticleBody {
                    category_id,
                    title: title.to_owned(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, send a title of the article.")
                .await?;
        }
    }

    Ok(())
}

pub(crate) async fn receive_article_body(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    (category_id, title): (Uuid, String),
) -> HandlerResult {
    match msg.text() {
        Some(body) if !fits_in_message(&title, body) => {
            log::info!(
                "{}: article body of {} chars is too long",
                msg.chat.id,
                body.chars().count()
            );
            bot.send_message(
                msg.chat.id,
                "The article is too long for one Telegram message. Please, send a shorter text.",
            )
            .await?;
        }
        Some(body) => {
            bot.send_message(msg.chat.id, "Send a photo for the article, or press Skip.")
                .reply_markup(skip_keyboard())
                .await?;
            dialogue
                .update(BotState::ReceiveArticlePhoto {
                    category_id,
                    title,
                    body: body.to_owned(),
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please, send the article text.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, msg, dialogue, connection))]
pub(crate) async fn receive_article_photo<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    (category_id, title, body): (Uuid, String, String),
    connection: Arc<Catalog>,
) -> HandlerResult {
    // Telegram sends several sizes; the last one is the largest.
    let photo = msg
        .photo()
        .and_then(|sizes| sizes.last())
        .map(|size| size.file.id.to_string());

    if photo.is_none() && msg.text() != Some(SKIP) {
        bot.send_message(msg.chat.id, "Please, send a photo or press Skip.")
            .reply_markup(skip_keyboard())
            .await?;
        return Ok(());
    }

    let article = Article::new(category_id, title, body, photo);
    connection.create_article(&article).await?;
    log::info!(
        "{} creates article '{}' (photo: {})",
        msg.chat.id,
        article.title(),
        article.photo_file_id().is_some()
    );
    back_to_admin_menu(
        &bot,
        &msg,
        &dialogue,
        &format!("Article '{}' saved.", article.title()),
    )
    .await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_city_name<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(name) if !name.is_empty() => {
            if connection.find_city_by_name(name).await?.is_some() {
                bot.send_message(msg.chat.id, "City already exists. Try again.")
                    .await?;
                return Ok(());
            }
            connection.create_city(&City::new(name)).await?;
            log::info!("{} adds city '{}'", msg.chat.id, name);
            back_to_admin_menu(&bot, &msg, &dialogue, &format!("City '{}' added.", name)).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Nothing entered. Try again.").await?;
        }
    }

    Ok(())
}

pub(crate) async fn receive_store_city<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => back_to_admin_menu(&bot, &msg, &dialogue, "Returning back.").await?,
        Some(name) => match connection.find_city_by_name(name).await? {
            Some(city) => {
                bot.send_message(msg.chat.id, format!("What's the store name in {}?", city.name()))
                    .reply_markup(ReplyMarkup::kb_remove())
                    .await?;
                dialogue
                    .update(BotState::ReceiveStoreName {
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

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn receive_store_name<Directory: ManageDirectory>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    city_id: Uuid,
    connection: Arc<Directory>,
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(name) if !name.is_empty() => {
            if connection.find_store_by_name(&city_id, name).await?.is_some() {
                bot.send_message(msg.chat.id, "Store already exists in this city. Try again.")
                    .await?;
                return Ok(());
            }
            connection.create_store(&Store::new(city_id, name)).await?;
            log::info!("{} adds store '{}'", msg.chat.id, name);
            back_to_admin_menu(&bot, &msg, &dialogue, &format!("Store '{}' added.", name)).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Nothing entered. Try again.").await?;
        }
    }

    Ok(())
}
