use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{SendMessageSetters, SendPhotoSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, InputFile, Message, ParseMode},
    utils::html,
    Bot, RequestError,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    config::Config,
    database::{
        connection::{ManageCatalog, RecordAttempt, RetrieveQuiz},
        content::Article,
        quiz::Quiz,
    },
    keyboard::{articles_keyboard, main_menu_keyboard, names_keyboard, take_quiz_keyboard, BACK},
    state::BotState,
    HandlerResult, UserDialogue,
};

/// Telegram rejects photo captions above this length.
const CAPTION_LIMIT: usize = 1024;
/// Telegram rejects text messages above this length.
const MESSAGE_LIMIT: usize = 4096;

fn format_article(title: &str, body: &str) -> String {
    format!("<b>{}</b>\n\n{}", html::escape(title), html::escape(body))
}

pub(crate) fn article_text(article: &Article) -> String {
    format_article(article.title(), article.body())
}

/// Whether the rendered article still fits in one message.
pub(crate) fn fits_in_message(title: &str, body: &str) -> bool {
    format_article(title, body).chars().count() <= MESSAGE_LIMIT
}

fn fits_in_caption(text: &str) -> bool {
    text.chars().count() <= CAPTION_LIMIT
}

/// Messages `render_article` sends for one recipient.
pub(crate) fn article_message_count(article: &Article) -> usize {
    match article.photo_file_id() {
        Some(_) if !fits_in_caption(&article_text(article)) => 2,
        _ => 1,
    }
}

/// Sends an article with its photo, and the quiz button when a quiz is attached.
pub(crate) async fn render_article(
    bot: &Bot,
    chat_id: ChatId,
    article: &Article,
    quiz: Option<&Quiz>,
) -> Result<(), RequestError> {
    let text = article_text(article);

    match article.photo_file_id() {
        Some(file_id) if fits_in_caption(&text) => {
            let request = bot
                .send_photo(chat_id, InputFile::file_id(file_id))
                .caption(text)
                .parse_mode(ParseMode::Html);
            match quiz {
                Some(quiz) => request.reply_markup(take_quiz_keyboard(*quiz.uuid())).await?,
                None => request.await?,
            };
        }
        photo => {
            if let Some(file_id) = photo {
                bot.send_photo(chat_id, InputFile::file_id(file_id)).await?;
            }
            let request = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
            match quiz {
                Some(quiz) => request.reply_markup(take_quiz_keyboard(*quiz.uuid())).await?,
                None => request.await?,
            };
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn open_catalog<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Catalog>,
) -> HandlerResult {
    let categories: Vec<String> = connection
        .list_categories()
        .await?
        .iter()
        .map(|category| category.name().to_owned())
        .collect();

    if categories.is_empty() {
        bot.send_message(msg.chat.id, "The knowledge base is empty for now.")
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Please, choose a category:")
        .reply_markup(names_keyboard(&categories))
        .await?;
    dialogue.update(BotState::BrowseCategories).await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn browse_category<Catalog: ManageCatalog>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Catalog>,
    config: Arc<Config>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => {
            bot.send_message(msg.chat.id, "What do you want to do now?")
                .reply_markup(main_menu_keyboard(config.is_admin(msg.chat.id)))
                .await?;
            dialogue.update(BotState::Start).await?;
        }
        Some(name) => match connection.find_category_by_name(name).await? {
            Some(category) => {
                let articles = connection.list_articles(category.uuid()).await?;
                log::info!(
                    "{} opens category '{}' ({} articles)",
                    msg.chat.id,
                    category.name(),
                    articles.len()
                );
                if articles.is_empty() {
                    bot.send_message(msg.chat.id, "No articles in this category yet.")
                        .await?;
                } else {
                    bot.send_message(msg.chat.id, format!("Articles in '{}':", category.name()))
                        .reply_markup(articles_keyboard(&articles))
                        .await?;
                }
            }
            None => {
                bot.send_message(msg.chat.id, format!("Category '{}' not found.", name))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please, choose a category.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, q, connection))]
pub(crate) async fn open_article<Catalog: ManageCatalog + RetrieveQuiz>(
    bot: Bot,
    q: CallbackQuery,
    article_id: Uuid,
    connection: Arc<Catalog>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    match connection.find_article(&article_id).await? {
        Some(article) => {
            let quiz = connection.find_quiz_by_article(&article_id).await?;
            render_article(&bot, chat_id, &article, quiz.as_ref()).await?;
        }
        None => {
            bot.send_message(chat_id, "This article is no longer available.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, connection))]
pub(crate) async fn show_results<Attempts: RecordAttempt>(
    bot: Bot,
    msg: Message,
    connection: Arc<Attempts>,
) -> HandlerResult {
    let attempts = connection.list_user_attempts(msg.chat.id.0).await?;

    let text = if attempts.is_empty() {
        "You haven't taken any quizzes yet.".to_owned()
    } else {
        let lines: Vec<String> = attempts.iter().map(|attempt| attempt.to_string()).collect();
        format!("Your latest results:\n{}", lines.join("\n"))
    };
    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_text_escapes_html() {
        let article = Article::new(
            Uuid::new_v4(),
            "Shelf <rules>",
            "Keep & tidy",
            None,
        );

        assert_eq!(
            article_text(&article),
            "<b>Shelf &lt;rules&gt;</b>\n\nKeep &amp; tidy"
        );
    }

    #[test]
    fn long_captions_need_a_second_message() {
        let category_id = Uuid::new_v4();
        let photo = Some("photo-1".to_owned());
        let short = Article::new(category_id, "Returns", "Check the receipt.", photo.clone());
        let long = Article::new(category_id, "Returns", "x".repeat(CAPTION_LIMIT), photo);
        let text_only = Article::new(category_id, "Returns", "x".repeat(CAPTION_LIMIT), None);

        assert_eq!(article_message_count(&short), 1);
        assert_eq!(article_message_count(&long), 2);
        assert_eq!(article_message_count(&text_only), 1);
    }

    #[test]
    fn message_limit_counts_escaped_markup() {
        let title = "Returns";
        let overhead = format_article(title, "").chars().count();

        assert!(fits_in_message(title, &"a".repeat(MESSAGE_LIMIT - overhead)));
        assert!(!fits_in_message(title, &"a".repeat(MESSAGE_LIMIT - overhead + 1)));
        // `&` is escaped to `&amp;`
        assert!(!fits_in_message(title, &"&".repeat(MESSAGE_LIMIT / 2)));
    }
}
