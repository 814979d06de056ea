use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    payloads::{AnswerCallbackQuerySetters, SendMessageSetters},
    prelude::{DependencyMap, Requester},
    types::{CallbackQuery, Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    admin, broadcast,
    callback::CallbackEvent,
    catalog,
    commands::{cancel, ensure_registered, help, start, Command},
    config::Config,
    constructor,
    database::connection::{Connection, ManageCatalog, ManageUsers, RecordAttempt},
    keyboard::{admin_keyboard, main_menu_keyboard, ADMIN_PANEL, KNOWLEDGE_BASE, MY_RESULTS},
    registration, runner,
    state::BotState,
    HandlerResult, UserDialogue,
};

type SchemeHandler =
    Handler<'static, DependencyMap, Result<(), Box<dyn Error + Send + Sync + 'static>>, DpHandlerDescription>;

pub fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start::<Connection>))
        .branch(case![Command::Cancel].endpoint(cancel));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![BotState::Start].endpoint(choose_what_to_do::<Connection>))
        .branch(registration_scheme())
        .branch(case![BotState::BrowseCategories].endpoint(catalog::browse_category::<Connection>))
        .branch(case![BotState::TakingQuiz { session }].endpoint(runner::awaiting_answer))
        .branch(admin_scheme())
        .branch(constructor_scheme())
        .branch(broadcast_scheme())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<BotState>, BotState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
async fn choose_what_to_do<Connect: ManageCatalog + RecordAttempt + ManageUsers>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Connect>,
    config: Arc<Config>,
) -> HandlerResult {
    if !ensure_registered(&bot, msg.chat.id, &dialogue, &*connection, &config).await? {
        return Ok(());
    }
    let is_admin = config.is_admin(msg.chat.id);

    match msg.text() {
        Some(KNOWLEDGE_BASE) => {
            log::info!("{} opens the knowledge base", msg.chat.id);
            catalog::open_catalog(bot, msg, dialogue, connection).await?;
        }
        Some(MY_RESULTS) => {
            catalog::show_results(bot, msg, connection).await?;
        }
        Some(ADMIN_PANEL) if is_admin => {
            log::info!("{} opens the admin panel", msg.chat.id);
            bot.send_message(msg.chat.id, "What do you want to manage?")
                .reply_markup(admin_keyboard())
                .await?;
            dialogue.update(BotState::AdminMenu).await?;
        }
        other => {
            log::warn!("Invalid message {:?} from {}", other, msg.chat.id);
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(main_menu_keyboard(is_admin))
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "debug")]
fn registration_scheme() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building dispatching tree for registration");
    Update::filter_message()
        .branch(
            case![BotState::ReceiveFullName]
                .endpoint(registration::receive_full_name::<Connection>),
        )
        .branch(
            case![BotState::ReceiveCity { full_name }]
                .endpoint(registration::receive_city::<Connection>),
        )
        .branch(
            case![BotState::ReceiveStore { full_name, city_id }]
                .endpoint(registration::receive_store::<Connection>),
        )
}

#[instrument(level = "debug")]
fn admin_scheme() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building dispatching tree for admin panel");
    Update::filter_message()
        .branch(case![BotState::AdminMenu].endpoint(admin::admin_menu::<Connection>))
        .branch(
            case![BotState::ReceiveCategoryName]
                .endpoint(admin::receive_category_name::<Connection>),
        )
        .branch(
            case![BotState::ReceiveArticleCategory]
                .endpoint(admin::receive_article_category::<Connection>),
        )
        .branch(
            case![BotState::ReceiveArticleTitle { category_id }]
                .endpoint(admin::receive_article_title::<Connection>),
        )
        .branch(
            case![BotState::ReceiveArticleBody { category_id, title }]
                .endpoint(admin::receive_article_body),
        )
        .branch(
            case![BotState::ReceiveArticlePhoto {
                category_id,
                title,
                body
            }]
            .endpoint(admin::receive_article_photo::<Connection>),
        )
        .branch(case![BotState::ReceiveCityName].endpoint(admin::receive_city_name::<Connection>))
        .branch(case![BotState::ReceiveStoreCity].endpoint(admin::receive_store_city::<Connection>))
        .branch(
            case![BotState::ReceiveStoreName { city_id }]
                .endpoint(admin::receive_store_name::<Connection>),
        )
}

#[instrument(level = "debug")]
fn constructor_scheme() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building a dispatch tree for constructor");
    Update::filter_message()
        .branch(
            case![BotState::ReceiveQuizArticle]
                .endpoint(constructor::receive_quiz_article::<Connection>),
        )
        .branch(
            case![BotState::ReceiveQuizThreshold { article_id, title }]
                .endpoint(constructor::receive_quiz_threshold),
        )
        .branch(
            case![BotState::ReceiveNewQuestion { draft }]
                .endpoint(constructor::receive_new_question),
        )
        .branch(
            case![BotState::ReceiveNewAnswer { draft, question }]
                .endpoint(constructor::receive_new_answer),
        )
        .branch(
            case![BotState::ReceiveAnswerIsCorrect {
                draft,
                question,
                answer
            }]
            .endpoint(constructor::receive_answer_is_correct),
        )
        .branch(
            case![BotState::ReceiveAddAnotherAnswer { draft, question }]
                .endpoint(constructor::receive_add_another_answer),
        )
        .branch(
            case![BotState::ReceiveAddAnotherQuestion { draft }]
                .endpoint(constructor::receive_add_another_question::<Connection>),
        )
}

#[instrument(level = "debug")]
fn broadcast_scheme() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building dispatching tree for broadcast");
    Update::filter_message()
        .branch(
            case![BotState::ReceiveBroadcastArticle]
                .endpoint(broadcast::receive_broadcast_article::<Connection>),
        )
        .branch(
            case![BotState::ReceiveBroadcastAudience { article_id }]
                .endpoint(broadcast::receive_broadcast_audience::<Connection>),
        )
        .branch(
            case![BotState::ReceiveBroadcastCity { article_id }]
                .endpoint(broadcast::receive_broadcast_city::<Connection>),
        )
        .branch(
            case![BotState::ReceiveBroadcastStoreCity { article_id }]
                .endpoint(broadcast::receive_broadcast_store_city::<Connection>),
        )
        .branch(
            case![BotState::ReceiveBroadcastStore {
                article_id,
                city_id
            }]
            .endpoint(broadcast::receive_broadcast_store::<Connection>),
        )
        .branch(
            case![BotState::ReceiveBroadcastUser { article_id }]
                .endpoint(broadcast::receive_broadcast_user::<Connection>),
        )
        .branch(
            case![BotState::ConfirmBroadcast {
                article_id,
                audience
            }]
            .endpoint(broadcast::confirm_broadcast::<Connection>),
        )
}

fn parse_callback(q: CallbackQuery) -> Option<CallbackEvent> {
    let data = q.data.as_deref()?;
    match data.parse() {
        Ok(event) => Some(event),
        Err(e) => {
            log::warn!("Unrecognised callback data '{}': {}", data, e);
            None
        }
    }
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building a dispatching tree for callback query");
    Update::filter_callback_query()
        .branch(
            dptree::filter_map(parse_callback)
                .branch(
                    case![CallbackEvent::Answer { option_id }].branch(
                        case![BotState::TakingQuiz { session }]
                            .endpoint(runner::take_answer::<Connection>),
                    ),
                )
                .branch(
                    case![CallbackEvent::Abandon].branch(
                        case![BotState::TakingQuiz { session }].endpoint(runner::abandon_quiz),
                    ),
                )
                .branch(
                    case![CallbackEvent::StartQuiz { quiz_id }]
                        .endpoint(runner::start_quiz::<Connection>),
                )
                .branch(
                    case![CallbackEvent::Restart { quiz_id }]
                        .endpoint(runner::restart_quiz::<Connection>),
                )
                .branch(
                    case![CallbackEvent::Article { article_id }]
                        .endpoint(catalog::open_article::<Connection>),
                ),
        )
        .endpoint(stale_callback)
}

/// Buttons from finished quizzes or unknown payloads.
async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    log::info!("{}: stale callback {:?}", q.from.id, q.data);
    bot.answer_callback_query(q.id)
        .text("This button is no longer active.")
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    log::info!("{}: invalid input '{:?}'", msg.chat.id, msg.text());
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
