use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::InMemStorage,
    error_handlers::LoggingErrorHandler,
    prelude::{Dialogue, Dispatcher, Requester},
    update_listeners::webhooks::{self, Options},
    utils::command::BotCommands,
    Bot,
};

use commands::Command;
use config::Config;
use database::connection::Connection;
use state::BotState;

pub mod admin;
pub mod broadcast;
pub mod callback;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod constructor;
pub mod database;
pub mod keyboard;
pub mod presenter;
pub mod quiz;
pub mod registration;
pub mod runner;
pub mod schema;
pub mod state;

type UserDialogue = Dialogue<BotState, InMemStorage<BotState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Connects to the database, applies migrations and serves updates until
/// the process receives Ctrl+C.
pub async fn run(config: Config) -> HandlerResult {
    let connection = Arc::new(Connection::connect(&config.database_url).await?);
    connection.migrate().await?;
    log::info!("Database is ready");

    let bot = Bot::new(&config.teloxide_token);
    bot.set_my_commands(Command::bot_commands()).await?;
    log::info!("Starting bot...");

    let webhook = config.webhook.clone();
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema::schema())
        .dependencies(teloxide::dptree::deps![
            InMemStorage::<BotState>::new(),
            connection,
            Arc::new(config)
        ])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    match webhook {
        Some(webhook) => {
            log::info!("Listening for webhooks on {}", webhook.addr);
            let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}
