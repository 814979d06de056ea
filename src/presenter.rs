use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, ParseMode},
    utils::html,
    Bot, RequestError,
};

use crate::database::quiz::{AnswerOption, Question};
use crate::keyboard::{options_keyboard, restart_keyboard};
use crate::quiz::{Progress, QuizReport};

/// Renders quiz steps to the user.
pub(crate) trait Present {
    async fn present_question(
        &self,
        question: &Question,
        options: &[AnswerOption],
        progress: Progress,
    ) -> Result<(), RequestError>;

    async fn present_result(&self, report: &QuizReport, allow_restart: bool)
        -> Result<(), RequestError>;
}

/// Sends quiz steps as Telegram messages to one chat.
pub(crate) struct ChatPresenter {
    bot: Bot,
    chat_id: ChatId,
}

impl ChatPresenter {
    pub(crate) fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

pub(crate) fn question_text(question: &Question, progress: Progress) -> String {
    format!(
        "<b>Question #{}/{}</b>\n{}",
        progress.number,
        progress.total,
        html::escape(question.text())
    )
}

impl Present for ChatPresenter {
    async fn present_question(
        &self,
        question: &Question,
        options: &[AnswerOption],
        progress: Progress,
    ) -> Result<(), RequestError> {
        log::info!(
            "{}: asking question #{}: '{}'",
            self.chat_id,
            progress.number,
            question.text()
        );
        self.bot
            .send_message(self.chat_id, question_text(question, progress))
            .reply_markup(options_keyboard(options))
            .parse_mode(ParseMode::Html)
            .await?;

        Ok(())
    }

    async fn present_result(
        &self,
        report: &QuizReport,
        allow_restart: bool,
    ) -> Result<(), RequestError> {
        let request = self.bot.send_message(self.chat_id, report.to_string());
        if allow_restart {
            request.reply_markup(restart_keyboard(report.quiz_id)).await?;
        } else {
            request.await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn question_text_escapes_markup() {
        let question = Question::new(Uuid::new_v4(), 0, "Is 2 < 3?", 1);

        let text = question_text(&question, Progress { number: 2, total: 5 });

        assert_eq!(text, "<b>Question #2/5</b>\nIs 2 &lt; 3?");
    }
}
