use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use uuid::Uuid;

use crate::callback::CallbackEvent;
use crate::database::content::Article;
use crate::database::quiz::AnswerOption;

pub(crate) const YES: &str = "Yes✔️";
pub(crate) const NO: &str = "No❌";
pub(crate) const BACK: &str = "⬅️ Back";
pub(crate) const SKIP: &str = "Skip";

pub(crate) const KNOWLEDGE_BASE: &str = "Knowledge base📚";
pub(crate) const MY_RESULTS: &str = "My results📊";
pub(crate) const ADMIN_PANEL: &str = "Admin panel⚙️";

pub(crate) const NEW_CATEGORY: &str = "New category🗂️";
pub(crate) const NEW_ARTICLE: &str = "New article📝";
pub(crate) const NEW_QUIZ: &str = "New quiz🏗️";
pub(crate) const NEW_CITY: &str = "New city🏙️";
pub(crate) const NEW_STORE: &str = "New store🏪";
pub(crate) const BROADCAST: &str = "Broadcast📣";

pub(crate) const AUDIENCE_EVERYONE: &str = "Everyone";
pub(crate) const AUDIENCE_CITY: &str = "City";
pub(crate) const AUDIENCE_STORE: &str = "Store";
pub(crate) const AUDIENCE_USER: &str = "Single user";

/// Accepts both the keyboard labels and plain typed answers.
pub(crate) fn is_yes(text: &str) -> bool {
    matches!(text, YES | "Yes" | "yes")
}

pub(crate) fn is_no(text: &str) -> bool {
    matches!(text, NO | "No" | "no")
}

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> =
        vec![vec![KeyboardButton::new(YES), KeyboardButton::new(NO)]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn skip_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(SKIP)]])
}

/// One reply button per name plus a trailing back button.
pub(crate) fn names_keyboard<S: AsRef<str>>(names: &[S]) -> KeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = names
        .iter()
        .map(|name| vec![KeyboardButton::new(name.as_ref())])
        .collect();
    keyboard.push(vec![KeyboardButton::new(BACK)]);

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn main_menu_keyboard(is_admin: bool) -> KeyboardMarkup {
    let mut keyboard = vec![vec![
        KeyboardButton::new(KNOWLEDGE_BASE),
        KeyboardButton::new(MY_RESULTS),
    ]];

    if is_admin {
        keyboard.push(vec![KeyboardButton::new(ADMIN_PANEL)]);
    }

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn admin_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![
            KeyboardButton::new(NEW_CATEGORY),
            KeyboardButton::new(NEW_ARTICLE),
        ],
        vec![KeyboardButton::new(NEW_QUIZ), KeyboardButton::new(BROADCAST)],
        vec![KeyboardButton::new(NEW_CITY), KeyboardButton::new(NEW_STORE)],
        vec![KeyboardButton::new(BACK)],
    ];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn audience_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![
            KeyboardButton::new(AUDIENCE_EVERYONE),
            KeyboardButton::new(AUDIENCE_CITY),
        ],
        vec![
            KeyboardButton::new(AUDIENCE_STORE),
            KeyboardButton::new(AUDIENCE_USER),
        ],
        vec![KeyboardButton::new(BACK)],
    ];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn options_keyboard(options: &[AnswerOption]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .map(|option| {
            vec![InlineKeyboardButton::callback(
                option.text(),
                CallbackEvent::Answer {
                    option_id: *option.uuid(),
                }
                .to_string(),
            )]
        })
        .collect();
    keyboard.push(vec![InlineKeyboardButton::callback(
        "Leave quiz🚪",
        CallbackEvent::Abandon.to_string(),
    )]);

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn restart_keyboard(quiz_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Try again🔁",
        CallbackEvent::Restart { quiz_id }.to_string(),
    )]])
}

pub(crate) fn take_quiz_keyboard(quiz_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Take the quiz📝",
        CallbackEvent::StartQuiz { quiz_id }.to_string(),
    )]])
}

pub(crate) fn articles_keyboard(articles: &[Article]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = articles
        .iter()
        .map(|article| {
            vec![InlineKeyboardButton::callback(
                article.title(),
                CallbackEvent::Article {
                    article_id: *article.uuid(),
                }
                .to_string(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_keyboard_ends_with_leave_button() {
        let question_id = Uuid::new_v4();
        let options = vec![
            AnswerOption::new(question_id, "Planogram", true),
            AnswerOption::new(question_id, "Price tag", false),
        ];

        let markup = options_keyboard(&options);

        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[2][0].text, "Leave quiz🚪");
    }

    #[test]
    fn admin_row_only_for_admins() {
        assert_eq!(main_menu_keyboard(false).keyboard.len(), 1);
        assert_eq!(main_menu_keyboard(true).keyboard.len(), 2);
    }
}
