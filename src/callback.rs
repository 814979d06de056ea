use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Inline button payloads, decoded once when a callback query arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackEvent {
    Answer { option_id: Uuid },
    StartQuiz { quiz_id: Uuid },
    Restart { quiz_id: Uuid },
    Article { article_id: Uuid },
    Abandon,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackParseError {
    #[error("unknown callback tag '{0}'")]
    UnknownTag(String),

    #[error("invalid id in callback: {0}")]
    InvalidId(#[from] uuid::Error),
}

const ANSWER: &str = "ans";
const START_QUIZ: &str = "quiz";
const RESTART: &str = "retry";
const ARTICLE: &str = "art";
const ABANDON: &str = "leave";

impl fmt::Display for CallbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackEvent::Answer { option_id } => write!(f, "{ANSWER}:{option_id}"),
            CallbackEvent::StartQuiz { quiz_id } => write!(f, "{START_QUIZ}:{quiz_id}"),
            CallbackEvent::Restart { quiz_id } => write!(f, "{RESTART}:{quiz_id}"),
            CallbackEvent::Article { article_id } => write!(f, "{ARTICLE}:{article_id}"),
            CallbackEvent::Abandon => f.write_str(ABANDON),
        }
    }
}

impl FromStr for CallbackEvent {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let (tag, id) = data.split_once(':').unwrap_or((data, ""));
        match tag {
            ABANDON => Ok(CallbackEvent::Abandon),
            ANSWER => Ok(CallbackEvent::Answer {
                option_id: id.parse()?,
            }),
            START_QUIZ => Ok(CallbackEvent::StartQuiz { quiz_id: id.parse()? }),
            RESTART => Ok(CallbackEvent::Restart { quiz_id: id.parse()? }),
            ARTICLE => Ok(CallbackEvent::Article {
                article_id: id.parse()?,
            }),
            other => Err(CallbackParseError::UnknownTag(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_payload_decodes_to_option_id() {
        let option_id = Uuid::new_v4();
        let data = CallbackEvent::Answer { option_id }.to_string();

        assert!(data.len() <= 64, "telegram limits callback data to 64 bytes");
        assert_eq!(
            data.parse::<CallbackEvent>(),
            Ok(CallbackEvent::Answer { option_id })
        );
    }

    #[test]
    fn abandon_has_no_id() {
        assert_eq!("leave".parse::<CallbackEvent>(), Ok(CallbackEvent::Abandon));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(
            "Yes✔️".parse::<CallbackEvent>(),
            Err(CallbackParseError::UnknownTag("Yes✔️".into()))
        );
    }

    #[test]
    fn broken_id_is_rejected() {
        assert!(matches!(
            "retry:not-a-uuid".parse::<CallbackEvent>(),
            Err(CallbackParseError::InvalidId(_))
        ));
    }
}
