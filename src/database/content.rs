use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    uuid: Uuid,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Article {
    uuid: Uuid,
    category_id: Uuid,
    title: String,
    body: String,
    photo_file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct City {
    uuid: Uuid,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Store {
    uuid: Uuid,
    city_id: Uuid,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BotUser {
    chat_id: i64,
    full_name: String,
    city_id: Option<Uuid>,
    store_id: Option<Uuid>,
    registered_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Article {
    pub fn new(
        category_id: Uuid,
        title: impl Into<String>,
        body: impl Into<String>,
        photo_file_id: Option<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            category_id,
            title: title.into(),
            body: body.into(),
            photo_file_id,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn category_id(&self) -> &Uuid {
        &self.category_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn photo_file_id(&self) -> Option<&str> {
        self.photo_file_id.as_deref()
    }
}

impl City {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Store {
    pub fn new(city_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            city_id,
            name: name.into(),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn city_id(&self) -> &Uuid {
        &self.city_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BotUser {
    pub fn new(chat_id: i64, full_name: impl Into<String>, city_id: Uuid, store_id: Uuid) -> Self {
        Self {
            chat_id,
            full_name: full_name.into(),
            city_id: Some(city_id),
            store_id: Some(store_id),
            registered_at: Utc::now(),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn city_id(&self) -> Option<&Uuid> {
        self.city_id.as_ref()
    }

    pub fn store_id(&self) -> Option<&Uuid> {
        self.store_id.as_ref()
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// A user is registered once both city and store are chosen.
    pub fn is_registered(&self) -> bool {
        self.city_id.is_some() && self.store_id.is_some()
    }
}
