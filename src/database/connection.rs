use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::broadcast::Audience;

use super::content::{Article, BotUser, Category, City, Store};
use super::quiz::{AnswerOption, AnswerRecord, Attempt, AttemptSummary, Question, Quiz};

pub(crate) struct Connection {
    pool: PgPool,
}

impl Connection {
    pub(crate) async fn connect(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await?;
        Ok(Self { pool })
    }

    pub(crate) async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        log::debug!("Applying migrations");
        sqlx::migrate!().run(&self.pool).await
    }
}

pub(crate) type DbResult<T> = Result<T, sqlx::Error>;

/// Read side of the content store used by the quiz engine.
pub(crate) trait RetrieveQuiz {
    async fn find_quiz(&self, quiz_id: &Uuid) -> DbResult<Option<Quiz>>;

    async fn find_quiz_by_article(&self, article_id: &Uuid) -> DbResult<Option<Quiz>>;

    /// Questions ordered by position; the order is stable between calls.
    async fn list_questions(&self, quiz_id: &Uuid) -> DbResult<Vec<Question>>;

    async fn find_question(&self, question_id: &Uuid) -> DbResult<Option<Question>>;

    async fn list_answer_options(&self, question_id: &Uuid) -> DbResult<Vec<AnswerOption>>;
}

pub(crate) trait RecordAttempt {
    async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: &Uuid,
        initial_score: i16,
        initial_pass: bool,
    ) -> DbResult<Attempt>;

    async fn record_answer(&self, record: &AnswerRecord) -> DbResult<()>;

    /// Persists the final values of an attempt finalized in memory.
    async fn finalize_attempt(&self, attempt: &Attempt) -> DbResult<()>;

    /// Latest finalized attempt of the user for the quiz.
    async fn find_latest_attempt(&self, user_id: i64, quiz_id: &Uuid) -> DbResult<Option<Attempt>>;

    async fn list_user_attempts(&self, user_id: i64) -> DbResult<Vec<AttemptSummary>>;
}

pub(crate) trait CreateQuiz {
    async fn create_quiz(
        &self,
        quiz: &Quiz,
        questions: &[(Question, Vec<AnswerOption>)],
    ) -> DbResult<String>;
}

pub(crate) trait ManageCatalog {
    async fn create_category(&self, category: &Category) -> DbResult<()>;

    async fn list_categories(&self) -> DbResult<Vec<Category>>;

    async fn find_category_by_name(&self, name: &str) -> DbResult<Option<Category>>;

    async fn create_article(&self, article: &Article) -> DbResult<()>;

    async fn list_articles(&self, category_id: &Uuid) -> DbResult<Vec<Article>>;

    async fn list_all_articles(&self) -> DbResult<Vec<Article>>;

    async fn find_article(&self, article_id: &Uuid) -> DbResult<Option<Article>>;

    async fn find_article_by_title(&self, title: &str) -> DbResult<Option<Article>>;
}

pub(crate) trait ManageDirectory {
    async fn create_city(&self, city: &City) -> DbResult<()>;

    async fn list_cities(&self) -> DbResult<Vec<City>>;

    async fn find_city_by_name(&self, name: &str) -> DbResult<Option<City>>;

    async fn create_store(&self, store: &Store) -> DbResult<()>;

    async fn list_stores(&self, city_id: &Uuid) -> DbResult<Vec<Store>>;

    async fn find_store_by_name(&self, city_id: &Uuid, name: &str) -> DbResult<Option<Store>>;
}

pub(crate) trait ManageUsers {
    async fn upsert_user(&self, user: &BotUser) -> DbResult<()>;

    async fn find_user(&self, chat_id: i64) -> DbResult<Option<BotUser>>;

    async fn find_user_by_name(&self, full_name: &str) -> DbResult<Option<BotUser>>;

    async fn list_recipients(&self, audience: &Audience) -> DbResult<Vec<i64>>;
}

impl RetrieveQuiz for Connection {
    async fn find_quiz(&self, quiz_id: &Uuid) -> DbResult<Option<Quiz>> {
        sqlx::query_as::<_, Quiz>(
            "SELECT uuid, article_id, title, pass_threshold FROM quizzes WHERE uuid = $1",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_quiz_by_article(&self, article_id: &Uuid) -> DbResult<Option<Quiz>> {
        sqlx::query_as::<_, Quiz>(
            "SELECT uuid, article_id, title, pass_threshold FROM quizzes WHERE article_id = $1",
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_questions(&self, quiz_id: &Uuid) -> DbResult<Vec<Question>> {
        sqlx::query_as::<_, Question>(
            "SELECT uuid, quiz_id, position, text, weight FROM questions WHERE quiz_id = $1 ORDER BY position, uuid",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_question(&self, question_id: &Uuid) -> DbResult<Option<Question>> {
        sqlx::query_as::<_, Question>(
            "SELECT uuid, quiz_id, position, text, weight FROM questions WHERE uuid = $1",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_answer_options(&self, question_id: &Uuid) -> DbResult<Vec<AnswerOption>> {
        sqlx::query_as::<_, AnswerOption>(
            "SELECT uuid, question_id, text, is_correct FROM answer_options WHERE question_id = $1 ORDER BY text",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
    }
}

impl RecordAttempt for Connection {
    async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: &Uuid,
        initial_score: i16,
        initial_pass: bool,
    ) -> DbResult<Attempt> {
        let attempt = Attempt::new(user_id, *quiz_id, initial_score, initial_pass);
        log::debug!("Creating attempt {} for user {}", attempt.uuid(), user_id);
        sqlx::query(
            "INSERT INTO quiz_attempts (uuid, user_id, quiz_id, score, is_passed, started_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(attempt.uuid())
        .bind(attempt.user_id())
        .bind(attempt.quiz_id())
        .bind(attempt.score())
        .bind(attempt.is_passed())
        .bind(attempt.started_at())
        .execute(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn record_answer(&self, record: &AnswerRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO answer_records (uuid, attempt_id, question_id, option_id, is_correct, answered_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.uuid())
        .bind(record.attempt_id())
        .bind(record.question_id())
        .bind(record.option_id())
        .bind(record.is_correct())
        .bind(record.answered_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn finalize_attempt(&self, attempt: &Attempt) -> DbResult<()> {
        // `finished_at IS NULL` keeps the pass flag write-once.
        let result = sqlx::query(
            "UPDATE quiz_attempts SET score = $1, is_passed = $2, finished_at = $3 WHERE uuid = $4 AND finished_at IS NULL",
        )
        .bind(attempt.score())
        .bind(attempt.is_passed())
        .bind(attempt.finished_at())
        .bind(attempt.uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            log::warn!("Attempt {} was already finalized or is missing", attempt.uuid());
        }

        Ok(())
    }

    async fn find_latest_attempt(&self, user_id: i64, quiz_id: &Uuid) -> DbResult<Option<Attempt>> {
        sqlx::query_as::<_, Attempt>(
            "SELECT uuid, user_id, quiz_id, score, is_passed, started_at, finished_at FROM quiz_attempts \
             WHERE user_id = $1 AND quiz_id = $2 AND finished_at IS NOT NULL \
             ORDER BY finished_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_user_attempts(&self, user_id: i64) -> DbResult<Vec<AttemptSummary>> {
        sqlx::query_as::<_, AttemptSummary>(
            "SELECT quizzes.title AS quiz_title, quiz_attempts.score, quiz_attempts.is_passed, quiz_attempts.finished_at \
             FROM quiz_attempts INNER JOIN quizzes ON quizzes.uuid = quiz_attempts.quiz_id \
             WHERE quiz_attempts.user_id = $1 ORDER BY quiz_attempts.started_at DESC LIMIT 20",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

impl CreateQuiz for Connection {
    async fn create_quiz(
        &self,
        quiz: &Quiz,
        questions: &[(Question, Vec<AnswerOption>)],
    ) -> DbResult<String> {
        log::debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;

        log::debug!("Adding quiz");
        sqlx::query("INSERT INTO quizzes (uuid, article_id, title, pass_threshold) VALUES ($1, $2, $3, $4)")
            .bind(quiz.uuid())
            .bind(quiz.article_id())
            .bind(quiz.title())
            .bind(i16::from(quiz.pass_threshold()))
            .execute(&mut *tx)
            .await?;

        log::debug!("Adding questions");
        for (question, options) in questions {
            log::debug!(
                "Adding question {} with uuid {}",
                question.text(),
                question.uuid()
            );
            sqlx::query(
                "INSERT INTO questions (uuid, quiz_id, position, text, weight) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(question.uuid())
            .bind(question.quiz_id())
            .bind(question.position())
            .bind(question.text())
            .bind(question.weight())
            .execute(&mut *tx)
            .await?;

            for option in options {
                sqlx::query(
                    "INSERT INTO answer_options (uuid, question_id, text, is_correct) VALUES ($1, $2, $3, $4)",
                )
                .bind(option.uuid())
                .bind(option.question_id())
                .bind(option.text())
                .bind(option.is_correct())
                .execute(&mut *tx)
                .await?;
            }
        }

        log::debug!("Closing transaction");
        tx.commit().await?;

        Ok(quiz.title().to_owned())
    }
}

impl ManageCatalog for Connection {
    async fn create_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query("INSERT INTO categories (uuid, name) VALUES ($1, $2)")
            .bind(category.uuid())
            .bind(category.name())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_categories(&self) -> DbResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT uuid, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    async fn find_category_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT uuid, name FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_article(&self, article: &Article) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO articles (uuid, category_id, title, body, photo_file_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(article.uuid())
        .bind(article.category_id())
        .bind(article.title())
        .bind(article.body())
        .bind(article.photo_file_id())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_articles(&self, category_id: &Uuid) -> DbResult<Vec<Article>> {
        sqlx::query_as::<_, Article>(
            "SELECT uuid, category_id, title, body, photo_file_id FROM articles WHERE category_id = $1 ORDER BY title",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_all_articles(&self) -> DbResult<Vec<Article>> {
        sqlx::query_as::<_, Article>(
            "SELECT uuid, category_id, title, body, photo_file_id FROM articles ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn find_article(&self, article_id: &Uuid) -> DbResult<Option<Article>> {
        sqlx::query_as::<_, Article>(
            "SELECT uuid, category_id, title, body, photo_file_id FROM articles WHERE uuid = $1",
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_article_by_title(&self, title: &str) -> DbResult<Option<Article>> {
        sqlx::query_as::<_, Article>(
            "SELECT uuid, category_id, title, body, photo_file_id FROM articles WHERE title = $1 LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
    }
}

impl ManageDirectory for Connection {
    async fn create_city(&self, city: &City) -> DbResult<()> {
        sqlx::query("INSERT INTO cities (uuid, name) VALUES ($1, $2)")
            .bind(city.uuid())
            .bind(city.name())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_cities(&self) -> DbResult<Vec<City>> {
        sqlx::query_as::<_, City>("SELECT uuid, name FROM cities ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    async fn find_city_by_name(&self, name: &str) -> DbResult<Option<City>> {
        sqlx::query_as::<_, City>("SELECT uuid, name FROM cities WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_store(&self, store: &Store) -> DbResult<()> {
        sqlx::query("INSERT INTO stores (uuid, city_id, name) VALUES ($1, $2, $3)")
            .bind(store.uuid())
            .bind(store.city_id())
            .bind(store.name())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_stores(&self, city_id: &Uuid) -> DbResult<Vec<Store>> {
        sqlx::query_as::<_, Store>(
            "SELECT uuid, city_id, name FROM stores WHERE city_id = $1 ORDER BY name",
        )
        .bind(city_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_store_by_name(&self, city_id: &Uuid, name: &str) -> DbResult<Option<Store>> {
        sqlx::query_as::<_, Store>(
            "SELECT uuid, city_id, name FROM stores WHERE city_id = $1 AND name = $2",
        )
        .bind(city_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }
}

impl ManageUsers for Connection {
    async fn upsert_user(&self, user: &BotUser) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO bot_users (chat_id, full_name, city_id, store_id, registered_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (chat_id) DO UPDATE SET full_name = EXCLUDED.full_name, city_id = EXCLUDED.city_id, store_id = EXCLUDED.store_id",
        )
        .bind(user.chat_id())
        .bind(user.full_name())
        .bind(user.city_id())
        .bind(user.store_id())
        .bind(user.registered_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user(&self, chat_id: i64) -> DbResult<Option<BotUser>> {
        sqlx::query_as::<_, BotUser>(
            "SELECT chat_id, full_name, city_id, store_id, registered_at FROM bot_users WHERE chat_id = $1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_user_by_name(&self, full_name: &str) -> DbResult<Option<BotUser>> {
        sqlx::query_as::<_, BotUser>(
            "SELECT chat_id, full_name, city_id, store_id, registered_at FROM bot_users WHERE lower(full_name) = lower($1) LIMIT 1",
        )
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_recipients(&self, audience: &Audience) -> DbResult<Vec<i64>> {
        let query = match audience {
            Audience::Everyone => sqlx::query_scalar::<_, i64>("SELECT chat_id FROM bot_users"),
            Audience::City(city_id) => {
                sqlx::query_scalar::<_, i64>("SELECT chat_id FROM bot_users WHERE city_id = $1")
                    .bind(*city_id)
            }
            Audience::Store(store_id) => {
                sqlx::query_scalar::<_, i64>("SELECT chat_id FROM bot_users WHERE store_id = $1")
                    .bind(*store_id)
            }
            Audience::User(chat_id) => {
                sqlx::query_scalar::<_, i64>("SELECT chat_id FROM bot_users WHERE chat_id = $1")
                    .bind(*chat_id)
            }
        };

        query.fetch_all(&self.pool).await
    }
}
