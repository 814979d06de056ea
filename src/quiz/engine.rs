use tracing::instrument;
use uuid::Uuid;

use crate::database::connection::{RecordAttempt, RetrieveQuiz};
use crate::database::quiz::{AnswerOption, AnswerRecord, Attempt, Question};
use crate::presenter::Present;

use super::scoring::{self, Scorecard, MAX_SCORE};
use super::{Progress, QuizError, QuizReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    NotStarted,
    AwaitingAnswer,
    Completed,
    Aborted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Aborted)
    }
}

/// Per-user state of one quiz attempt. Lives in the dialogue storage from
/// `start` until the attempt completes, aborts or is abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    quiz_id: Uuid,
    quiz_title: String,
    attempt: Attempt,
    pass_threshold: u8,
    question_ids: Vec<Uuid>,
    current_index: usize,
    scorecard: Scorecard,
    is_passed: bool,
    phase: Phase,
}

impl QuizSession {
    pub fn quiz_id(&self) -> &Uuid {
        &self.quiz_id
    }

    pub fn attempt_id(&self) -> &Uuid {
        self.attempt.uuid()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u8 {
        self.scorecard.score()
    }

    pub fn error_count(&self) -> u8 {
        self.scorecard.errors()
    }

    pub fn is_passed(&self) -> bool {
        self.is_passed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> Progress {
        Progress {
            number: self.current_index + 1,
            total: self.question_ids.len(),
        }
    }

    pub fn report(&self) -> QuizReport {
        QuizReport {
            quiz_id: self.quiz_id,
            quiz_title: self.quiz_title.clone(),
            score: self.scorecard.score(),
            errors: self.scorecard.errors(),
            is_passed: self.is_passed,
            phase: self.phase,
        }
    }

    fn current_question_id(&self) -> Uuid {
        self.question_ids[self.current_index]
    }

    fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.question_ids.len()
    }
}

async fn load_question<S: RetrieveQuiz>(
    store: &S,
    question_id: &Uuid,
) -> Result<(Question, Vec<AnswerOption>), QuizError> {
    let question = store
        .find_question(question_id)
        .await?
        .ok_or(QuizError::NotFound("question"))?;
    let options = store.list_answer_options(question_id).await?;
    if options.is_empty() {
        return Err(QuizError::NotFound("answer options"));
    }

    Ok((question, options))
}

/// Opens a new attempt and presents the first question.
///
/// Nothing is persisted when the quiz is missing, has no questions, or the
/// user already holds a finalized attempt with the maximum score.
#[instrument(level = "info", skip(store, presenter))]
pub(crate) async fn start<S, P>(
    store: &S,
    presenter: &P,
    user_id: i64,
    quiz_id: Uuid,
) -> Result<QuizSession, QuizError>
where
    S: RetrieveQuiz + RecordAttempt,
    P: Present,
{
    let quiz = store
        .find_quiz(&quiz_id)
        .await?
        .ok_or(QuizError::NotFound("quiz"))?;

    if let Some(latest) = store.find_latest_attempt(user_id, &quiz_id).await? {
        if latest.score() >= i16::from(MAX_SCORE) {
            log::info!(
                "User {} already scored {} in quiz '{}'",
                user_id,
                latest.score(),
                quiz.title()
            );
            return Err(QuizError::AlreadyPerfect);
        }
    }

    let question_ids: Vec<Uuid> = store
        .list_questions(&quiz_id)
        .await?
        .iter()
        .map(|question| *question.uuid())
        .collect();
    let Some(first_id) = question_ids.first().copied() else {
        return Err(QuizError::EmptyQuiz);
    };
    let (first, options) = load_question(store, &first_id).await?;

    let attempt = store
        .create_attempt(user_id, &quiz_id, i16::from(MAX_SCORE), false)
        .await?;
    log::info!(
        "User {} starts quiz '{}' ({} questions), attempt {}",
        user_id,
        quiz.title(),
        question_ids.len(),
        attempt.uuid()
    );

    let mut session = QuizSession {
        quiz_id,
        quiz_title: quiz.title().to_owned(),
        attempt,
        pass_threshold: quiz.pass_threshold(),
        question_ids,
        current_index: 0,
        scorecard: Scorecard::default(),
        is_passed: false,
        phase: Phase::NotStarted,
    };

    presenter
        .present_question(&first, &options, session.progress())
        .await?;
    session.phase = Phase::AwaitingAnswer;

    Ok(session)
}

/// Applies the user's choice for the pending question.
///
/// An option that does not belong to the pending question re-presents the
/// question and leaves the session untouched.
#[instrument(level = "info", skip(store, presenter, session), fields(attempt = %session.attempt_id()))]
pub(crate) async fn submit_answer<S, P>(
    store: &S,
    presenter: &P,
    session: &mut QuizSession,
    option_id: Uuid,
) -> Result<Phase, QuizError>
where
    S: RetrieveQuiz + RecordAttempt,
    P: Present,
{
    if session.phase != Phase::AwaitingAnswer {
        return Err(QuizError::SessionClosed);
    }

    let question_id = session.current_question_id();
    let options = store.list_answer_options(&question_id).await?;
    let Some(selected) = options.iter().find(|option| *option.uuid() == option_id) else {
        log::warn!(
            "Option {} does not belong to question {}",
            option_id,
            question_id
        );
        let (question, options) = load_question(store, &question_id).await?;
        presenter
            .present_question(&question, &options, session.progress())
            .await?;
        return Err(QuizError::InvalidSelection);
    };

    let record = AnswerRecord::new(
        *session.attempt_id(),
        question_id,
        *selected.uuid(),
        selected.is_correct(),
    );
    store.record_answer(&record).await?;
    session.scorecard.register(selected.is_correct());
    log::info!(
        "Question #{}: correct = {}, score = {}, errors = {}",
        session.current_index + 1,
        selected.is_correct(),
        session.scorecard.score(),
        session.scorecard.errors()
    );

    if session.scorecard.is_exhausted() {
        return finish(store, presenter, session, Phase::Aborted).await;
    }

    if session.is_last_question() {
        return finish(store, presenter, session, Phase::Completed).await;
    }

    session.current_index += 1;
    let (question, options) = load_question(store, &session.current_question_id()).await?;
    presenter
        .present_question(&question, &options, session.progress())
        .await?;

    Ok(Phase::AwaitingAnswer)
}

async fn finish<S, P>(
    store: &S,
    presenter: &P,
    session: &mut QuizSession,
    phase: Phase,
) -> Result<Phase, QuizError>
where
    S: RecordAttempt,
    P: Present,
{
    let score = session.scorecard.score();
    let is_passed =
        phase == Phase::Completed && scoring::is_passing(score, session.pass_threshold);

    session.attempt.finalize(i16::from(score), is_passed);
    store.finalize_attempt(&session.attempt).await?;
    session.is_passed = is_passed;
    session.phase = phase;
    log::info!(
        "Attempt {} finished as {:?} with {}/{}, passed = {}",
        session.attempt_id(),
        phase,
        score,
        MAX_SCORE,
        is_passed
    );

    presenter
        .present_result(&session.report(), !session.scorecard.is_perfect())
        .await?;

    Ok(phase)
}

/// Starts the quiz over after a finished attempt that did not reach the
/// maximum score.
#[instrument(level = "info", skip(store, presenter))]
pub(crate) async fn restart<S, P>(
    store: &S,
    presenter: &P,
    user_id: i64,
    quiz_id: Uuid,
) -> Result<QuizSession, QuizError>
where
    S: RetrieveQuiz + RecordAttempt,
    P: Present,
{
    match store.find_latest_attempt(user_id, &quiz_id).await? {
        Some(latest) if latest.score() < i16::from(MAX_SCORE) => {
            start(store, presenter, user_id, quiz_id).await
        }
        Some(_) => Err(QuizError::AlreadyPerfect),
        None => Err(QuizError::RestartUnavailable),
    }
}

/// Drops the session. The attempt row keeps its last persisted values and
/// stays unfinalized.
pub(crate) fn abandon(session: QuizSession) {
    log::info!(
        "Attempt {} of quiz '{}' abandoned at question #{} (score {}, errors {})",
        session.attempt_id(),
        session.quiz_title,
        session.current_index + 1,
        session.scorecard.score(),
        session.scorecard.errors()
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::database::connection::DbResult;
    use crate::database::quiz::{AttemptSummary, Quiz};

    #[derive(Default)]
    struct MemoryStore {
        quizzes: Vec<Quiz>,
        questions: Vec<Question>,
        options: Vec<AnswerOption>,
        attempts: Mutex<Vec<Attempt>>,
        records: Mutex<Vec<AnswerRecord>>,
    }

    impl MemoryStore {
        /// Builds a quiz where each question has one correct and one wrong option.
        fn with_quiz(question_count: usize, pass_threshold: u8) -> (Self, Uuid) {
            let quiz = Quiz::new(Uuid::new_v4(), "Merchandising basics", pass_threshold);
            let quiz_id = *quiz.uuid();
            let mut store = Self::default();
            for position in 0..question_count {
                let question = Question::new(quiz_id, position as i32, format!("Q{position}"), 1);
                store
                    .options
                    .push(AnswerOption::new(*question.uuid(), "right", true));
                store
                    .options
                    .push(AnswerOption::new(*question.uuid(), "wrong", false));
                store.questions.push(question);
            }
            store.quizzes.push(quiz);
            (store, quiz_id)
        }

        fn option_for(&self, session: &QuizSession, correct: bool) -> Uuid {
            let question_id = session.current_question_id();
            *self
                .options
                .iter()
                .find(|o| *o.question_id() == question_id && o.is_correct() == correct)
                .unwrap()
                .uuid()
        }

        fn attempt(&self, attempt_id: &Uuid) -> Attempt {
            self.attempts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.uuid() == attempt_id)
                .cloned()
                .unwrap()
        }

        fn remove_options(&mut self, position: usize) {
            let question_id = *self.questions[position].uuid();
            self.options.retain(|o| *o.question_id() != question_id);
        }

        fn attempt_count(&self) -> usize {
            self.attempts.lock().unwrap().len()
        }

        fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl RetrieveQuiz for MemoryStore {
        async fn find_quiz(&self, quiz_id: &Uuid) -> DbResult<Option<Quiz>> {
            Ok(self.quizzes.iter().find(|q| q.uuid() == quiz_id).cloned())
        }

        async fn find_quiz_by_article(&self, article_id: &Uuid) -> DbResult<Option<Quiz>> {
            Ok(self
                .quizzes
                .iter()
                .find(|q| q.article_id() == article_id)
                .cloned())
        }

        async fn list_questions(&self, quiz_id: &Uuid) -> DbResult<Vec<Question>> {
            let mut questions: Vec<Question> = self
                .questions
                .iter()
                .filter(|q| q.quiz_id() == quiz_id)
                .cloned()
                .collect();
            questions.sort_by_key(|q| q.position());
            Ok(questions)
        }

        async fn find_question(&self, question_id: &Uuid) -> DbResult<Option<Question>> {
            Ok(self.questions.iter().find(|q| q.uuid() == question_id).cloned())
        }

        async fn list_answer_options(&self, question_id: &Uuid) -> DbResult<Vec<AnswerOption>> {
            Ok(self
                .options
                .iter()
                .filter(|o| o.question_id() == question_id)
                .cloned()
                .collect())
        }
    }

    impl RecordAttempt for MemoryStore {
        async fn create_attempt(
            &self,
            user_id: i64,
            quiz_id: &Uuid,
            initial_score: i16,
            initial_pass: bool,
        ) -> DbResult<Attempt> {
            let attempt = Attempt::new(user_id, *quiz_id, initial_score, initial_pass);
            self.attempts.lock().unwrap().push(attempt.clone());
            Ok(attempt)
        }

        async fn record_answer(&self, record: &AnswerRecord) -> DbResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn finalize_attempt(&self, attempt: &Attempt) -> DbResult<()> {
            let mut attempts = self.attempts.lock().unwrap();
            if let Some(stored) = attempts
                .iter_mut()
                .find(|a| a.uuid() == attempt.uuid() && !a.is_finalized())
            {
                *stored = attempt.clone();
            }
            Ok(())
        }

        async fn find_latest_attempt(
            &self,
            user_id: i64,
            quiz_id: &Uuid,
        ) -> DbResult<Option<Attempt>> {
            Ok(self
                .attempts
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.user_id() == user_id && a.quiz_id() == quiz_id && a.is_finalized())
                .last()
                .cloned())
        }

        async fn list_user_attempts(&self, _user_id: i64) -> DbResult<Vec<AttemptSummary>> {
            Ok(Vec::new())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Rendered {
        Question { text: String, number: usize },
        Result { report: QuizReport, allow_restart: bool },
    }

    #[derive(Default)]
    struct RecordingPresenter {
        rendered: Mutex<Vec<Rendered>>,
    }

    impl RecordingPresenter {
        fn last(&self) -> Rendered {
            self.rendered.lock().unwrap().last().cloned().unwrap()
        }

        fn len(&self) -> usize {
            self.rendered.lock().unwrap().len()
        }
    }

    impl Present for RecordingPresenter {
        async fn present_question(
            &self,
            question: &Question,
            _options: &[AnswerOption],
            progress: Progress,
        ) -> Result<(), teloxide::RequestError> {
            self.rendered.lock().unwrap().push(Rendered::Question {
                text: question.text().to_owned(),
                number: progress.number,
            });
            Ok(())
        }

        async fn present_result(
            &self,
            report: &QuizReport,
            allow_restart: bool,
        ) -> Result<(), teloxide::RequestError> {
            self.rendered.lock().unwrap().push(Rendered::Result {
                report: report.clone(),
                allow_restart,
            });
            Ok(())
        }
    }

    const USER: i64 = 42;

    async fn answer(
        store: &MemoryStore,
        presenter: &RecordingPresenter,
        session: &mut QuizSession,
        correct: bool,
    ) -> Phase {
        let option = store.option_for(session, correct);
        submit_answer(store, presenter, session, option).await.unwrap()
    }

    #[tokio::test]
    async fn start_creates_attempt_and_presents_first_question() {
        let (store, quiz_id) = MemoryStore::with_quiz(3, 80);
        let presenter = RecordingPresenter::default();

        let session = start(&store, &presenter, USER, quiz_id).await.unwrap();

        assert_eq!(session.phase(), Phase::AwaitingAnswer);
        assert_eq!(session.score(), 10);
        assert_eq!(session.error_count(), 0);
        assert_eq!(
            presenter.last(),
            Rendered::Question {
                text: "Q0".into(),
                number: 1
            }
        );
        let attempt = store.attempt(session.attempt_id());
        assert_eq!(attempt.score(), 10);
        assert!(!attempt.is_passed());
        assert!(!attempt.is_finalized());
    }

    #[tokio::test]
    async fn start_refuses_empty_quiz_without_persisting() {
        let (store, quiz_id) = MemoryStore::with_quiz(0, 80);
        let presenter = RecordingPresenter::default();

        let result = start(&store, &presenter, USER, quiz_id).await;

        assert!(matches!(result, Err(QuizError::EmptyQuiz)));
        assert_eq!(store.attempt_count(), 0);
        assert_eq!(presenter.len(), 0);
    }

    #[tokio::test]
    async fn start_reports_missing_quiz() {
        let (store, _) = MemoryStore::with_quiz(2, 80);
        let presenter = RecordingPresenter::default();

        let result = start(&store, &presenter, USER, Uuid::new_v4()).await;

        assert!(matches!(result, Err(QuizError::NotFound("quiz"))));
        assert_eq!(store.attempt_count(), 0);
    }

    #[tokio::test]
    async fn first_question_without_options_is_refused_before_attempt() {
        let (mut store, quiz_id) = MemoryStore::with_quiz(2, 80);
        store.remove_options(0);
        let presenter = RecordingPresenter::default();

        let result = start(&store, &presenter, USER, quiz_id).await;

        assert!(matches!(result, Err(QuizError::NotFound("answer options"))));
        assert_eq!(store.attempt_count(), 0);
        assert_eq!(presenter.len(), 0);
    }

    #[tokio::test]
    async fn lookup_failure_mid_quiz_keeps_attempt_provisional() {
        let (mut store, quiz_id) = MemoryStore::with_quiz(3, 80);
        store.remove_options(1);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();
        let option = store.option_for(&session, true);

        let result = submit_answer(&store, &presenter, &mut session, option).await;

        assert!(matches!(result, Err(QuizError::NotFound("answer options"))));
        assert_eq!(store.record_count(), 1);
        let attempt = store.attempt(session.attempt_id());
        assert_eq!(attempt.score(), 10);
        assert!(!attempt.is_passed());
        assert!(!attempt.is_finalized());
    }

    #[tokio::test]
    async fn all_correct_completes_with_full_score() {
        let (store, quiz_id) = MemoryStore::with_quiz(3, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();

        assert_eq!(answer(&store, &presenter, &mut session, true).await, Phase::AwaitingAnswer);
        assert_eq!(answer(&store, &presenter, &mut session, true).await, Phase::AwaitingAnswer);
        assert_eq!(answer(&store, &presenter, &mut session, true).await, Phase::Completed);

        assert_eq!(session.score(), 10);
        assert!(session.is_passed());
        let attempt = store.attempt(session.attempt_id());
        assert_eq!(attempt.score(), 10);
        assert!(attempt.is_passed());
        assert!(attempt.is_finalized());
        assert_eq!(store.record_count(), 3);
        match presenter.last() {
            Rendered::Result { allow_restart, .. } => assert!(!allow_restart),
            other => panic!("unexpected render {other:?}"),
        }
    }

    #[tokio::test]
    async fn two_wrong_answers_fail_eighty_percent_threshold() {
        let (store, quiz_id) = MemoryStore::with_quiz(2, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();

        answer(&store, &presenter, &mut session, false).await;
        let phase = answer(&store, &presenter, &mut session, false).await;

        assert_eq!(phase, Phase::Completed);
        assert_eq!(session.score(), 6);
        assert!(!session.is_passed());
        let attempt = store.attempt(session.attempt_id());
        assert_eq!(attempt.score(), 6);
        assert!(!attempt.is_passed());
        match presenter.last() {
            Rendered::Result {
                report,
                allow_restart,
            } => {
                assert!(allow_restart);
                assert_eq!(report.phase, Phase::Completed);
            }
            other => panic!("unexpected render {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_mistake_in_three_questions_still_passes() {
        let (store, quiz_id) = MemoryStore::with_quiz(3, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();

        answer(&store, &presenter, &mut session, false).await;
        answer(&store, &presenter, &mut session, true).await;
        answer(&store, &presenter, &mut session, true).await;

        assert_eq!(session.score(), 8);
        assert!(session.is_passed());
        assert!(!scoring::is_passing(7, 80));
    }

    #[tokio::test]
    async fn five_wrong_answers_abort_long_quiz() {
        let (store, quiz_id) = MemoryStore::with_quiz(10, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();

        let mut previous_errors = 0;
        for round in 1..=5 {
            let phase = answer(&store, &presenter, &mut session, false).await;
            assert_eq!(session.error_count(), previous_errors + 1);
            assert!(session.score() <= 10);
            previous_errors = session.error_count();
            if round < 5 {
                assert_eq!(phase, Phase::AwaitingAnswer);
            } else {
                assert_eq!(phase, Phase::Aborted);
            }
        }

        assert_eq!(session.score(), 0);
        assert!(!session.is_passed());
        assert_eq!(store.record_count(), 5);
        let attempt = store.attempt(session.attempt_id());
        assert!(attempt.is_finalized());
        assert!(!attempt.is_passed());
        assert_eq!(attempt.score(), 0);
        match presenter.last() {
            Rendered::Result { report, .. } => assert_eq!(report.phase, Phase::Aborted),
            other => panic!("unexpected render {other:?}"),
        }
    }

    #[tokio::test]
    async fn answers_after_finish_are_rejected() {
        let (store, quiz_id) = MemoryStore::with_quiz(1, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();
        let option = store.option_for(&session, true);

        submit_answer(&store, &presenter, &mut session, option)
            .await
            .unwrap();
        let result = submit_answer(&store, &presenter, &mut session, option).await;

        assert!(matches!(result, Err(QuizError::SessionClosed)));
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn foreign_option_is_rejected_without_state_change() {
        let (store, quiz_id) = MemoryStore::with_quiz(3, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();
        let before = session.clone();

        let result = submit_answer(&store, &presenter, &mut session, Uuid::new_v4()).await;

        assert!(matches!(result, Err(QuizError::InvalidSelection)));
        assert_eq!(session, before);
        assert_eq!(store.record_count(), 0);
        assert_eq!(
            presenter.last(),
            Rendered::Question {
                text: "Q0".into(),
                number: 1
            }
        );
    }

    #[tokio::test]
    async fn perfect_score_blocks_new_attempts() {
        let (store, quiz_id) = MemoryStore::with_quiz(1, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();
        answer(&store, &presenter, &mut session, true).await;

        let again = start(&store, &presenter, USER, quiz_id).await;
        let restarted = restart(&store, &presenter, USER, quiz_id).await;

        assert!(matches!(again, Err(QuizError::AlreadyPerfect)));
        assert!(matches!(restarted, Err(QuizError::AlreadyPerfect)));
        assert_eq!(store.attempt_count(), 1);
    }

    #[tokio::test]
    async fn restart_after_failed_attempt_opens_new_attempt() {
        let (store, quiz_id) = MemoryStore::with_quiz(1, 80);
        let presenter = RecordingPresenter::default();
        let mut session = start(&store, &presenter, USER, quiz_id).await.unwrap();
        answer(&store, &presenter, &mut session, false).await;

        let restarted = restart(&store, &presenter, USER, quiz_id).await.unwrap();

        assert_ne!(restarted.attempt_id(), session.attempt_id());
        assert_eq!(restarted.score(), 10);
        assert_eq!(restarted.phase(), Phase::AwaitingAnswer);
        assert_eq!(store.attempt_count(), 2);
    }

    #[tokio::test]
    async fn restart_requires_a_finished_attempt() {
        let (store, quiz_id) = MemoryStore::with_quiz(2, 80);
        let presenter = RecordingPresenter::default();

        let result = restart(&store, &presenter, USER, quiz_id).await;

        assert!(matches!(result, Err(QuizError::RestartUnavailable)));
    }

    #[tokio::test]
    async fn abandoned_attempt_stays_provisional_and_does_not_block() {
        let (store, quiz_id) = MemoryStore::with_quiz(2, 80);
        let presenter = RecordingPresenter::default();
        let session = start(&store, &presenter, USER, quiz_id).await.unwrap();
        let attempt_id = *session.attempt_id();

        abandon(session);

        let attempt = store.attempt(&attempt_id);
        assert_eq!(attempt.score(), 10);
        assert!(!attempt.is_passed());
        assert!(!attempt.is_finalized());
        assert!(start(&store, &presenter, USER, quiz_id).await.is_ok());
    }
}
