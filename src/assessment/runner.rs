//! Assessment runner: resolves questions (source, then fallback) and drives
//! each run in its own task.
//!
//! A run task owns its `AssessmentRun` and a `Countdown`. User actions arrive
//! as commands over a channel and countdown ticks come from the same
//! `select!` loop, so the two never race. Progress is published on a
//! broadcast channel for WebSocket subscribers.

use std::{future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::Timing;
use crate::domain::{Question, QuestionOrigin, RunRequest};

use super::countdown::Countdown;
use super::result::AssessmentResult;
use super::run::{AssessmentRun, RunError, RunSnapshot, Step, Tick};
use super::source::{validate_batch, FallbackProvider, QuestionSource, SourceError};

const COMMAND_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 64;

/// Reply to an answer or skip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    InProgress { run: RunSnapshot },
    Completed { result: AssessmentResult },
}

/// Progress notifications published by a run task.
#[derive(Clone, Debug)]
pub enum RunEvent {
    Tick { question_index: usize, remaining: u32 },
    /// The current question changed (answer, skip, timeout or navigation).
    Moved(RunSnapshot),
    Completed(AssessmentResult),
}

/// Reply to next/previous. `changed` is false when already at the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub changed: bool,
    pub run: RunSnapshot,
}

enum Command {
    Answer { selection: Option<String>, reply: oneshot::Sender<Result<Outcome, RunError>> },
    Next { reply: oneshot::Sender<Result<Navigation, RunError>> },
    Previous { reply: oneshot::Sender<Result<Navigation, RunError>> },
    Snapshot { reply: oneshot::Sender<(RunSnapshot, Option<AssessmentResult>)> },
}

/// Cloneable handle to a live run task.
#[derive(Clone)]
pub struct RunHandle {
    id: Uuid,
    topic: String,
    origin: QuestionOrigin,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<RunEvent>,
    cancel: CancellationToken,
}

impl RunHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn origin(&self) -> QuestionOrigin {
        self.origin
    }

    pub async fn answer(&self, selection: impl Into<String>) -> Result<Outcome, RunError> {
        let selection = Some(selection.into());
        self.request(|reply| Command::Answer { selection, reply }).await?
    }

    pub async fn skip(&self) -> Result<Outcome, RunError> {
        self.request(|reply| Command::Answer { selection: None, reply }).await?
    }

    pub async fn go_next(&self) -> Result<Navigation, RunError> {
        self.request(|reply| Command::Next { reply }).await?
    }

    pub async fn go_previous(&self) -> Result<Navigation, RunError> {
        self.request(|reply| Command::Previous { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<RunSnapshot, RunError> {
        self.request(|reply| Command::Snapshot { reply }).await.map(|(snap, _)| snap)
    }

    /// The completion payload, once the run is over.
    pub async fn result(&self) -> Result<Option<AssessmentResult>, RunError> {
        self.request(|reply| Command::Snapshot { reply }).await.map(|(_, result)| result)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Tear the run down. Its countdown stops with the task.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RunError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(make(tx)).await.map_err(|_| RunError::Closed)?;
        rx.await.map_err(|_| RunError::Closed)
    }
}

#[derive(Clone)]
pub struct AssessmentRunner {
    source: Option<Arc<dyn QuestionSource>>,
    fallback: Arc<dyn FallbackProvider>,
    timing: Timing,
}

impl AssessmentRunner {
    pub fn new(
        source: Option<Arc<dyn QuestionSource>>,
        fallback: Arc<dyn FallbackProvider>,
        timing: Timing,
    ) -> Self {
        Self { source, fallback, timing }
    }

    /// Fetch from the source once; on any failure use the fallback provider.
    #[instrument(
        level = "info",
        skip(self),
        fields(topic = %request.topic, count = request.count, difficulty = %request.difficulty)
    )]
    pub async fn resolve_questions(&self, request: &RunRequest) -> (Vec<Question>, QuestionOrigin) {
        let fetched = match &self.source {
            Some(source) => source
                .fetch(request)
                .await
                .and_then(|batch| validate_batch(batch, request)),
            None => Err(SourceError::Unavailable("no question source configured".into())),
        };

        match fetched {
            Ok(questions) => {
                info!(
                    target: "assessment",
                    n = questions.len(),
                    origin = "remote",
                    "Questions resolved"
                );
                (questions, QuestionOrigin::Remote)
            }
            Err(e) => {
                let questions = self.fallback.fallback(request);
                warn!(
                    target: "assessment",
                    error = %e,
                    n = questions.len(),
                    origin = "fallback",
                    "Question source failed; using fallback"
                );
                (questions, QuestionOrigin::Fallback)
            }
        }
    }

    /// Resolve questions and spawn the run task.
    #[instrument(level = "info", skip(self), fields(topic = %request.topic))]
    pub async fn start(&self, request: RunRequest) -> Result<RunHandle, RunError> {
        let (questions, origin) = self.resolve_questions(&request).await;
        let id = Uuid::new_v4();
        let run = AssessmentRun::new(id, request.topic.clone(), questions, self.timing.clone())?;

        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();

        let task = RunTask {
            run,
            events: events.clone(),
            countdown: Countdown::new(self.timing.tick_period()),
            retention: self.timing.completed_retention(),
            drop_at: None,
        };
        tokio::spawn(task.drive(rx, cancel.clone()));

        info!(target: "assessment", run_id = %id, topic = %request.topic, ?origin, "Run started");
        Ok(RunHandle { id, topic: request.topic, origin, commands, events, cancel })
    }
}

struct RunTask {
    run: AssessmentRun,
    events: broadcast::Sender<RunEvent>,
    countdown: Countdown,
    retention: Duration,
    // Set once, when the run completes.
    drop_at: Option<Instant>,
}

impl RunTask {
    async fn drive(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let run_id = self.run.id();
        loop {
            let in_progress = self.run.is_in_progress();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(target: "assessment", %run_id, "Run torn down");
                    break;
                }
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => break,
                },
                _ = self.countdown.tick(), if in_progress => self.on_tick(),
                _ = until(self.drop_at) => {
                    debug!(target: "assessment", %run_id, "Completed run retention elapsed");
                    break;
                }
            }
        }
        // Mark the handle closed for every holder.
        cancel.cancel();
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Answer { selection, reply } => {
                let step = match selection {
                    Some(s) => self.run.answer(s),
                    None => self.run.skip(),
                };
                let outcome = step.map(|step| self.after_step(step));
                let _ = reply.send(outcome);
            }
            Command::Next { reply } => {
                let moved = self.run.go_next();
                let _ = reply.send(moved.map(|changed| self.navigated(changed)));
            }
            Command::Previous { reply } => {
                let moved = self.run.go_previous();
                let _ = reply.send(moved.map(|changed| self.navigated(changed)));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send((self.run.snapshot(), self.run.result().cloned()));
            }
        }
    }

    fn on_tick(&mut self) {
        match self.run.tick() {
            Ok(Tick::Counting(remaining)) => {
                let question_index = self.run.current_index();
                let _ = self.events.send(RunEvent::Tick { question_index, remaining });
            }
            Ok(Tick::TimedOut(step)) => {
                debug!(target: "assessment", run_id = %self.run.id(), "Question timed out");
                self.after_step(step);
            }
            Err(e) => {
                warn!(target: "assessment", run_id = %self.run.id(), error = %e, "Tick on finished run")
            }
        }
    }

    fn after_step(&mut self, step: Step) -> Outcome {
        match step {
            Step::Advanced => {
                let snap = self.after_move(true);
                Outcome::InProgress { run: snap }
            }
            Step::Completed(result) => {
                info!(
                    target: "assessment",
                    run_id = %self.run.id(),
                    score = result.score,
                    total = result.total,
                    "Run completed"
                );
                self.drop_at = Some(Instant::now() + self.retention);
                let _ = self.events.send(RunEvent::Completed(result.clone()));
                Outcome::Completed { result }
            }
        }
    }

    fn navigated(&mut self, changed: bool) -> Navigation {
        Navigation { changed, run: self.after_move(changed) }
    }

    fn after_move(&mut self, changed: bool) -> RunSnapshot {
        let snap = self.run.snapshot();
        if changed {
            self.countdown.restart();
            let _ = self.events.send(RunEvent::Moved(snap.clone()));
        }
        snap
    }
}

/// Resolves at `deadline`; never while there is none.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;
    use crate::assessment::run::RunStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn q(i: usize) -> Question {
        Question {
            text: format!("question {}", i),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option: "b".into(),
            explanation: String::new(),
            difficulty: Difficulty::Medium,
        }
    }

    struct FixedSource {
        batch: Vec<Question>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuestionSource for FixedSource {
        async fn fetch(&self, _request: &RunRequest) -> Result<Vec<Question>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.batch.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl QuestionSource for FailingSource {
        async fn fetch(&self, _request: &RunRequest) -> Result<Vec<Question>, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
    }

    struct OneQuestionFallback;

    impl FallbackProvider for OneQuestionFallback {
        fn fallback(&self, _request: &RunRequest) -> Vec<Question> {
            vec![q(99)]
        }
    }

    fn request(count: usize) -> RunRequest {
        RunRequest { topic: "Computer Engineering".into(), count, difficulty: Difficulty::Medium }
    }

    fn runner(source: Option<Arc<dyn QuestionSource>>) -> AssessmentRunner {
        AssessmentRunner::new(source, Arc::new(OneQuestionFallback), Timing::default())
    }

    #[tokio::test]
    async fn successful_source_supplies_the_run() {
        let source = Arc::new(FixedSource { batch: (0..4).map(q).collect(), calls: AtomicUsize::new(0) });
        let handle = runner(Some(source.clone())).start(request(4)).await.unwrap();
        assert_eq!(handle.origin(), QuestionOrigin::Remote);
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.total, 4);
        assert_eq!(snap.current_index, 0);
        assert_eq!(snap.time_remaining, 30);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        handle.close();
    }

    #[tokio::test]
    async fn failing_or_empty_source_falls_back_without_retry() {
        let handle = runner(Some(Arc::new(FailingSource))).start(request(5)).await.unwrap();
        assert_eq!(handle.origin(), QuestionOrigin::Fallback);
        assert_eq!(handle.snapshot().await.unwrap().total, 1);

        let empty = Arc::new(FixedSource { batch: vec![], calls: AtomicUsize::new(0) });
        let handle = runner(Some(empty.clone())).start(request(5)).await.unwrap();
        assert_eq!(handle.origin(), QuestionOrigin::Fallback);
        assert_eq!(empty.calls.load(Ordering::SeqCst), 1);

        let handle2 = runner(None).start(request(5)).await.unwrap();
        assert_eq!(handle2.origin(), QuestionOrigin::Fallback);
        handle.close();
        handle2.close();
    }

    #[tokio::test]
    async fn answering_every_question_completes_with_result() {
        let source = Arc::new(FixedSource { batch: (0..3).map(q).collect(), calls: AtomicUsize::new(0) });
        let handle = runner(Some(source)).start(request(3)).await.unwrap();
        let mut events = handle.subscribe();

        assert!(matches!(handle.answer("b").await.unwrap(), Outcome::InProgress { .. }));
        assert!(matches!(handle.skip().await.unwrap(), Outcome::InProgress { .. }));
        let Outcome::Completed { result } = handle.answer("b").await.unwrap() else { panic!("expected completion") };
        assert_eq!(result.score, 2);
        assert_eq!(handle.result().await.unwrap(), Some(result.clone()));

        let err = handle.answer("b").await.unwrap_err();
        assert_eq!(err, RunError::InvalidTransition { action: "answer", status: RunStatus::Completed });

        // Two moves, then the completion event.
        assert!(matches!(events.recv().await.unwrap(), RunEvent::Moved(_)));
        assert!(matches!(events.recv().await.unwrap(), RunEvent::Moved(_)));
        assert!(matches!(events.recv().await.unwrap(), RunEvent::Completed(r) if r == result));
        handle.close();
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_times_out_the_current_question() {
        let source = Arc::new(FixedSource { batch: (0..2).map(q).collect(), calls: AtomicUsize::new(0) });
        let handle = runner(Some(source)).start(request(2)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handle.snapshot().await.unwrap().time_remaining, 20);

        tokio::time::sleep(Duration::from_secs(20)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.current_index, 1);
        assert_eq!(snap.answered, 1);
        assert_eq!(snap.time_remaining, 30);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let result = handle.result().await.unwrap().expect("run should be complete");
        assert_eq!(result.score, 0);
        assert!(result.detailed_results.iter().all(|r| r.user_answer.is_none()));
        handle.close();
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_restarts_the_countdown() {
        let source = Arc::new(FixedSource { batch: (0..2).map(q).collect(), calls: AtomicUsize::new(0) });
        let handle = runner(Some(source)).start(request(2)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(25_500)).await;
        let nav = handle.go_next().await.unwrap();
        assert!(nav.changed);
        assert_eq!(nav.run.current_index, 1);
        assert_eq!(nav.run.time_remaining, 30);

        // Question 0 would have timed out by now; question 1 still has time.
        tokio::time::sleep(Duration::from_millis(10_200)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.current_index, 1);
        assert_eq!(snap.answered, 0);
        assert_eq!(snap.time_remaining, 20);

        let same = handle.go_next().await.unwrap();
        assert!(!same.changed);
        assert_eq!(same.run.current_index, 1);
        handle.close();
    }

    #[tokio::test(start_paused = true)]
    async fn polling_does_not_extend_completed_retention() {
        let timing = Timing { completed_retention_secs: 10, ..Timing::default() };
        let handle = AssessmentRunner::new(None, Arc::new(OneQuestionFallback), timing)
            .start(request(1))
            .await
            .unwrap();
        assert!(matches!(handle.skip().await.unwrap(), Outcome::Completed { .. }));

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(handle.snapshot().await.is_ok());

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(handle.is_closed());
        assert_eq!(handle.snapshot().await.unwrap_err(), RunError::Closed);
    }

    #[tokio::test]
    async fn closed_run_rejects_commands() {
        let handle = runner(None).start(request(1)).await.unwrap();
        handle.close();
        assert!(handle.is_closed());
        assert_eq!(handle.snapshot().await.unwrap_err(), RunError::Closed);
        assert_eq!(handle.skip().await.unwrap_err(), RunError::Closed);
    }
}
