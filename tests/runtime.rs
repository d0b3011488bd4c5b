//! Service facade tests: registry, session table and store.
mod common;
use common::*;
use survey_flow::error::StoreError;
use survey_flow::interpreter::SessionSnapshot;
use survey_flow::prelude::*;
use survey_flow::runtime::{MemorySessionStore, SessionStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// A store whose writes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemorySessionStore,
    failing: AtomicBool,
}

impl SessionStore for FlakyStore {
    fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        self.inner.load(session_id)
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.save(snapshot)
    }

    fn remove(&self, session_id: &str) -> Result<(), StoreError> {
        self.inner.remove(session_id)
    }
}

#[cfg(test)]
mod runtime_tests {
    use super::*;

    fn runtime_with(json: &str) -> SurveyRuntime {
        let runtime = SurveyRuntime::new();
        let report = runtime.register_graph("survey", load(json));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        runtime
    }

    #[test]
    fn test_full_session_through_the_facade() {
        let runtime = runtime_with(ART_SURVEY_JSON);

        let start = runtime.start_session("survey").unwrap();
        assert_eq!(start.first_block.id, "q1");
        assert_eq!(runtime.session_count(), 1);

        let outcome = runtime.submit_answer(&start.session_id, "q1", "yes").unwrap();
        assert_eq!(outcome.next_block.as_ref().unwrap().id, "b1");
        assert!(!outcome.completed);
        assert!(outcome.progress > 0.0 && outcome.progress < 1.0);

        let outcome = runtime
            .submit_answer(&start.session_id, "b1", "Hokusai")
            .unwrap();
        assert_eq!(outcome.next_block, None);
        assert!(outcome.completed);
        assert_eq!(outcome.progress, 1.0);

        // Completed sessions are archived.
        assert_eq!(runtime.session_count(), 0);
        assert!(runtime.store().is_empty());
        assert!(matches!(
            runtime.session(&start.session_id),
            Err(RuntimeError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_graph_and_session() {
        let runtime = SurveyRuntime::new();
        assert!(matches!(
            runtime.start_session("missing"),
            Err(RuntimeError::GraphNotFound(_))
        ));
        assert!(matches!(
            runtime.submit_answer("nope", "q1", "yes"),
            Err(RuntimeError::SessionNotFound(_))
        ));
        assert!(matches!(
            runtime.terminate_session("nope"),
            Err(RuntimeError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_graph_registers_but_cannot_start() {
        let runtime = SurveyRuntime::new();
        let report = runtime.register_graph("broken", load(DANGLING_SURVEY_JSON));
        assert!(!report.is_valid());

        let err = runtime.start_session("broken").unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Session(SessionError::InvalidGraph { .. })
        ));
        assert_eq!(runtime.session_count(), 0);
    }

    #[test]
    fn test_stale_submission_is_rejected_without_mutation() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();
        let before = runtime.session(&start.session_id).unwrap();

        let err = runtime
            .submit_answer(&start.session_id, "b1", "Hokusai")
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::StaleBlock {
                submitted: "b1".to_string(),
                current: "q1".to_string()
            }
        );
        assert!(err.is_recoverable());
        assert_eq!(runtime.session(&start.session_id).unwrap(), before);
    }

    #[test]
    fn test_invalid_answer_keeps_session_alive() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();

        let err = runtime
            .submit_answer(&start.session_id, "q1", "maybe")
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            runtime.session(&start.session_id).unwrap().current_block_id(),
            "q1"
        );
    }

    #[test]
    fn test_defect_removes_the_session() {
        let runtime = runtime_with(RETRY_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();

        runtime
            .submit_answer(&start.session_id, "ask", "again")
            .unwrap();
        let err = runtime
            .submit_answer(&start.session_id, "ask", "again")
            .unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::Session(SessionError::NonTerminatingFlow { .. })
        ));
        assert!(!err.is_recoverable());
        assert_eq!(runtime.session_count(), 0);
        assert!(runtime.store().is_empty());
    }

    #[test]
    fn test_go_back_through_the_facade() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();
        runtime.submit_answer(&start.session_id, "q1", "no").unwrap();

        let block = runtime.go_back(&start.session_id).unwrap();
        assert_eq!(block.id, "q1");
        assert!(matches!(
            runtime.go_back(&start.session_id),
            Err(RuntimeError::Session(SessionError::NothingToUndo { .. }))
        ));
    }

    #[test]
    fn test_terminate_session() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();

        runtime.terminate_session(&start.session_id).unwrap();
        assert_eq!(runtime.session_count(), 0);
        assert!(matches!(
            runtime.submit_answer(&start.session_id, "q1", "yes"),
            Err(RuntimeError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_reregistering_a_graph_keeps_live_sessions_on_their_revision() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();

        runtime.register_graph("survey", load(AGE_SURVEY_JSON));
        assert_eq!(runtime.graph("survey").unwrap().start_block_id(), "age_q");

        let outcome = runtime.submit_answer(&start.session_id, "q1", "yes").unwrap();
        assert_eq!(outcome.next_block.unwrap().id, "b1");

        let fresh = runtime.start_session("survey").unwrap();
        assert_eq!(fresh.first_block.id, "age_q");
    }

    #[test]
    fn test_store_failure_surfaces_and_keeps_previous_state() {
        let runtime =
            SurveyRuntime::with_store(Interpreter::default(), FlakyStore::default());
        runtime.register_graph("survey", load(ART_SURVEY_JSON));
        let start = runtime.start_session("survey").unwrap();

        runtime.store().failing.store(true, Ordering::SeqCst);
        let err = runtime
            .submit_answer(&start.session_id, "q1", "yes")
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Store(StoreError::Backend(_))));

        runtime.store().failing.store(false, Ordering::SeqCst);
        assert_eq!(
            runtime.session(&start.session_id).unwrap().current_block_id(),
            "q1"
        );
    }

    #[test]
    fn test_concurrent_submissions_for_one_session_are_serialized() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();

        // Every thread answers the start block; exactly one can win.
        let results: Vec<Result<AnswerOutcome, RuntimeError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| runtime.submit_answer(&start.session_id, "q1", "yes")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, RuntimeError::StaleBlock { .. }))
        );
        let session = runtime.session(&start.session_id).unwrap();
        assert_eq!(session.current_block_id(), "b1");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_independent_sessions_run_in_parallel() {
        let runtime = runtime_with(ART_SURVEY_JSON);

        thread::scope(|scope| {
            for i in 0..8 {
                let runtime = &runtime;
                scope.spawn(move || {
                    let start = runtime.start_session("survey").unwrap();
                    let answer = if i % 2 == 0 { "yes" } else { "no" };
                    let outcome = runtime
                        .submit_answer(&start.session_id, "q1", answer)
                        .unwrap();
                    let block = outcome.next_block.unwrap();
                    let done = runtime
                        .submit_answer(&start.session_id, &block.id, "because")
                        .unwrap();
                    assert!(done.completed);
                });
            }
        });

        assert_eq!(runtime.session_count(), 0);
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let runtime = runtime_with(ART_SURVEY_JSON);
        let start = runtime.start_session("survey").unwrap();
        let outcome = runtime.submit_answer(&start.session_id, "q1", "no").unwrap();

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["nextBlock"]["id"], "b2");
        assert_eq!(json["completed"], false);
        let start_json = serde_json::to_value(&start).unwrap();
        assert_eq!(start_json["firstBlock"]["kind"], "single-choice");
    }
}
