//! Claim-and-execute tests against a shared in-memory store.

mod test_harness;

use futures::future::join_all;
use spooler_agent::repository::{JobRepository, MemoryJobRepository};
use spooler_agent::scheduler::{JobRunner, RetryPolicy, RunOutcome};
use spooler_core::domain::job::JobStatus;
use std::sync::Arc;
use std::time::Duration;
use test_harness::{StubPrinter, Workspace, agent, wait_for};

#[tokio::test]
async fn test_concurrent_claims_have_exactly_one_winner() {
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("A-1", "https://example.com/a.pdf");
    let jobs: Arc<dyn JobRepository> = repo.clone();

    let claims = (0..32).map(|i| {
        let jobs = Arc::clone(&jobs);
        tokio::spawn(async move { jobs.claim(id, &format!("agent-{i}")).await })
    });
    let results = join_all(claims).await;

    let winners: Vec<_> = results
        .into_iter()
        .filter_map(|r| r.unwrap().unwrap())
        .collect();
    assert_eq!(winners.len(), 1);

    let stored = repo.get(id).unwrap();
    assert_eq!(stored.claimed_by, winners[0].claimed_by);
    assert_eq!(stored.status, JobStatus::Printing);
}

#[tokio::test]
async fn test_two_agents_race_for_one_job() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("job7", &workspace.label_url("job7.pdf"));

    let printer_a = StubPrinter::working();
    let printer_b = StubPrinter::working();
    let a = agent("agent-a", &repo, &workspace, printer_a.clone());
    let b = agent("agent-b", &repo, &workspace, printer_b.clone());

    let (outcome_a, outcome_b) = tokio::join!(a.run_once(), b.run_once());

    let completed = [&outcome_a, &outcome_b]
        .iter()
        .filter(|o| matches!(o, RunOutcome::Completed { .. }))
        .count();
    assert_eq!(completed, 1, "outcomes: {:?} / {:?}", outcome_a, outcome_b);
    assert_eq!(printer_a.calls() + printer_b.calls(), 1);

    let job = repo.get(id).unwrap();
    let winner = if printer_a.calls() == 1 { "agent-a" } else { "agent-b" };
    assert_eq!(job.claimed_by.as_deref(), Some(winner));
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_successful_job_ends_completed_with_claim_kept() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    let printer = StubPrinter::working();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    assert!(!runner.is_busy());
    let outcome = runner.run_once().await;

    assert_eq!(outcome, RunOutcome::Completed { job_id: id });
    let job = repo.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.claimed_by.as_deref(), Some("agent-a"));
    assert!(job.claimed_at.is_some());
    assert!(job.printed_at.is_some());
    assert_eq!(printer.calls(), 1);
    assert!(!runner.is_busy());
    assert_eq!(runner.retry_attempts(), 0);
    assert_eq!(workspace.leftover_files(), 0);
}

#[tokio::test]
async fn test_failing_job_stays_printing_after_ceiling() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    let printer = StubPrinter::failing();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    let outcome = runner.run_once().await;
    assert_eq!(
        outcome,
        RunOutcome::Failed {
            job_id: id,
            attempts: 1,
            retry_scheduled: true
        }
    );

    assert!(wait_for(|| !runner.retry_pending()).await);
    assert!(wait_for(|| !runner.is_busy()).await);

    assert_eq!(runner.retry_attempts(), 3);
    assert_eq!(printer.calls(), 3);

    let job = repo.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Printing);
    assert_eq!(job.claimed_by.as_deref(), Some("agent-a"));
    assert!(job.printed_at.is_none());
    assert_eq!(workspace.leftover_files(), 0);
}

#[tokio::test]
async fn test_pending_retry_blocks_new_claims() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let first = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    repo.insert_pending("A-2", &workspace.label_url("b.pdf"));
    let runner = agent("agent-a", &repo, &workspace, StubPrinter::failing());

    runner.run_once().await;
    assert_eq!(runner.run_once().await, RunOutcome::RetryPending);

    let claimed: Vec<_> = repo
        .jobs()
        .into_iter()
        .filter(|job| job.claimed_by.is_some())
        .map(|job| job.id)
        .collect();
    assert_eq!(claimed, vec![first]);

    runner.cancel_retry();
}

#[tokio::test]
async fn test_empty_queue_makes_no_writes() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let printer = StubPrinter::working();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    assert_eq!(runner.run_once().await, RunOutcome::NoJob);
    assert_eq!(repo.write_count(), 0);
    assert_eq!(printer.calls(), 0);
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn test_trigger_burst_never_overlaps_prints() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    for i in 0..5 {
        repo.insert_pending(&format!("A-{i}"), &workspace.label_url(&format!("{i}.pdf")));
    }
    let printer = StubPrinter::slow(Duration::from_millis(20));
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    let triggers: Vec<_> = (0..20).map(|_| runner.trigger()).collect();
    let outcomes = join_all(triggers).await;

    assert!(outcomes.into_iter().all(|o| o.is_ok()));
    assert_eq!(printer.max_in_flight(), 1);
    assert_eq!(printer.calls(), 5);
    assert!(
        repo.jobs()
            .iter()
            .all(|job| job.status == JobStatus::Completed)
    );
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn test_job_claimed_elsewhere_is_skipped() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    repo.claim(id, "agent-b").await.unwrap();

    let printer = StubPrinter::working();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    assert_eq!(runner.run_once().await, RunOutcome::NoJob);
    assert_eq!(printer.calls(), 0);
    assert_eq!(repo.get(id).unwrap().claimed_by.as_deref(), Some("agent-b"));
}

#[tokio::test]
async fn test_store_outage_is_reported_without_claiming() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    repo.set_offline(true);

    let runner = agent("agent-a", &repo, &workspace, StubPrinter::working());

    assert!(matches!(runner.run_once().await, RunOutcome::StoreError(_)));
    assert!(!runner.is_busy());

    repo.set_offline(false);
    assert!(matches!(runner.run_once().await, RunOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_agent_without_printer_leaves_queue_to_others() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let ids: Vec<_> = (0..5)
        .map(|i| repo.insert_pending(&format!("job{i}"), &workspace.label_url(&format!("job{i}.pdf"))))
        .collect();

    let printer = StubPrinter::working();
    let jobs: Arc<dyn JobRepository> = repo.clone();
    let unconfigured = Arc::new(
        JobRunner::new("agent-a", Some(jobs), workspace.executor_for(printer.clone(), None, None))
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(20))),
    );

    let outcome = unconfigured.trigger().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Unprintable { .. }));
    assert_eq!(printer.calls(), 0);
    assert_eq!(repo.write_count(), 0);
    assert!(unconfigured.status().last_error.is_some());
    for id in &ids {
        let job = repo.get(*id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.claimed_by.is_none());
    }

    // A configured agent still serves the whole queue
    let configured = agent("agent-b", &repo, &workspace, printer.clone());
    configured.trigger().await.unwrap();
    for id in &ids {
        assert_eq!(repo.get(*id).unwrap().status, JobStatus::Completed);
    }
    assert_eq!(printer.calls(), 5);
}
