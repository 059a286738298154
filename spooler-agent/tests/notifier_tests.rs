//! Push notification tests over the in-memory change feed.

mod test_harness;

use spooler_agent::notifier::{ChangeNotifier, MemoryChangeNotifier, spawn_notifier_pump};
use spooler_agent::repository::MemoryJobRepository;
use spooler_agent::scheduler::{RetryPolicy, spawn_poll_loop};
use spooler_core::domain::job::JobStatus;
use std::sync::Arc;
use std::time::Duration;
use test_harness::{StubPrinter, Workspace, agent, wait_for};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_inserted_job_is_printed_without_polling() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let runner = agent("agent-a", &repo, &workspace, StubPrinter::working());
    let notifier: Arc<dyn ChangeNotifier> = Arc::new(MemoryChangeNotifier::new(repo.clone()));
    let token = CancellationToken::new();

    let pump = spawn_notifier_pump(
        notifier,
        Arc::clone(&runner),
        RetryPolicy::new(2, Duration::from_millis(10)),
        token.clone(),
    );
    assert!(wait_for(|| runner.status().notifier_active).await);
    // Let the catch-up pass after subscribing finish
    assert!(wait_for(|| !runner.is_busy()).await);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let id = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    assert!(wait_for(|| repo.get(id).unwrap().status == JobStatus::Completed).await);

    token.cancel();
    pump.await.unwrap();
    assert!(!runner.status().notifier_active);
}

#[tokio::test]
async fn test_two_agents_share_one_feed() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let printer_a = StubPrinter::slow(Duration::from_millis(5));
    let printer_b = StubPrinter::slow(Duration::from_millis(5));
    let a = agent("agent-a", &repo, &workspace, printer_a.clone());
    let b = agent("agent-b", &repo, &workspace, printer_b.clone());
    let token = CancellationToken::new();

    for runner in [&a, &b] {
        let notifier: Arc<dyn ChangeNotifier> =
            Arc::new(MemoryChangeNotifier::new(repo.clone()));
        spawn_notifier_pump(
            notifier,
            Arc::clone(runner),
            RetryPolicy::new(2, Duration::from_millis(10)),
            token.clone(),
        );
        // Hints that arrive mid-print are dropped; polling picks those jobs up
        spawn_poll_loop(Arc::clone(runner), Duration::from_millis(50), token.clone());
    }
    assert!(wait_for(|| a.status().notifier_active && b.status().notifier_active).await);

    for i in 0..10 {
        repo.insert_pending(&format!("A-{i}"), &workspace.label_url(&format!("{i}.pdf")));
    }

    assert!(
        wait_for(|| repo
            .jobs()
            .iter()
            .all(|job| job.status == JobStatus::Completed))
        .await
    );
    assert_eq!(printer_a.calls() + printer_b.calls(), 10);

    token.cancel();
}
