use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Installs the queue table, its indexes and the pending-job notify trigger
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS print_jobs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            order_id TEXT NOT NULL,
            label_url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            claimed_by TEXT,
            claimed_at TIMESTAMPTZ,
            printed_at TIMESTAMPTZ,
            retries INTEGER NOT NULL DEFAULT 0,
            last_tried_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            printer_name TEXT,
            copies INTEGER,
            paper_size TEXT,
            orientation TEXT,
            CONSTRAINT print_jobs_status_check
                CHECK (status IN ('pending', 'printing', 'completed', 'failed'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Serves the fetch-oldest-pending query
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_print_jobs_pending ON print_jobs(created_at) \
         WHERE status = 'pending' AND claimed_by IS NULL",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_print_jobs_claimed_by ON print_jobs(claimed_by)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION notify_print_job_pending() RETURNS trigger AS $$
        BEGIN
            IF NEW.status = 'pending' THEN
                PERFORM pg_notify('print_jobs_pending', NEW.id::text);
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS print_jobs_pending_notify ON print_jobs")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER print_jobs_pending_notify
        AFTER INSERT ON print_jobs
        FOR EACH ROW EXECUTE FUNCTION notify_print_job_pending()
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
