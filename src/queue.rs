// src/queue.rs
//
// Durable email queue on Postgres. A job is leased by bumping `attempts` and
// setting `locked_until`; a worker that dies mid-job leaves the lease to
// expire so another worker picks it up again (at-least-once delivery).

use std::time::Duration;

use sqlx::PgPool;

use crate::{
    config::MAX_EMAIL_ATTEMPTS,
    error::AppError,
    mailer::Mailer,
    models::email::{EmailJob, VerificationMail},
};

/// How long a claimed job stays invisible to other workers.
pub const LEASE: Duration = Duration::from_secs(60);

/// Delay before a failed job becomes claimable again, per attempt made.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// What happened to a claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered,
    Retry { error: String },
    DeadLetter { error: String },
}

pub async fn enqueue(pool: &PgPool, mail: &VerificationMail) -> Result<i64, AppError> {
    let payload = serde_json::to_value(mail)?;
    let id: i64 = sqlx::query_scalar("INSERT INTO email_jobs (payload) VALUES ($1) RETURNING id")
        .bind(payload)
        .fetch_one(pool)
        .await?;

    tracing::info!(job_id = id, to = %mail.email, "Email job queued");
    Ok(id)
}

/// Leases the oldest claimable job, counting the attempt up front.
pub async fn claim_next(pool: &PgPool, lease: Duration) -> Result<Option<EmailJob>, AppError> {
    let job = sqlx::query_as::<_, EmailJob>(
        r#"
        UPDATE email_jobs
        SET attempts = attempts + 1,
            locked_until = NOW() + make_interval(secs => $1)
        WHERE id = (
            SELECT id FROM email_jobs
            WHERE locked_until IS NULL OR locked_until < NOW()
            ORDER BY id
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        RETURNING id, payload, attempts, locked_until, created_at
        "#,
    )
    .bind(lease.as_secs_f64())
    .fetch_optional(pool)
    .await?;

    Ok(job)
}

/// Sends a claimed job once and classifies the result.
pub async fn attempt_job(mailer: &dyn Mailer, job: &EmailJob, max_attempts: u32) -> JobOutcome {
    let mail: VerificationMail = match serde_json::from_value(job.payload.clone()) {
        Ok(mail) => mail,
        Err(e) => {
            return JobOutcome::DeadLetter {
                error: format!("undecodable payload: {}", e),
            };
        }
    };

    match mailer.send_verification(&mail).await {
        Ok(()) => JobOutcome::Delivered,
        Err(e) if job.attempts as u32 >= max_attempts => JobOutcome::DeadLetter {
            error: e.to_string(),
        },
        Err(e) => JobOutcome::Retry {
            error: e.to_string(),
        },
    }
}

/// Persists the outcome: delete, release for a later retry, or move to the
/// dead-letter table.
pub async fn settle(pool: &PgPool, job: &EmailJob, outcome: &JobOutcome) -> Result<(), AppError> {
    match outcome {
        JobOutcome::Delivered => {
            sqlx::query("DELETE FROM email_jobs WHERE id = $1")
                .bind(job.id)
                .execute(pool)
                .await?;
            tracing::info!(job_id = job.id, attempts = job.attempts, "Email job delivered");
        }
        JobOutcome::Retry { error } => {
            let backoff = RETRY_BACKOFF * job.attempts.max(1) as u32;
            sqlx::query(
                "UPDATE email_jobs SET locked_until = NOW() + make_interval(secs => $2) WHERE id = $1",
            )
            .bind(job.id)
            .bind(backoff.as_secs_f64())
            .execute(pool)
            .await?;
            tracing::warn!(job_id = job.id, attempts = job.attempts, %error, "Email job failed, will retry");
        }
        JobOutcome::DeadLetter { error } => {
            let mut tx = pool.begin().await?;
            sqlx::query(
                r#"
                INSERT INTO email_dead_letters (payload, attempts, last_error)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(&job.payload)
            .bind(job.attempts)
            .bind(error)
            .execute(&mut *tx)
            .await?;
            sqlx::query("DELETE FROM email_jobs WHERE id = $1")
                .bind(job.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::error!(job_id = job.id, attempts = job.attempts, %error, "Email job moved to dead letters");
        }
    }
    Ok(())
}

/// Claims and handles at most one job. Returns whether a job was found.
pub async fn process_next(pool: &PgPool, mailer: &dyn Mailer) -> Result<bool, AppError> {
    let Some(job) = claim_next(pool, LEASE).await? else {
        return Ok(false);
    };

    let outcome = attempt_job(mailer, &job, MAX_EMAIL_ATTEMPTS).await;
    settle(pool, &job, &outcome).await?;
    Ok(true)
}

/// Worker loop. Drains the queue, sleeps `poll_interval` when it is empty, and
/// only logs store errors so one bad round never stops the worker.
pub async fn run_worker(pool: PgPool, mailer: &dyn Mailer, poll_interval: Duration) {
    tracing::info!(?poll_interval, "Email worker started");
    loop {
        match process_next(&pool, mailer).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Email worker round failed"),
        }
        tokio::time::sleep(poll_interval).await;
    }
}
