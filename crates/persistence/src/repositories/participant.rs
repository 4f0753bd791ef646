//! Participant repository for database operations.
//!
//! Join and approve lock the event row with `SELECT ... FOR UPDATE` before
//! counting approved participants, which serializes concurrent capacity
//! decisions for the same event.

use domain::services::participation::{
    self, EventSnapshot, JoinOutcome, JoinRejection, TransitionError,
};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{
    EventEntity, ParticipantEntity, ParticipantStatusDb, ParticipantWithUserEntity,
    ParticipationWithEventEntity, StatusCountEntity,
};
use crate::metrics::QueryTimer;

/// Errors from the transactional participation operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Participant not found")]
    ParticipantNotFound,

    #[error(transparent)]
    Join(#[from] JoinRejection),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct JoinResult {
    pub event: EventEntity,
    pub participant: ParticipantEntity,
    pub outcome: JoinOutcome,
}

/// Repository for participant-related database operations.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    /// Creates a new ParticipantRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the caller's participation in an event.
    pub async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ParticipantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_participant_by_event_and_user");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at, attended, rejection_reason, updated_at
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List an event's participants with profiles, newest join first.
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
        status: Option<ParticipantStatusDb>,
    ) -> Result<Vec<ParticipantWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_participants");
        let result = sqlx::query_as::<_, ParticipantWithUserEntity>(
            r#"
            SELECT p.id, p.event_id, p.user_id, p.status, p.joined_at, p.attended,
                   p.rejection_reason, p.updated_at,
                   u.id AS author_id, u.username AS author_username,
                   u.full_name AS author_full_name, u.avatar_url AS author_avatar_url,
                   u.email
            FROM event_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.event_id = $1
              AND ($2::participant_status IS NULL OR p.status = $2)
            ORDER BY p.joined_at DESC
            "#,
        )
        .bind(event_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Participant counts grouped by status.
    pub async fn count_by_status(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<StatusCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("count_participants_by_status");
        let result = sqlx::query_as::<_, StatusCountEntity>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM event_participants
            WHERE event_id = $1
            GROUP BY status
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List a user's participations with their events, newest join first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<ParticipantStatusDb>,
    ) -> Result<Vec<ParticipationWithEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_user_participations");
        let result = sqlx::query_as::<_, ParticipationWithEventEntity>(
            r#"
            SELECT p.id AS participant_id, p.user_id AS participant_user_id,
                   p.status AS participant_status, p.joined_at, p.attended, p.rejection_reason,
                   p.updated_at AS participant_updated_at,
                   e.id, e.host_id, e.title, e.description, e.event_at, e.location,
                   e.max_capacity, e.join_policy, e.status, e.invite_code, e.cover_image_url,
                   e.created_at, e.updated_at
            FROM event_participants p
            JOIN events e ON e.id = p.event_id
            WHERE p.user_id = $1
              AND ($2::participant_status IS NULL OR p.status = $2)
            ORDER BY p.joined_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Join an event through its invite code.
    ///
    /// Inserts a new row or resets a cancelled/rejected one.
    pub async fn join_by_invite_code(
        &self,
        invite_code: &str,
        user_id: Uuid,
    ) -> Result<JoinResult, WorkflowError> {
        let timer = QueryTimer::new("join_event");
        let result = self.join_in_tx(invite_code, user_id).await;
        timer.record();
        result
    }

    async fn join_in_tx(
        &self,
        invite_code: &str,
        user_id: Uuid,
    ) -> Result<JoinResult, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, host_id, title, description, event_at, location, max_capacity,
                   join_policy, status, invite_code, cover_image_url, created_at, updated_at
            FROM events
            WHERE invite_code = $1
            FOR UPDATE
            "#,
        )
        .bind(invite_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WorkflowError::EventNotFound)?;

        let existing = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at, attended, rejection_reason, updated_at
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(event.id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let approved = count_approved_locked(&mut tx, event.id).await?;
        let snapshot = EventSnapshot::from(&event);
        let outcome = participation::evaluate_join(
            &snapshot,
            user_id,
            existing.as_ref().map(|p| p.status.into()),
            approved,
        )?;
        let status = ParticipantStatusDb::from(outcome.status);

        let participant = if outcome.rejoin {
            sqlx::query_as::<_, ParticipantEntity>(
                r#"
                UPDATE event_participants
                SET status = $3, joined_at = NOW(), attended = NULL, rejection_reason = NULL,
                    updated_at = NOW()
                WHERE event_id = $1 AND user_id = $2
                RETURNING id, event_id, user_id, status, joined_at, attended, rejection_reason,
                          updated_at
                "#,
            )
            .bind(event.id)
            .bind(user_id)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, ParticipantEntity>(
                r#"
                INSERT INTO event_participants (event_id, user_id, status)
                VALUES ($1, $2, $3)
                RETURNING id, event_id, user_id, status, joined_at, attended, rejection_reason,
                          updated_at
                "#,
            )
            .bind(event.id)
            .bind(user_id)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok(JoinResult {
            event,
            participant,
            outcome,
        })
    }

    /// Approve a pending participant, re-checking capacity under the event lock.
    pub async fn approve(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let timer = QueryTimer::new("approve_participant");
        let result = self.approve_in_tx(event_id, participant_id).await;
        timer.record();
        result
    }

    async fn approve_in_tx(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        let max_capacity = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT max_capacity FROM events WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WorkflowError::EventNotFound)?;

        let current = lock_participant(&mut tx, event_id, participant_id).await?;
        let approved = count_approved_locked(&mut tx, event_id).await?;
        let next = participation::approve(current.status.into(), max_capacity, approved)?;

        let updated = update_status(&mut tx, participant_id, next.into(), None).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Reject a pending participant with an optional reason.
    pub async fn reject(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
        reason: Option<&str>,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let timer = QueryTimer::new("reject_participant");
        let result = self.reject_in_tx(event_id, participant_id, reason).await;
        timer.record();
        result
    }

    async fn reject_in_tx(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
        reason: Option<&str>,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_participant(&mut tx, event_id, participant_id).await?;
        let next = participation::reject(current.status.into())?;

        let updated = update_status(&mut tx, participant_id, next.into(), reason).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Cancel the caller's own pending or approved participation.
    pub async fn cancel_own(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let timer = QueryTimer::new("cancel_participation");
        let result = self.cancel_own_in_tx(event_id, user_id).await;
        timer.record();
        result
    }

    async fn cancel_own_in_tx(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at, attended, rejection_reason, updated_at
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WorkflowError::ParticipantNotFound)?;

        let next = participation::cancel(current.status.into())?;
        let updated = update_status(&mut tx, current.id, next.into(), None).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Record attendance for an approved participant.
    pub async fn set_attendance(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
        attended: bool,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let timer = QueryTimer::new("set_participant_attendance");
        let result = self.set_attendance_in_tx(event_id, participant_id, attended).await;
        timer.record();
        result
    }

    async fn set_attendance_in_tx(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
        attended: bool,
    ) -> Result<ParticipantEntity, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_participant(&mut tx, event_id, participant_id).await?;
        participation::check_attendance(current.status.into())?;

        let updated = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            UPDATE event_participants
            SET attended = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, event_id, user_id, status, joined_at, attended, rejection_reason, updated_at
            "#,
        )
        .bind(participant_id)
        .bind(attended)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }
}

async fn count_approved_locked(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM event_participants
        WHERE event_id = $1 AND status = 'approved'
        "#,
    )
    .bind(event_id)
    .fetch_one(&mut **tx)
    .await
}

async fn lock_participant(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    participant_id: Uuid,
) -> Result<ParticipantEntity, WorkflowError> {
    sqlx::query_as::<_, ParticipantEntity>(
        r#"
        SELECT id, event_id, user_id, status, joined_at, attended, rejection_reason, updated_at
        FROM event_participants
        WHERE id = $1 AND event_id = $2
        FOR UPDATE
        "#,
    )
    .bind(participant_id)
    .bind(event_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(WorkflowError::ParticipantNotFound)
}

async fn update_status(
    tx: &mut Transaction<'_, Postgres>,
    participant_id: Uuid,
    status: ParticipantStatusDb,
    rejection_reason: Option<&str>,
) -> Result<ParticipantEntity, sqlx::Error> {
    sqlx::query_as::<_, ParticipantEntity>(
        r#"
        UPDATE event_participants
        SET status = $2, rejection_reason = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, user_id, status, joined_at, attended, rejection_reason, updated_at
        "#,
    )
    .bind(participant_id)
    .bind(status)
    .bind(rejection_reason)
    .fetch_one(&mut **tx)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::participant::ParticipantStatus;
    use metrics::{
        Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Collects the `query` label of every histogram registered.
    struct QueryLabelRecorder {
        queries: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder for QueryLabelRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            if let Some(label) = key.labels().find(|l| l.key() == "query") {
                self.queries.lock().unwrap().push(label.value().to_string());
            }
            Histogram::noop()
        }
    }

    #[test]
    fn test_failed_join_still_records_query_time() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let recorder = QueryLabelRecorder {
            queries: queries.clone(),
        };

        let result = metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(async {
                let pool = PgPoolOptions::new()
                    .acquire_timeout(Duration::from_millis(500))
                    .connect_lazy("postgres://meetup@127.0.0.1:1/meetup")
                    .unwrap();
                ParticipantRepository::new(pool)
                    .join_by_invite_code("ABCD2345", Uuid::new_v4())
                    .await
            })
        });

        assert!(matches!(result, Err(WorkflowError::Database(_))));
        assert_eq!(*queries.lock().unwrap(), vec!["join_event".to_string()]);
    }

    #[test]
    fn test_workflow_error_messages() {
        let err: WorkflowError = JoinRejection::EventFull.into();
        assert_eq!(err.to_string(), "This event is full");

        let err: WorkflowError = TransitionError::NotPending(ParticipantStatus::Approved).into();
        assert!(err.to_string().contains("approved"));
    }
}
