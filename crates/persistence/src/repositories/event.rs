//! Event repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EventEntity, EventStatusDb, EventWrite};
use crate::metrics::QueryTimer;

/// Escapes `LIKE` metacharacters so user search text matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new active event.
    ///
    /// A collision on `invite_code` surfaces as a unique violation; callers
    /// retry with a fresh code.
    pub async fn create(
        &self,
        host_id: Uuid,
        invite_code: &str,
        data: &EventWrite<'_>,
    ) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            INSERT INTO events (host_id, title, description, event_at, location, max_capacity,
                                join_policy, invite_code, cover_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, host_id, title, description, event_at, location, max_capacity,
                      join_policy, status, invite_code, cover_image_url, created_at, updated_at
            "#,
        )
        .bind(host_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.event_at)
        .bind(data.location)
        .bind(data.max_capacity)
        .bind(data.join_policy)
        .bind(invite_code)
        .bind(data.cover_image_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, host_id, title, description, event_at, location, max_capacity,
                   join_policy, status, invite_code, cover_image_url, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an event by invite code.
    pub async fn find_by_invite_code(
        &self,
        invite_code: &str,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_invite_code");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, host_id, title, description, event_at, location, max_capacity,
                   join_policy, status, invite_code, cover_image_url, created_at, updated_at
            FROM events
            WHERE invite_code = $1
            "#,
        )
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace the editable fields of an event.
    pub async fn update(
        &self,
        id: Uuid,
        data: &EventWrite<'_>,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_event");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            UPDATE events
            SET title = $2, description = $3, event_at = $4, location = $5, max_capacity = $6,
                join_policy = $7, cover_image_url = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING id, host_id, title, description, event_at, location, max_capacity,
                      join_policy, status, invite_code, cover_image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.event_at)
        .bind(data.location)
        .bind(data.max_capacity)
        .bind(data.join_policy)
        .bind(data.cover_image_url)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Set an event's status.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: EventStatusDb,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_event_status");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            UPDATE events
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, host_id, title, description, event_at, location, max_capacity,
                      join_policy, status, invite_code, cover_image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List events hosted by a user, latest event date first.
    ///
    /// `search` matches the title case-insensitively.
    pub async fn list_hosted(
        &self,
        host_id: Uuid,
        status: Option<EventStatusDb>,
        search: Option<&str>,
    ) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_hosted_events");
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, host_id, title, description, event_at, location, max_capacity,
                   join_policy, status, invite_code, cover_image_url, created_at, updated_at
            FROM events
            WHERE host_id = $1
              AND ($2::event_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE $3)
            ORDER BY event_at DESC
            "#,
        )
        .bind(host_id)
        .bind(status)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Number of approved participants.
    pub async fn count_approved(&self, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_approved_participants");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM event_participants
            WHERE event_id = $1 AND status = 'approved'
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
