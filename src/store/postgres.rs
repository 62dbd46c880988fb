//! Postgres-backed request store.
//!
//! Each request is one row holding the full JSONB document (update feed
//! embedded), with `status` and `requestor_id` promoted to columns for the
//! scoped list queries. Mutations load the document `FOR UPDATE` inside a
//! transaction so two reviewers deciding the same request serialize at the
//! row: the second decision sees the new status and gets an
//! invalid-transition conflict instead of silently overwriting.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lifecycle;
use crate::models::{AccessRequest, RequestStatus, Update, User};

use super::{ensure_can_view, ensure_scope_allowed, RequestStore, Scope};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<AccessRequest, AppError> {
        let doc = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT doc FROM access_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;
        Ok(serde_json::from_value(doc)?)
    }
}

#[async_trait]
impl RequestStore for PgStore {
    async fn create(
        &self,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let id = Uuid::new_v4();
        let created = lifecycle::create_request(id, request, user);
        sqlx::query(
            r#"INSERT INTO access_requests (id, requestor_id, status, doc, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(&user.id)
        .bind(created.status.as_str())
        .bind(serde_json::to_value(&created)?)
        .bind(created.requested_when)
        .execute(&self.pool)
        .await?;
        Ok(created)
    }

    async fn fetch(&self, id: Uuid, user: &User) -> Result<AccessRequest, AppError> {
        let request = self.load(id).await?;
        ensure_can_view(&request, user)?;
        Ok(request)
    }

    async fn fetch_scope(
        &self,
        scope: Scope,
        user: &User,
    ) -> Result<Vec<AccessRequest>, AppError> {
        ensure_scope_allowed(scope, user)?;
        let docs: Vec<serde_json::Value> = match scope {
            Scope::Mine => {
                sqlx::query_scalar::<_, serde_json::Value>(
                    "SELECT doc FROM access_requests WHERE requestor_id = $1 ORDER BY created_at DESC",
                )
                .bind(&user.id)
                .fetch_all(&self.pool)
                .await?
            }
            Scope::Pending => {
                sqlx::query_scalar::<_, serde_json::Value>(
                    "SELECT doc FROM access_requests WHERE status = 'Pending' ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
            Scope::All => {
                sqlx::query_scalar::<_, serde_json::Value>(
                    "SELECT doc FROM access_requests ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(AppError::from))
            .collect()
    }

    async fn replace(
        &self,
        id: Uuid,
        request: &AccessRequest,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut existing = load_for_update(&mut tx, id).await?;
        lifecycle::apply_draft_edits(&mut existing, request, user)?;
        save(&mut tx, id, &existing).await?;
        tx.commit().await?;
        Ok(existing)
    }

    async fn transition(
        &self,
        id: Uuid,
        status: RequestStatus,
        comment: Option<String>,
        user: &User,
    ) -> Result<AccessRequest, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut existing = load_for_update(&mut tx, id).await?;
        lifecycle::apply_transition(&mut existing, user, status, comment, None)?;
        save(&mut tx, id, &existing).await?;
        tx.commit().await?;
        Ok(existing)
    }

    async fn list_updates(&self, id: Uuid, user: &User) -> Result<Vec<Update>, AppError> {
        let request = self.fetch(id, user).await?;
        Ok(request.updates)
    }

    async fn append_update(
        &self,
        id: Uuid,
        comment: String,
        user: &User,
    ) -> Result<Update, AppError> {
        if comment.trim().is_empty() {
            return Err(AppError::Validation {
                missing: vec!["comment".to_string()],
            });
        }
        let mut tx = self.pool.begin().await?;
        let mut existing = load_for_update(&mut tx, id).await?;
        ensure_can_view(&existing, user)?;
        let update =
            lifecycle::record_update(&mut existing, user, Default::default(), Some(comment));
        save(&mut tx, id, &existing).await?;
        tx.commit().await?;
        Ok(update)
    }
}

async fn load_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<AccessRequest, AppError> {
    let doc = sqlx::query_scalar::<_, serde_json::Value>(
        "SELECT doc FROM access_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(serde_json::from_value(doc)?)
}

async fn save(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    request: &AccessRequest,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE access_requests SET doc = $2, status = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(serde_json::to_value(request)?)
    .bind(request.status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
