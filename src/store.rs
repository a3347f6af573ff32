//! Database store for accounts, therapist records and moderated content

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Admin, ContentItem, ContentKind, CreateContentRequest, Profile, RequestStatus, Therapist,
    UpdateRequest, User,
};

/// Database store
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // User operations

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        row.try_into()
    }

    // Admin operations

    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO admins (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Admin {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM admins
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let user: User = r.try_into()?;
            Ok(Admin {
                id: user.id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                created_at: user.created_at,
                updated_at: user.updated_at,
            })
        })
        .transpose()
    }

    // Therapist operations

    pub async fn create_therapist(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Therapist> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let profile = Profile {
            name: name.to_string(),
            ..Default::default()
        };
        let profile_json = serde_json::to_string(&profile)
            .map_err(|e| AppError::Internal(format!("Profile serialization failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO therapists
                (id, email, password_hash, approved, profile, update_requests,
                 pending_count, version, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, '[]', 0, 0, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(email)
        .bind(password_hash)
        .bind(&profile_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Therapist {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            approved: false,
            profile,
            update_requests: vec![],
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_therapist(&self, id: Uuid) -> Result<Therapist> {
        let row = sqlx::query_as::<_, TherapistRow>(
            r#"
            SELECT id, email, password_hash, approved, profile, update_requests,
                   version, created_at, updated_at
            FROM therapists
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Therapist not found".to_string()))?;

        row.try_into()
    }

    pub async fn get_therapist_by_email(&self, email: &str) -> Result<Option<Therapist>> {
        let row = sqlx::query_as::<_, TherapistRow>(
            r#"
            SELECT id, email, password_hash, approved, profile, update_requests,
                   version, created_at, updated_at
            FROM therapists
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    pub async fn list_therapists(&self) -> Result<Vec<Therapist>> {
        let rows = sqlx::query_as::<_, TherapistRow>(
            r#"
            SELECT id, email, password_hash, approved, profile, update_requests,
                   version, created_at, updated_at
            FROM therapists
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn list_approved_therapists(&self) -> Result<Vec<Therapist>> {
        let rows = sqlx::query_as::<_, TherapistRow>(
            r#"
            SELECT id, email, password_hash, approved, profile, update_requests,
                   version, created_at, updated_at
            FROM therapists
            WHERE approved = 1
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Therapists needing admin attention: unapproved accounts, or accounts
    /// with pending ledger entries
    pub async fn list_pending_therapists(&self) -> Result<Vec<Therapist>> {
        let rows = sqlx::query_as::<_, TherapistRow>(
            r#"
            SELECT id, email, password_hash, approved, profile, update_requests,
                   version, created_at, updated_at
            FROM therapists
            WHERE approved = 0 OR pending_count > 0
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Compare-and-swap write of a mutated therapist record.
    ///
    /// Applies only when the stored `version` still matches the one the
    /// record was loaded with; returns false when another writer got there
    /// first, and the caller should reload and retry. Email is immutable and
    /// is deliberately not part of the update.
    pub async fn try_save_therapist(&self, therapist: &Therapist) -> Result<bool> {
        let now = Utc::now();
        let profile_json = serde_json::to_string(&therapist.profile)
            .map_err(|e| AppError::Internal(format!("Profile serialization failed: {}", e)))?;
        let ledger_json = serde_json::to_string(&therapist.update_requests)
            .map_err(|e| AppError::Internal(format!("Ledger serialization failed: {}", e)))?;
        let pending_count = therapist
            .update_requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count() as i64;

        let result = sqlx::query(
            r#"
            UPDATE therapists
            SET approved = ?, profile = ?, update_requests = ?, pending_count = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(therapist.approved)
        .bind(&profile_json)
        .bind(&ledger_json)
        .bind(pending_count)
        .bind(now)
        .bind(therapist.id.to_string())
        .bind(therapist.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_therapist(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM therapists WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Therapist not found".to_string()));
        }
        Ok(())
    }

    // Content operations

    pub async fn create_content(
        &self,
        kind: ContentKind,
        author_id: Uuid,
        author_name: &str,
        req: &CreateContentRequest,
    ) -> Result<ContentItem> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let meta = req.meta.clone().unwrap_or_else(|| serde_json::json!({}));
        let meta_json = serde_json::to_string(&meta)
            .map_err(|e| AppError::Internal(format!("Meta serialization failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO content_items
                (id, kind, title, body, meta, author_id, author_name, approved,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(kind.as_str())
        .bind(&req.title)
        .bind(&req.body)
        .bind(&meta_json)
        .bind(author_id.to_string())
        .bind(author_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(ContentItem {
            id,
            kind,
            title: req.title.clone(),
            body: req.body.clone(),
            meta,
            author_id,
            author_name: author_name.to_string(),
            approved: false,
            approved_by_id: None,
            approved_by_name: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_content(&self, kind: ContentKind, id: Uuid) -> Result<ContentItem> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, kind, title, body, meta, author_id, author_name, approved,
                   approved_by_id, approved_by_name, approved_at, created_at, updated_at
            FROM content_items
            WHERE id = ? AND kind = ?
            "#,
        )
        .bind(id.to_string())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind.as_str())))?;

        row.try_into()
    }

    /// Approved items, newest first, with the total count for pagination
    pub async fn list_approved_content(
        &self,
        kind: ContentKind,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ContentItem>, i64)> {
        // Offset arithmetic in i64: `page` arrives from the query string and
        // u32 multiplication would overflow on absurd page numbers.
        let offset = (i64::from(page) - 1).max(0).saturating_mul(i64::from(limit));

        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, kind, title, body, meta, author_id, author_name, approved,
                   approved_by_id, approved_by_name, approved_at, created_at, updated_at
            FROM content_items
            WHERE kind = ? AND approved = 1
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(kind.as_str())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM content_items WHERE kind = ? AND approved = 1
            "#,
        )
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| r.try_into())
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn list_unapproved_content(&self, kind: ContentKind) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, kind, title, body, meta, author_id, author_name, approved,
                   approved_by_id, approved_by_name, approved_at, created_at, updated_at
            FROM content_items
            WHERE kind = ? AND approved = 0
            ORDER BY created_at DESC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn list_content_by_author(
        &self,
        kind: ContentKind,
        author_id: Uuid,
    ) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, kind, title, body, meta, author_id, author_name, approved,
                   approved_by_id, approved_by_name, approved_at, created_at, updated_at
            FROM content_items
            WHERE kind = ? AND author_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(kind.as_str())
        .bind(author_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// The simple moderation variant: a single admin toggle recording who
    /// approved and when
    pub async fn approve_content(
        &self,
        kind: ContentKind,
        id: Uuid,
        approver_id: Uuid,
        approver_name: &str,
    ) -> Result<ContentItem> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET approved = 1, approved_by_id = ?, approved_by_name = ?,
                approved_at = ?, updated_at = ?
            WHERE id = ? AND kind = ?
            "#,
        )
        .bind(approver_id.to_string())
        .bind(approver_name)
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} not found", kind.as_str())));
        }

        self.get_content(kind, id).await
    }
}

// Internal row types for sqlx

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for User {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(User {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TherapistRow {
    id: String,
    email: String,
    password_hash: String,
    approved: bool,
    profile: String,
    update_requests: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TherapistRow> for Therapist {
    type Error = AppError;

    fn try_from(row: TherapistRow) -> Result<Self> {
        let profile: Profile = serde_json::from_str(&row.profile)
            .map_err(|e| AppError::Internal(format!("Invalid profile document: {}", e)))?;
        let update_requests: Vec<UpdateRequest> = serde_json::from_str(&row.update_requests)
            .map_err(|e| AppError::Internal(format!("Invalid update-request ledger: {}", e)))?;

        Ok(Therapist {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            email: row.email,
            password_hash: row.password_hash,
            approved: row.approved,
            profile,
            update_requests,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ContentRow {
    id: String,
    kind: String,
    title: String,
    body: String,
    meta: String,
    author_id: String,
    author_name: String,
    approved: bool,
    approved_by_id: Option<String>,
    approved_by_name: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentRow> for ContentItem {
    type Error = AppError;

    fn try_from(row: ContentRow) -> Result<Self> {
        let approved_by_id = row
            .approved_by_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| AppError::Internal(format!("Invalid approver UUID: {}", e)))?;

        Ok(ContentItem {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            kind: row
                .kind
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid content kind: {}", e)))?,
            title: row.title,
            body: row.body,
            meta: serde_json::from_str(&row.meta)
                .map_err(|e| AppError::Internal(format!("Invalid content meta: {}", e)))?,
            author_id: Uuid::parse_str(&row.author_id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            author_name: row.author_name,
            approved: row.approved,
            approved_by_id,
            approved_by_name: row.approved_by_name,
            approved_at: row.approved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
