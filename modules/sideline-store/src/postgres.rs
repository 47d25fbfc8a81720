//! PgDocumentStore: documents as JSONB rows in Postgres.
//!
//! Each atomic update runs in one transaction: the target rows are locked
//! with `SELECT ... FOR UPDATE` in key order, mutated in Rust, and written
//! back before commit. Votes and reactions live in their own tables whose
//! unique keys are the authoritative duplicate guard. Rows in those tables
//! are inserted only after the parent document is locked `FOR UPDATE`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use sideline_common::{
    Account, AccountId, Challenge, ChallengeId, ContentId, ContentItem, OptionId, Page, QuestionId,
    Reaction, ReactionKind, Vote,
};

use crate::error::{StoreError, StoreResult};
use crate::mutation::{apply_all, lock_order, Applied, AtomicUpdate, DocKey, Document};
use crate::store::DocumentStore;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id   UUID  PRIMARY KEY,
        doc  JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS content_items (
        id    UUID  PRIMARY KEY,
        kind  TEXT  NOT NULL,
        doc   JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS challenges (
        id   UUID  PRIMARY KEY,
        doc  JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS votes (
        id            UUID        PRIMARY KEY,
        voter_id      UUID        NOT NULL,
        challenge_id  UUID        NOT NULL REFERENCES challenges(id),
        answers       JSONB       NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        UNIQUE (voter_id, challenge_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS votes_challenge_created_idx ON votes (challenge_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS reactions (
        actor_id    UUID        NOT NULL,
        content_id  UUID        NOT NULL REFERENCES content_items(id),
        kind        TEXT        NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (actor_id, content_id, kind)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS reactions_content_idx ON reactions (content_id, created_at)",
];

type VoteRow = (
    Uuid,
    Uuid,
    Uuid,
    Json<BTreeMap<QuestionId, OptionId>>,
    DateTime<Utc>,
);

type ReactionRow = (Uuid, Uuid, String, DateTime<Utc>);

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        info!("Document store schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_doc(&self, key: DocKey) -> StoreResult<Option<Document>> {
        let sql = format!("SELECT doc FROM {} WHERE id = $1", key.table());
        let row = sqlx::query_as::<_, (Json<serde_json::Value>,)>(&sql)
            .bind(key.id())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(Json(value),)| Document::from_value(key, value))
            .transpose()
    }

    async fn insert_doc(&self, doc: &Document) -> StoreResult<()> {
        let key = doc.key();
        let value = doc.to_value()?;
        match doc {
            Document::Content(item) => {
                sqlx::query("INSERT INTO content_items (id, kind, doc) VALUES ($1, $2, $3)")
                    .bind(item.id)
                    .bind(item.kind.to_string())
                    .bind(Json(value))
                    .execute(&self.pool)
                    .await?;
            }
            _ => {
                let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", key.table());
                sqlx::query(&sql)
                    .bind(key.id())
                    .bind(Json(value))
                    .execute(&self.pool)
                    .await?;
            }
        }
        debug!(%key, "Inserted document");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transaction helpers
// ---------------------------------------------------------------------------

async fn lock_doc(conn: &mut PgConnection, key: DocKey) -> StoreResult<Document> {
    let sql = format!("SELECT doc FROM {} WHERE id = $1 FOR UPDATE", key.table());
    let row = sqlx::query_as::<_, (Json<serde_json::Value>,)>(&sql)
        .bind(key.id())
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some((Json(value),)) => Document::from_value(key, value),
        None => Err(StoreError::NotFound(key)),
    }
}

async fn save_doc(conn: &mut PgConnection, doc: &Document) -> StoreResult<()> {
    let key = doc.key();
    let sql = format!("UPDATE {} SET doc = $2 WHERE id = $1", key.table());
    sqlx::query(&sql)
        .bind(key.id())
        .bind(Json(doc.to_value()?))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Lock every target in key order, apply, write back. Caller owns the transaction.
async fn apply_in_tx(
    conn: &mut PgConnection,
    updates: &[AtomicUpdate],
) -> StoreResult<Vec<Applied>> {
    let mut staged = BTreeMap::new();
    for key in lock_order(updates) {
        let doc = lock_doc(conn, key).await?;
        staged.insert(key, doc);
    }

    let results = apply_all(&mut staged, updates)?;

    for doc in staged.values() {
        save_doc(conn, doc).await?;
    }
    Ok(results)
}

async fn apply_one_in_tx(conn: &mut PgConnection, update: AtomicUpdate) -> StoreResult<Applied> {
    apply_in_tx(conn, std::slice::from_ref(&update))
        .await?
        .pop()
        .ok_or_else(|| StoreError::Unavailable("empty update result".into()))
}

fn reaction_from_row((actor_id, content_id, kind, created_at): ReactionRow) -> StoreResult<Reaction> {
    let kind = kind.parse().map_err(|reason| StoreError::Corrupt {
        key: format!("reaction {actor_id}/{content_id}"),
        reason,
    })?;
    Ok(Reaction {
        actor_id,
        content_id,
        kind,
        created_at,
    })
}

fn vote_from_row((id, voter_id, challenge_id, Json(answers), created_at): VoteRow) -> Vote {
    Vote {
        id,
        voter_id,
        challenge_id,
        answers,
        created_at,
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self
            .find_doc(DocKey::Account(id))
            .await?
            .and_then(Document::into_account))
    }

    async fn find_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>> {
        Ok(self
            .find_doc(DocKey::Content(id))
            .await?
            .and_then(Document::into_content))
    }

    async fn find_challenge(&self, id: ChallengeId) -> StoreResult<Option<Challenge>> {
        Ok(self
            .find_doc(DocKey::Challenge(id))
            .await?
            .and_then(Document::into_challenge))
    }

    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.insert_doc(&Document::Account(account.clone())).await
    }

    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()> {
        self.insert_doc(&Document::Content(item.clone())).await
    }

    async fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
        self.insert_doc(&Document::Challenge(challenge.clone())).await
    }

    async fn set_notification_address(
        &self,
        id: AccountId,
        address: Option<String>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET doc = jsonb_set(doc, '{notificationAddress}', $2::jsonb) WHERE id = $1",
        )
        .bind(id)
        .bind(Json(address))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(DocKey::Account(id)));
        }
        Ok(())
    }

    async fn atomic_update(&self, update: AtomicUpdate) -> StoreResult<Applied> {
        let mut tx = self.pool.begin().await?;
        let applied = apply_one_in_tx(&mut tx, update).await?;
        tx.commit().await?;
        Ok(applied)
    }

    async fn atomic_update_all(&self, updates: Vec<AtomicUpdate>) -> StoreResult<Vec<Applied>> {
        let mut tx = self.pool.begin().await?;
        let results = apply_in_tx(&mut tx, &updates).await?;
        tx.commit().await?;
        Ok(results)
    }

    async fn find_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>> {
        let row = sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT actor_id, content_id, kind, created_at
            FROM reactions
            WHERE actor_id = $1 AND content_id = $2 AND kind = $3
            "#,
        )
        .bind(actor_id)
        .bind(content_id)
        .bind(kind.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(reaction_from_row).transpose()
    }

    async fn insert_reaction(
        &self,
        reaction: &Reaction,
        update: AtomicUpdate,
    ) -> StoreResult<Applied> {
        let mut tx = self.pool.begin().await?;
        let applied = apply_one_in_tx(&mut tx, update).await?;
        sqlx::query(
            "INSERT INTO reactions (actor_id, content_id, kind, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(reaction.actor_id)
        .bind(reaction.content_id)
        .bind(reaction.kind.to_string())
        .bind(reaction.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(applied)
    }

    async fn delete_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
        update: AtomicUpdate,
    ) -> StoreResult<Option<Applied>> {
        let mut tx = self.pool.begin().await?;
        // Parent first, same as insert_reaction.
        lock_doc(&mut tx, update.target).await?;
        let deleted = sqlx::query(
            "DELETE FROM reactions WHERE actor_id = $1 AND content_id = $2 AND kind = $3",
        )
        .bind(actor_id)
        .bind(content_id)
        .bind(kind.to_string())
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let applied = apply_one_in_tx(&mut tx, update).await?;
        tx.commit().await?;
        Ok(Some(applied))
    }

    async fn reactions_for(&self, content_id: ContentId) -> StoreResult<Vec<Reaction>> {
        let rows = sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT actor_id, content_id, kind, created_at
            FROM reactions
            WHERE content_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(reaction_from_row).collect()
    }

    async fn find_vote(
        &self,
        voter_id: AccountId,
        challenge_id: ChallengeId,
    ) -> StoreResult<Option<Vote>> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_id, challenge_id, answers, created_at
            FROM votes
            WHERE voter_id = $1 AND challenge_id = $2
            "#,
        )
        .bind(voter_id)
        .bind(challenge_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(vote_from_row))
    }

    async fn insert_vote(&self, vote: &Vote, update: AtomicUpdate) -> StoreResult<Applied> {
        let mut tx = self.pool.begin().await?;
        let applied = apply_one_in_tx(&mut tx, update).await?;
        sqlx::query(
            r#"
            INSERT INTO votes (id, voter_id, challenge_id, answers, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(vote.id)
        .bind(vote.voter_id)
        .bind(vote.challenge_id)
        .bind(Json(&vote.answers))
        .bind(vote.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(applied)
    }

    async fn list_votes(&self, challenge_id: ChallengeId, page: Page) -> StoreResult<Vec<Vote>> {
        let rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_id, challenge_id, answers, created_at
            FROM votes
            WHERE challenge_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(challenge_id)
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(vote_from_row).collect())
    }
}
