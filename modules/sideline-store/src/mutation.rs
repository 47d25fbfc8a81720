//! Atomic set mutations and the documents they apply to.
//!
//! Both store backends funnel every write to a `CountedSet` through
//! `apply_all`: updates are applied to staged copies and only committed
//! when every mutation in the batch succeeded.

use std::collections::BTreeMap;

use uuid::Uuid;

use sideline_common::{Account, Challenge, ContentItem, CountedSet};

use crate::error::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocKey {
    Account(Uuid),
    Content(Uuid),
    Challenge(Uuid),
}

impl DocKey {
    pub fn id(&self) -> Uuid {
        match self {
            DocKey::Account(id) | DocKey::Content(id) | DocKey::Challenge(id) => *id,
        }
    }

    /// Backing Postgres table.
    pub fn table(&self) -> &'static str {
        match self {
            DocKey::Account(_) => "accounts",
            DocKey::Content(_) => "content_items",
            DocKey::Challenge(_) => "challenges",
        }
    }
}

impl std::fmt::Display for DocKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocKey::Account(id) => write!(f, "account {id}"),
            DocKey::Content(id) => write!(f, "content {id}"),
            DocKey::Challenge(id) => write!(f, "challenge {id}"),
        }
    }
}

/// A `CountedSet` inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Following,
    Followers,
    Likes,
    Dislikes,
    ChallengeVoters,
    OptionVoters {
        question_id: Uuid,
        option_id: Uuid,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetMutation {
    pub field: SetField,
    pub op: SetOp,
    pub member: Uuid,
}

/// A batch of set mutations against one document, applied all-or-nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicUpdate {
    pub target: DocKey,
    pub mutations: Vec<SetMutation>,
}

impl AtomicUpdate {
    pub fn new(target: DocKey) -> Self {
        Self {
            target,
            mutations: Vec::new(),
        }
    }

    pub fn add(self, field: SetField, member: Uuid) -> Self {
        self.push(field, SetOp::Add, member)
    }

    pub fn remove(self, field: SetField, member: Uuid) -> Self {
        self.push(field, SetOp::Remove, member)
    }

    pub fn push(mut self, field: SetField, op: SetOp, member: Uuid) -> Self {
        self.mutations.push(SetMutation { field, op, member });
        self
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Account(Account),
    Content(ContentItem),
    Challenge(Challenge),
}

impl Document {
    pub fn key(&self) -> DocKey {
        match self {
            Document::Account(a) => DocKey::Account(a.id),
            Document::Content(c) => DocKey::Content(c.id),
            Document::Challenge(c) => DocKey::Challenge(c.id),
        }
    }

    /// Decode a stored JSON document for the given key.
    pub fn from_value(key: DocKey, value: serde_json::Value) -> StoreResult<Self> {
        let corrupt = |e: serde_json::Error| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        };
        Ok(match key {
            DocKey::Account(_) => Document::Account(serde_json::from_value(value).map_err(corrupt)?),
            DocKey::Content(_) => Document::Content(serde_json::from_value(value).map_err(corrupt)?),
            DocKey::Challenge(_) => {
                Document::Challenge(serde_json::from_value(value).map_err(corrupt)?)
            }
        })
    }

    pub fn to_value(&self) -> StoreResult<serde_json::Value> {
        let encoded = match self {
            Document::Account(a) => serde_json::to_value(a),
            Document::Content(c) => serde_json::to_value(c),
            Document::Challenge(c) => serde_json::to_value(c),
        };
        encoded.map_err(|e| StoreError::Corrupt {
            key: self.key().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn into_account(self) -> Option<Account> {
        match self {
            Document::Account(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_content(self) -> Option<ContentItem> {
        match self {
            Document::Content(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_challenge(self) -> Option<Challenge> {
        match self {
            Document::Challenge(c) => Some(c),
            _ => None,
        }
    }

    fn counted_set_mut(&mut self, field: &SetField) -> Option<&mut CountedSet<Uuid>> {
        match (self, field) {
            (Document::Account(a), SetField::Following) => Some(&mut a.following),
            (Document::Account(a), SetField::Followers) => Some(&mut a.followers),
            (Document::Content(c), SetField::Likes) => Some(&mut c.likes),
            (Document::Content(c), SetField::Dislikes) => Some(&mut c.dislikes),
            (Document::Challenge(c), SetField::ChallengeVoters) => Some(&mut c.voters),
            (
                Document::Challenge(c),
                SetField::OptionVoters {
                    question_id,
                    option_id,
                },
            ) => c
                .questions
                .iter_mut()
                .find(|q| q.id == *question_id)?
                .options
                .iter_mut()
                .find(|o| o.id == *option_id)
                .map(|o| &mut o.voters),
            _ => None,
        }
    }

    /// Apply mutations in order. Returns, per mutation, whether it changed
    /// the set. On error the document may be partially modified; callers
    /// apply to a staged copy.
    fn apply(&mut self, mutations: &[SetMutation]) -> StoreResult<Vec<bool>> {
        let key = self.key();
        let mut changed = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            let set = self
                .counted_set_mut(&mutation.field)
                .ok_or(StoreError::MissingField {
                    key,
                    field: mutation.field,
                })?;
            changed.push(match mutation.op {
                SetOp::Add => set.add(mutation.member),
                SetOp::Remove => set.remove(&mutation.member),
            });
        }
        Ok(changed)
    }
}

/// The committed state of a document after an atomic update.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub document: Document,
    pub changed: Vec<bool>,
}

impl Applied {
    pub fn any_changed(&self) -> bool {
        self.changed.iter().any(|c| *c)
    }
}

/// Keys in lock order (sorted, deduplicated).
pub fn lock_order(updates: &[AtomicUpdate]) -> Vec<DocKey> {
    let mut keys: Vec<DocKey> = updates.iter().map(|u| u.target).collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Apply every update to the staged documents, in input order.
///
/// `staged` must hold every target. Nothing is written back by this
/// function; on `Err` the caller discards the staged copies.
pub fn apply_all(
    staged: &mut BTreeMap<DocKey, Document>,
    updates: &[AtomicUpdate],
) -> StoreResult<Vec<Applied>> {
    let mut results = Vec::with_capacity(updates.len());
    for update in updates {
        let doc = staged
            .get_mut(&update.target)
            .ok_or(StoreError::NotFound(update.target))?;
        let changed = doc.apply(&update.mutations)?;
        results.push(Applied {
            document: doc.clone(),
            changed,
        });
    }
    Ok(results)
}
