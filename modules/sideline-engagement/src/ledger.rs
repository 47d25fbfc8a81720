//! RelationshipLedger: follow, like and dislike toggles.
//!
//! Every toggle reads current membership, then asks the store for the
//! opposite set mutation. The outcome reported back is read from the
//! committed documents, so two racing toggles both see the real end state.

use chrono::{DateTime, Utc};
use expo_push::PushMessage;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use sideline_common::{
    Account, AccountId, ContentId, ContentItem, Reaction, ReactionKind, SidelineError,
};
use sideline_events::EngagementEvent;
use sideline_store::{AtomicUpdate, DocKey, Document, SetField, SetOp, StoreError};

use crate::deps::EngagementDeps;
use crate::scorer::EngagementReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    pub followed: bool,
    pub following_count: u64,
    pub followers_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionOutcome {
    pub content_id: ContentId,
    pub kind: ReactionKind,
    pub active: bool,
    pub count: u64,
}

pub struct RelationshipLedger {
    deps: EngagementDeps,
}

impl RelationshipLedger {
    pub fn new(deps: EngagementDeps) -> Self {
        Self { deps }
    }

    /// Follow `target_id` if not already following, unfollow otherwise.
    pub async fn toggle_follow(
        &self,
        actor_id: AccountId,
        target_id: AccountId,
    ) -> Result<FollowOutcome, SidelineError> {
        if actor_id == target_id {
            return Err(SidelineError::SelfReference);
        }

        let actor = self.account(actor_id).await?;
        let target = self.account(target_id).await?;

        let op = if actor.following.contains(&target_id) {
            SetOp::Remove
        } else {
            SetOp::Add
        };

        let applied = self
            .deps
            .store
            .atomic_update_all(vec![
                AtomicUpdate::new(DocKey::Account(actor_id)).push(SetField::Following, op, target_id),
                AtomicUpdate::new(DocKey::Account(target_id)).push(SetField::Followers, op, actor_id),
            ])
            .await?;

        let mut accounts = applied.into_iter().filter_map(|a| a.document.into_account());
        let (Some(actor_after), Some(target_after)) = (accounts.next(), accounts.next()) else {
            return Err(SidelineError::Upstream(
                "follow update returned no accounts".into(),
            ));
        };

        let outcome = FollowOutcome {
            followed: actor_after.following.contains(&target_id),
            following_count: actor_after.following.size(),
            followers_count: target_after.followers.size(),
        };

        info!(
            actor = %actor_id,
            target = %target_id,
            followed = outcome.followed,
            "Follow toggled"
        );

        self.deps.bus.publish(&EngagementEvent::FollowToggled {
            user_id: target_id,
            follower_id: actor_id,
            followed: outcome.followed,
        });

        if outcome.followed && op == SetOp::Add {
            if let Some(address) = target.notification_address.as_deref() {
                self.deps.notifier.dispatch(
                    PushMessage::new(
                        address,
                        "New Follower",
                        format!("🎉 {} has followed you", actor.username),
                    )
                    .with_data(json!({ "followerId": actor_id })),
                );
            }
        }

        Ok(outcome)
    }

    pub async fn toggle_like(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
    ) -> Result<ReactionOutcome, SidelineError> {
        let content = self.content(actor_id, content_id).await?;
        let outcome = self.toggle_reaction(actor_id, &content, ReactionKind::Like).await?;

        self.deps.bus.publish(&EngagementEvent::LikeToggled {
            content_kind: content.kind,
            content_id,
            user_id: actor_id,
            liked: outcome.active,
        });
        Ok(outcome)
    }

    /// Secondary reaction. Only news items carry one.
    pub async fn toggle_dislike(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
    ) -> Result<ReactionOutcome, SidelineError> {
        let content = self.content(actor_id, content_id).await?;
        if !content.kind.has_secondary_reaction() {
            return Err(SidelineError::Validation(format!(
                "{} items cannot be disliked",
                content.kind
            )));
        }
        let outcome = self
            .toggle_reaction(actor_id, &content, ReactionKind::Dislike)
            .await?;

        self.deps.bus.publish(&EngagementEvent::DislikeToggled {
            content_id,
            user_id: actor_id,
            unliked: outcome.active,
        });
        Ok(outcome)
    }

    /// Register or clear the account's push token.
    pub async fn set_notification_address(
        &self,
        account_id: AccountId,
        address: Option<String>,
    ) -> Result<(), SidelineError> {
        let address = match address {
            Some(a) if a.trim().is_empty() => {
                return Err(SidelineError::Validation(
                    "notification address must not be blank".into(),
                ))
            }
            Some(a) => Some(a.trim().to_string()),
            None => None,
        };

        self.account(account_id).await?;
        let enabled = address.is_some();
        self.deps
            .store
            .set_notification_address(account_id, address)
            .await?;

        info!(account = %account_id, enabled, "Notification address updated");

        self.deps.bus.publish(&EngagementEvent::ProfileUpdated {
            user_id: account_id,
            updated_fields: json!({ "notificationsEnabled": enabled }),
        });
        Ok(())
    }

    /// Score a content item from its reaction history.
    pub async fn engagement_report(
        &self,
        content_id: ContentId,
        now: DateTime<Utc>,
    ) -> Result<EngagementReport, SidelineError> {
        let content = self
            .deps
            .store
            .find_content(content_id)
            .await?
            .ok_or_else(|| SidelineError::not_found("content", content_id))?;
        let reactions = self.deps.store.reactions_for(content_id).await?;
        Ok(self.deps.scorer().score(content.kind, &reactions, now))
    }

    async fn toggle_reaction(
        &self,
        actor_id: AccountId,
        content: &ContentItem,
        kind: ReactionKind,
    ) -> Result<ReactionOutcome, SidelineError> {
        let store = &self.deps.store;
        let key = DocKey::Content(content.id);
        let field = match kind {
            ReactionKind::Like => SetField::Likes,
            ReactionKind::Dislike => SetField::Dislikes,
        };

        let existing = store.find_reaction(actor_id, content.id, kind).await?;
        let document = match existing {
            Some(_) => {
                let removed = store
                    .delete_reaction(
                        actor_id,
                        content.id,
                        kind,
                        AtomicUpdate::new(key).remove(field, actor_id),
                    )
                    .await?;
                match removed {
                    Some(applied) => applied.document,
                    // Removed concurrently; report what is there now.
                    None => Document::Content(
                        store
                            .find_content(content.id)
                            .await?
                            .ok_or_else(|| SidelineError::not_found("content", content.id))?,
                    ),
                }
            }
            None => {
                let reaction = Reaction {
                    actor_id,
                    content_id: content.id,
                    kind,
                    created_at: Utc::now(),
                };
                store
                    .insert_reaction(&reaction, AtomicUpdate::new(key).add(field, actor_id))
                    .await
                    .map_err(|e| match e {
                        StoreError::Conflict(_) => {
                            SidelineError::Conflict(format!("{kind} already recorded"))
                        }
                        other => other.into(),
                    })?
                    .document
            }
        };

        let item = document
            .into_content()
            .ok_or_else(|| SidelineError::Upstream("reaction update returned no content".into()))?;
        let set = match kind {
            ReactionKind::Like => &item.likes,
            ReactionKind::Dislike => &item.dislikes,
        };
        let outcome = ReactionOutcome {
            content_id: item.id,
            kind,
            active: set.contains(&actor_id),
            count: set.size(),
        };

        info!(
            actor = %actor_id,
            content = %item.id,
            %kind,
            active = outcome.active,
            count = outcome.count,
            "Reaction toggled"
        );
        Ok(outcome)
    }

    async fn account(&self, id: AccountId) -> Result<Account, SidelineError> {
        self.deps
            .store
            .find_account(id)
            .await?
            .ok_or_else(|| SidelineError::not_found("account", id))
    }

    async fn content(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
    ) -> Result<ContentItem, SidelineError> {
        self.account(actor_id).await?;
        self.deps
            .store
            .find_content(content_id)
            .await?
            .ok_or_else(|| SidelineError::not_found("content", content_id))
    }
}
