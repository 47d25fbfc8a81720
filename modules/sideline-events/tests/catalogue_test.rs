//! Wire-contract tests: event names and payload keys are consumed by
//! existing clients and must match exactly.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use serde_json::json;
use sideline_common::{ContentKind, CountedSet, PollOption, Question};
use sideline_events::{ChallengeCreator, EngagementEvent, VoterSummary};
use uuid::Uuid;

#[test]
fn follow_payload_shape() {
    let user_id = Uuid::new_v4();
    let follower_id = Uuid::new_v4();
    let event = EngagementEvent::FollowToggled {
        user_id,
        follower_id,
        followed: true,
    };

    assert_eq!(event.event_name(), "new follower");
    assert_eq!(
        event.payload(),
        json!({"userId": user_id, "followerId": follower_id, "followed": true})
    );
}

#[test]
fn like_payload_keys_by_content_kind() {
    let content_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    for (kind, key) in [
        (ContentKind::Post, "postId"),
        (ContentKind::Analysis, "analysisId"),
        (ContentKind::News, "newsId"),
    ] {
        let event = EngagementEvent::LikeToggled {
            content_kind: kind,
            content_id,
            user_id,
            liked: false,
        };
        assert_eq!(event.event_name(), "new like created");
        assert_eq!(
            event.payload(),
            json!({key: content_id, "userId": user_id, "liked": false})
        );
    }
}

#[test]
fn vote_payload_carries_voter_summary_and_answers() {
    let vote_id = Uuid::new_v4();
    let voter_id = Uuid::new_v4();
    let question_id = Uuid::new_v4();
    let option_id = Uuid::new_v4();

    let event = EngagementEvent::VoteRecorded {
        vote_id,
        voter: VoterSummary {
            id: voter_id,
            username: "keeper".into(),
            avatar_url: None,
        },
        answers: BTreeMap::from([(question_id, option_id)]),
    };

    assert_eq!(event.event_name(), "new vote created");
    assert_eq!(
        event.payload(),
        json!({
            "_id": vote_id,
            "user": {"_id": voter_id, "username": "keeper", "avatarUrl": null},
            "answers": {question_id.to_string(): option_id},
        })
    );
}

#[test]
fn challenge_payload_omits_tallies() {
    let challenge_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let question = Question {
        id: Uuid::new_v4(),
        text: "Man of the match?".into(),
        options: vec![PollOption {
            id: Uuid::new_v4(),
            label: "Striker".into(),
            voters: CountedSet::new(),
        }],
    };

    let event = EngagementEvent::ChallengeCreated {
        challenge_id,
        creator: ChallengeCreator {
            id: owner_id,
            username: "league".into(),
            profile_picture: Some("https://cdn.example/p.png".into()),
        },
        title: "Matchday 4".into(),
        description: "Predict the derby".into(),
        questions: vec![question.clone()],
        start_date: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2026, 5, 3, 12, 0, 0).unwrap(),
    };

    let payload = event.payload();
    assert_eq!(event.event_name(), "new challenge created");
    assert_eq!(
        payload["user"],
        json!({"id": owner_id, "username": "league", "profilePicture": "https://cdn.example/p.png"})
    );
    assert_eq!(payload["startDate"], json!("2026-05-01T00:00:00.000Z"));
    assert_eq!(payload["endDate"], json!("2026-05-03T12:00:00.000Z"));
    assert_eq!(
        payload["questions"][0]["options"][0],
        json!({"_id": question.options[0].id, "label": "Striker"})
    );
    assert!(payload["questions"][0]["options"][0].get("voters").is_none());
}

#[test]
fn dislike_and_profile_payloads() {
    let news_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let dislike = EngagementEvent::DislikeToggled {
        content_id: news_id,
        user_id,
        unliked: true,
    };
    assert_eq!(dislike.event_name(), "new unlike created");
    assert_eq!(
        dislike.payload(),
        json!({"newsId": news_id, "userId": user_id, "unliked": true})
    );

    let profile = EngagementEvent::ProfileUpdated {
        user_id,
        updated_fields: json!({"notificationsEnabled": false}),
    };
    assert_eq!(profile.to_published().name, "userProfileUpdated");
    assert_eq!(
        profile.payload(),
        json!({"userId": user_id, "updatedFields": {"notificationsEnabled": false}})
    );
}
