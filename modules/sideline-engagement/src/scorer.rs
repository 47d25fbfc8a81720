//! Engagement scoring. Pure: same reactions, same clock, same report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use sideline_common::{ContentKind, Reaction, ReactionKind};

/// Points per primary (like) and secondary (dislike) reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Weights {
    pub primary: u64,
    pub secondary: u64,
}

impl Weights {
    pub fn for_kind(kind: ContentKind) -> Self {
        if kind.has_secondary_reaction() {
            Weights {
                primary: 2,
                secondary: 1,
            }
        } else {
            Weights {
                primary: 1,
                secondary: 0,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub likes: u64,
    pub secondary: u64,
    pub points: u64,
    pub earnings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rollup {
    pub likes: u64,
    pub secondary: u64,
    pub points: u64,
    pub earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementReport {
    pub kind: ContentKind,
    pub weights: Weights,
    pub rate: f64,
    /// Oldest first, one per calendar day through today.
    pub days: Vec<DayBucket>,
    pub today: Rollup,
    pub yesterday: Rollup,
    pub past_totals: Rollup,
    pub all_time: Rollup,
}

#[derive(Debug, Clone, Copy)]
pub struct EngagementScorer {
    rate: f64,
}

impl EngagementScorer {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn score(
        &self,
        kind: ContentKind,
        reactions: &[Reaction],
        now: DateTime<Utc>,
    ) -> EngagementReport {
        let weights = Weights::for_kind(kind);
        let today = now.date_naive();
        let yesterday = today.pred_opt().unwrap_or(today);

        // Reactions stamped in the future count as today.
        let day_of = |r: &Reaction| r.created_at.date_naive().min(today);

        let first = reactions
            .iter()
            .map(day_of)
            .min()
            .map_or(yesterday, |d| d.min(yesterday));

        let mut counts: Vec<(NaiveDate, u64, u64)> = first
            .iter_days()
            .take_while(|d| *d <= today)
            .map(|d| (d, 0, 0))
            .collect();

        for reaction in reactions {
            let index = (day_of(reaction) - first).num_days() as usize;
            let Some(slot) = counts.get_mut(index) else {
                continue;
            };
            match reaction.kind {
                ReactionKind::Like => slot.1 += 1,
                ReactionKind::Dislike => slot.2 += 1,
            }
        }

        let days: Vec<DayBucket> = counts
            .into_iter()
            .map(|(date, likes, secondary)| {
                let points = likes * weights.primary + secondary * weights.secondary;
                DayBucket {
                    date,
                    likes,
                    secondary,
                    points,
                    earnings: points as f64 * self.rate,
                }
            })
            .collect();

        let rollup = |filter: &dyn Fn(NaiveDate) -> bool| -> Rollup {
            let (likes, secondary, points) = days
                .iter()
                .filter(|b| filter(b.date))
                .fold((0, 0, 0), |(l, s, p), b| {
                    (l + b.likes, s + b.secondary, p + b.points)
                });
            Rollup {
                likes,
                secondary,
                points,
                earnings: points as f64 * self.rate,
            }
        };

        EngagementReport {
            kind,
            weights,
            rate: self.rate,
            today: rollup(&|d| d == today),
            yesterday: rollup(&|d| d == yesterday),
            past_totals: rollup(&|d| d < yesterday),
            all_time: rollup(&|_| true),
            days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn reaction(kind: ReactionKind, at: DateTime<Utc>) -> Reaction {
        Reaction {
            actor_id: Uuid::new_v4(),
            content_id: Uuid::nil(),
            kind,
            created_at: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_reactions_yield_zeroed_today_and_yesterday() {
        let report = EngagementScorer::new(0.05).score(ContentKind::Post, &[], now());
        assert_eq!(report.days.len(), 2);
        assert!(report.days.iter().all(|d| d.points == 0));
        assert_eq!(report.all_time, Rollup::default());
    }

    #[test]
    fn news_weights_likes_double_and_dislikes_single() {
        let reactions = vec![
            reaction(ReactionKind::Like, now()),
            reaction(ReactionKind::Like, now()),
            reaction(ReactionKind::Dislike, now()),
        ];
        let report = EngagementScorer::new(0.05).score(ContentKind::News, &reactions, now());
        assert_eq!(report.today.points, 5);
        assert!((report.today.earnings - 0.25).abs() < 1e-9);
    }

    #[test]
    fn posts_ignore_secondary_reactions() {
        let reactions = vec![
            reaction(ReactionKind::Like, now()),
            reaction(ReactionKind::Dislike, now()),
        ];
        let report = EngagementScorer::new(0.05).score(ContentKind::Post, &reactions, now());
        assert_eq!(report.today.points, 1);
        assert_eq!(report.today.secondary, 1);
    }

    #[test]
    fn gaps_are_zero_filled_and_rollups_partition_all_time() {
        let reactions = vec![
            reaction(ReactionKind::Like, now() - Duration::days(5)),
            reaction(ReactionKind::Like, now() - Duration::days(1)),
            reaction(ReactionKind::Like, now()),
            reaction(ReactionKind::Like, now()),
        ];
        let report = EngagementScorer::new(0.05).score(ContentKind::Analysis, &reactions, now());

        assert_eq!(report.days.len(), 6);
        assert_eq!(report.days[0].likes, 1);
        assert!(report.days[1..4].iter().all(|d| d.likes == 0));
        assert_eq!(report.past_totals.points, 1);
        assert_eq!(report.yesterday.points, 1);
        assert_eq!(report.today.points, 2);
        assert_eq!(
            report.all_time.points,
            report.past_totals.points + report.yesterday.points + report.today.points
        );
    }

    #[test]
    fn future_reactions_count_as_today() {
        let reactions = vec![reaction(ReactionKind::Like, now() + Duration::days(3))];
        let report = EngagementScorer::new(0.05).score(ContentKind::Post, &reactions, now());
        assert_eq!(report.days.last().unwrap().date, now().date_naive());
        assert_eq!(report.today.likes, 1);
    }

    #[test]
    fn scoring_is_deterministic() {
        let reactions = vec![
            reaction(ReactionKind::Like, now() - Duration::days(2)),
            reaction(ReactionKind::Dislike, now() - Duration::hours(30)),
        ];
        let scorer = EngagementScorer::new(0.05);
        let a = serde_json::to_string(&scorer.score(ContentKind::News, &reactions, now())).unwrap();
        let b = serde_json::to_string(&scorer.score(ContentKind::News, &reactions, now())).unwrap();
        assert_eq!(a, b);
    }
}
