//! Dashboard figures that are not derived from stored rows: top skills,
//! application sources and candidate quality.
//!
//! `AppState` holds an `Arc<dyn InsightProvider>`. The default
//! `PlaceholderInsights` returns fixed stand-in numbers and marks them with
//! `"placeholder": true` so clients never mistake them for aggregates.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Share {
    pub name: String,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub placeholder: bool,
    pub top_skills: Vec<Share>,
    pub sources: Vec<Share>,
    pub candidate_quality: Vec<Share>,
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn employer_insights(&self, company_id: Uuid) -> Result<Insights, AppError>;
}

pub struct PlaceholderInsights;

fn shares(items: &[(&str, u32)]) -> Vec<Share> {
    items
        .iter()
        .map(|(name, percentage)| Share {
            name: (*name).to_string(),
            percentage: *percentage,
        })
        .collect()
}

#[async_trait]
impl InsightProvider for PlaceholderInsights {
    async fn employer_insights(&self, _company_id: Uuid) -> Result<Insights, AppError> {
        Ok(Insights {
            placeholder: true,
            top_skills: shares(&[
                ("JavaScript", 35),
                ("Python", 28),
                ("React", 22),
                ("SQL", 15),
            ]),
            sources: shares(&[
                ("Direct", 45),
                ("Job boards", 30),
                ("Referrals", 15),
                ("Social media", 10),
            ]),
            candidate_quality: shares(&[("Excellent", 20), ("Good", 45), ("Average", 35)]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_is_tagged() {
        let insights = PlaceholderInsights
            .employer_insights(Uuid::new_v4())
            .await
            .unwrap();
        assert!(insights.placeholder);
        let v = serde_json::to_value(&insights).unwrap();
        assert_eq!(v["placeholder"], true);
    }

    #[tokio::test]
    async fn test_placeholder_shares_sum_to_hundred() {
        let insights = PlaceholderInsights
            .employer_insights(Uuid::new_v4())
            .await
            .unwrap();
        for group in [&insights.top_skills, &insights.sources, &insights.candidate_quality] {
            assert_eq!(group.iter().map(|s| s.percentage).sum::<u32>(), 100);
        }
    }
}
