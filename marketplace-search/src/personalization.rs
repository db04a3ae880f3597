//! Personalization interface.
//!
//! Provides user-specific boost maps consumed by the relevance scorer on
//! the personalized search path. The core never computes these itself.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

/// User-specific boost weights keyed by lowercased term.
///
/// A weight of 1.0 is neutral; above 1.0 favors matching documents.
/// Category and brand boosts derive from browsing history, value boosts
/// from explicit preferences.
#[derive(Debug, Clone, Default)]
pub struct PersonalizedBoosts {
    pub category_boosts: HashMap<String, f64>,
    pub brand_boosts: HashMap<String, f64>,
    pub value_boosts: HashMap<String, f64>,
}

/// Supplies per-user personalization data.
#[async_trait]
pub trait PersonalizationProvider: Send + Sync {
    /// Boost maps for a user. Implementations should return neutral
    /// defaults rather than failing.
    async fn personalized_boosts(&self, user_id: Uuid) -> PersonalizedBoosts;

    /// Recommended entity ids for a user, most relevant first.
    async fn personalized_recommendations(&self, user_id: Uuid, limit: usize) -> Vec<String>;
}

/// Provider that personalizes nothing. The default when no personalization
/// service is wired in.
pub struct NoopPersonalizationProvider;

#[async_trait]
impl PersonalizationProvider for NoopPersonalizationProvider {
    async fn personalized_boosts(&self, _user_id: Uuid) -> PersonalizedBoosts {
        PersonalizedBoosts::default()
    }

    async fn personalized_recommendations(&self, _user_id: Uuid, _limit: usize) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_provider_is_neutral() {
        let provider = NoopPersonalizationProvider;
        let boosts = provider.personalized_boosts(Uuid::new_v4()).await;
        assert!(boosts.category_boosts.is_empty());
        assert!(boosts.brand_boosts.is_empty());
        assert!(boosts.value_boosts.is_empty());

        let recs = provider
            .personalized_recommendations(Uuid::new_v4(), 10)
            .await;
        assert!(recs.is_empty());
    }
}
