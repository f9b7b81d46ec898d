use tracing::{info, warn};

use crate::gateway::ServiceGateway;
use crate::models::{Post, PostAnalysis, PostQuery, RecommendationQuery};

/// Persist a post. Returns whether the database accepted it.
pub async fn persist_post<G>(gateway: &G, post: &Post) -> bool
where
    G: ServiceGateway + ?Sized,
{
    match gateway.add_post(post).await {
        Ok(()) => true,
        Err(e) => {
            warn!(post_id = %post.id, error = %e, "failed to persist post, dropping it from analysis");
            false
        }
    }
}

/// Forward the accumulated queries to the analyzer and, optionally, the
/// recommender. Both calls are best-effort. Returns whether the analysis
/// batch was accepted.
pub async fn dispatch_batch<G>(gateway: &G, queries: Vec<PostQuery>, notify_recommender: bool) -> bool
where
    G: ServiceGateway + ?Sized,
{
    if queries.is_empty() {
        info!("No posts to dispatch");
        return false;
    }

    let post_ids: Vec<String> = queries.iter().map(|q| q.post_id.clone()).collect();
    let count = queries.len();

    let analysis = PostAnalysis { post_queries: queries };
    let analysis_sent = match gateway.add_analysis(&analysis).await {
        Ok(()) => {
            info!("Sent {} posts for LLM analysis", count);
            true
        }
        Err(e) => {
            warn!(error = %e, posts = count, "LLM analysis dispatch failed");
            false
        }
    };

    if notify_recommender {
        let query = RecommendationQuery { post_ids };
        if let Err(e) = gateway.add_recommendations(&query).await {
            warn!(error = %e, posts = count, "recommender notification failed");
        }
    }

    analysis_sent
}
