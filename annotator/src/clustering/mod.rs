use thiserror::Error;

use crate::gateway::ServiceError;

pub mod remote;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("clustering service failed: {0}")]
    Service(#[from] ServiceError),

    #[error("cluster assignment is not a partition of {expected} documents: {reason}")]
    InvalidPartition { expected: usize, reason: String },

    #[error("malformed clustering response: {0}")]
    Decode(String),
}

/// Topic clustering over a document set, treated as an opaque capability
#[async_trait::async_trait]
pub trait TopicClusterer: Send + Sync {
    /// Group `documents` into at most `num_clusters` topical clusters
    async fn cluster(
        &self,
        model_name: &str,
        documents: &[String],
        num_clusters: usize,
    ) -> Result<ClusterResult, ClusterError>;
}

/// One topical group of documents
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster index as reported by the model (may be negative for outliers)
    pub label: i64,
    /// Positions into the document set, in model order
    pub members: Vec<usize>,
    /// Raw topic labels; may contain empty or missing entries
    pub topics: Vec<Option<String>>,
}

/// Clusters in the order the clustering capability returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterResult {
    pub clusters: Vec<Cluster>,
}

impl ClusterResult {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// Check that every position in `[0, document_count)` appears in exactly one cluster.
    pub fn validate_partition(&self, document_count: usize) -> Result<(), ClusterError> {
        let invalid = |reason: String| ClusterError::InvalidPartition {
            expected: document_count,
            reason,
        };

        let mut seen = vec![false; document_count];
        for cluster in &self.clusters {
            for &pos in &cluster.members {
                match seen.get_mut(pos) {
                    None => {
                        return Err(invalid(format!(
                            "cluster {} references position {} out of range",
                            cluster.label, pos
                        )))
                    }
                    Some(true) => {
                        return Err(invalid(format!(
                            "position {} assigned more than once (cluster {})",
                            pos, cluster.label
                        )))
                    }
                    Some(slot) => *slot = true,
                }
            }
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(invalid(format!("position {} not assigned to any cluster", missing)));
        }
        Ok(())
    }
}
