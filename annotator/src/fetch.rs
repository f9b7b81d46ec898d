use tracing::{debug, info};

use crate::gateway::ServiceGateway;
use crate::models::{ScrapeQuery, Source, SourceId};

/// Documents and their sources, index-aligned.
#[derive(Debug, Default)]
pub struct FetchedBatch {
    documents: Vec<String>,
    sources: Vec<Source>,
}

impl FetchedBatch {
    pub fn push(&mut self, source: Source, content: String) {
        self.documents.push(content);
        self.sources.push(source);
        assert_eq!(
            self.documents.len(),
            self.sources.len(),
            "documents and sources must stay aligned"
        );
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Fetch metadata then scraped content for each id, in order.
/// Ids failing either lookup are skipped.
pub async fn fetch_sources<G>(gateway: &G, source_ids: &[SourceId]) -> FetchedBatch
where
    G: ServiceGateway + ?Sized,
{
    let mut batch = FetchedBatch::default();

    if source_ids.is_empty() {
        info!("No sources to process");
        return batch;
    }

    for source_id in source_ids {
        let source = match gateway.get_source(source_id).await {
            Ok(source) => source,
            Err(e) => {
                debug!(%source_id, error = %e, "skipping source: metadata lookup failed");
                continue;
            }
        };

        let query = ScrapeQuery {
            source_id: source_id.clone(),
            link: source.link.clone(),
        };

        match gateway.get_scrape_data(&query).await {
            Ok(scrape) => batch.push(source, scrape.content),
            Err(e) => {
                debug!(%source_id, link = %source.link, error = %e, "skipping source: scrape lookup failed");
            }
        }
    }

    info!(
        "Fetched {}/{} sources with content",
        batch.len(),
        source_ids.len()
    );
    batch
}
