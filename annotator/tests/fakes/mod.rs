// In-memory collaborators shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use annotator::clustering::{Cluster, ClusterError, ClusterResult, TopicClusterer};
use annotator::gateway::{Result, ServiceError, ServiceGateway};
use annotator::models::{Post, PostAnalysis, RecommendationQuery, ScrapeData, ScrapeQuery, Source, SourceId};

#[derive(Default)]
pub struct FakeGateway {
    pub sources: HashMap<SourceId, Source>,
    /// Scraped content keyed by source link
    pub content: HashMap<String, String>,
    pub images: HashMap<String, Vec<u8>>,
    /// Posts containing one of these source ids are rejected by `add_post`
    pub reject_posts_with: Vec<SourceId>,
    pub fail_analysis: bool,
    pub calls: Mutex<Calls>,
}

#[derive(Default, Debug)]
pub struct Calls {
    pub get_source: Vec<SourceId>,
    pub get_scrape_data: Vec<String>,
    pub posts: Vec<Post>,
    pub analyses: Vec<PostAnalysis>,
    pub recommendations: Vec<RecommendationQuery>,
    pub image_batches: Vec<Vec<String>>,
}

impl Calls {
    pub fn remote_call_count(&self) -> usize {
        self.get_source.len()
            + self.get_scrape_data.len()
            + self.posts.len()
            + self.analyses.len()
            + self.recommendations.len()
            + self.image_batches.len()
    }
}

impl FakeGateway {
    pub fn with_source(mut self, id: &str, date: &str, media: Option<&str>, content: Option<&str>) -> Self {
        let link = format!("https://news.example.com/{}", id);
        self.sources.insert(
            id.to_string(),
            Source {
                id: id.to_string(),
                link: link.clone(),
                date: Some(date.to_string()).filter(|d| !d.is_empty()),
                media: media.map(String::from),
            },
        );
        if let Some(content) = content {
            self.content.insert(link, content.to_string());
        }
        self
    }

    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait::async_trait]
impl ServiceGateway for FakeGateway {
    async fn get_source(&self, source_id: &SourceId) -> Result<Source> {
        self.calls.lock().unwrap().get_source.push(source_id.clone());
        self.sources.get(source_id).cloned().ok_or(ServiceError::Status {
            status: 404,
            body: "unknown source".into(),
        })
    }

    async fn get_scrape_data(&self, query: &ScrapeQuery) -> Result<ScrapeData> {
        self.calls.lock().unwrap().get_scrape_data.push(query.source_id.clone());
        self.content
            .get(&query.link)
            .map(|content| ScrapeData {
                content: content.clone(),
            })
            .ok_or(ServiceError::Network("scraper unreachable".into()))
    }

    async fn add_post(&self, post: &Post) -> Result<()> {
        self.calls.lock().unwrap().posts.push(post.clone());
        if post.source_ids.iter().any(|id| self.reject_posts_with.contains(id)) {
            return Err(ServiceError::Status {
                status: 500,
                body: "insert failed".into(),
            });
        }
        Ok(())
    }

    async fn add_analysis(&self, analysis: &PostAnalysis) -> Result<()> {
        self.calls.lock().unwrap().analyses.push(analysis.clone());
        if self.fail_analysis {
            return Err(ServiceError::Network("llm down".into()));
        }
        Ok(())
    }

    async fn add_recommendations(&self, query: &RecommendationQuery) -> Result<()> {
        self.calls.lock().unwrap().recommendations.push(query.clone());
        Ok(())
    }

    async fn fetch_images(&self, urls: &[String]) -> Result<Vec<Vec<u8>>> {
        self.calls.lock().unwrap().image_batches.push(urls.to_vec());
        urls.iter()
            .map(|url| {
                self.images
                    .get(url)
                    .cloned()
                    .ok_or_else(|| ServiceError::Network(format!("cannot fetch {}", url)))
            })
            .collect()
    }
}

/// Clusterer returning a fixed answer and recording its inputs
pub struct FakeClusterer {
    pub answer: std::result::Result<ClusterResult, String>,
    pub calls: Mutex<Vec<(String, Vec<String>, usize)>>,
}

impl FakeClusterer {
    pub fn returning(clusters: Vec<(i64, Vec<usize>, Vec<Option<&str>>)>) -> Self {
        let clusters = clusters
            .into_iter()
            .map(|(label, members, topics)| Cluster {
                label,
                members,
                topics: topics.into_iter().map(|t| t.map(String::from)).collect(),
            })
            .collect();
        Self {
            answer: Ok(ClusterResult::new(clusters)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TopicClusterer for FakeClusterer {
    async fn cluster(
        &self,
        model_name: &str,
        documents: &[String],
        num_clusters: usize,
    ) -> std::result::Result<ClusterResult, ClusterError> {
        self.calls
            .lock()
            .unwrap()
            .push((model_name.to_string(), documents.to_vec(), num_clusters));
        match &self.answer {
            Ok(result) => Ok(result.clone()),
            Err(reason) => Err(ClusterError::Decode(reason.clone())),
        }
    }
}

/// Encode a solid-color PNG of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
