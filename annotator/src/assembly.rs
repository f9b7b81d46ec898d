use chrono::NaiveDateTime;

use crate::clustering::Cluster;
use crate::models::{Post, Source, DATE_FORMAT};

/// Separator placed between member documents in the analysis text
pub const TEXT_SEPARATOR: &str = "\n ";

/// A post ready to persist, with the text sent to the analyzer
#[derive(Debug, Clone)]
pub struct AssembledPost {
    pub post: Post,
    pub text: String,
}

/// Earliest parseable date, returned in its original form.
/// Empty or malformed entries are ignored; `None` when nothing parses.
pub fn get_min_date<'a, I>(dates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    dates
        .into_iter()
        .filter(|d| !d.is_empty())
        .filter_map(|d| NaiveDateTime::parse_from_str(d, DATE_FORMAT).ok().map(|parsed| (parsed, d)))
        .min_by_key(|(parsed, _)| *parsed)
        .map(|(_, original)| original.to_string())
}

pub fn filter_topics(topics: &[Option<String>]) -> Vec<String> {
    topics
        .iter()
        .flatten()
        .filter(|t| !t.is_empty())
        .cloned()
        .collect()
}

/// Member sources of a cluster, in member order.
pub fn resolve_members<'a>(cluster: &Cluster, sources: &'a [Source]) -> Vec<&'a Source> {
    cluster.members.iter().filter_map(|&pos| sources.get(pos)).collect()
}

pub fn join_documents(cluster: &Cluster, documents: &[String]) -> String {
    cluster
        .members
        .iter()
        .filter_map(|&pos| documents.get(pos).map(String::as_str))
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}

/// Build the post for one cluster. Returns `None` when no member has a
/// parseable date.
pub fn assemble_post(
    cluster: &Cluster,
    sources: &[Source],
    documents: &[String],
    media: Option<String>,
) -> Option<AssembledPost> {
    let members = resolve_members(cluster, sources);
    let date = get_min_date(members.iter().filter_map(|s| s.date.as_deref()))?;

    let post = Post::new(
        members.iter().map(|s| s.id.clone()).collect(),
        filter_topics(&cluster.topics),
        date,
        media,
    );

    Some(AssembledPost {
        post,
        text: join_documents(cluster, documents),
    })
}
