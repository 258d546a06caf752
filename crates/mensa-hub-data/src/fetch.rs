use std::future::Future;

use serde::Deserialize;

/// Which side of the document source a query hits first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Server,
    Cache,
}

impl SourceKind {
    pub fn complement(self) -> Self {
        match self {
            SourceKind::Server => SourceKind::Cache,
            SourceKind::Cache => SourceKind::Server,
        }
    }
}

/// Runs `primary`; an empty (but successful) result triggers exactly one run
/// of `fallback`, and whichever result is non-empty wins. A failure on either
/// attempt surfaces immediately — errors never trigger the fallback and there
/// are no retries.
pub async fn fetch_with_fallback<T, E, P, F, PFut, FFut>(
    primary: P,
    fallback: F,
) -> Result<Vec<T>, E>
where
    P: FnOnce() -> PFut,
    PFut: Future<Output = Result<Vec<T>, E>>,
    F: FnOnce() -> FFut,
    FFut: Future<Output = Result<Vec<T>, E>>,
{
    let documents = primary().await?;
    if !documents.is_empty() {
        return Ok(documents);
    }

    tracing::debug!("primary source empty, retrying against complement");
    fallback().await
}
