//! News aggregation: documents in the news folder rendered to HTML

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::ContentService;
use crate::drive::{DriveFile, ListQuery};
use crate::error::ProxyError;
use crate::models::{Article, ArticleSummary};
use crate::render::Rendered;
use crate::transform::{article_title, excerpt};

impl ContentService {
    async fn list_documents(&self) -> Result<Vec<DriveFile>, ProxyError> {
        let news = &self.sources.news_folder_id;
        let files = self
            .store
            .list_files(&ListQuery::documents(news))
            .await
            .map_err(|source| ProxyError::UpstreamListing {
                what: format!("news documents in {}", news),
                source,
            })?;

        debug!(folder = %news, count = files.len(), "Listed news documents");
        Ok(files)
    }

    /// Fetch a document and convert it to HTML
    async fn render_document(&self, file: &DriveFile) -> Result<Rendered, ProxyError> {
        let bytes = self
            .store
            .fetch_content(&file.id)
            .await
            .map_err(|source| ProxyError::UpstreamFetch {
                file_id: file.id.clone(),
                source,
            })?;

        let rendered = self
            .renderer
            .render(&bytes)
            .map_err(|source| ProxyError::Conversion {
                file_id: file.id.clone(),
                source,
            })?;

        for warning in &rendered.warnings {
            debug!(file_id = %file.id, warning = %warning, "Conversion warning");
        }
        Ok(rendered)
    }

    /// Articles with excerpts, newest first
    ///
    /// Documents that fail to download or convert are left out.
    pub async fn list_articles(&self) -> Result<Vec<ArticleSummary>, ProxyError> {
        let files = self.list_documents().await?;

        let rendered = join_all(files.iter().map(|f| self.render_document(f))).await;

        let articles: Vec<ArticleSummary> = files
            .into_iter()
            .zip(rendered)
            .filter_map(|(file, result)| match result {
                Ok(r) => Some(ArticleSummary {
                    title: article_title(&file.name),
                    excerpt: excerpt(&r.html, self.options.excerpt_length),
                    id: file.id,
                    created_time: file.created_time,
                    modified_time: file.modified_time,
                }),
                Err(e) => {
                    warn!(file_id = %file.id, name = %file.name, error = %e, "Dropping article");
                    None
                }
            })
            .collect();

        info!(articles = articles.len(), "Aggregated news articles");
        Ok(articles)
    }

    /// One article with its full HTML
    pub async fn get_article(&self, article_id: &str) -> Result<Article, ProxyError> {
        let file = self
            .list_documents()
            .await?
            .into_iter()
            .find(|f| f.id == article_id)
            .ok_or_else(|| ProxyError::NotFound(article_id.to_string()))?;

        let rendered = self.render_document(&file).await?;

        Ok(Article {
            title: article_title(&file.name),
            content: rendered.html,
            warnings: rendered.warnings,
            id: file.id,
            created_time: file.created_time,
            modified_time: file.modified_time,
        })
    }
}
