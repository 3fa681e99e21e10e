//! Gallery aggregation: folders under the root, each with its images

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::{ContentService, GalleryFailurePolicy};
use crate::drive::ListQuery;
use crate::error::ProxyError;
use crate::models::{FolderRecord, GalleryRecord, ImageRecord};
use crate::transform::{folder_record, image_record};

impl ContentService {
    /// Folders directly under the gallery root, by name
    pub async fn list_folders(&self) -> Result<Vec<FolderRecord>, ProxyError> {
        let root = &self.sources.root_folder_id;
        let files = self
            .store
            .list_files(&ListQuery::folders(root))
            .await
            .map_err(|source| ProxyError::UpstreamListing {
                what: format!("gallery folders in {}", root),
                source,
            })?;

        debug!(root = %root, count = files.len(), "Listed gallery folders");
        Ok(files.iter().map(folder_record).collect())
    }

    /// Images directly inside one folder, newest first
    pub async fn list_images(&self, folder_id: &str) -> Result<Vec<ImageRecord>, ProxyError> {
        let files = self
            .store
            .list_files(&ListQuery::images(folder_id))
            .await
            .map_err(|source| ProxyError::UpstreamListing {
                what: format!("images in folder {}", folder_id),
                source,
            })?;

        debug!(folder = %folder_id, count = files.len(), "Listed folder images");
        Ok(files
            .iter()
            .map(|f| image_record(f, self.options.image_urls))
            .collect())
    }

    /// Every gallery with its images, in folder-name order
    pub async fn list_galleries(&self) -> Result<Vec<GalleryRecord>, ProxyError> {
        let folders = self.list_folders().await?;

        let listings = join_all(folders.iter().map(|f| self.list_images(&f.id))).await;

        let mut galleries = Vec::with_capacity(folders.len());
        for (folder, images) in folders.into_iter().zip(listings) {
            match images {
                Ok(images) => galleries.push(GalleryRecord::new(folder, images)),
                Err(e) if self.gallery_failures == GalleryFailurePolicy::Strict => return Err(e),
                Err(e) => {
                    warn!(folder = %folder.id, name = %folder.name, error = %e, "Skipping gallery");
                }
            }
        }

        info!(galleries = galleries.len(), "Aggregated galleries");
        Ok(galleries)
    }
}
