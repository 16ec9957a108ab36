//! services/client/src/flows/resources.rs
//!
//! Upload, list and delete of study books.
//!
//! Upload and delete are two-phase writes against two different stores with no
//! transaction between them. Upload stores content, then metadata; delete
//! removes metadata, then content. If the second phase fails the first is not
//! rolled back: the caller gets `ClientError::Incomplete` naming the content
//! location left behind (orphaned on upload, unreferenced on delete).

use crate::error::{ClientError, ClientResult};
use chrono::Utc;
use crybaby_core::domain::{Book, BookListing, NewBook, UploadFile};
use crybaby_core::ports::{BlobStorage, DatabaseService, View};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const UPLOAD_MISSING_INPUT: &str = "Please select a file and enter a subject.";
pub const UPLOAD_OK: &str = "Book uploaded successfully!";
pub const UPLOAD_FAILED: &str = "Failed to upload book.";
pub const DELETE_OK: &str = "Book deleted successfully!";
pub const DELETE_FAILED: &str = "Failed to delete book.";

/// Where a book's content is stored.
pub fn content_path(owner_id: &str, subject: &str, file_name: &str) -> String {
    format!("books/{}/{}/{}", owner_id, subject, file_name)
}

pub struct ResourceManager {
    db: Arc<dyn DatabaseService>,
    blobs: Arc<dyn BlobStorage>,
    view: Arc<dyn View>,
}

impl ResourceManager {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        blobs: Arc<dyn BlobStorage>,
        view: Arc<dyn View>,
    ) -> Self {
        Self { db, blobs, view }
    }

    pub async fn upload(
        &self,
        owner_id: Option<&str>,
        file: Option<UploadFile>,
        subject: &str,
    ) -> ClientResult<Book> {
        let subject = subject.trim();
        let (Some(owner_id), Some(file)) = (owner_id.filter(|o| !o.is_empty()), file) else {
            self.view.alert(UPLOAD_MISSING_INPUT);
            return Err(ClientError::Validation(UPLOAD_MISSING_INPUT.to_string()));
        };
        if subject.is_empty() {
            self.view.alert(UPLOAD_MISSING_INPUT);
            return Err(ClientError::Validation(UPLOAD_MISSING_INPUT.to_string()));
        }

        // Phase 1: content.
        let path = content_path(owner_id, subject, &file.name);
        let location = match self.blobs.upload(&path, &file).await {
            Ok(location) => location,
            Err(e) => {
                error!("Error uploading book content to {}: {}", path, e);
                self.view.alert(UPLOAD_FAILED);
                return Err(e.into());
            }
        };

        // Phase 2: metadata.
        let new_book = NewBook {
            owner_id: owner_id.to_string(),
            subject: subject.to_string(),
            display_name: file.name.clone(),
            content_location: location.clone(),
            created_at: Utc::now(),
        };
        let book = match self.db.add_book(&new_book).await {
            Ok(book) => book,
            Err(e) => {
                error!(
                    "Book content at {} stored but metadata write failed: {}",
                    location, e
                );
                self.view.alert(UPLOAD_FAILED);
                return Err(ClientError::Incomplete {
                    step: "book metadata write",
                    dangling: location,
                    source: e,
                });
            }
        };

        info!("Uploaded book {} for {}", book.id, owner_id);
        self.view.alert(UPLOAD_OK);
        self.refresh(owner_id).await;
        Ok(book)
    }

    /// Re-fetches the owner's books and re-renders both views. Without an
    /// identity this does nothing.
    pub async fn list(&self, owner_id: Option<&str>) -> ClientResult<Vec<Book>> {
        let Some(owner_id) = owner_id else {
            return Ok(Vec::new());
        };
        let books = self.db.list_books(owner_id).await?;
        self.view.render_books(&BookListing::from_books(&books));
        Ok(books)
    }

    pub async fn delete(
        &self,
        owner_id: Option<&str>,
        book_id: &str,
        content_location: &str,
    ) -> ClientResult<()> {
        let Some(owner_id) = owner_id else {
            return Ok(());
        };

        // Phase 1: metadata.
        if let Err(e) = self.db.delete_book(book_id).await {
            error!("Error deleting book {}: {}", book_id, e);
            self.view.alert(DELETE_FAILED);
            return Err(e.into());
        }

        // Phase 2: content.
        if let Err(e) = self.blobs.delete(content_location).await {
            warn!(
                "Book {} metadata deleted but content at {} remains: {}",
                book_id, content_location, e
            );
            self.view.alert(DELETE_FAILED);
            return Err(ClientError::Incomplete {
                step: "book content delete",
                dangling: content_location.to_string(),
                source: e,
            });
        }

        info!("Deleted book {}", book_id);
        self.view.alert(DELETE_OK);
        self.refresh(owner_id).await;
        Ok(())
    }

    /// Post-write re-render. A failed refresh leaves the previous listing on
    /// screen and does not change the outcome of the write.
    async fn refresh(&self, owner_id: &str) {
        if let Err(e) = self.list(Some(owner_id)).await {
            warn!("Could not refresh books for {}: {}", owner_id, e);
        }
    }
}
