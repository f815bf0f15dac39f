//! Note and photo removal that keeps the object store in step with the rows.

use tracing::warn;

use diary_core::{NoteRepository, Photo, PhotoRepository, Result};
use diary_db::StorageBackend;

/// Delete a note after removing its photo blobs.
///
/// Blob deletions are best-effort: a failure is logged and the row deletion
/// still runs. Returns the number of blobs that were removed.
pub async fn delete_note_with_photos(
    notes: &dyn NoteRepository,
    photos: &dyn PhotoRepository,
    storage: &dyn StorageBackend,
    note_id: i64,
) -> Result<usize> {
    let attached = photos.list_for_note(note_id).await?;
    let mut removed = 0;
    for photo in &attached {
        if remove_blob(storage, photo).await {
            removed += 1;
        }
    }
    notes.delete(note_id).await?;
    Ok(removed)
}

/// Delete one photo: blob first (best-effort), then the row.
pub async fn delete_photo(
    photos: &dyn PhotoRepository,
    storage: &dyn StorageBackend,
    photo: &Photo,
) -> Result<()> {
    remove_blob(storage, photo).await;
    photos.delete(photo.id).await
}

async fn remove_blob(storage: &dyn StorageBackend, photo: &Photo) -> bool {
    match storage.delete(photo.storage_key()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                subsystem = "api",
                component = "notes",
                op = "delete_photo_blob",
                photo_id = photo.id,
                note_id = photo.note_id,
                error = %e,
                "Failed to delete photo from object store"
            );
            false
        }
    }
}
