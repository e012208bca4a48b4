//! Uploaded program files: sanitation, embedding, storage.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use liftwise_db::models::FileVector;
use liftwise_db::queries::file_vectors;

use crate::error::ServiceError;
use crate::llm::EmbeddingClient;
use crate::text::truncate_chars;

/// Stored upload text is cut to this many characters.
pub const MAX_UPLOAD_CHARS: usize = 50_000;

pub const TRUNCATION_MARKER: &str = "\n\n[FILE TRUNCATED - Original file was too large]";

/// Decode upload bytes into text that Postgres will accept.
///
/// Invalid UTF-8 is replaced, NUL characters are removed, and overlong text
/// is cut with [`TRUNCATION_MARKER`] appended.
pub fn sanitize_upload(bytes: &[u8]) -> String {
    let text: String = String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != '\0')
        .collect();

    if text.chars().count() > MAX_UPLOAD_CHARS {
        let mut cut = truncate_chars(&text, MAX_UPLOAD_CHARS).to_owned();
        cut.push_str(TRUNCATION_MARKER);
        cut
    } else {
        text
    }
}

/// Sanitize, embed, and store an upload.
///
/// Returns `None` without calling the embedder when the file holds no text.
pub async fn store_upload(
    pool: &PgPool,
    embedder: &dyn EmbeddingClient,
    user_id: Uuid,
    filename: &str,
    bytes: &[u8],
) -> Result<Option<FileVector>, ServiceError> {
    let text = sanitize_upload(bytes);
    if text.trim().is_empty() {
        warn!(user_id = %user_id, filename, "ignoring empty upload");
        return Ok(None);
    }

    let embedding = embedder.embed(&text).await.map_err(ServiceError::Embedding)?;
    let row = file_vectors::insert_file_vector(pool, user_id, filename, &text, &embedding).await?;

    info!(
        user_id = %user_id,
        filename,
        chars = text.chars().count(),
        dims = embedding.len(),
        "stored upload"
    );
    Ok(Some(row))
}
