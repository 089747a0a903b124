use std::sync::Arc;

use bytes::Bytes;
use domains::MediaStorage;

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Bytes,
}

/// Best-effort removal of a stored file. Failures are only logged.
pub(crate) async fn discard(media: &Arc<dyn MediaStorage>, path: Option<String>) {
    let Some(path) = path else { return };
    if let Err(err) = media.remove(&path).await {
        tracing::warn!(%path, error = %err, "failed to remove uploaded file");
    }
}
