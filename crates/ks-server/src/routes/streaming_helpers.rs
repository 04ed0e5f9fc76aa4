//! Range-aware file serving for the media route.
//!
//! Resolves a request path inside the storage root, picks the content type
//! from the allow-list, and streams the full file or one byte range in
//! 64KB chunks via `ReaderStream`, so memory stays bounded regardless of
//! file size.

use std::io::SeekFrom;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures::TryStreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use ks_core::media::{signature_matches, SIGNATURE_SNIFF_LEN};
use ks_core::range::parse_range_header;
use ks_core::storage::segments_display;
use ks_core::{Error, MimeTable, Result, StorageRoot};

/// Chunk size for streamed bodies.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Uploads are never modified in place, so clients may cache them for a day.
pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=86400, immutable";

/// Everything the media pipeline needs besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct MediaSource<'a> {
    pub storage: &'a StorageRoot,
    pub mime: &'a MimeTable,
    pub verify_signatures: bool,
}

/// Serve one media file, honoring an optional `Range` header.
///
/// Returns `200` with the whole file when `range_header` is `None`, otherwise
/// `206` with the requested slice. Rejections come back as [`Error`] values
/// for the caller to render.
pub async fn serve_media<S: AsRef<str>>(
    source: MediaSource<'_>,
    segments: &[S],
    range_header: Option<&str>,
) -> Result<Response> {
    let rel_path = segments_display(segments);
    let not_found = || Error::not_found("file", &rel_path);

    let candidate = source.storage.candidate(segments)?;
    let canonical = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|_| not_found())?;
    source.storage.ensure_contains(&canonical)?;

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let content_type = source.mime.for_path(&canonical).ok_or_else(|| {
        Error::UnsupportedMediaType(
            canonical
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "(none)".into()),
        )
    })?;

    let file_size = metadata.len();
    let mut file = tokio::fs::File::open(&canonical).await?;

    if source.verify_signatures {
        let head = read_prefix(&mut file, SIGNATURE_SNIFF_LEN).await?;
        if !signature_matches(&head, content_type) {
            return Err(Error::UnsupportedMediaType(format!(
                "content of {rel_path} does not match {content_type}"
            )));
        }
    }

    let Some(range_header) = range_header else {
        file.seek(SeekFrom::Start(0)).await?;
        tracing::trace!(path = %rel_path, size = file_size, "Serving full file");
        return build_response(
            StatusCode::OK,
            content_type,
            file_size,
            None,
            stream_body(file.take(file_size), canonical),
        );
    };

    let range = parse_range_header(range_header, file_size)?;
    file.seek(SeekFrom::Start(range.start)).await?;

    tracing::trace!(
        path = %rel_path,
        start = range.start,
        end = range.end,
        size = file_size,
        "Serving byte range"
    );

    build_response(
        StatusCode::PARTIAL_CONTENT,
        content_type,
        range.len(),
        Some(range.content_range(file_size)),
        stream_body(file.take(range.len()), canonical),
    )
}

/// Read up to `limit` bytes from the start of `file`.
async fn read_prefix(file: &mut tokio::fs::File, limit: usize) -> Result<Vec<u8>> {
    let mut head = Vec::with_capacity(limit);
    (&mut *file).take(limit as u64).read_to_end(&mut head).await?;
    Ok(head)
}

/// Wrap a reader as a response body. Read errors are logged and surface as
/// stream errors, which aborts the connection instead of finishing the
/// response. Dropping the body closes the file.
fn stream_body<R>(reader: R, path: PathBuf) -> Body
where
    R: AsyncRead + Send + 'static,
{
    let stream = ReaderStream::with_capacity(reader, STREAM_CHUNK_SIZE).inspect_err(move |e| {
        tracing::warn!(path = %path.display(), error = %e, "Media stream read failed");
    });
    Body::from_stream(stream)
}

fn build_response(
    status: StatusCode,
    content_type: &'static str,
    content_length: u64,
    content_range: Option<String>,
    body: Body,
) -> Result<Response> {
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
        .header(header::CONTENT_LENGTH, content_length.to_string())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, MEDIA_CACHE_CONTROL)
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff");

    if let Some(content_range) = content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    builder
        .body(body)
        .map_err(|e| Error::Internal(format!("failed to build media response: {e}")))
}
