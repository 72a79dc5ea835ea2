//! Upload-and-convert endpoint.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::Stream;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use sc_av::{CleanupGuard, ConversionJob};
use sc_core::media;

use crate::context::AppContext;
use crate::error::AppError;

/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "audio";

/// POST /api/convert
///
/// Accepts one audio file in the `audio` field, converts it, and streams the
/// SILK file back as an attachment. The upload, its PCM intermediate, and the
/// output are removed once the response body is finished or dropped.
pub async fn convert(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let limit = ctx.config.upload.max_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(original) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let ext = media::extension_of(&original)
            .filter(|e| media::is_supported_extension(e))
            .ok_or_else(|| {
                sc_core::Error::Validation(format!(
                    "Unsupported file format. Supported formats: {}",
                    media::supported_list()
                ))
            })?;

        tokio::fs::create_dir_all(ctx.upload_dir.as_path())
            .await
            .map_err(sc_core::Error::from)?;
        let job = ConversionJob::for_upload(&ctx.upload_dir, &ext);
        let guard = job.cleanup_all();

        let received = save_field(field, &job, limit).await?;
        tracing::debug!(file = %original, bytes = received, "Upload received");

        ctx.converter
            .run(&job)
            .await
            .map_err(|e| AppError::conversion_failed(&e))?;

        return download(&job, &original, guard).await;
    }

    Err(sc_core::Error::Validation("No audio file uploaded".into()).into())
}

/// Stream a field into the job's source path, enforcing the size cap.
async fn save_field(
    mut field: Field<'_>,
    job: &ConversionJob,
    limit: u64,
) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(&job.source)
        .await
        .map_err(sc_core::Error::from)?;
    let mut written: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        written += chunk.len() as u64;
        if written > limit {
            return Err(sc_core::Error::PayloadTooLarge { limit }.into());
        }
        file.write_all(&chunk).await.map_err(sc_core::Error::from)?;
    }

    file.flush().await.map_err(sc_core::Error::from)?;
    Ok(written)
}

async fn download(
    job: &ConversionJob,
    original: &str,
    guard: CleanupGuard,
) -> Result<Response, AppError> {
    let file = tokio::fs::File::open(&job.output)
        .await
        .map_err(|e| AppError::conversion_failed(&sc_core::Error::from(e)))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| AppError::conversion_failed(&sc_core::Error::from(e)))?
        .len();

    let name = media::silk_file_name(original);
    let body = Body::from_stream(CleanupStream {
        inner: ReaderStream::new(file),
        _guard: guard,
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, content_disposition(&name))
        .header(header::CONTENT_LENGTH, len)
        .body(body)
        .map_err(|e| sc_core::Error::Internal(e.to_string()).into())
}

/// File stream that removes the job's artifacts when it is dropped, whether
/// the client read it to the end or went away.
struct CleanupStream {
    inner: ReaderStream<tokio::fs::File>,
    _guard: CleanupGuard,
}

impl Stream for CleanupStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

fn multipart_error(e: MultipartError, limit: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        sc_core::Error::PayloadTooLarge { limit }.into()
    } else {
        sc_core::Error::Validation(e.body_text()).into()
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8
/// name.
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(name.len() * 3);
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
