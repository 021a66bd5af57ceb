// Chunked JSON streaming utilities
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Create a chunked streaming response, one length-prefixed JSON message per chunk
pub async fn chunked_json_stream<S, T>(
    stream: S,
    compress: bool,
) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = Arc<T>> + Send + 'static,
    T: Serialize + Send + Sync + 'static,
{
    let byte_stream =
        stream.then(move |msg| async move { encode_chunk(msg.as_ref(), compress).await });

    let body = Body::from_stream(byte_stream);

    // Chunks are compressed individually, so no Content-Encoding on the response.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize one message: 4-byte big-endian length, then the (optionally Brotli) JSON payload
pub async fn encode_chunk<T: Serialize>(msg: &T, compress: bool) -> Result<Bytes, std::io::Error> {
    let json_bytes = serde_json::to_vec(msg)?;

    let payload = if compress {
        brotli_compress(json_bytes).await?
    } else {
        json_bytes
    };

    let length = payload.len() as u32;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// The current value of `rx`, then every change, until the sender is dropped or
/// `shutdown` flips.
pub fn watch_stream<T>(
    mut rx: watch::Receiver<Arc<T>>,
    mut shutdown: watch::Receiver<bool>,
) -> impl Stream<Item = Arc<T>>
where
    T: Send + Sync + 'static,
{
    async_stream::stream! {
        let stopped = *shutdown.borrow_and_update();
        if !stopped {
            let current = rx.borrow_and_update().clone();
            yield current;

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
                let next = rx.borrow_and_update().clone();
                yield next;
            }
        }
    }
}

/// Chunked response over [`watch_stream`]
pub async fn stream_from_watch<T>(
    rx: watch::Receiver<Arc<T>>,
    shutdown: watch::Receiver<bool>,
    compress: bool,
) -> impl IntoResponse
where
    T: Serialize + Send + Sync + 'static,
{
    match chunked_json_stream(watch_stream(rx, shutdown), compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
