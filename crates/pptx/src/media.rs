//! Payload resolution for media parts.
//!
//! Every image, audio and video record names a part under `ppt/media/`.
//! Before the package is written, each payload is turned into bytes: inline
//! data is base64-decoded, files are read from disk and built-in pictures
//! are embedded in the crate.

use crate::rels::{Payload, RelationshipRegistry, ResourceKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use deckgen_core::{Error, Result};
use futures::future;
use std::collections::HashSet;

/// 1x1 transparent PNG used for SVG fallbacks.
const BUILTIN_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Poster frame of audio and video.
const PLAY_BUTTON_PNG: &[u8] = include_bytes!("../resources/play_button.png");

/// A media part waiting for its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadJob {
    /// Path inside the package.
    pub path: String,
    /// Byte source.
    pub payload: Payload,
}

/// A media part with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPayload {
    /// Path inside the package.
    pub path: String,
    /// Part content.
    pub bytes: Vec<u8>,
}

/// Collect the payloads of every registry, in the order given.
///
/// Links, charts and online video carry no payload. Records sharing a
/// package path (the two records of an audio/video pair) yield one job.
pub fn collect_jobs(registries: &[&RelationshipRegistry]) -> Vec<PayloadJob> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();

    for registry in registries {
        for record in registry.media_records() {
            if record.kind == ResourceKind::OnlineVideo || record.payload == Payload::External {
                continue;
            }
            let path = record.package_path();
            if seen.insert(path.clone()) {
                jobs.push(PayloadJob {
                    path,
                    payload: record.payload.clone(),
                });
            }
        }
    }

    jobs
}

/// Resolve every job concurrently. The first failure aborts the whole set.
pub async fn resolve_all(jobs: Vec<PayloadJob>) -> Result<Vec<ResolvedPayload>> {
    log::debug!("Resolving {} media payloads", jobs.len());
    future::try_join_all(jobs.into_iter().map(resolve)).await
}

/// Resolve a single job.
pub async fn resolve(job: PayloadJob) -> Result<ResolvedPayload> {
    let bytes = match &job.payload {
        Payload::Inline(data) => decode_inline(data)?,
        Payload::File(path) => tokio::fs::read(path)
            .await
            .map_err(|e| Error::PayloadError(format!("Failed to read {}: {}", path, e)))?,
        Payload::Builtin => builtin_png()?,
        Payload::PlayButton => PLAY_BUTTON_PNG.to_vec(),
        Payload::External => Vec::new(),
    };

    Ok(ResolvedPayload {
        path: job.path,
        bytes,
    })
}

/// Add the missing parts of a `type/subtype;base64,` header.
///
/// Callers pass all sorts of shapes: bare base64, `base64,...` without a
/// type, or `image/png,...` without the encoding marker.
pub fn normalize_inline(data: &str) -> String {
    let has_comma = data.contains(',');
    let has_semicolon = data.contains(';');

    if !has_comma {
        format!("image/png;base64,{}", data)
    } else if !has_semicolon {
        format!("image/png;{}", data)
    } else {
        data.to_string()
    }
}

/// Decode an inline payload: everything after the last `,`.
pub fn decode_inline(data: &str) -> Result<Vec<u8>> {
    let normalized = normalize_inline(data);
    let encoded = normalized.rsplit(',').next().unwrap_or_default();
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::PayloadError(format!("Invalid base64 payload: {}", e)))
}

fn builtin_png() -> Result<Vec<u8>> {
    STANDARD
        .decode(BUILTIN_PNG)
        .map_err(|e| Error::PayloadError(format!("Invalid built-in image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::{MediaKind, ResourceCounters};

    #[test]
    fn test_normalize_inline() {
        assert_eq!(normalize_inline("AAAA"), "image/png;base64,AAAA");
        assert_eq!(normalize_inline("a;AAAA"), "image/png;base64,a;AAAA");
        assert_eq!(normalize_inline("base64,AAAA"), "image/png;base64,AAAA");
        assert_eq!(
            normalize_inline("image/gif;base64,AAAA"),
            "image/gif;base64,AAAA"
        );
    }

    #[test]
    fn test_decode_inline() {
        assert_eq!(decode_inline("image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_inline("aGVsbG8=").unwrap(), b"hello");
        assert!(matches!(
            decode_inline("image/png;base64,***"),
            Err(Error::PayloadError(_))
        ));
    }

    #[test]
    fn test_builtin_png_signature() {
        let bytes = builtin_png().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_media_preview_is_play_button() {
        let mut rels = RelationshipRegistry::new(ResourceCounters::shared());
        rels.register_media(MediaKind::Audio, Payload::File("a.mp3".into()), "mp3", None);

        let preview = collect_jobs(&[&rels])
            .into_iter()
            .find(|j| j.path.ends_with(".png"))
            .unwrap();
        assert_eq!(preview.payload, Payload::PlayButton);
        let resolved = resolve(preview).await.unwrap();
        assert_eq!(&resolved.bytes[1..4], b"PNG");
        assert!(resolved.bytes.len() > builtin_png().unwrap().len());
    }

    #[test]
    fn test_collect_jobs_dedups_shared_targets() {
        let mut rels = RelationshipRegistry::new(ResourceCounters::shared());
        rels.register_image(Payload::File("a.png".into()), "png");
        rels.register_media(
            MediaKind::Video,
            Payload::Inline("video/mp4;base64,AAAA".into()),
            "mp4",
            None,
        );
        rels.register_media(
            MediaKind::Online,
            Payload::External,
            "mp4",
            Some("https://example.com/v"),
        );

        let jobs = collect_jobs(&[&rels]);
        let paths: Vec<&str> = jobs.iter().map(|j| j.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "ppt/media/image1.png",
                "ppt/media/media1.mp4",
                "ppt/media/image2.png",
                "ppt/media/image3.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_all_fails_on_missing_file() {
        let jobs = vec![
            PayloadJob {
                path: "ppt/media/image1.png".into(),
                payload: Payload::Builtin,
            },
            PayloadJob {
                path: "ppt/media/image2.png".into(),
                payload: Payload::File("/definitely/not/here.png".into()),
            },
        ];
        assert!(matches!(
            resolve_all(jobs).await,
            Err(Error::PayloadError(_))
        ));
    }
}
