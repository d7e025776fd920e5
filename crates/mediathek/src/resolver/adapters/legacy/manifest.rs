//! Secondary documents referenced by legacy format entries: meta-file
//! redirects and SMIL-style playlists.

use reqwest::header::HeaderMap;
use tracing::{debug, instrument, warn};

use crate::{
    markup::{XmlDocument, XmlElement},
    media::{ContainerFormat, QualityTier, StreamDescriptor},
    resolver::{error::ResolveError, fetcher::FetchContext},
};

const DEFAULT_STREAM_URL_PATH: &str = "/meta/default-stream-url";
const PARAM_GROUP: &str = "paramGroup";
const VIDEO: &str = "video";

/// Fetch failures become manifest errors, except cancellation which must
/// keep stopping the whole resolution.
fn manifest_error(uri: &str, e: ResolveError) -> ResolveError {
    match e {
        ResolveError::Cancelled => ResolveError::Cancelled,
        other => ResolveError::manifest(uri, other),
    }
}

async fn fetch_xml(
    ctx: &FetchContext,
    uri: &str,
    headers: &HeaderMap,
) -> Result<XmlDocument, ResolveError> {
    let body = ctx
        .fetch(uri, headers)
        .await
        .map_err(|e| manifest_error(uri, e))?;
    XmlDocument::parse(&body).map_err(|e| manifest_error(uri, e))
}

/// Follows a meta-file redirect to the real stream URI.
#[instrument(skip(ctx, headers), level = "debug")]
pub(super) async fn resolve_meta_file(
    ctx: &FetchContext,
    uri: &str,
    headers: &HeaderMap,
) -> Result<String, ResolveError> {
    let doc = fetch_xml(ctx, uri, headers).await?;
    let target = doc
        .query_text(DEFAULT_STREAM_URL_PATH)
        .ok_or_else(|| ResolveError::manifest(uri, "no default-stream-url"))?;
    debug!(%target, "Meta file redirect");
    Ok(target)
}

/// Fetches a SMIL playlist and turns each of its videos into an rtmp descriptor.
#[instrument(skip(ctx, headers), level = "debug")]
pub(super) async fn resolve_smil(
    ctx: &FetchContext,
    uri: &str,
    headers: &HeaderMap,
) -> Result<Vec<StreamDescriptor>, ResolveError> {
    let doc = fetch_xml(ctx, uri, headers).await?;
    parse_smil(&doc, uri)
}

pub(super) fn parse_smil(doc: &XmlDocument, uri: &str) -> Result<Vec<StreamDescriptor>, ResolveError> {
    let params = doc
        .find_first(PARAM_GROUP)
        .ok_or_else(|| ResolveError::manifest(uri, "no paramGroup"))?;
    let host = params
        .param("host")
        .ok_or_else(|| ResolveError::manifest(uri, "no host param"))?;
    let app = params
        .param("app")
        .ok_or_else(|| ResolveError::manifest(uri, "no app param"))?;

    let descriptors: Vec<_> = doc
        .find_all(VIDEO)
        .into_iter()
        .filter_map(|video| match smil_video(video, host, app) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(error = %e, manifest = uri, "Skipping manifest entry");
                None
            }
        })
        .collect();

    debug!(count = descriptors.len(), "SMIL candidates");
    Ok(descriptors)
}

fn smil_video(video: &XmlElement, host: &str, app: &str) -> Result<StreamDescriptor, ResolveError> {
    let src = video
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .ok_or_else(|| ResolveError::Structure("video without src".to_string()))?;
    let tier: QualityTier = video
        .param("quality")
        .ok_or_else(|| ResolveError::Structure(format!("no quality for {src}")))?
        .parse()?;

    StreamDescriptor::builder(format!("rtmp://{host}/{app}/{src}"), tier)
        .container_format(ContainerFormat::Mp4)
        .build()
}
