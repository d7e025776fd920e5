use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    config::ResolverConfig,
    markup::{HtmlDocument, json},
    media::{ContainerFormat, QualityTier, StreamDescriptor, VideoInfo},
    resolver::{
        adapters::{
            BackendAdapter, BackendKind, Extraction, PageContent, check_airtime,
            modern::models::{
                MAIN_VIDEO_CONTENT, PLAYABLE_MIME_TYPES, PLAYER_ID_PLACEHOLDER, PlayerParams,
                REL_BRAND, REL_PTMD_TEMPLATE, REL_TARGET,
            },
        },
        error::ResolveError,
        fetcher::{FetchContext, browser_headers, insert_header},
    },
};

const PLAYER_BOX_SELECTOR: &str = "div[class~=b-playerbox]";
const PLAYER_PARAMS_ATTR: &str = "data-zdfplayer-jsb";
const TITLE_SELECTOR: &str = "h1.big-headline";
const DESCRIPTION_SELECTOR: &str = "p.item-description";
const AIRTIME_SELECTOR: &str = "dd[class~=teaser-info] time";

/// Adapter for the current API generation: an HTML page carrying a player
/// configuration, a token-authenticated player config fetch and a stream
/// manifest fetch.
pub struct ModernJsonAdapter {
    config: ResolverConfig,
}

/// Result of the page stage. Owned, so it can cross the fetch stages.
#[derive(Debug)]
struct PageData {
    params: PlayerParams,
    video: VideoInfo,
}

impl ModernJsonAdapter {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Page stage: metadata, air-date gate, embedded player parameters.
    fn parse_page(&self, page: &PageContent, now: DateTime<Utc>) -> Result<PageData, ResolveError> {
        let doc = HtmlDocument::parse(&page.body);

        let video = VideoInfo {
            title: doc.text_of(TITLE_SELECTOR)?,
            description: doc.text_of(DESCRIPTION_SELECTOR)?,
            published: Self::parse_airtime(&doc),
            ..Default::default()
        };

        check_airtime(&self.config, video.published, &page.body, now)?;

        let params = match doc.attr_of(PLAYER_BOX_SELECTOR, PLAYER_PARAMS_ATTR)? {
            Some(raw) => serde_json::from_str::<PlayerParams>(&raw)?,
            None if page.body.contains(&self.config.unavailable_marker) => {
                return Err(ResolveError::VideoUnavailable(
                    self.config.unavailable_marker.clone(),
                ));
            }
            None => return Err(ResolveError::ConfigNotFound),
        };

        Ok(PageData { params, video })
    }

    fn parse_airtime(doc: &HtmlDocument) -> Option<DateTime<FixedOffset>> {
        let raw = match doc.attr_of(AIRTIME_SELECTOR, "datetime") {
            Ok(Some(raw)) => raw,
            _ => return None,
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(airtime) => Some(airtime),
            Err(e) => {
                warn!(error = %e, airtime = %raw, "Couldn't parse publish date");
                None
            }
        }
    }

    fn api_headers(&self, token: &str, referer: &str) -> HeaderMap {
        let mut headers = browser_headers(&self.config);
        insert_header(&mut headers, "accept", &self.config.api_accept);
        insert_header(&mut headers, &self.config.auth_header, &format!("Bearer {token}"));
        insert_header(&mut headers, "referer", referer);
        headers
    }

    #[instrument(skip(self, ctx, headers), level = "debug")]
    async fn fetch_player_config(
        &self,
        ctx: &FetchContext,
        uri: &str,
        headers: &HeaderMap,
    ) -> Result<Value, ResolveError> {
        let body = ctx.fetch(uri, headers).await?;
        let player_config: Value = serde_json::from_str(&body)?;

        let target = json::get_path(&player_config, &[REL_BRAND, REL_TARGET])?;
        if !json::get_bool(target, "hasVideo")? {
            return Err(ResolveError::NoVideoAvailable);
        }
        Ok(player_config)
    }

    fn parse_duration(player_config: &Value) -> Option<u64> {
        json::get_path(player_config, &[MAIN_VIDEO_CONTENT, REL_TARGET])
            .and_then(|target| json::get_i64(target, "duration"))
            .ok()
            .and_then(|seconds| u64::try_from(seconds).ok())
    }

    /// Prefers the original layout, then the widest `WxH` layout.
    fn parse_thumbnail(player_config: &Value) -> Option<String> {
        let layouts = json::get_object(player_config, "teaserImageRef")
            .and_then(|teaser| json::get_map(teaser, "layouts"));
        let layouts = match layouts {
            Ok(layouts) => layouts,
            Err(e) => {
                debug!(error = %e, "No thumbnail in player config");
                return None;
            }
        };

        if let Some(original) = layouts.get("original").and_then(Value::as_str) {
            return Some(original.to_string());
        }
        layouts
            .iter()
            .filter_map(|(key, value)| Some((key, value.as_str()?)))
            .max_by_key(|(key, _)| {
                key.split_once('x')
                    .and_then(|(width, _)| width.parse::<u32>().ok())
                    .unwrap_or(0)
            })
            .map(|(_, uri)| uri.to_string())
    }

    fn manifest_uri(&self, player_config: &Value) -> Result<String, ResolveError> {
        let target = json::get_path(player_config, &[MAIN_VIDEO_CONTENT, REL_TARGET])?;
        let template = json::get_str(target, REL_PTMD_TEMPLATE)?;
        let path = template.replace(PLAYER_ID_PLACEHOLDER, &self.config.player_id);
        if path.starts_with('/') {
            Ok(format!("{}{}", self.config.api_base_uri.trim_end_matches('/'), path))
        } else {
            Ok(path)
        }
    }

    #[instrument(skip(self, ctx, headers), level = "debug")]
    async fn fetch_manifest(
        &self,
        ctx: &FetchContext,
        uri: &str,
        headers: &HeaderMap,
    ) -> Result<Value, ResolveError> {
        let body = ctx.fetch(uri, headers).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Walks `priorityList → formitaeten → qualities → audio.tracks`.
    ///
    /// A missing `priorityList` fails the stage; everything below it only
    /// drops the affected candidates.
    fn descriptors_from_manifest(manifest: &Value) -> Result<Vec<StreamDescriptor>, ResolveError> {
        let mut descriptors = Vec::new();

        for group in json::get_array(manifest, "priorityList")? {
            let formats = match json::get_array(group, "formitaeten") {
                Ok(formats) => formats,
                Err(e) => {
                    warn!(error = %e, "Skipping manifest group");
                    continue;
                }
            };

            for format in formats {
                let mime_type = match json::get_str(format, "mimeType") {
                    Ok(mime_type) => mime_type,
                    Err(e) => {
                        warn!(error = %e, "Skipping manifest format");
                        continue;
                    }
                };
                if !PLAYABLE_MIME_TYPES.contains(&mime_type) {
                    debug!(mime_type, "Skipping unplayable format");
                    continue;
                }
                let container = ContainerFormat::from_mime_type(mime_type);

                let qualities = match json::get_array(format, "qualities") {
                    Ok(qualities) => qualities,
                    Err(e) => {
                        warn!(error = %e, mime_type, "Skipping manifest format");
                        continue;
                    }
                };

                for entry in qualities {
                    match Self::quality_entry(entry, container) {
                        Ok(mut found) => descriptors.append(&mut found),
                        Err(e) => warn!(error = %e, "Couldn't parse video"),
                    }
                }
            }
        }

        debug!(count = descriptors.len(), "Manifest candidates");
        Ok(descriptors)
    }

    /// One descriptor per audio track of a quality entry.
    fn quality_entry(
        entry: &Value,
        container: Option<ContainerFormat>,
    ) -> Result<Vec<StreamDescriptor>, ResolveError> {
        let tier: QualityTier = json::get_str(entry, "quality")?.parse()?;
        let audio = json::get_object(entry, "audio")?;

        let mut descriptors = Vec::new();
        for track in json::get_array(audio, "tracks")? {
            let descriptor = json::get_str(track, "uri").and_then(|uri| {
                StreamDescriptor::builder(uri, tier)
                    .container_format_opt(container)
                    .build()
            });
            match descriptor {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => warn!(error = %e, %tier, "Skipping audio track"),
            }
        }
        Ok(descriptors)
    }

    async fn extract_at(
        &self,
        page: &PageContent,
        ctx: &FetchContext,
        now: DateTime<Utc>,
    ) -> Result<Extraction, ResolveError> {
        let PageData { params, mut video } = self.parse_page(page, now)?;
        let headers = self.api_headers(&params.api_token, &page.uri);

        let player_config = self.fetch_player_config(ctx, &params.content, &headers).await?;
        video.duration = Self::parse_duration(&player_config);
        video.thumbnail = Self::parse_thumbnail(&player_config);

        let manifest_uri = self.manifest_uri(&player_config)?;
        let manifest = self.fetch_manifest(ctx, &manifest_uri, &headers).await?;
        let descriptors = Self::descriptors_from_manifest(&manifest)?;

        Ok(Extraction { descriptors, video })
    }
}

#[async_trait]
impl BackendAdapter for ModernJsonAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Modern
    }

    async fn extract(
        &self,
        page: &PageContent,
        ctx: &FetchContext,
    ) -> Result<Extraction, ResolveError> {
        self.extract_at(page, ctx, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::StaticFetcher;
    use chrono::TimeZone;
    use serde_json::json;

    const PAGE_URI: &str = "https://www.zdf.de/comedy/heute-show/heute-show-vom-1-maerz-100.html";
    const CONFIG_URI: &str = "https://api.zdf.de/content/documents/heute-show-100.json?profile=player";
    const MANIFEST_URI: &str = "https://api.zdf.de/tmd/2/ngplayer_2_3/vod/ptmd/mediathek/190301_sendung_hsh";

    fn page(extra: &str) -> String {
        format!(
            r#"<html><body>
                <h1 class="big-headline">heute-show vom 1. März</h1>
                <p class="item-description">Satire am Freitag.</p>
                <dl><dd class="teaser-info"><time datetime="2019-03-01T22:30:00.000+01:00">01.03.2019</time></dd></dl>
                {extra}
                <div class="b-playerbox b-ratiobox" data-zdfplayer-jsb='{{"apiToken":"secret-token","content":"{CONFIG_URI}"}}'></div>
            </body></html>"#
        )
    }

    fn player_config(has_video: bool) -> String {
        json!({
            "http://zdf.de/rels/brand": { "http://zdf.de/rels/target": { "hasVideo": has_video } },
            "teaserImageRef": { "layouts": {
                "384x216": "https://www.zdf.de/assets/small.jpg",
                "1920x1080": "https://www.zdf.de/assets/large.jpg"
            } },
            "mainVideoContent": { "http://zdf.de/rels/target": {
                "duration": 1800,
                "http://zdf.de/rels/streams/ptmd-template": "/tmd/2/{playerId}/vod/ptmd/mediathek/190301_sendung_hsh"
            } }
        })
        .to_string()
    }

    fn manifest() -> String {
        json!({ "priorityList": [
            { "formitaeten": [
                { "mimeType": "application/x-mpegURL", "qualities": [
                    { "quality": "auto", "audio": { "tracks": [ { "uri": "https://hls.example/auto.m3u8" } ] } }
                ] },
                { "mimeType": "video/webm", "qualities": [
                    { "quality": "hd", "audio": { "tracks": [ { "uri": "https://cdn.example/hd.webm" } ] } }
                ] }
            ] },
            { "formitaeten": [
                { "mimeType": "video/mp4", "qualities": [
                    { "quality": "bogus", "audio": { "tracks": [ { "uri": "https://cdn.example/bogus.mp4" } ] } },
                    { "quality": "veryhigh", "audio": { "tracks": [
                        { "uri": "https://cdn.example/veryhigh_de.mp4" },
                        { "uri": "https://cdn.example/veryhigh_ad.mp4" }
                    ] } },
                    { "quality": "low", "audio": { "tracks": [ { "uri": "https://cdn.example/low.mp4" } ] } }
                ] }
            ] }
        ] })
        .to_string()
    }

    fn fetcher(has_video: bool) -> StaticFetcher {
        StaticFetcher::new()
            .with(CONFIG_URI, &player_config(has_video))
            .with(MANIFEST_URI, &manifest())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 2, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn extracts_every_quality_and_track() {
        let (fetcher, ctx) = fetcher(true).into_context();
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());

        let extraction = adapter
            .extract_at(&PageContent::new(PAGE_URI, page("")), &ctx, now())
            .await
            .unwrap();

        let uris: Vec<_> = extraction.descriptors.iter().map(|d| d.uri.as_str()).collect();
        assert_eq!(
            uris,
            [
                "https://cdn.example/veryhigh_de.mp4",
                "https://cdn.example/veryhigh_ad.mp4",
                "https://cdn.example/low.mp4",
            ]
        );
        assert!(extraction.descriptors.iter().all(|d| d.pixel_height == 0));
        assert!(
            extraction
                .descriptors
                .iter()
                .all(|d| d.container_format == Some(ContainerFormat::Mp4))
        );

        assert_eq!(extraction.video.title.as_deref(), Some("heute-show vom 1. März"));
        assert_eq!(extraction.video.duration, Some(1800));
        assert_eq!(
            extraction.video.thumbnail.as_deref(),
            Some("https://www.zdf.de/assets/large.jpg")
        );
        assert_eq!(fetcher.requested_uris(), [CONFIG_URI, MANIFEST_URI]);
    }

    #[tokio::test]
    async fn secondary_fetches_carry_token_and_pinned_media_type() {
        let (fetcher, ctx) = fetcher(true).into_context();
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());
        adapter
            .extract_at(&PageContent::new(PAGE_URI, page("")), &ctx, now())
            .await
            .unwrap();

        for (_, headers) in fetcher.requests() {
            assert_eq!(headers["api-auth"], "Bearer secret-token");
            assert_eq!(headers["accept"], "application/vnd.de.zdf.v1.0+json");
            assert_eq!(headers["referer"], PAGE_URI);
            assert!(headers.contains_key("user-agent"));
        }
    }

    #[tokio::test]
    async fn has_video_false_is_terminal() {
        let (fetcher, ctx) = fetcher(false).into_context();
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());
        let err = adapter
            .extract_at(&PageContent::new(PAGE_URI, page("")), &ctx, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoVideoAvailable));
        assert_eq!(fetcher.requested_uris(), [CONFIG_URI]);
    }

    #[tokio::test]
    async fn missing_config_with_unavailable_marker_is_video_unavailable() {
        let (_, ctx) = StaticFetcher::new().into_context();
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());
        let body = "<html><body><p>Video leider nicht mehr verfügbar</p></body></html>";
        let err = adapter
            .extract_at(&PageContent::new(PAGE_URI, body), &ctx, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::VideoUnavailable(_)));
        assert!(err.is_content_unavailable());
    }

    #[tokio::test]
    async fn missing_config_without_marker_is_config_not_found() {
        let (_, ctx) = StaticFetcher::new().into_context();
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());
        let body = r#"<html><body><div class="b-playerbox"></div></body></html>"#;
        let err = adapter
            .extract_at(&PageContent::new(PAGE_URI, body), &ctx, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ConfigNotFound));
        assert!(!err.is_content_unavailable());
    }

    #[tokio::test]
    async fn future_broadcast_needs_preview_marker() {
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());
        let before_airing = Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap();

        let (fetcher, ctx) = fetcher(true).into_context();
        let err = adapter
            .extract_at(&PageContent::new(PAGE_URI, page("")), &ctx, before_airing)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotYetAired { .. }));
        assert!(fetcher.requested_uris().is_empty());

        let (_, ctx) = self::fetcher(true).into_context();
        let preview = adapter
            .extract_at(
                &PageContent::new(PAGE_URI, page("<strong>Vorab</strong>")),
                &ctx,
                before_airing,
            )
            .await
            .unwrap();
        assert_eq!(preview.descriptors.len(), 3);
    }

    #[test]
    fn manifest_without_priority_list_fails_the_stage() {
        let err = ModernJsonAdapter::descriptors_from_manifest(&json!({ "foo": [] })).unwrap_err();
        assert!(matches!(err, ResolveError::Structure(_)));
    }

    #[test]
    fn absolute_templates_are_kept() {
        let adapter = ModernJsonAdapter::new(ResolverConfig::default());
        let config = json!({ "mainVideoContent": { "http://zdf.de/rels/target": {
            "http://zdf.de/rels/streams/ptmd-template": "https://other.example/ptmd/{playerId}/x"
        } } });
        assert_eq!(
            adapter.manifest_uri(&config).unwrap(),
            "https://other.example/ptmd/ngplayer_2_3/x"
        );
    }
}
