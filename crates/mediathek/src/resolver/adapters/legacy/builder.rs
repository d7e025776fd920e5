use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::{
    config::ResolverConfig,
    markup::{XmlDocument, XmlElement},
    media::{ContainerFormat, QualityTier, StreamDescriptor, VideoInfo},
    resolver::{
        adapters::{
            BackendAdapter, BackendKind, Extraction, PageContent, check_airtime,
            legacy::manifest::{resolve_meta_file, resolve_smil},
        },
        error::ResolveError,
        fetcher::{FetchContext, browser_headers},
    },
};

const STATUS_OK: &str = "ok";
const WIDESCREEN_RATIO: &str = "16:9";
const EXCLUDED_BASETYPES: &[&str] = &["3gp", "rtsp"];
const META_FILE_BASETYPE: &str = "zdfmeta";
const MANIFEST_BASETYPE: &str = "smil";
const AIRTIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Adapter for the XML API of the previous generation.
pub struct LegacyXmlAdapter {
    config: ResolverConfig,
}

/// One `formitaet` element, copied out of the document.
#[derive(Debug, Clone)]
struct FormatEntry {
    uri: String,
    basetype: String,
    ratio: Option<String>,
    quality: Option<String>,
    height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatKind {
    MetaRedirect,
    Manifest,
    Direct,
}

impl LegacyXmlAdapter {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    fn check_status(doc: &XmlDocument) -> Result<(), ResolveError> {
        let status = doc.query_text("status/statuscode").unwrap_or_default();
        if status == STATUS_OK {
            return Ok(());
        }
        Err(ResolveError::BackendError {
            status,
            debug: doc.query_text("status/debuginfo").unwrap_or_default(),
        })
    }

    fn parse_video_info(doc: &XmlDocument) -> VideoInfo {
        VideoInfo {
            title: doc.query_text("information/title"),
            description: doc.query_text("information/detail"),
            published: doc
                .query_text("details/airtime")
                .and_then(|raw| Self::parse_airtime(&raw)),
            duration: doc
                .query_text("details/lengthSec")
                .and_then(|raw| raw.parse().ok()),
            thumbnail: Self::largest_teaser_image(doc),
        }
    }

    /// Airtimes are local Berlin time without an offset.
    fn parse_airtime(raw: &str) -> Option<DateTime<FixedOffset>> {
        let naive = match NaiveDateTime::parse_from_str(raw.trim(), AIRTIME_FORMAT) {
            Ok(naive) => naive,
            Err(e) => {
                warn!(error = %e, airtime = raw, "Couldn't parse airtime");
                return None;
            }
        };
        Berlin
            .from_local_datetime(&naive)
            .earliest()
            .map(|airtime| airtime.fixed_offset())
    }

    fn largest_teaser_image(doc: &XmlDocument) -> Option<String> {
        doc.find_all("teaserimage")
            .into_iter()
            .filter_map(|image| {
                let width = image
                    .attr("key")
                    .and_then(|key| key.split_once('x'))
                    .and_then(|(width, _)| width.parse::<u32>().ok())
                    .unwrap_or(0);
                let uri = image.text();
                (!uri.is_empty()).then_some((width, uri))
            })
            .max_by_key(|(width, _)| *width)
            .map(|(_, uri)| uri)
    }

    fn format_entries(doc: &XmlDocument) -> Vec<FormatEntry> {
        doc.find_all("formitaet")
            .into_iter()
            .filter_map(Self::format_entry)
            .collect()
    }

    fn format_entry(element: &XmlElement) -> Option<FormatEntry> {
        let Some(uri) = element.path_text("url") else {
            debug!("Format without url");
            return None;
        };
        Some(FormatEntry {
            uri,
            basetype: element.attr("basetype").unwrap_or_default().to_string(),
            ratio: element.path_text("ratio"),
            quality: element.path_text("quality"),
            height: element.path_text("height").and_then(|h| h.parse().ok()),
        })
    }

    /// `None` marks a deliberate exclusion.
    fn classify(&self, entry: &FormatEntry) -> Option<FormatKind> {
        if let Some(marker) = self
            .config
            .broken_host_markers
            .iter()
            .find(|marker| entry.uri.contains(marker.as_str()))
        {
            debug!(uri = %entry.uri, marker, "Skipping broken host");
            return None;
        }
        if EXCLUDED_BASETYPES
            .iter()
            .any(|excluded| entry.basetype.contains(excluded))
        {
            debug!(basetype = %entry.basetype, "Skipping excluded basetype");
            return None;
        }
        if entry.ratio.as_deref() != Some(WIDESCREEN_RATIO) {
            debug!(ratio = ?entry.ratio, uri = %entry.uri, "Skipping non widescreen format");
            return None;
        }

        if entry.basetype.contains(META_FILE_BASETYPE) {
            Some(FormatKind::MetaRedirect)
        } else if entry.basetype.contains(MANIFEST_BASETYPE) {
            Some(FormatKind::Manifest)
        } else {
            Some(FormatKind::Direct)
        }
    }

    /// Candidate from an entry whose URI points at the media itself.
    fn direct_descriptor(entry: &FormatEntry) -> Option<StreamDescriptor> {
        let Some(container) = ContainerFormat::from_uri_suffix(&entry.uri) else {
            debug!(uri = %entry.uri, "Unsupported container");
            return None;
        };
        let Some(height) = entry.height else {
            debug!(uri = %entry.uri, "No height reported");
            return None;
        };

        let descriptor = entry
            .quality
            .as_deref()
            .ok_or_else(|| ResolveError::Structure(format!("no quality for {}", entry.uri)))
            .and_then(|label| label.parse::<QualityTier>())
            .and_then(|tier| {
                StreamDescriptor::builder(entry.uri.as_str(), tier)
                    .container_format(container)
                    .pixel_height(height)
                    .build()
            });

        match descriptor {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(error = %e, uri = %entry.uri, "Couldn't parse video");
                None
            }
        }
    }

    async fn extract_at(
        &self,
        page: &PageContent,
        ctx: &FetchContext,
        now: DateTime<Utc>,
    ) -> Result<Extraction, ResolveError> {
        let doc = XmlDocument::parse(&page.body)?;
        Self::check_status(&doc)?;

        let video = Self::parse_video_info(&doc);
        check_airtime(&self.config, video.published, &page.body, now)?;

        let headers: HeaderMap = browser_headers(&self.config);
        let mut descriptors = Vec::new();

        for mut entry in Self::format_entries(&doc) {
            ctx.ensure_active()?;
            let Some(kind) = self.classify(&entry) else {
                continue;
            };

            match kind {
                FormatKind::Manifest => {
                    match resolve_smil(ctx, &entry.uri, &headers).await {
                        Ok(mut found) => descriptors.append(&mut found),
                        Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                        Err(e) => warn!(error = %e, "Skipping manifest format"),
                    }
                    continue;
                }
                FormatKind::MetaRedirect => match resolve_meta_file(ctx, &entry.uri, &headers).await {
                    Ok(target) => entry.uri = target,
                    Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                    Err(e) => {
                        warn!(error = %e, "Skipping meta file format");
                        continue;
                    }
                },
                FormatKind::Direct => {}
            }

            if let Some(descriptor) = Self::direct_descriptor(&entry) {
                descriptors.push(descriptor);
            }
        }

        debug!(count = descriptors.len(), "Legacy candidates");
        Ok(Extraction { descriptors, video })
    }
}

#[async_trait]
impl BackendAdapter for LegacyXmlAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Legacy
    }

    async fn extract(
        &self,
        page: &PageContent,
        ctx: &FetchContext,
    ) -> Result<Extraction, ResolveError> {
        self.extract_at(page, ctx, Utc::now()).await
    }
}
