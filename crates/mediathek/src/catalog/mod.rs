//! Walks the program listings down to individual video pages.
//!
//! The root lists the A-Z groups, a group page lists programs, and a program
//! page lists its teaser video plus the video cards and clusters below it.

use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::ElementRef;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument, warn};

use crate::config::ResolverConfig;
use crate::markup::HtmlDocument;
use crate::markup::html::{element_attr, element_text, inner_html, select_within};
use crate::resolver::capabilities::CapabilitySnapshot;
use crate::resolver::error::ResolveError;
use crate::resolver::fetcher::{ContentFetcher, FetchContext, browser_headers};
use crate::resolver::media_resolver::{MediaResolver, Resolution};

const ROOT_TITLE: &str = "Sendungen A-Z";
const GROUP_PATH: &str = "/sendungen-a-z?group=";
const PROGRAMS_SELECTOR: &str = "div#aria-teaser-list-shows article[class~=b-content-teaser-item]";
const CARD_LINK_SELECTOR: &str = "h3.teaser-title a";
const TEASER_VIDEO_SELECTOR: &str = "div[class~=item-caption] h3[class~=teaser-title] a";
const CARDS_SELECTOR: &str = "div[class~=b-content-teaser-list] article[class~=b-content-teaser-item]";
const CLUSTERS_SELECTOR: &str = "article[class~=b-cluster-teaser]";

/// Cards without a running time are trailers for programs, not videos.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\s+min").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A page listing further entries.
    Overview,
    /// A video page, resolvable to a stream.
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    pub uri: String,
    pub kind: EntryKind,
}

impl CatalogEntry {
    fn overview(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
            kind: EntryKind::Overview,
        }
    }

    fn video(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
            kind: EntryKind::Video,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == EntryKind::Video
    }
}

/// Outcome of resolving one catalog video.
#[derive(Debug)]
pub struct VideoOutcome {
    pub entry: CatalogEntry,
    pub result: Result<Resolution, ResolveError>,
}

pub struct Catalog {
    fetcher: Arc<dyn ContentFetcher>,
    config: ResolverConfig,
}

impl Catalog {
    pub fn new(config: ResolverConfig, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self { fetcher, config }
    }

    pub fn root_title(&self) -> &'static str {
        ROOT_TITLE
    }

    /// The A-Z group pages. Needs no fetch.
    pub fn root(&self) -> Vec<CatalogEntry> {
        let base = self.config.base_uri.trim_end_matches('/');
        let digits = CatalogEntry::overview("0-9", format!("{base}{GROUP_PATH}0+-+9"));
        let letters = ('a'..='z').map(|letter| {
            CatalogEntry::overview(
                letter.to_ascii_uppercase().to_string(),
                format!("{base}{GROUP_PATH}{letter}"),
            )
        });
        std::iter::once(digits).chain(letters).collect()
    }

    /// Fetches an overview page and lists its children.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, uri: &str) -> Result<Vec<CatalogEntry>, ResolveError> {
        let ctx = FetchContext::new(self.fetcher.clone(), Default::default());
        let body = ctx.fetch(uri, &browser_headers(&self.config)).await?;

        let entries = if uri.contains(GROUP_PATH) {
            self.parse_programs(&body)?
        } else {
            self.parse_program_page(&body)?
        };
        debug!(count = entries.len(), "Listed entries");
        Ok(entries)
    }

    fn parse_programs(&self, body: &str) -> Result<Vec<CatalogEntry>, ResolveError> {
        let doc = HtmlDocument::parse(body);
        let mut entries = Vec::new();
        for card in doc.select_all(PROGRAMS_SELECTOR)? {
            match self.card_link(card)? {
                Some((title, uri)) => entries.push(CatalogEntry::overview(title, uri)),
                None => debug!("Program card without link"),
            }
        }
        Ok(entries)
    }

    fn parse_program_page(&self, body: &str) -> Result<Vec<CatalogEntry>, ResolveError> {
        let doc = HtmlDocument::parse(body);
        let mut entries = Vec::new();

        if let Some(link) = doc.select_first(TEASER_VIDEO_SELECTOR)? {
            if let Some(href) = element_attr(link, "href") {
                entries.push(CatalogEntry::video(
                    element_text(link),
                    self.config.absolutize(href),
                ));
            }
        }

        let cards = doc.select_all(CARDS_SELECTOR)?;
        let clusters = doc.select_all(CLUSTERS_SELECTOR)?;
        for card in cards.into_iter().chain(clusters) {
            if let Some(entry) = self.video_card(card)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn video_card(&self, card: ElementRef<'_>) -> Result<Option<CatalogEntry>, ResolveError> {
        let Some((title, uri)) = self.card_link(card)? else {
            debug!("Card without teaser link");
            return Ok(None);
        };
        if !DURATION_RE.is_match(&inner_html(card)) {
            warn!(%title, "Card has no duration, probably no video");
            return Ok(None);
        }
        Ok(Some(CatalogEntry::video(title, uri)))
    }

    fn card_link(&self, card: ElementRef<'_>) -> Result<Option<(String, String)>, ResolveError> {
        Ok(select_within(card, CARD_LINK_SELECTOR)?.and_then(|link| {
            element_attr(link, "href")
                .map(|href| (element_text(link), self.config.absolutize(href)))
        }))
    }

    /// Resolves every video entry, a bounded number at a time. Overview
    /// entries are ignored. Outcomes arrive in completion order.
    pub async fn resolve_videos(
        &self,
        entries: &[CatalogEntry],
        resolver: &MediaResolver,
        capabilities: &CapabilitySnapshot,
    ) -> Vec<VideoOutcome> {
        let concurrency = self.config.catalog_concurrency.max(1);
        stream::iter(entries.iter().filter(|entry| entry.is_video()).cloned())
            .map(|entry| async move {
                let result = resolver.resolve_uri(&entry.uri, capabilities).await;
                if let Err(e) = &result {
                    warn!(error = %e, uri = %entry.uri, "Couldn't resolve video");
                }
                VideoOutcome { entry, result }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ContainerFormat, QualityTier, StreamDescriptor, VideoInfo};
    use crate::resolver::adapters::{BackendAdapter, BackendKind, Extraction, PageContent};
    use crate::resolver::test_support::StaticFetcher;
    use async_trait::async_trait;

    const GROUP_PAGE: &str = r#"
        <html><body>
          <div id="aria-teaser-list-shows">
            <article class="b-content-teaser-item">
              <h3 class="teaser-title"><a href="/comedy/heute-show">heute-show</a></h3>
            </article>
            <article class="b-content-teaser-item">
              <h3 class="teaser-title"><a href="/politik/hallo-deutschland">hallo deutschland</a></h3>
            </article>
            <article class="b-content-teaser-item"><p>kein Link</p></article>
          </div>
          <div class="b-content-teaser-list">
            <article class="b-content-teaser-item">
              <h3 class="teaser-title"><a href="/tipps">Tipps</a></h3>
            </article>
          </div>
        </body></html>"#;

    const PROGRAM_PAGE: &str = r#"
        <html><body>
          <div class="item-caption">
            <h3 class="teaser-title"><a href=" /comedy/heute-show/neueste.html ">Die neueste Folge</a></h3>
          </div>
          <div class="b-content-teaser-list">
            <article class="b-content-teaser-item">
              <h3 class="teaser-title"><a href="/comedy/heute-show/folge-1.html">Folge 1</a></h3>
              <dd class="video-duration">30 min</dd>
            </article>
            <article class="b-content-teaser-item">
              <h3 class="teaser-title"><a href="/comedy/heute-show/ueber.html">Über die Sendung</a></h3>
            </article>
          </div>
          <article class="b-cluster-teaser">
            <h3 class="teaser-title"><a href="https://www.zdf.de/comedy/clip.html">Clip</a></h3>
            <span>3  min</span>
          </article>
        </body></html>"#;

    fn catalog(fetcher: StaticFetcher) -> Catalog {
        Catalog::new(ResolverConfig::default(), Arc::new(fetcher))
    }

    #[test]
    fn root_lists_all_groups() {
        let root = catalog(StaticFetcher::new()).root();
        assert_eq!(root.len(), 27);
        assert_eq!(root[0].title, "0-9");
        assert_eq!(root[0].uri, "https://www.zdf.de/sendungen-a-z?group=0+-+9");
        assert_eq!(root[1].title, "A");
        assert_eq!(root[26].uri, "https://www.zdf.de/sendungen-a-z?group=z");
        assert!(root.iter().all(|entry| entry.kind == EntryKind::Overview));
    }

    #[tokio::test]
    async fn group_page_lists_programs() {
        let uri = "https://www.zdf.de/sendungen-a-z?group=h";
        let entries = catalog(StaticFetcher::new().with(uri, GROUP_PAGE))
            .list(uri)
            .await
            .unwrap();

        assert_eq!(
            entries,
            [
                CatalogEntry::overview("heute-show", "https://www.zdf.de/comedy/heute-show"),
                CatalogEntry::overview(
                    "hallo deutschland",
                    "https://www.zdf.de/politik/hallo-deutschland"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn program_page_lists_only_videos() {
        let uri = "https://www.zdf.de/comedy/heute-show";
        let entries = catalog(StaticFetcher::new().with(uri, PROGRAM_PAGE))
            .list(uri)
            .await
            .unwrap();

        let uris: Vec<_> = entries.iter().map(|entry| entry.uri.as_str()).collect();
        assert_eq!(
            uris,
            [
                "https://www.zdf.de/comedy/heute-show/neueste.html",
                "https://www.zdf.de/comedy/heute-show/folge-1.html",
                "https://www.zdf.de/comedy/clip.html",
            ]
        );
        assert!(entries.iter().all(CatalogEntry::is_video));
        assert_eq!(entries[0].title, "Die neueste Folge");
    }

    /// Resolves to one http stream unless the page body says otherwise.
    struct BodyAdapter;

    #[async_trait]
    impl BackendAdapter for BodyAdapter {
        fn kind(&self) -> BackendKind {
            BackendKind::Modern
        }

        async fn extract(
            &self,
            page: &PageContent,
            _ctx: &FetchContext,
        ) -> Result<Extraction, ResolveError> {
            if page.body.contains("gone") {
                return Err(ResolveError::VideoUnavailable(page.uri.clone()));
            }
            let descriptor = StreamDescriptor::builder(format!("{}.mp4", page.uri), QualityTier::High)
                .container_format(ContainerFormat::Mp4)
                .build()?;
            Ok(Extraction {
                descriptors: vec![descriptor],
                video: VideoInfo::default(),
            })
        }
    }

    #[tokio::test]
    async fn one_failing_video_does_not_stop_the_others() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with("https://www.zdf.de/a.html", "ok")
                .with("https://www.zdf.de/b.html", "gone")
                .with("https://www.zdf.de/c.html", "ok"),
        );
        let config = ResolverConfig {
            catalog_concurrency: 2,
            ..ResolverConfig::default()
        };
        let resolver = MediaResolver::with_adapter(Box::new(BodyAdapter), config.clone(), fetcher.clone());
        let catalog = Catalog::new(config, fetcher);

        let entries = [
            CatalogEntry::video("A", "https://www.zdf.de/a.html"),
            CatalogEntry::overview("Overview", "https://www.zdf.de/o"),
            CatalogEntry::video("B", "https://www.zdf.de/b.html"),
            CatalogEntry::video("C", "https://www.zdf.de/c.html"),
            CatalogEntry::video("D", "https://www.zdf.de/d.html"),
        ];
        let caps = CapabilitySnapshot::from_schemes(["https"]);
        let mut outcomes = catalog.resolve_videos(&entries, &resolver, &caps).await;
        outcomes.sort_by(|a, b| a.entry.title.cmp(&b.entry.title));

        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            outcomes[0].result.as_ref().unwrap().stream.uri,
            "https://www.zdf.de/a.html.mp4"
        );
        assert!(matches!(outcomes[1].result, Err(ResolveError::VideoUnavailable(_))));
        assert!(outcomes[2].result.is_ok());
        assert!(matches!(outcomes[3].result, Err(ResolveError::Fetch { .. })));
    }
}
