//! CSS-selector queries over HTML markup.
//!
//! `scraper::Html` is not `Send`, so callers parse and extract inside a
//! synchronous scope and only carry owned strings across `.await` points.

use scraper::{ElementRef, Html, Selector};

use crate::resolver::error::ResolveError;

pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    pub fn select_first(&self, selector: &str) -> Result<Option<ElementRef<'_>>, ResolveError> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).next())
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, ResolveError> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    /// Whitespace-normalized text of the first match.
    pub fn text_of(&self, selector: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.select_first(selector)?.map(element_text))
    }

    pub fn attr_of(&self, selector: &str, attr: &str) -> Result<Option<String>, ResolveError> {
        Ok(self
            .select_first(selector)?
            .and_then(|el| el.value().attr(attr).map(str::to_owned)))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ResolveError> {
    Selector::parse(selector)
        .map_err(|e| ResolveError::Structure(format!("invalid selector `{selector}`: {e:?}")))
}

/// First descendant of `element` matching `selector`.
pub fn select_within<'a>(
    element: ElementRef<'a>,
    selector: &str,
) -> Result<Option<ElementRef<'a>>, ResolveError> {
    let selector = parse_selector(selector)?;
    Ok(element.select(&selector).next())
}

/// Text content with runs of whitespace collapsed to single spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn element_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

pub fn inner_html(element: ElementRef<'_>) -> String {
    element.inner_html()
}
