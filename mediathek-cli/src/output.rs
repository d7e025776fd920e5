#[cfg(feature = "colored-output")]
use colored::*;
use mediathek_parser::Resolution;
use mediathek_parser::catalog::{CatalogEntry, EntryKind, VideoOutcome};
use serde_json::json;

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_resolution(&self, resolution: &Resolution, as_json: bool) -> anyhow::Result<String> {
        if as_json {
            return Ok(serde_json::to_string_pretty(resolution)?);
        }

        let stream = &resolution.stream;
        let video = &resolution.video;
        let mut output = String::new();

        if let Some(title) = &video.title {
            output.push_str(&self.colorize(title, Tint::Header));
            output.push('\n');
        }
        if let Some(description) = &video.description {
            output.push_str(&format!("  {description}\n"));
        }
        if let Some(published) = &video.published {
            output.push_str(&self.field("Published", &published.to_rfc3339()));
        }
        if let Some(duration) = video.duration {
            output.push_str(&self.field(
                "Duration",
                &format!("{}:{:02}", duration / 60, duration % 60),
            ));
        }
        if let Some(thumbnail) = &video.thumbnail {
            output.push_str(&self.field("Thumbnail", thumbnail));
        }

        output.push_str(&self.colorize("Stream:", Tint::Header));
        output.push('\n');
        output.push_str(&self.field("Quality", stream.quality_tier.as_str()));
        output.push_str(&self.field(
            "Format",
            stream
                .container_format
                .map(|format| format.as_str())
                .unwrap_or("unknown"),
        ));
        if stream.pixel_height > 0 {
            output.push_str(&self.field("Height", &format!("{}p", stream.pixel_height)));
        }
        output.push_str(&self.field("URL", &stream.uri));
        if let Some(name) = &resolution.stream_name {
            output.push_str(&self.field("Stream name", name));
        }
        Ok(output)
    }

    pub fn format_entries(
        &self,
        title: &str,
        entries: &[CatalogEntry],
        as_json: bool,
    ) -> anyhow::Result<String> {
        if as_json {
            return Ok(serde_json::to_string_pretty(entries)?);
        }

        let mut output = self.colorize(title, Tint::Header);
        output.push('\n');
        for entry in entries {
            let marker = match entry.kind {
                EntryKind::Overview => "+",
                EntryKind::Video => ">",
            };
            output.push_str(&format!(
                "  {marker} {}  {}\n",
                entry.title,
                self.colorize(&entry.uri, Tint::Link)
            ));
        }
        Ok(output)
    }

    pub fn format_outcomes(&self, outcomes: &[VideoOutcome], as_json: bool) -> anyhow::Result<String> {
        if as_json {
            let values: Vec<_> = outcomes
                .iter()
                .map(|outcome| match &outcome.result {
                    Ok(resolution) => json!({
                        "entry": outcome.entry,
                        "status": "ok",
                        "resolution": resolution,
                    }),
                    Err(e) => json!({
                        "entry": outcome.entry,
                        "status": "error",
                        "message": e.to_string(),
                    }),
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&values)?);
        }

        let mut output = String::new();
        for outcome in outcomes {
            match &outcome.result {
                Ok(resolution) => output.push_str(&format!(
                    "  {} {}  {}\n",
                    self.colorize("ok", Tint::Value),
                    outcome.entry.title,
                    self.colorize(&resolution.stream.uri, Tint::Link)
                )),
                Err(e) => output.push_str(&format!(
                    "  {} {}  {e}\n",
                    self.colorize("failed", Tint::Error),
                    outcome.entry.title
                )),
            }
        }
        Ok(output)
    }

    fn field(&self, name: &str, value: &str) -> String {
        format!(
            "  {}: {}\n",
            self.colorize(name, Tint::Label),
            self.colorize(value, Tint::Value)
        )
    }

    #[cfg(feature = "colored-output")]
    fn colorize(&self, text: &str, tint: Tint) -> String {
        if !self.colored {
            return text.to_string();
        }
        match tint {
            Tint::Header => text.green().bold().to_string(),
            Tint::Label => text.yellow().to_string(),
            Tint::Value => text.cyan().to_string(),
            Tint::Link => text.blue().to_string(),
            Tint::Error => text.red().bold().to_string(),
        }
    }

    #[cfg(not(feature = "colored-output"))]
    fn colorize(&self, text: &str, _tint: Tint) -> String {
        let _ = self.colored;
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
enum Tint {
    Header,
    Label,
    Value,
    Link,
    Error,
}
