//! Text and JSON rendering of command results

use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::CliError;
use crate::{
    DictionaryInfo, DictionaryTag, KeyInfo, PatternInfo, SeriesInfo, StatsItem,
    SubscriptionFeatures,
};

/// Width of the caption column in text output
pub const CAPTION_WIDTH: usize = 25;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// Pretty-printed JSON
    Json,
}

/// A record printable as `caption: value` lines
pub trait TextRecord {
    /// Caption/value pairs in display order
    fn fields(&self) -> Vec<(&'static str, String)>;
}

fn optional<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "not available".to_string(), |v| v.to_string())
}

impl TextRecord for KeyInfo {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Type", self.key_type.clone()),
            ("Key Scope", self.key_scope.to_string()),
            ("Slug", self.slug.clone()),
            ("Org Slug", self.org_slug.clone()),
            ("Series Slug", optional(self.series_slug.as_deref())),
            ("Scopes", self.scopes.join(", ")),
            ("Enabled", self.enabled.to_string()),
        ]
    }
}

impl TextRecord for SeriesInfo {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Series Slug", self.slug.clone()),
            ("Organization Slug", self.org_slug.clone()),
            ("Name", optional(self.name.as_deref())),
            ("Pattern", self.pattern.clone()),
            ("Max Pattern Length", self.max_pattern_length.to_string()),
            ("Capacity", self.capacity.clone()),
            ("Generated Count", self.generated_count.clone()),
            ("Remaining", optional(self.remaining_capacity())),
            ("Last Modified", self.mtime.clone()),
        ]
    }
}

impl TextRecord for PatternInfo {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Pattern", self.pattern.clone()),
            ("Capacity", self.capacity.clone()),
            ("Max Slug Length", self.max_slug_length.to_string()),
            ("Complexity", self.complexity.to_string()),
            ("Components", self.components.to_string()),
        ]
    }
}

impl TextRecord for StatsItem {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Event Type", self.event_type.to_string()),
            ("Date Part", self.date_part.to_string()),
            ("Total Count", self.total_count.to_string()),
            ("Request Count", self.request_count.to_string()),
            ("Total Duration (us)", self.total_duration_us.to_string()),
            ("Avg Duration (us)", format!("{:.2}", self.avg_duration_us)),
        ]
    }
}

impl TextRecord for DictionaryInfo {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![("Kind", self.kind.clone()), ("Words", self.count.to_string())]
    }
}

impl TextRecord for DictionaryTag {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Tag", format!("{}:{}", self.kind, self.tag)),
            ("Description", optional(self.description.as_deref())),
            ("Opt In", self.opt_in.to_string()),
            ("Words", self.word_count.to_string()),
        ]
    }
}

impl TextRecord for SubscriptionFeatures {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("Plan", optional(self.plan.as_deref()))];
        fields.extend(
            self.limits()
                .into_iter()
                .map(|(caption, value)| (caption, optional(value))),
        );
        fields.push(("Streaming", optional(self.streaming)));
        fields.push(("Custom Dictionaries", optional(self.custom_dictionaries)));
        fields
    }
}

/// Destination of command output
pub struct Output<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl Output<Box<dyn Write + Send>> {
    /// Buffered output to `path`, or to stdout when `None`
    pub fn open(path: Option<&Path>, format: OutputFormat) -> Result<Self, CliError> {
        let writer: Box<dyn Write + Send> = match path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout())),
        };
        Ok(Self::new(writer, format))
    }
}

impl<W: Write> Output<W> {
    /// Output over an arbitrary writer
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Selected format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether results are rendered as JSON
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Write one line of text
    pub fn line(&mut self, text: impl Display) -> Result<(), CliError> {
        writeln!(self.writer, "{text}")?;
        Ok(())
    }

    /// Write `value` as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CliError> {
        serde_json::to_writer_pretty(&mut self.writer, value)?;
        writeln!(self.writer)?;
        Ok(())
    }

    /// Write one record in the selected format
    pub fn record<T: TextRecord + Serialize>(&mut self, record: &T) -> Result<(), CliError> {
        if self.is_json() {
            return self.json(record);
        }
        self.fields(record)
    }

    /// Write several records, separated in text mode
    pub fn records<T: TextRecord + Serialize>(&mut self, records: &[T]) -> Result<(), CliError> {
        if self.is_json() {
            return self.json(records);
        }
        for record in records {
            self.fields(record)?;
            self.line("-".repeat(50))?;
        }
        Ok(())
    }

    /// Write identifiers, one per line or as a JSON array
    pub fn identifiers(&mut self, ids: &[String]) -> Result<(), CliError> {
        if self.is_json() {
            return self.json(ids);
        }
        for id in ids {
            self.line(id)?;
        }
        Ok(())
    }

    /// Flush buffered output
    pub fn finish(mut self) -> Result<W, CliError> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn fields<T: TextRecord>(&mut self, record: &T) -> Result<(), CliError> {
        for (caption, value) in record.fields() {
            writeln!(self.writer, "{caption:<width$}: {value}", width = CAPTION_WIDTH)?;
        }
        Ok(())
    }
}
