use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::tsv;
use crate::core::Instant;
use crate::error::Result;

/// Sparse table of per-instant results.
///
/// Columns are discovered as they are recorded. Rows are keyed by the
/// canonical instant string, so they come out in chronological order.
/// A recorder has a single writer; it does no locking of its own.
#[derive(Debug, Clone, Default)]
pub struct ResultRecorder {
    fields: Vec<String>,
    data: BTreeMap<String, Map<String, Value>>,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert fields for an instant. A field recorded twice keeps the latest value.
    /// Recording no fields leaves the table untouched.
    pub fn record<K, V>(&mut self, instant: &Instant, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut fields = fields.into_iter().peekable();
        if fields.peek().is_none() {
            return;
        }
        let row = self.data.entry(instant.to_string()).or_default();
        for (key, value) in fields {
            let key = key.into();
            if !self.fields.contains(&key) {
                self.fields.push(key.clone());
            }
            row.insert(key, value.into());
        }
    }

    /// Field names in the order they were first seen
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, instant: &Instant) -> Option<&Map<String, Value>> {
        self.data.get(&instant.to_string())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrite `path` with the current table. Does nothing (and creates no
    /// file) while the recorder is empty.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.is_empty() {
            debug!(path = %path.display(), "no results recorded, not writing report");
            return Ok(());
        }
        let file = BufWriter::new(File::create(path)?);
        self.write_to(file)?;
        debug!(path = %path.display(), rows = self.len(), "report saved");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, inner: W) -> Result<()> {
        let mut writer = tsv::writer(inner);

        let mut header = Vec::with_capacity(self.fields.len() + 1);
        header.push("Instant".to_string());
        header.extend(self.fields.iter().map(|field| tsv::escape(field)));
        writer.write_record(&header)?;

        for (instant, record) in &self.data {
            let mut line = Vec::with_capacity(self.fields.len() + 1);
            line.push(tsv::escape(instant));
            line.extend(self.fields.iter().map(|field| tsv::render(record.get(field))));
            writer.write_record(&line)?;
        }
        writer.flush()?;
        Ok(())
    }
}
