//! JSON file source and target.
//!
//! The file holds a JSON array of rule records. A target projects filters
//! and owners out of those rules, since a file has no separate place for
//! them, and rewrites the whole array on commit.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use netcfg_core::{decode_rules, DeserializationError, EntityKind, Identified, Identifier, Owner, PacketFilter, Rule};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{AccessError, Result};
use crate::traits::{Endpoint, Source, Target};

/// Reads desired rules from a JSON file.
///
/// The file is read when the session opens.
pub struct JsonFileSource {
    path: PathBuf,
    records: Option<Vec<Value>>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: None,
        }
    }

    /// A factory producing a fresh handle on `path` per attempt.
    pub fn factory(path: impl Into<PathBuf>) -> impl Fn() -> Result<Self> {
        let path = path.into();
        move || Ok(Self::new(path.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Endpoint for JsonFileSource {
    fn open(&mut self) -> Result<()> {
        let text = fs::read_to_string(&self.path)?;
        self.records = Some(parse_array(&text)?);
        tracing::debug!(path = %self.path.display(), "opened rule file");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.records = None;
        Ok(())
    }
}

impl Source for JsonFileSource {
    fn read_all_rules(&mut self) -> Result<Vec<Value>> {
        self.records.clone().ok_or(AccessError::NotOpen)
    }
}

/// Keeps a JSON file of rules in sync.
///
/// Rule additions and deletions are buffered and the file is rewritten on
/// [`Target::apply_changes`]. Filter and owner mutations have nothing to
/// change in a file and succeed without effect. A missing file reads as
/// empty and is created on commit.
pub struct JsonFileTarget {
    path: PathBuf,
    state: Option<FileState>,
}

struct FileState {
    /// Records as read at open or last commit.
    records: Vec<Value>,
    /// Rules the next commit writes.
    rules: BTreeMap<Identifier, Rule>,
}

impl JsonFileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    /// A factory producing a fresh handle on `path` per attempt.
    pub fn factory(path: impl Into<PathBuf>) -> impl Fn() -> Result<Self> {
        let path = path.into();
        move || Ok(Self::new(path.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn state(&mut self) -> Result<&mut FileState> {
        self.state.as_mut().ok_or(AccessError::NotOpen)
    }

    /// Write to a sibling temporary file, then rename it over the target so
    /// a failed write never leaves a truncated file behind.
    fn write_file(&self, records: &[Value]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, records).map_err(io::Error::from)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(io::Error::from)?;
        Ok(())
    }
}

impl Endpoint for JsonFileTarget {
    fn open(&mut self) -> Result<()> {
        let records = match fs::read_to_string(&self.path) {
            Ok(text) => parse_array(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        let rules = decode_rules(records.iter().cloned())?
            .into_iter()
            .map(|rule| (rule.identifier().clone(), rule))
            .collect();

        self.state = Some(FileState { records, rules });
        tracing::debug!(path = %self.path.display(), "opened rule file for writing");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state = None;
        Ok(())
    }
}

impl Target for JsonFileTarget {
    fn read_all_rules(&mut self) -> Result<Vec<Value>> {
        Ok(self.state()?.records.clone())
    }

    fn read_all_filters(&mut self) -> Result<Vec<Value>> {
        let state = self.state()?;
        Ok(state
            .records
            .iter()
            .filter_map(|record| record.get("packet_filter").cloned())
            .collect())
    }

    fn read_all_owners(&mut self) -> Result<Vec<Value>> {
        let state = self.state()?;
        Ok(state
            .records
            .iter()
            .filter_map(|record| record.get("owners").and_then(Value::as_array))
            .flatten()
            .cloned()
            .collect())
    }

    fn add_rule(&mut self, rule: &Rule) -> Result<()> {
        self.state()?
            .rules
            .insert(rule.identifier().clone(), rule.clone());
        Ok(())
    }

    fn delete_rule(&mut self, identifier: &Identifier) -> Result<()> {
        self.state()?.rules.remove(identifier);
        Ok(())
    }

    fn add_filter(&mut self, _filter: &PacketFilter) -> Result<()> {
        self.state().map(|_| ())
    }

    fn delete_filter(&mut self, _identifier: &Identifier) -> Result<()> {
        self.state().map(|_| ())
    }

    fn add_owner(&mut self, _owner: &Owner) -> Result<()> {
        self.state().map(|_| ())
    }

    fn delete_owner(&mut self, _identifier: &Identifier) -> Result<()> {
        self.state().map(|_| ())
    }

    fn apply_changes(&mut self) -> Result<()> {
        let records: Vec<Value> = self.state()?.rules.values().map(Rule::to_value).collect();
        self.write_file(&records)?;
        tracing::debug!(path = %self.path.display(), rules = records.len(), "wrote rule file");
        self.state()?.records = records;
        Ok(())
    }
}

fn parse_array(text: &str) -> Result<Vec<Value>> {
    let malformed = |reason: String| {
        AccessError::Deserialization(DeserializationError::Malformed {
            kind: EntityKind::Rule,
            reason,
        })
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(malformed("file content is not an array".to_string())),
        Err(err) => Err(malformed(err.to_string())),
    }
}
