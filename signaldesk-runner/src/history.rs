//! Opportunity history — bounded in memory, JSONL on disk.
//!
//! After every cycle the history holds the new batch followed by at most
//! `capacity` earlier opportunities, newest first. Older entries are evicted.
//! Each JSONL line is one opportunity, so files survive partial writes and
//! stream easily.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::warn;

use signaldesk_core::domain::Opportunity;

#[derive(Debug, Clone)]
pub struct OpportunityHistory {
    capacity: usize,
    /// Newest first.
    entries: VecDeque<Opportunity>,
}

impl OpportunityHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend a cycle's batch, keeping at most `capacity` earlier entries.
    ///
    /// Returns how many entries were evicted.
    pub fn record_batch(&mut self, batch: &[Opportunity]) -> usize {
        let evicted = self.entries.len().saturating_sub(self.capacity);
        self.entries.truncate(self.capacity);
        for opp in batch.iter().rev() {
            self.entries.push_front(opp.clone());
        }
        evicted
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Opportunity> {
        self.entries.iter()
    }

    pub fn latest(&self, n: usize) -> Vec<&Opportunity> {
        self.entries.iter().take(n).collect()
    }

    /// Opportunities for one instrument, newest first.
    pub fn for_instrument<'a>(
        &'a self,
        instrument: &'a str,
    ) -> impl Iterator<Item = &'a Opportunity> + 'a {
        self.entries.iter().filter(move |o| o.instrument == instrument)
    }

    /// Write the whole history to `path`, replacing the file.
    pub fn export_jsonl(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        for opp in &self.entries {
            writeln!(file, "{}", to_json_line(opp)?)?;
        }
        file.flush()
    }
}

/// Append `batch` to a JSONL file, creating it if needed.
pub fn append_jsonl(path: &Path, batch: &[Opportunity]) -> io::Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for opp in batch {
        writeln!(file, "{}", to_json_line(opp)?)?;
    }
    file.flush()
}

/// Read every opportunity from a JSONL file; malformed lines are skipped.
pub fn read_jsonl(path: &Path) -> io::Result<Vec<Opportunity>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = io::BufReader::new(fs::File::open(path)?);
    let mut out = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Opportunity>(&line) {
            Ok(opp) => out.push(opp),
            Err(e) => warn!(path = %path.display(), line = line_no + 1, error = %e, "skipping malformed history line"),
        }
    }
    Ok(out)
}

fn to_json_line(opp: &Opportunity) -> io::Result<String> {
    serde_json::to_string(opp).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
