use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flutterlog_core::classification::ClassificationResult;
use flutterlog_core::history::{
    EXPORT_FILE_NAME, HistoryFilter, IdentificationRecord, SessionHistory, SortKey, demo_records,
};
use flutterlog_core::kv::KeyValueStore;

/// Fields of a hand-entered record.
pub struct NewRecord {
    pub species: String,
    pub confidence: f64,
    pub image_url: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub id: Option<String>,
    pub timestamp: Option<String>,
}

impl NewRecord {
    fn into_record(self) -> IdentificationRecord {
        let mut record = IdentificationRecord::new(self.species, self.confidence, self.image_url);
        if let Some(id) = self.id {
            record = record.with_id(id);
        }
        if let Some(timestamp) = self.timestamp {
            record = record.with_timestamp(timestamp);
        }
        if let Some(location) = self.location {
            record = record.with_location(location);
        }
        if let Some(notes) = self.notes {
            record = record.with_notes(notes);
        }
        record
    }
}

pub fn list<S: KeyValueStore>(
    history: &SessionHistory<S>,
    filter: HistoryFilter,
    sort: SortKey,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let records = history.view(filter, sort);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(out, "No identifications recorded.")?;
        return Ok(());
    }

    for record in &records {
        writeln!(out, "{}", format_record(record))?;
    }
    Ok(())
}

pub fn add<S: KeyValueStore>(
    history: &mut SessionHistory<S>,
    input: NewRecord,
    out: &mut impl Write,
) -> Result<()> {
    if !history.is_active() {
        return print_no_user(out);
    }

    let record = input.into_record();
    let id = record.id.clone();
    history.insert(record).context("Failed to add record")?;
    writeln!(out, "Added {}", id)?;
    Ok(())
}

pub fn record<S: KeyValueStore>(
    history: &mut SessionHistory<S>,
    source: &Path,
    image_url: String,
    out: &mut impl Write,
) -> Result<()> {
    let raw = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read classification from stdin")?;
        buf
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?
    };

    let result: ClassificationResult =
        serde_json::from_str(&raw).context("Failed to parse classification result")?;

    match history
        .record_classification(&result, image_url)
        .context("Failed to record classification")?
    {
        Some(saved) => writeln!(out, "Recorded {}", format_record(saved))?,
        None => print_no_user(out)?,
    }
    Ok(())
}

pub fn delete<S: KeyValueStore>(
    history: &mut SessionHistory<S>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    if !history.is_active() {
        return print_no_user(out);
    }

    let existed = history.records().iter().any(|record| record.id == id);
    history.delete(id).context("Failed to delete record")?;
    if existed {
        writeln!(out, "Deleted {}", id)?;
    } else {
        writeln!(out, "No record with id {}", id)?;
    }
    Ok(())
}

pub fn verify<S: KeyValueStore>(
    history: &mut SessionHistory<S>,
    id: &str,
    verified: bool,
    out: &mut impl Write,
) -> Result<()> {
    match history
        .set_verified(id, verified)
        .context("Failed to update verification")?
    {
        Some(record) => writeln!(out, "{}", format_record(record))?,
        None => print_no_user(out)?,
    }
    Ok(())
}

pub fn stats<S: KeyValueStore>(
    history: &SessionHistory<S>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let stats = history.statistics();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
        return Ok(());
    }

    writeln!(out, "Total identifications: {}", stats.total)?;
    writeln!(out, "Unique species:        {}", stats.unique_species)?;
    writeln!(out, "Verified:              {}", stats.verified_count)?;
    writeln!(out, "Average confidence:    {}%", stats.average_confidence)?;
    Ok(())
}

pub fn export<S: KeyValueStore>(
    history: &SessionHistory<S>,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let document = history.export().context("Failed to serialize history")?;

    match output {
        None => writeln!(out, "{}", document)?,
        Some(path) => {
            let target = if path.is_dir() {
                path.join(EXPORT_FILE_NAME)
            } else {
                path.to_path_buf()
            };
            fs::write(&target, document)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            writeln!(
                out,
                "Exported {} records to {}",
                history.records().len(),
                target.display()
            )?;
        }
    }
    Ok(())
}

pub fn seed<S: KeyValueStore>(history: &mut SessionHistory<S>, out: &mut impl Write) -> Result<()> {
    if !history.is_active() {
        return print_no_user(out);
    }

    if history
        .seed_if_empty(demo_records())
        .context("Failed to seed history")?
    {
        writeln!(out, "Seeded {} demo records", history.records().len())?;
    } else {
        writeln!(out, "History is not empty; nothing seeded")?;
    }
    Ok(())
}

pub fn clear<S: KeyValueStore>(
    history: &mut SessionHistory<S>,
    out: &mut impl Write,
) -> Result<()> {
    if !history.is_active() {
        return print_no_user(out);
    }

    history.clear().context("Failed to clear history")?;
    writeln!(out, "History cleared")?;
    Ok(())
}

fn print_no_user(out: &mut impl Write) -> Result<()> {
    writeln!(out, "No user session; nothing to do.")?;
    Ok(())
}

fn format_record(record: &IdentificationRecord) -> String {
    let mut line = format!(
        "{:<36}  {:<20}  {:>5.1}%  {}  {}",
        record.id,
        record.species,
        record.confidence,
        record.timestamp,
        if record.verified { "verified" } else { "unverified" }
    );
    if let Some(location) = &record.location {
        line.push_str(&format!("  @ {}", location));
    }
    line
}
