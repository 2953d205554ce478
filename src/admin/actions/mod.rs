use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;
use serde_json::Value;

use crate::cms::{Collection, DocId, Document, User};


#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Flash {
    Info(String),
    Error(String),
}

/// Messages produced by a bulk action and the records it created or changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ActionReport {
    pub flashes: Vec<Flash>,
    pub affected: Vec<DocId>,
}

impl ActionReport {
    fn not_found(&mut self, id: DocId) {
        warn!("Admin action skipped missing item {}", id);
        self.flashes.push(Flash::Error(format!("Item not found {}", id)));
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub mimetype: &'static str,
    pub body: String,
    pub missing: Vec<DocId>,
}

pub fn toggle_publish<D, C>(
    collection: &C,
    ids: &[DocId],
    user: Option<&User>,
    now: DateTime<Utc>,
) -> Result<ActionReport>
where
    D: Document,
    C: Collection<D> + ?Sized,
{
    let mut report = ActionReport::default();
    for id in ids {
        let mut document = match collection.get(*id) {
            Some(document) => document,
            None => {
                report.not_found(*id);
                continue;
            }
        };
        let publication = document.publication_mut();
        publication.published = !publication.published;
        let saved = collection
            .save(document, user, now)
            .with_context(|| format!("Could not toggle {} {}", D::MODEL_NAME, id))?;
        report.affected.push(saved);
    }
    let message = match report.affected.len() {
        1 => "Item successfully published/Unpublished.".to_owned(),
        count => format!("{} items were successfully published/Unpublished.", count),
    };
    info!("{}", message);
    report.flashes.push(Flash::Info(message));
    Ok(report)
}

/// Saves an unpublished copy of a single item under a randomized slug.
pub fn clone_item<D, C>(
    collection: &C,
    ids: &[DocId],
    user: Option<&User>,
    now: DateTime<Utc>,
) -> Result<ActionReport>
where
    D: Document,
    C: Collection<D> + ?Sized,
{
    let mut report = ActionReport::default();
    let id = match ids {
        [id] => *id,
        _ => {
            report.flashes.push(Flash::Error(
                "You can select only one item for this action".to_owned(),
            ));
            return Ok(report);
        }
    };
    let mut copy = match collection.get(id) {
        Some(document) => document,
        None => {
            report.not_found(id);
            return Ok(report);
        }
    };
    copy.detach();
    copy.publication_mut().published = false;
    let slug = copy.slug_mut();
    *slug = format!("{}-{}", slug, rand::thread_rng().gen::<u32>());
    let new_id = collection
        .save(copy, user, now)
        .with_context(|| format!("Could not copy {} {}", D::MODEL_NAME, id))?;
    info!("Copied {} {} into {}", D::MODEL_NAME, id, new_id);
    report
        .flashes
        .push(Flash::Info(format!("Created copy {}", new_id)));
    report.affected.push(new_id);
    Ok(report)
}

fn collect<D, C>(collection: &C, ids: &[DocId]) -> (Vec<D>, Vec<DocId>)
where
    D: Document,
    C: Collection<D> + ?Sized,
{
    let mut found = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match collection.get(*id) {
            Some(document) => found.push(document),
            None => {
                warn!("Export skipped missing item {}", id);
                missing.push(*id);
            }
        }
    }
    (found, missing)
}

pub fn export_to_json<D, C>(collection: &C, ids: &[DocId]) -> Result<Attachment>
where
    D: Document,
    C: Collection<D> + ?Sized,
{
    let (documents, missing) = collect(collection, ids);
    let body = serde_json::to_string(&documents)
        .with_context(|| format!("Could not serialize {} export", D::MODEL_NAME))?;
    Ok(Attachment {
        filename: format!("{}.json", D::MODEL_NAME),
        mimetype: "text/json",
        body,
        missing,
    })
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One CSV row per item; the header comes from the fields of the first one.
pub fn export_to_csv<D, C>(collection: &C, ids: &[DocId]) -> Result<Attachment>
where
    D: Document,
    C: Collection<D> + ?Sized,
{
    let (documents, missing) = collect(collection, ids);
    let records = documents
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()
        .with_context(|| format!("Could not serialize {} export", D::MODEL_NAME))?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    if let Some(Value::Object(first)) = records.first() {
        let header: Vec<&String> = first.keys().collect();
        writer.write_record(&header)?;
        for record in &records {
            writer.write_record(header.iter().map(|key| cell(record.get(key.as_str()))))?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Could not flush csv export: {}", e.error()))?;
    let body = String::from_utf8(bytes).context("Csv export is not valid utf-8")?;

    Ok(Attachment {
        filename: format!("{}.csv", D::MODEL_NAME),
        mimetype: "text/csv",
        body,
        missing,
    })
}
