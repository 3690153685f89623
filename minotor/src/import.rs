//! minotor-import - load analytics documents into the document store
//!
//! Accepts JSON exports (an array of documents or a single document) and
//! JSON Lines files. Directories are searched for `*.json` and `*.jsonl`.
//! Documents without a usable id get a generated `_id`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use minotor_core::{Config, Database};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "minotor-import")]
#[command(about = "Import analytics documents into the minotor store")]
#[command(version)]
struct Args {
    /// Files or directories to import
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Target collection
    #[arg(short, long, default_value = "events")]
    collection: String,

    /// Parse and count documents without writing them
    #[arg(long)]
    dry_run: bool,

    /// Remove existing documents from the collection first
    #[arg(long)]
    replace: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        minotor_core::logging::init(&config.logging).context("failed to initialize logging")?;

    if args.collection.trim().is_empty() {
        bail!("collection name must not be empty");
    }

    let files = expand_paths(&args.paths)?;
    if files.is_empty() {
        println!("No .json or .jsonl files found.");
        return Ok(());
    }

    tracing::info!(files = files.len(), collection = %args.collection, "Import starting");

    let db = if args.dry_run {
        None
    } else {
        let db_path = config.store.database_path();
        println!("Database: {}", db_path.display());
        let db = Database::open(&db_path).context("failed to open database")?;
        db.migrate().context("failed to run database migrations")?;
        if args.replace {
            let removed = db
                .clear_collection(&args.collection)
                .context("failed to clear collection")?;
            println!("Removed {} existing document(s)", removed);
        }
        Some(db)
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut imported = 0;
    let mut failed_files = Vec::new();

    for path in &files {
        pb.set_message(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("...")
                .to_string(),
        );

        let result = read_documents(path).and_then(|documents| match &db {
            Some(db) => db
                .insert_documents(&args.collection, &documents)
                .with_context(|| format!("failed to insert documents from {}", path.display())),
            None => Ok(documents.len()),
        });

        match result {
            Ok(count) => {
                tracing::debug!(path = %path.display(), count, "File imported");
                imported += count;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "File skipped");
                failed_files.push((path.clone(), e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    let verb = if args.dry_run { "Parsed" } else { "Imported" };
    println!(
        "{} {} document(s) from {} file(s) into '{}'",
        verb,
        imported,
        files.len() - failed_files.len(),
        args.collection
    );
    for (path, error) in &failed_files {
        println!("  Skipped {}: {:#}", path.display(), error);
    }

    tracing::info!(imported, failed = failed_files.len(), "Import complete");

    if args.dry_run {
        println!("\nDry run - nothing written");
    }
    if !failed_files.is_empty() && imported == 0 {
        bail!("no documents imported");
    }
    Ok(())
}

/// Files named directly, plus `*.json` / `*.jsonl` inside named directories.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for extension in ["json", "jsonl"] {
                let pattern = path.join(format!("**/*.{}", extension));
                let pattern = pattern
                    .to_str()
                    .with_context(|| format!("non UTF-8 path: {}", path.display()))?;
                let mut found: Vec<PathBuf> = glob::glob(pattern)
                    .with_context(|| format!("invalid search pattern for {}", path.display()))?
                    .filter_map(|entry| entry.ok())
                    .collect();
                found.sort();
                files.extend(found);
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }
    Ok(files)
}

/// Parse one file into documents, each with an `_id`.
fn read_documents(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_jsonl = path.extension().and_then(|e| e.to_str()) == Some("jsonl");
    let values = if is_jsonl {
        parse_json_lines(&content)?
    } else {
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(items)) => items,
            Ok(single @ Value::Object(_)) => vec![single],
            Ok(_) => bail!("expected a JSON array or object"),
            // Not a single JSON value: try it as JSON Lines
            Err(_) => parse_json_lines(&content)?,
        }
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Object(doc) => Ok(Value::Object(with_id(doc))),
            _ => bail!("document {} is not a JSON object", i + 1),
        })
        .collect()
}

fn parse_json_lines(content: &str) -> Result<Vec<Value>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid JSON on line {}", i + 1))
        })
        .collect()
}

/// Make sure the document carries an id the reader accepts.
///
/// A string `id` is read as-is; a numeric one is copied into `_id` so it
/// survives. Only documents with neither get a generated id.
fn with_id(mut doc: Map<String, Value>) -> Map<String, Value> {
    if doc.contains_key("_id") {
        return doc;
    }
    let id = match doc.get("id") {
        Some(Value::String(id)) if !id.is_empty() => return doc,
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    doc.insert("_id".to_string(), Value::String(id));
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_array_object_and_lines() {
        let dir = TempDir::new().unwrap();

        let array = write(&dir, "a.json", r#"[{"_id": "1", "url": "/a"}, {"_id": "2", "url": "/b"}]"#);
        assert_eq!(read_documents(&array).unwrap().len(), 2);

        let single = write(&dir, "b.json", r#"{"_id": "3", "url": "/c"}"#);
        assert_eq!(read_documents(&single).unwrap().len(), 1);

        let lines = write(&dir, "c.jsonl", "{\"url\": \"/d\"}\n\n{\"url\": \"/e\"}\n");
        assert_eq!(read_documents(&lines).unwrap().len(), 2);

        // JSON Lines content behind a .json name
        let mislabeled = write(&dir, "d.json", "{\"url\": \"/f\"}\n{\"url\": \"/g\"}\n");
        assert_eq!(read_documents(&mislabeled).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_non_objects() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.json", r#"[{"url": "/a"}, 42]"#);
        let err = read_documents(&path).unwrap_err();
        assert!(err.to_string().contains("document 2"));

        let path = write(&dir, "broken.jsonl", "{\"url\": \"/a\"}\nnot json\n");
        let err = read_documents(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_ids_assigned_only_when_missing() {
        let doc = |value: Value| value.as_object().cloned().unwrap();

        let kept = with_id(doc(serde_json::json!({"_id": {"$oid": "abc"}})));
        assert_eq!(kept["_id"]["$oid"], "abc");

        let plain = with_id(doc(serde_json::json!({"id": "evt-1"})));
        assert!(!plain.contains_key("_id"));

        let numeric = with_id(doc(serde_json::json!({"id": 5, "url": "/a"})));
        assert_eq!(numeric["_id"], "5");
        assert_eq!(numeric["id"], 5);

        let empty = with_id(doc(serde_json::json!({"id": "", "url": "/a"})));
        assert!(uuid::Uuid::parse_str(empty["_id"].as_str().unwrap()).is_ok());

        let generated = with_id(doc(serde_json::json!({"url": "/a"})));
        let id = generated["_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_expand_paths() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.json", "[]");
        write(&dir, "nested/a.jsonl", "");
        write(&dir, "notes.txt", "");

        let files = expand_paths(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b.json", "a.jsonl"]);

        assert!(expand_paths(&[dir.path().join("missing.json")]).is_err());
    }
}
