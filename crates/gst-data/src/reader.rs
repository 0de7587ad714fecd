//! Input discovery and the JSONL event store.
//!
//! Command-line arguments are resolved to a sorted file list (directories are
//! walked, file-name wildcards are matched), and the files are concatenated
//! into one row sequence. Each row keeps its `file:line` origin so a bad row
//! can be reported precisely.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use gst_core::error::{GstError, Result};
use gst_core::event::EventRecord;
use gst_core::row::RawRow;
use regex::Regex;
use tracing::{debug, info, warn};

// ── Input resolution ──────────────────────────────────────────────────────────

/// Resolve every argument to files and concatenate the results in argument
/// order.
///
/// * an existing directory yields all `*.jsonl` files below it, sorted;
/// * an argument whose file-name component contains `*` or `?` yields the
///   matching files in its directory, sorted;
/// * anything else must be an existing file.
///
/// An empty result is [`GstError::NoInputFiles`].
pub fn resolve_inputs(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for arg in args {
        let path = Path::new(arg);
        let resolved = if path.is_dir() {
            find_jsonl_files(path)
        } else if is_pattern(path) {
            match_pattern(path)?
        } else {
            std::fs::metadata(path).map_err(|source| GstError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
            vec![path.to_path_buf()]
        };

        if resolved.is_empty() {
            warn!("Input '{}' matched no files", arg);
        } else {
            debug!("Input '{}' resolved to {} file(s)", arg, resolved.len());
        }
        files.extend(resolved);
    }

    if files.is_empty() {
        return Err(GstError::NoInputFiles(args.to_vec()));
    }

    info!("Resolved {} input file(s)", files.len());
    Ok(files)
}

/// All `.jsonl` files below `dir`, sorted by path.
pub fn find_jsonl_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

fn is_pattern(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(|c: char| c == '*' || c == '?'))
        .unwrap_or(false)
}

/// Translate a shell-style file-name pattern into an anchored regex.
fn pattern_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| GstError::Config(format!("bad input pattern '{pattern}': {e}")))
}

fn match_pattern(path: &Path) -> Result<Vec<PathBuf>> {
    let pattern = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let re = pattern_regex(&pattern)?;

    let entries = std::fs::read_dir(&dir).map_err(|source| GstError::FileRead {
        path: dir.clone(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| re.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();

    files.sort();
    Ok(files)
}

// ── Event sources ─────────────────────────────────────────────────────────────

/// Random access to materialised events by row index.
pub trait EventSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialise row `index`, which must be in `[0, len)`.
    fn event(&self, index: usize) -> Result<EventRecord>;
}

#[derive(Debug, Clone)]
struct Row {
    file: usize,
    line: usize,
    text: String,
}

/// Rows of one or more JSONL files, concatenated in order.
#[derive(Debug, Default)]
pub struct JsonlEventStore {
    files: Vec<PathBuf>,
    rows: Vec<Row>,
}

impl JsonlEventStore {
    /// Read every non-blank line of `files`.
    pub fn open(files: &[PathBuf]) -> Result<Self> {
        let mut store = Self {
            files: files.to_vec(),
            rows: Vec::new(),
        };

        for (file_index, path) in files.iter().enumerate() {
            let read_err = |source| GstError::FileRead {
                path: path.clone(),
                source,
            };
            let file = std::fs::File::open(path).map_err(read_err)?;
            let reader = std::io::BufReader::new(file);

            let before = store.rows.len();
            for (line_index, line) in reader.lines().enumerate() {
                let line = line.map_err(read_err)?;
                if line.trim().is_empty() {
                    continue;
                }
                store.rows.push(Row {
                    file: file_index,
                    line: line_index + 1,
                    text: line,
                });
            }
            debug!(
                "File {}: {} rows",
                path.display(),
                store.rows.len() - before
            );
        }

        if store.rows.is_empty() {
            warn!("Input files contain no rows");
        } else {
            info!("Loaded {} rows from {} file(s)", store.rows.len(), files.len());
        }
        Ok(store)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// `file:line` of row `index`.
    pub fn origin(&self, index: usize) -> Option<String> {
        self.rows
            .get(index)
            .map(|row| format!("{}:{}", self.files[row.file].display(), row.line))
    }
}

impl EventSource for JsonlEventStore {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn event(&self, index: usize) -> Result<EventRecord> {
        let origin = self.origin(index).ok_or_else(|| GstError::MalformedRow {
            origin: format!("row {index}"),
            reason: format!("index out of range, store has {} rows", self.rows.len()),
        })?;
        let text = &self.rows[index].text;
        RawRow::parse(text, &origin)?.into_event(&origin)
    }
}

/// In-memory events, for synthetic runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource(pub Vec<EventRecord>);

impl EventSource for MemoryEventSource {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn event(&self, index: usize) -> Result<EventRecord> {
        self.0.get(index).cloned().ok_or_else(|| GstError::MalformedRow {
            origin: format!("row {index}"),
            reason: format!("index out of range, source has {} rows", self.0.len()),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gst_core::event::InteractionFlags;
    use std::io::Write;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_lines(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn event_line(nuance_code: i32) -> String {
        let ev = EventRecord {
            neu: 14,
            nuance_code,
            enu: 1.0,
            elep: 0.4,
            flags: InteractionFlags {
                cc: true,
                qel: true,
                ..Default::default()
            },
            ..Default::default()
        };
        serde_json::to_string(&RawRow::from(&ev)).unwrap()
    }

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    // ── resolve_inputs ────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_directory_recursive_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        write_lines(tmp.path(), "b.jsonl", &[]);
        write_lines(tmp.path(), "a.jsonl", &[]);
        write_lines(&tmp.path().join("sub"), "c.jsonl", &[]);
        write_lines(tmp.path(), "notes.txt", &[]);

        let files = resolve_inputs(&[arg(tmp.path())]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl", "sub/c.jsonl"]);
    }

    #[test]
    fn test_resolve_pattern() {
        let tmp = TempDir::new().unwrap();
        write_lines(tmp.path(), "gntp.2.gst.jsonl", &[]);
        write_lines(tmp.path(), "gntp.1.gst.jsonl", &[]);
        write_lines(tmp.path(), "gntp.10.other.jsonl", &[]);

        let files = resolve_inputs(&[arg(&tmp.path().join("gntp.?.gst.jsonl"))]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("gntp.1.gst.jsonl"));
        assert!(files[1].ends_with("gntp.2.gst.jsonl"));

        let files = resolve_inputs(&[arg(&tmp.path().join("*.jsonl"))]).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_pattern_dots_are_literal() {
        let re = pattern_regex("a.b*").unwrap();
        assert!(re.is_match("a.bcd"));
        assert!(!re.is_match("axbcd"));
    }

    #[test]
    fn test_resolve_keeps_argument_order() {
        let tmp = TempDir::new().unwrap();
        let z = write_lines(tmp.path(), "z.jsonl", &[]);
        let a = write_lines(tmp.path(), "a.jsonl", &[]);
        let files = resolve_inputs(&[arg(&z), arg(&a)]).unwrap();
        assert_eq!(files, vec![z, a]);
    }

    #[test]
    fn test_resolve_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_inputs(&[arg(&tmp.path().join("missing.jsonl"))]).unwrap_err();
        assert!(matches!(err, GstError::FileRead { .. }));
    }

    #[test]
    fn test_resolve_nothing_matched() {
        let tmp = TempDir::new().unwrap();
        let args = vec![arg(&tmp.path().join("*.jsonl"))];
        let err = resolve_inputs(&args).unwrap_err();
        match err {
            GstError::NoInputFiles(patterns) => assert_eq!(patterns, args),
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── JsonlEventStore ───────────────────────────────────────────────────────

    #[test]
    fn test_store_concatenates_and_skips_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let a = write_lines(
            tmp.path(),
            "a.jsonl",
            &[event_line(1), String::new(), event_line(2)],
        );
        let b = write_lines(tmp.path(), "b.jsonl", &["   ".to_string(), event_line(3)]);

        let store = JsonlEventStore::open(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.event(0).unwrap().nuance_code, 1);
        assert_eq!(store.event(1).unwrap().nuance_code, 2);
        assert_eq!(store.event(2).unwrap().nuance_code, 3);

        assert_eq!(store.origin(1).unwrap(), format!("{}:3", a.display()));
        assert_eq!(store.origin(2).unwrap(), format!("{}:2", b.display()));
        assert!(store.origin(3).is_none());
    }

    #[test]
    fn test_store_event_roundtrips_kinematics() {
        let tmp = TempDir::new().unwrap();
        let a = write_lines(tmp.path(), "a.jsonl", &[event_line(1)]);
        let store = JsonlEventStore::open(&[a]).unwrap();
        let ev = store.event(0).unwrap();
        assert!(ev.flags.cc && ev.flags.qel);
        assert_eq!(ev.q0(), 0.6);
    }

    #[test]
    fn test_store_malformed_row_names_origin() {
        let tmp = TempDir::new().unwrap();
        let a = write_lines(tmp.path(), "a.jsonl", &[event_line(1), "{not json".to_string()]);
        let store = JsonlEventStore::open(&[a.clone()]).unwrap();
        let err = store.event(1).unwrap_err();
        match err {
            GstError::MalformedRow { origin, .. } => {
                assert_eq!(origin, format!("{}:2", a.display()))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_store_empty_file() {
        let tmp = TempDir::new().unwrap();
        let a = write_lines(tmp.path(), "a.jsonl", &[]);
        let store = JsonlEventStore::open(&[a]).unwrap();
        assert!(store.is_empty());
        assert!(store.event(0).is_err());
    }

    #[test]
    fn test_store_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = JsonlEventStore::open(&[tmp.path().join("gone.jsonl")]).unwrap_err();
        assert!(matches!(err, GstError::FileRead { .. }));
    }

    // ── MemoryEventSource ─────────────────────────────────────────────────────

    #[test]
    fn test_memory_source() {
        let src = MemoryEventSource(vec![EventRecord::default(); 2]);
        assert_eq!(src.len(), 2);
        assert!(src.event(1).is_ok());
        assert!(src.event(2).is_err());
    }
}
