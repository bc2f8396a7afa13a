use std::path::Path;

use serde_json::Value;

use crate::model::task::{Priority, Task};

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid JSON format: expected an array of tasks")]
    NotAnArray,
    #[error("task at index {index} is missing a title")]
    MissingTitle { index: usize },
    #[error("task at index {index} is malformed: {source}")]
    InvalidTask {
        index: usize,
        source: serde_json::Error,
    },
    #[error("CSV file must contain a header row and at least one data row")]
    TooFewRows,
    #[error("CSV file must contain a 'title' column")]
    MissingTitleColumn,
    #[error("unsupported file format {0:?}: use .json or .csv")]
    UnsupportedFormat(String),
}

/// Interchange format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Format, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        Format::parse(&ext).ok_or(ImportError::UnsupportedFormat(ext))
    }

    pub fn parse(s: &str) -> Option<Format> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }
}

/// Column order of CSV exports
pub const CSV_HEADERS: [&str; 11] = [
    "id",
    "title",
    "description",
    "category",
    "priority",
    "dueDate",
    "completed",
    "assignedTo",
    "notes",
    "created",
    "timer",
];

/// Parse import text in the given format
pub fn import_tasks(text: &str, format: Format) -> Result<Vec<Task>, ImportError> {
    match format {
        Format::Json => import_json(text),
        Format::Csv => import_csv(text),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Parse a JSON array of task objects. Every task needs a non-empty title;
/// ids are reset to 0 so the store assigns fresh ones.
pub fn import_json(text: &str) -> Result<Vec<Task>, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    // Validate every title before converting anything
    for (index, item) in items.iter().enumerate() {
        let has_title = item
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        if !has_title {
            return Err(ImportError::MissingTitle { index });
        }
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let mut task: Task = serde_json::from_value(item)
                .map_err(|source| ImportError::InvalidTask { index, source })?;
            task.id = 0;
            Ok(task)
        })
        .collect()
}

/// Pretty-printed JSON array
pub fn export_json(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tasks)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse CSV with a header row. Requires a `title` column; rows without a
/// title are skipped. Quoted fields may contain commas, doubled quotes and
/// line breaks.
pub fn import_csv(text: &str) -> Result<Vec<Task>, ImportError> {
    let mut records = read_csv_records(text).into_iter();
    let header = records.next().ok_or(ImportError::TooFewRows)?;
    let rows: Vec<Vec<String>> = records.collect();
    if rows.is_empty() {
        return Err(ImportError::TooFewRows);
    }

    let headers: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    if !headers.iter().any(|h| h == "title") {
        return Err(ImportError::MissingTitleColumn);
    }

    let mut tasks = Vec::new();
    for values in rows {
        let mut task = Task::new("");
        for (header, value) in headers.iter().zip(values.iter()) {
            apply_csv_field(&mut task, header, value.trim());
        }
        if task.title.is_empty() {
            continue;
        }
        task.id = 0;
        tasks.push(task);
    }
    Ok(tasks)
}

fn apply_csv_field(task: &mut Task, header: &str, value: &str) {
    match header {
        "title" => task.title = value.to_string(),
        "description" => task.description = value.to_string(),
        "category" => task.category = value.to_string(),
        "priority" => task.priority = Priority::parse(value).unwrap_or_default(),
        "dueDate" => task.due_date = value.to_string(),
        "completed" => task.completed = value.eq_ignore_ascii_case("true"),
        "assignedTo" => task.assigned_to = value.parse().unwrap_or(0),
        "timer" => task.timer = value.parse().unwrap_or(0),
        "subtasks" if !value.is_empty() => {
            task.subtasks = value.split(';').map(|s| s.to_string()).collect();
        }
        "notes" if !value.is_empty() => task.notes = Some(value.to_string()),
        "created" => task.created = value.to_string(),
        _ => {}
    }
}

/// Split CSV text into records of fields. Line breaks inside a quoted
/// field belong to the field; blank records are dropped.
fn read_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    let mut finish_record = |record: &mut Vec<String>, field: &mut String| {
        record.push(std::mem::take(field));
        let fields = std::mem::take(record);
        if !fields.iter().all(|f| f.trim().is_empty()) {
            records.push(fields);
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => record.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => finish_record(&mut record, &mut field),
            _ => field.push(c),
        }
    }
    finish_record(&mut record, &mut field);
    records
}

/// CSV with the fixed `CSV_HEADERS` columns, rows joined by `\n`. Values
/// holding a comma, quote or line break are quoted.
pub fn export_csv(tasks: &[Task]) -> String {
    let mut rows = vec![CSV_HEADERS.join(",")];
    for task in tasks {
        let cells = [
            task.id.to_string(),
            task.title.clone(),
            task.description.clone(),
            task.category.clone(),
            task.priority.to_string(),
            task.due_date.clone(),
            task.completed.to_string(),
            task.assigned_to.to_string(),
            task.notes.clone().unwrap_or_default(),
            task.created.clone(),
            task.timer.to_string(),
        ];
        let row: Vec<String> = cells.iter().map(|c| quote_csv(c)).collect();
        rows.push(row.join(","));
    }
    rows.join("\n")
}

fn quote_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
