//! Conversions from posts into template [`Value`]s.

use crate::post::{Metadata, PostRecord};
use gtmpl_value::Value;
use std::collections::HashMap;

impl From<&Metadata> for Value {
    /// Converts [`Metadata`] into an object with fields `postId`, `date`
    /// (`YYYY-MM-DD`), `datetime` (RFC 3339), `title`, `author`,
    /// `description` and `image`. A missing date is nil.
    fn from(info: &Metadata) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("postId".to_owned(), Value::String(info.post_id.clone()));
        match &info.date {
            Some(date) => {
                m.insert(
                    "date".to_owned(),
                    Value::String(date.format("%Y-%m-%d").to_string()),
                );
                m.insert("datetime".to_owned(), Value::String(date.to_rfc3339()));
            }
            None => {
                m.insert("date".to_owned(), Value::Nil);
                m.insert("datetime".to_owned(), Value::Nil);
            }
        }
        m.insert("title".to_owned(), Value::String(info.title.clone()));
        m.insert("author".to_owned(), Value::String(info.author.clone()));
        m.insert(
            "description".to_owned(),
            Value::String(info.description.clone()),
        );
        m.insert("image".to_owned(), Value::String(info.image.clone()));
        Value::Object(m)
    }
}

impl From<&PostRecord> for Value {
    /// Converts a [`PostRecord`] into an object with fields `path`, `info`,
    /// `post` (markdown), `html` (nil if conversion failed) and `href` (the
    /// output file name).
    fn from(record: &PostRecord) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "path".to_owned(),
            Value::String(record.path.display().to_string()),
        );
        m.insert("info".to_owned(), Value::from(&record.info));
        m.insert("post".to_owned(), Value::String(record.post.clone()));
        m.insert("html".to_owned(), html_value(record));
        m.insert("href".to_owned(), Value::String(record.file_name()));
        Value::Object(m)
    }
}

fn html_value(record: &PostRecord) -> Value {
    match &record.file {
        Some(html) => Value::String(html.clone()),
        None => Value::Nil,
    }
}

// Template payloads are always wrapped in a top-level `values` field.
fn wrap(values: Value) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("values".to_owned(), values);
    Value::Object(m)
}

/// The payload for the index page: `{ values: [post...] }`.
pub fn index_payload(records: &[PostRecord]) -> Value {
    wrap(Value::Array(records.iter().map(Value::from).collect()))
}

/// The payload for a post page: `{ values: { info, html } }`.
pub fn post_payload(record: &PostRecord) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("info".to_owned(), Value::from(&record.info));
    m.insert("html".to_owned(), html_value(record));
    wrap(Value::Object(m))
}
