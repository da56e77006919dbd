use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, str::FromStr};

/// How restriction keys and values are translated into index fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMapping {
    /// Keys are emitted as written and values are only escaped.
    #[default]
    Verbatim,
    /// File index schema: well-known keys map to index fields, free text
    /// searches `Name`, values are lowercased and media types expand to
    /// MIME types.
    Index,
}

const INDEX_FIELDS: &[(&str, &str)] = &[
    ("", "Name"),
    ("name", "Name"),
    ("tag", "Tags"),
    ("tags", "Tags"),
    ("id", "ID"),
    ("hidden", "Hidden"),
    ("mtime", "Mtime"),
    ("mediatype", "MimeType"),
    ("content", "Content"),
];

// Fields holding opaque identifiers or flags; their values are kept as written.
const OPAQUE_FIELDS: &[&str] = &["ID", "Hidden"];

const DOCUMENT_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.form",
    "application/vnd.oasis.opendocument.text",
    "text/plain",
    "text/markdown",
    "application/rtf",
    "application/vnd.apple.pages",
];

const SPREADSHEET_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
    "text/csv",
    "application/vnd.apple.numbers",
];

const PRESENTATION_TYPES: &[&str] = &[
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.oasis.opendocument.presentation",
    "application/vnd.apple.keynote",
];

const ARCHIVE_TYPES: &[&str] = &[
    "application/zip",
    "application/x-tar",
    "application/gzip",
    "application/x-7z-compressed",
    "application/vnd.rar",
];

/// MIME types behind a `mediatype:` alias.
pub fn media_types(alias: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match alias.to_ascii_lowercase().as_str() {
        "document" => DOCUMENT_TYPES,
        "spreadsheet" => SPREADSHEET_TYPES,
        "presentation" => PRESENTATION_TYPES,
        "archive" => ARCHIVE_TYPES,
        "pdf" => &["application/pdf"],
        "image" => &["image/*"],
        "video" => &["video/*"],
        "audio" => &["audio/*"],
        _ => return None,
    };
    Some(types)
}

impl FieldMapping {
    pub fn field<'k>(self, key: &'k str) -> Cow<'k, str> {
        match self {
            FieldMapping::Verbatim => Cow::Borrowed(key),
            FieldMapping::Index => INDEX_FIELDS
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(key))
                .map_or(Cow::Borrowed(key), |(_, field)| Cow::Borrowed(*field)),
        }
    }

    pub fn text_value(self, field: &str, value: &str) -> String {
        match self {
            FieldMapping::Verbatim => escape(value),
            FieldMapping::Index if OPAQUE_FIELDS.contains(&field) => value.to_string(),
            FieldMapping::Index => escape(&value.to_lowercase()),
        }
    }

    pub fn bool_value(self, value: bool) -> &'static str {
        match (self, value) {
            (FieldMapping::Verbatim, true) => "true",
            (FieldMapping::Verbatim, false) => "false",
            (FieldMapping::Index, true) => "T",
            (FieldMapping::Index, false) => "F",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldMapping::Verbatim => "verbatim",
            FieldMapping::Index => "index",
        }
    }
}

impl fmt::Display for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verbatim" => Ok(FieldMapping::Verbatim),
            "index" => Ok(FieldMapping::Index),
            other => Err(format!("unknown field mapping '{other}'")),
        }
    }
}

/// Backslash-escapes characters that carry meaning in the query-string
/// language. Wildcards `*` and `?` are left alone.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if is_reserved(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn is_reserved(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-'
            | '='
            | '&'
            | '|'
            | '>'
            | '<'
            | '!'
            | '('
            | ')'
            | '{'
            | '}'
            | '['
            | ']'
            | '^'
            | '"'
            | '~'
            | ':'
            | '\\'
            | '/'
            | ' '
    )
}
