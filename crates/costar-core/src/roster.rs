//! Roster records handed from ingestion to the graph builder.
//!
//! A roster is a list of productions plus a list of roles. Role years are
//! kept as raw text because source listings are not always clean; the
//! graph decides whether a year is usable when it resolves the role.

use crate::error::{Result, RosterError};
use crate::node::Gender;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A production as listed by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub stars: f64,
    #[serde(default)]
    pub votes: u32,
}

/// A performer appearing in a production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub performer: String,
    pub production: String,
    /// Raw year text; may not be a valid integer.
    #[serde(deserialize_with = "year_text")]
    pub year: String,
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl RoleRecord {
    pub fn new(
        performer: impl Into<String>,
        production: impl Into<String>,
        year: impl ToString,
    ) -> Self {
        Self {
            performer: performer.into(),
            production: production.into(),
            year: year.to_string(),
            gender: None,
        }
    }
}

/// Productions and roles read from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub productions: Vec<ProductionRecord>,
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
}

impl Roster {
    /// Parses a JSON roster.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reads a JSON roster from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let roster = Self::from_json_str(&text)?;
        debug!(
            "Read roster {}: {} productions, {} roles",
            path.as_ref().display(),
            roster.productions.len(),
            roster.roles.len()
        );
        Ok(roster)
    }

    /// Appends roles parsed from the `performer;production;year` line format.
    pub fn extend_roles_from_lines(&mut self, text: &str) -> Result<usize> {
        let roles = parse_role_lines(text)?;
        let count = roles.len();
        self.roles.extend(roles);
        Ok(count)
    }
}

/// Parses roles written one per line as `performer;production;year`.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_role_lines(text: &str) -> Result<Vec<RoleRecord>> {
    let mut roles = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(RosterError::Malformed {
                line: idx + 1,
                reason: format!("expected 3 fields, found {}", fields.len()),
            });
        }
        if fields[0].is_empty() || fields[1].is_empty() {
            return Err(RosterError::Malformed {
                line: idx + 1,
                reason: "empty performer or production name".to_string(),
            });
        }

        roles.push(RoleRecord::new(fields[0], fields[1], fields[2]));
    }

    Ok(roles)
}

/// Accepts a year written either as a JSON number or a string.
fn year_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YearRepr {
        Number(i64),
        Text(String),
    }

    Ok(match YearRepr::deserialize(deserializer)? {
        YearRepr::Number(n) => n.to_string(),
        YearRepr::Text(s) => s,
    })
}
