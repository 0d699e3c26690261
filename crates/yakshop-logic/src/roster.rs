//! Herd roster loading from XML.
//!
//! Every child of the root element is one yak and must carry `name`, `sex`
//! and `age` attributes:
//!
//! ```xml
//! <herd>
//!     <labyak name="Betty-1" age="4" sex="f"/>
//! </herd>
//! ```

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::growth::Yak;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed roster XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("roster XML ends inside an unclosed element")]
    Unclosed,

    #[error("yak record {index} is missing attribute '{attribute}'")]
    MissingAttribute { index: usize, attribute: &'static str },

    #[error("yak record {index} has invalid age '{value}'")]
    InvalidAge { index: usize, value: String },

    #[error("no yak records in roster")]
    Empty,
}

/// Flat record produced by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YakRecord {
    pub name: String,
    pub sex: String,
    /// Age in years.
    pub age: f64,
}

impl YakRecord {
    pub fn into_yak(self, id: u64) -> Yak {
        Yak::new(id, self.name, self.sex, self.age)
    }
}

pub fn parse_herd_xml(xml: &str) -> Result<Vec<YakRecord>, RosterError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0_usize;
    let mut records = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 1 {
                    records.push(read_record(&e, records.len())?);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 {
                    records.push(read_record(&e, records.len())?);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(RosterError::Unclosed);
    }
    if records.is_empty() {
        return Err(RosterError::Empty);
    }
    Ok(records)
}

fn read_record(element: &BytesStart<'_>, index: usize) -> Result<YakRecord, RosterError> {
    let mut name = None;
    let mut sex = None;
    let mut age = None;

    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"sex" => sex = Some(value),
            b"age" => age = Some(value),
            _ => {}
        }
    }

    let name = name.ok_or(RosterError::MissingAttribute {
        index,
        attribute: "name",
    })?;
    let sex = sex.ok_or(RosterError::MissingAttribute {
        index,
        attribute: "sex",
    })?;
    let raw_age = age.ok_or(RosterError::MissingAttribute {
        index,
        attribute: "age",
    })?;
    let age = raw_age
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
        .ok_or(RosterError::InvalidAge {
            index,
            value: raw_age.clone(),
        })?;

    Ok(YakRecord { name, sex, age })
}

/// Parse a roster and assign ids starting at 1.
pub fn herd_from_xml(xml: &str) -> Result<Vec<Yak>, RosterError> {
    let records = parse_herd_xml(xml)?;
    Ok(records
        .into_iter()
        .zip(1_u64..)
        .map(|(record, id)| record.into_yak(id))
        .collect())
}

pub fn load_herd_file(path: impl AsRef<Path>) -> Result<Vec<Yak>, RosterError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Loaded roster {} ({} bytes)", path.display(), xml.len());
    herd_from_xml(&xml)
}
