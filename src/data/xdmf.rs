use std::io;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Reasons a surface XDMF file cannot be queried.
#[derive(Debug, Error)]
pub enum XdmfError {
    #[error("reading file: {0}")]
    Io(#[from] io::Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("no Topology element")]
    MissingTopology,

    #[error("invalid element count '{0}'")]
    BadElementCount(String),
}

/// Number of cell elements declared by a SeisSol surface XDMF file.
///
/// Reads `NumberOfElements` on the first `Topology` element. Files that omit
/// it are accepted when the topology's `DataItem` carries `Dimensions`, whose
/// leading entry is the element count.
pub fn read_element_count(path: &Path) -> Result<usize, XdmfError> {
    let text = std::fs::read_to_string(path)?;
    element_count_from_str(&text)
}

pub fn element_count_from_str(text: &str) -> Result<usize, XdmfError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut in_topology = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Topology" => {
                if let Some(raw) = attribute(&e, b"NumberOfElements")? {
                    return parse_count(&raw);
                }
                in_topology = true;
            }
            Event::Start(e) | Event::Empty(e)
                if in_topology && e.local_name().as_ref() == b"DataItem" =>
            {
                let dims = attribute(&e, b"Dimensions")?
                    .ok_or_else(|| XdmfError::BadElementCount(String::new()))?;
                let first = dims.split_whitespace().next().unwrap_or_default();
                return parse_count(first);
            }
            Event::End(e) if e.local_name().as_ref() == b"Topology" => {
                return Err(XdmfError::BadElementCount(String::new()));
            }
            Event::Eof => return Err(XdmfError::MissingTopology),
            _ => {}
        }
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, XdmfError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_count(raw: &str) -> Result<usize, XdmfError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| XdmfError::BadElementCount(raw.to_string()))
}
