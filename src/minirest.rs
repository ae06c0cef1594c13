//! Wire format of the Stretch `minirest` appliance listing.
//!
//! The gateway answers `GET /minirest/appliances/` with a document holding one
//! `appliance` element per connected plug. Only the module id, name, type and
//! current power usage are read; every other element and attribute is ignored.

use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::snapshot::{Appliance, UNIT_WATT};

pub const APPLIANCES_PATH: &str = "/minirest/appliances/";

const ROOT_ELEMENT: &[u8] = b"appliances";

#[derive(Debug, Deserialize)]
struct AppliancesDocument {
    #[serde(rename = "appliance", default)]
    appliances: Vec<ApplianceElement>,
}

#[derive(Debug, Deserialize)]
struct ApplianceElement {
    module: ModuleElement,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    current_power_usage: String,
}

#[derive(Debug, Deserialize)]
struct ModuleElement {
    #[serde(rename = "@id")]
    id: String,
}

/// Parse an appliance listing into readings, preserving document order.
///
/// Either the whole document maps cleanly or nothing is returned: a malformed
/// document, a missing child element, a non-numeric power value or a repeated
/// module id all fail with [`AppError::Parse`]. So does a document whose root
/// is not `<appliances>` or that carries anything after the root closes.
pub fn parse_appliances(xml: &str) -> Result<Vec<Appliance>> {
    check_document_shape(xml)?;

    let document: AppliancesDocument = quick_xml::de::from_str(xml)
        .map_err(|e| AppError::Parse(format!("invalid appliance document: {e}")))?;

    let mut seen = HashSet::with_capacity(document.appliances.len());
    let mut readings = Vec::with_capacity(document.appliances.len());

    for element in document.appliances {
        let id = element.module.id.trim().to_string();
        if !seen.insert(id.clone()) {
            return Err(AppError::Parse(format!("duplicate appliance id {id}")));
        }

        let current_power = parse_power(&id, &element.current_power_usage)?;
        debug!(id = %id, name = %element.name, power = current_power, "parsed appliance");

        readings.push(Appliance {
            id,
            name: element.name,
            kind: element.kind,
            current_power,
            unit_of_measure: UNIT_WATT,
        });
    }

    Ok(readings)
}

// The serde deserializer stops at the end of the root element, so the
// document structure is checked separately.
fn check_document_shape(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut seen_root = false;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::Parse(format!("invalid appliance document: {e}")))?;

        if depth == 0 {
            match &event {
                Event::Eof => break,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Start(e) | Event::Empty(e) if !seen_root => {
                    if e.local_name().as_ref() != ROOT_ELEMENT {
                        return Err(AppError::Parse(format!(
                            "unexpected root element <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        )));
                    }
                    seen_root = true;
                }
                _ => {
                    return Err(AppError::Parse(format!(
                        "unexpected content outside <appliances> at byte {}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(AppError::Parse(
                    "document ends inside <appliances>".to_string(),
                ));
            }
            _ => {}
        }
    }

    if !seen_root {
        return Err(AppError::Parse("missing <appliances> root element".to_string()));
    }
    Ok(())
}

fn parse_power(id: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        AppError::Parse(format!(
            "appliance {id}: current_power_usage {raw:?} is not a number"
        ))
    })?;
    if !value.is_finite() {
        return Err(AppError::Parse(format!(
            "appliance {id}: current_power_usage {raw:?} is not finite"
        )));
    }
    Ok(value)
}
