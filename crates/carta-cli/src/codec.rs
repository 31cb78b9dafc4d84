// SPDX-License-Identifier: MIT OR Apache-2.0
//! Default ISO XML codec.
//!
//! Encodes the core of a record configuration as an ISO 19115-2 envelope.
//! This stands in for the full metadata library codec behind the
//! [`IsoXmlCodec`] seam; a complete implementation can be swapped in without
//! touching the exporters.

use serde_json::Value;

use carta_record::{IsoXmlCodec, IsoXmlError};

/// Escape text for XML element content.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn text(config: &Value, pointer: &str) -> String {
    config
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(escape)
        .unwrap_or_default()
}

/// Minimal ISO 19115-2 envelope encoder.
pub struct EnvelopeIsoXmlCodec;

impl IsoXmlCodec for EnvelopeIsoXmlCodec {
    fn encode(&self, config: &Value) -> Result<String, IsoXmlError> {
        let file_identifier = text(config, "/file_identifier");
        let hierarchy_level = text(config, "/hierarchy_level");
        let title = text(config, "/identification/title/value");
        let abstract_ = text(config, "/identification/abstract");
        let date_stamp = text(config, "/metadata/date_stamp");

        let mut dates = String::new();
        if let Some(Value::Object(date_map)) = config.pointer("/identification/dates") {
            for (role, value) in date_map {
                if let Some(value) = value.as_str() {
                    dates.push_str(&format!(
                        "      <gmd:date><gmd:CI_Date><gmd:date>{}</gmd:date>\
                         <gmd:dateType codeListValue=\"{}\"/></gmd:CI_Date></gmd:date>\n",
                        escape(value),
                        escape(role),
                    ));
                }
            }
        }

        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <gmi:MI_Metadata xmlns:gmi=\"http://www.isotc211.org/2005/gmi\" \
             xmlns:gmd=\"http://www.isotc211.org/2005/gmd\" \
             xmlns:gco=\"http://www.isotc211.org/2005/gco\">\n\
             \x20 <gmd:fileIdentifier><gco:CharacterString>{file_identifier}</gco:CharacterString></gmd:fileIdentifier>\n\
             \x20 <gmd:hierarchyLevel codeListValue=\"{hierarchy_level}\"/>\n\
             \x20 <gmd:dateStamp><gco:Date>{date_stamp}</gco:Date></gmd:dateStamp>\n\
             \x20 <gmd:identificationInfo>\n\
             \x20   <gmd:citation><gmd:CI_Citation>\n\
             \x20     <gmd:title><gco:CharacterString>{title}</gco:CharacterString></gmd:title>\n\
             {dates}\
             \x20   </gmd:CI_Citation></gmd:citation>\n\
             \x20   <gmd:abstract><gco:CharacterString>{abstract_}</gco:CharacterString></gmd:abstract>\n\
             \x20 </gmd:identificationInfo>\n\
             </gmi:MI_Metadata>\n"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_carries_core_fields() {
        let config = json!({
            "file_identifier": "5d5b4e21-fd32-409c-be83-ca1c339903e5",
            "hierarchy_level": "product",
            "metadata": {"date_stamp": "2014-06-30"},
            "identification": {
                "title": {"value": "Adelaide & Rothera"},
                "abstract": "x",
                "dates": {"creation": "2014-06-30"},
            },
        });
        let xml = EnvelopeIsoXmlCodec.encode(&config).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\""));
        assert!(xml.contains("5d5b4e21-fd32-409c-be83-ca1c339903e5"));
        assert!(xml.contains("Adelaide &amp; Rothera"));
        assert!(xml.contains("codeListValue=\"creation\""));
    }
}
