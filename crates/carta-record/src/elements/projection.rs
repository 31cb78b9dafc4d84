// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reference system (projection) information.

use serde_json::{Map, Value};

use crate::codec::{as_object, insert_opt, insert_opt_str, opt_str, req_str};
use crate::elements::common::Citation;
use crate::error::RecordError;

/// Coordinate reference system code, an anchor-style value/href pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Code {
    pub value: String,
    pub href: Option<String>,
}

impl Code {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "reference system code";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            value: req_str(obj, "value", ctx)?,
            href: opt_str(obj, "href", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("value".into(), Value::String(self.value.clone()));
        insert_opt_str(&mut obj, "href", self.href.as_deref());
        Value::Object(obj)
    }
}

/// Reference system info (`gmd:MD_ReferenceSystem`).
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSystemInfo {
    pub code: Code,
    pub version: Option<String>,
    pub authority: Option<Citation>,
}

impl ReferenceSystemInfo {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "reference_system_info";
        let obj = as_object(value, ctx)?;
        let code = obj
            .get("code")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'code'"))?;
        Ok(Self {
            code: Code::structure(code)?,
            version: opt_str(obj, "version", ctx)?,
            authority: obj
                .get("authority")
                .map(Citation::structure)
                .transpose()?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("code".into(), self.code.unstructure());
        insert_opt_str(&mut obj, "version", self.version.as_deref());
        insert_opt(
            &mut obj,
            "authority",
            self.authority.as_ref().map(Citation::unstructure),
        );
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_system_roundtrip() {
        let value = json!({
            "code": {
                "value": "urn:ogc:def:crs:EPSG::3031",
                "href": "http://www.opengis.net/def/crs/EPSG/0/3031",
            },
            "version": "6.18.3",
            "authority": {
                "title": {"value": "European Petroleum Survey Group (EPSG) Geodetic Parameter Registry"},
                "dates": {"publication": "2008-11-12"},
            },
        });
        let projection = ReferenceSystemInfo::structure(&value).unwrap();
        assert_eq!(projection.code.value, "urn:ogc:def:crs:EPSG::3031");
        assert_eq!(projection.unstructure(), value);
    }
}
