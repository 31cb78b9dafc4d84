// SPDX-License-Identifier: MIT OR Apache-2.0
//! Distribution elements: how a resource is served.

use serde_json::{Map, Value};

use crate::codec::{as_object, insert_opt, insert_opt_str, opt_str, req_f64, req_str};
use crate::elements::common::{Contact, OnlineResource};
use crate::enums::ContactRoleCode;
use crate::error::RecordError;

/// Distribution format.
#[derive(Clone, Debug, PartialEq)]
pub struct Format {
    pub format: String,
    pub href: Option<String>,
}

impl Format {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "format";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            format: req_str(obj, "format", ctx)?,
            href: opt_str(obj, "href", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("format".into(), Value::String(self.format.clone()));
        insert_opt_str(&mut obj, "href", self.href.as_deref());
        Value::Object(obj)
    }
}

/// Transfer size.
#[derive(Clone, Debug, PartialEq)]
pub struct Size {
    pub unit: String,
    pub magnitude: f64,
}

impl Size {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "size";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            unit: req_str(obj, "unit", ctx)?,
            magnitude: req_f64(obj, "magnitude", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("unit".into(), Value::String(self.unit.clone()));
        obj.insert(
            "magnitude".into(),
            serde_json::Number::from_f64(self.magnitude)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
        Value::Object(obj)
    }
}

/// Transfer option: an online resource plus optional size.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferOption {
    pub online_resource: OnlineResource,
    pub size: Option<Size>,
}

impl TransferOption {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "transfer_option";
        let obj = as_object(value, ctx)?;
        let online_resource = obj
            .get("online_resource")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'online_resource'"))?;
        Ok(Self {
            online_resource: OnlineResource::structure(online_resource)?,
            size: obj.get("size").map(Size::structure).transpose()?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "online_resource".into(),
            self.online_resource.unstructure(),
        );
        insert_opt(&mut obj, "size", self.size.as_ref().map(Size::unstructure));
        Value::Object(obj)
    }
}

/// Distribution entry: format, distributor and transfer option.
///
/// The distributor contact must carry the `distributor` role.
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub format: Option<Format>,
    pub distributor: Contact,
    pub transfer_option: TransferOption,
}

impl Distribution {
    pub fn new(
        format: Option<Format>,
        distributor: Contact,
        transfer_option: TransferOption,
    ) -> Result<Self, RecordError> {
        if !distributor.role.contains(&ContactRoleCode::Distributor) {
            return Err(RecordError::malformed(
                "distribution",
                "distributor contact must include the 'distributor' role",
            ));
        }
        Ok(Self {
            format,
            distributor,
            transfer_option,
        })
    }

    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "distribution";
        let obj = as_object(value, ctx)?;
        let distributor = obj
            .get("distributor")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'distributor'"))?;
        let transfer_option = obj
            .get("transfer_option")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'transfer_option'"))?;
        Self::new(
            obj.get("format").map(Format::structure).transpose()?,
            Contact::structure(distributor)?,
            TransferOption::structure(transfer_option)?,
        )
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        insert_opt(
            &mut obj,
            "format",
            self.format.as_ref().map(Format::unstructure),
        );
        obj.insert("distributor".into(), self.distributor.unstructure());
        obj.insert("transfer_option".into(), self.transfer_option.unstructure());
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn distribution_value() -> Value {
        json!({
            "format": {
                "format": "GeoPackage",
                "href": "https://www.iana.org/assignments/media-types/application/geopackage+sqlite3",
            },
            "distributor": {"organisation": {"name": "x"}, "role": ["distributor"]},
            "transfer_option": {
                "online_resource": {"href": "https://example.com/x.gpkg", "function": "download"},
                "size": {"unit": "bytes", "magnitude": 1024.0},
            },
        })
    }

    #[test]
    fn distribution_roundtrip() {
        let value = distribution_value();
        let distribution = Distribution::structure(&value).unwrap();
        assert_eq!(
            distribution.transfer_option.size.as_ref().unwrap().magnitude,
            1024.0
        );
        assert_eq!(distribution.unstructure(), value);
    }

    #[test]
    fn distributor_role_required() {
        let value = json!({
            "distributor": {"organisation": {"name": "x"}, "role": ["author"]},
            "transfer_option": {
                "online_resource": {"href": "x", "function": "download"},
            },
        });
        let result = Distribution::structure(&value);
        assert!(matches!(result, Err(RecordError::Malformed(_))));
    }
}
