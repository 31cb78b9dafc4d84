// SPDX-License-Identifier: MIT OR Apache-2.0
//! Elements shared across the record model: contacts, dates, identifiers and
//! citations.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::codec::{
    as_array, as_object, code_value, insert_opt, insert_opt_str, opt_str, req_str,
};
use crate::enums::{ContactRoleCode, DatePrecisionCode, DateTypeCode};
use crate::error::RecordError;

// ---------------------------------------------------------------------------
// Online resources and contacts
// ---------------------------------------------------------------------------

/// Online resource (`gmd:CI_OnlineResource`).
#[derive(Clone, Debug, PartialEq)]
pub struct OnlineResource {
    pub href: String,
    pub protocol: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub function: crate::enums::OnlineResourceFunctionCode,
}

impl OnlineResource {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "online_resource";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            href: req_str(obj, "href", ctx)?,
            protocol: opt_str(obj, "protocol", ctx)?,
            title: opt_str(obj, "title", ctx)?,
            description: opt_str(obj, "description", ctx)?,
            function: crate::codec::req_code(obj, "function", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("href".into(), Value::String(self.href.clone()));
        insert_opt_str(&mut obj, "protocol", self.protocol.as_deref());
        insert_opt_str(&mut obj, "title", self.title.as_deref());
        insert_opt_str(&mut obj, "description", self.description.as_deref());
        obj.insert("function".into(), code_value(&self.function));
        Value::Object(obj)
    }
}

/// Individual or organisation identity, an `xlink:anchor`-style name/href pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactIdentity {
    pub name: String,
    pub href: Option<String>,
    pub title: Option<String>,
}

impl ContactIdentity {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "contact_identity";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            name: req_str(obj, "name", ctx)?,
            href: opt_str(obj, "href", ctx)?,
            title: opt_str(obj, "title", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        insert_opt_str(&mut obj, "href", self.href.as_deref());
        insert_opt_str(&mut obj, "title", self.title.as_deref());
        Value::Object(obj)
    }
}

/// Postal address (`gmd:CI_Address`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Address {
    pub delivery_point: Option<String>,
    pub city: Option<String>,
    pub administrative_area: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "address";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            delivery_point: opt_str(obj, "delivery_point", ctx)?,
            city: opt_str(obj, "city", ctx)?,
            administrative_area: opt_str(obj, "administrative_area", ctx)?,
            postal_code: opt_str(obj, "postal_code", ctx)?,
            country: opt_str(obj, "country", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        insert_opt_str(&mut obj, "delivery_point", self.delivery_point.as_deref());
        insert_opt_str(&mut obj, "city", self.city.as_deref());
        insert_opt_str(
            &mut obj,
            "administrative_area",
            self.administrative_area.as_deref(),
        );
        insert_opt_str(&mut obj, "postal_code", self.postal_code.as_deref());
        insert_opt_str(&mut obj, "country", self.country.as_deref());
        Value::Object(obj)
    }
}

/// Responsible party (`gmd:CI_ResponsibleParty`).
///
/// At least one of `individual` or `organisation` and at least one role are
/// required. Roles are de-duplicated preserving first occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub individual: Option<ContactIdentity>,
    pub organisation: Option<ContactIdentity>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub email: Option<String>,
    pub online_resource: Option<OnlineResource>,
    pub role: Vec<ContactRoleCode>,
}

impl Contact {
    /// Validate the identity and role requirements, de-duplicating roles.
    pub fn new(
        individual: Option<ContactIdentity>,
        organisation: Option<ContactIdentity>,
        role: Vec<ContactRoleCode>,
    ) -> Result<Self, RecordError> {
        let contact = Self {
            individual,
            organisation,
            phone: None,
            address: None,
            email: None,
            online_resource: None,
            role: dedupe_roles(role),
        };
        contact.check()?;
        Ok(contact)
    }

    fn check(&self) -> Result<(), RecordError> {
        if self.individual.is_none() && self.organisation.is_none() {
            return Err(RecordError::malformed(
                "contact",
                "at least one of individual or organisation is required",
            ));
        }
        if self.role.is_empty() {
            return Err(RecordError::malformed(
                "contact",
                "at least one role is required",
            ));
        }
        Ok(())
    }

    /// Compare contacts ignoring roles.
    pub fn eq_no_roles(&self, other: &Contact) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.role.clear();
        b.role.clear();
        a == b
    }

    /// Compare contacts where this contact carries all roles of `other`.
    pub fn eq_contains_roles(&self, other: &Contact) -> bool {
        other.role.iter().all(|role| self.role.contains(role)) && self.eq_no_roles(other)
    }

    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "contact";
        let obj = as_object(value, ctx)?;
        let roles = obj
            .get("role")
            .map(|v| as_array(v, ctx))
            .transpose()?
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        serde_json::from_value::<ContactRoleCode>(item.clone())
                            .map_err(|e| RecordError::malformed(ctx, format!("invalid role: {e}")))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let contact = Self {
            individual: obj
                .get("individual")
                .map(ContactIdentity::structure)
                .transpose()?,
            organisation: obj
                .get("organisation")
                .map(ContactIdentity::structure)
                .transpose()?,
            phone: opt_str(obj, "phone", ctx)?,
            address: obj.get("address").map(Address::structure).transpose()?,
            email: opt_str(obj, "email", ctx)?,
            online_resource: obj
                .get("online_resource")
                .map(OnlineResource::structure)
                .transpose()?,
            role: dedupe_roles(roles),
        };
        contact.check()?;
        Ok(contact)
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        insert_opt(
            &mut obj,
            "individual",
            self.individual.as_ref().map(ContactIdentity::unstructure),
        );
        insert_opt(
            &mut obj,
            "organisation",
            self.organisation.as_ref().map(ContactIdentity::unstructure),
        );
        insert_opt_str(&mut obj, "phone", self.phone.as_deref());
        insert_opt(
            &mut obj,
            "address",
            self.address.as_ref().map(Address::unstructure),
        );
        insert_opt_str(&mut obj, "email", self.email.as_deref());
        insert_opt(
            &mut obj,
            "online_resource",
            self.online_resource.as_ref().map(OnlineResource::unstructure),
        );
        obj.insert(
            "role".into(),
            Value::Array(self.role.iter().map(code_value).collect()),
        );
        Value::Object(obj)
    }
}

fn dedupe_roles(roles: Vec<ContactRoleCode>) -> Vec<ContactRoleCode> {
    let mut seen = Vec::with_capacity(roles.len());
    for role in roles {
        if !seen.contains(&role) {
            seen.push(role);
        }
    }
    seen
}

/// Wrapper around a list of [`Contact`] items with filtering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contacts(pub Vec<Contact>);

impl Contacts {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "contacts")?;
        Ok(Self(
            items
                .iter()
                .map(Contact::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(Contact::unstructure).collect())
    }

    /// Filter contacts by role(s); a contact matches when it has any of them.
    pub fn filter(&self, roles: &[ContactRoleCode]) -> Contacts {
        Contacts(
            self.0
                .iter()
                .filter(|contact| roles.iter().any(|role| contact.role.contains(role)))
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// The value of a [`Date`], a whole day or an instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DateValue {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

/// Date (`gmd:CI_Date`) with optional reduced precision.
///
/// `2014`, `2014-06`, `2014-06-30` and `2014-06-30T14:30:45+00:00` all
/// round-trip losslessly. Instants must be UTC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Date {
    pub value: DateValue,
    pub precision: Option<DatePrecisionCode>,
}

impl Date {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            value: DateValue::Day(date),
            precision: None,
        }
    }

    pub fn instant(datetime: DateTime<Utc>) -> Self {
        Self {
            value: DateValue::Instant(datetime),
            precision: None,
        }
    }

    pub fn year(year: i32) -> Self {
        Self {
            value: DateValue::Day(NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()),
            precision: Some(DatePrecisionCode::Year),
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            value: DateValue::Day(NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()),
            precision: Some(DatePrecisionCode::Month),
        }
    }

    /// ISO 8601 string accounting for possible reduced precision.
    pub fn isoformat(&self) -> String {
        match (&self.value, self.precision) {
            (DateValue::Day(date), Some(DatePrecisionCode::Year)) => format!("{:04}", date.year()),
            (DateValue::Day(date), Some(DatePrecisionCode::Month)) => {
                format!("{:04}-{:02}", date.year(), date.month())
            }
            (DateValue::Day(date), None) => date.format("%Y-%m-%d").to_string(),
            (DateValue::Instant(datetime), _) => {
                datetime.to_rfc3339_opts(SecondsFormat::Secs, false)
            }
        }
    }

    /// Parse a date(time) from an ISO 8601 string, inferring precision.
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "date";
        let raw = value
            .as_str()
            .ok_or_else(|| RecordError::malformed(ctx, "expected a string"))?;

        if raw.contains('T') {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| RecordError::malformed(ctx, format!("invalid datetime: {e}")))?;
            if parsed.offset().local_minus_utc() != 0 {
                return Err(RecordError::malformed(ctx, "datetime must be UTC"));
            }
            return Ok(Self::instant(parsed.with_timezone(&Utc)));
        }

        let parts: Vec<&str> = raw.split('-').collect();
        match parts.as_slice() {
            [year] => {
                let year: i32 = year
                    .parse()
                    .map_err(|e| RecordError::malformed(ctx, format!("invalid year: {e}")))?;
                Ok(Self::year(year))
            }
            [year, month] => {
                let year: i32 = year
                    .parse()
                    .map_err(|e| RecordError::malformed(ctx, format!("invalid year: {e}")))?;
                let month: u32 = month
                    .parse()
                    .map_err(|e| RecordError::malformed(ctx, format!("invalid month: {e}")))?;
                if !(1..=12).contains(&month) {
                    return Err(RecordError::malformed(ctx, "month out of range"));
                }
                Ok(Self::month(year, month))
            }
            _ => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| RecordError::malformed(ctx, format!("invalid date: {e}")))?;
                Ok(Self::day(date))
            }
        }
    }

    pub fn unstructure(&self) -> Value {
        Value::String(self.isoformat())
    }
}

macro_rules! dates_slots {
    ($($field:ident => $code:path),+ $(,)?) => {
        /// Dates keyed by role (`CI_DateTypeCode`).
        ///
        /// At least one date is required.
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct Dates {
            $(pub $field: Option<Date>,)+
        }

        impl Dates {
            /// Look a date up by its type code.
            pub fn get(&self, code: DateTypeCode) -> Option<&Date> {
                match code {
                    $($code => self.$field.as_ref(),)+
                }
            }

            fn set(&mut self, code: DateTypeCode, date: Date) {
                match code {
                    $($code => self.$field = Some(date),)+
                }
            }

            /// Populated slots in declaration order.
            pub fn entries(&self) -> Vec<(DateTypeCode, &Date)> {
                let mut entries = Vec::new();
                $(if let Some(date) = self.$field.as_ref() {
                    entries.push(($code, date));
                })+
                entries
            }

            pub fn is_empty(&self) -> bool {
                self.entries().is_empty()
            }
        }
    };
}

dates_slots! {
    creation => DateTypeCode::Creation,
    publication => DateTypeCode::Publication,
    revision => DateTypeCode::Revision,
    adopted => DateTypeCode::Adopted,
    deprecated => DateTypeCode::Deprecated,
    distribution => DateTypeCode::Distribution,
    expiry => DateTypeCode::Expiry,
    in_force => DateTypeCode::InForce,
    last_revision => DateTypeCode::LastRevision,
    last_update => DateTypeCode::LastUpdate,
    next_update => DateTypeCode::NextUpdate,
    released => DateTypeCode::Released,
    superseded => DateTypeCode::Superseded,
    unavailable => DateTypeCode::Unavailable,
    validity_begins => DateTypeCode::ValidityBegins,
    validity_expires => DateTypeCode::ValidityExpires,
}

impl Dates {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "dates";
        let obj = as_object(value, ctx)?;
        let mut dates = Self::default();
        for (key, raw) in obj {
            let code: DateTypeCode = serde_json::from_value(Value::String(key.clone()))
                .map_err(|e| RecordError::malformed(ctx, format!("invalid date type: {e}")))?;
            dates.set(code, Date::structure(raw)?);
        }
        if dates.is_empty() {
            return Err(RecordError::malformed(ctx, "at least one date is required"));
        }
        Ok(dates)
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        for (code, date) in self.entries() {
            if let Value::String(key) = code_value(&code) {
                obj.insert(key, date.unstructure());
            }
        }
        Value::Object(obj)
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier (`gmd:MD_Identifier`).
#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub identifier: String,
    pub href: Option<String>,
    pub namespace: String,
}

impl Identifier {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "identifier";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            identifier: req_str(obj, "identifier", ctx)?,
            href: opt_str(obj, "href", ctx)?,
            namespace: req_str(obj, "namespace", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("identifier".into(), Value::String(self.identifier.clone()));
        insert_opt_str(&mut obj, "href", self.href.as_deref());
        obj.insert("namespace".into(), Value::String(self.namespace.clone()));
        Value::Object(obj)
    }
}

/// Wrapper around a list of [`Identifier`] items with filtering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Identifiers(pub Vec<Identifier>);

impl Identifiers {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "identifiers")?;
        Ok(Self(
            items
                .iter()
                .map(Identifier::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(Identifier::unstructure).collect())
    }

    /// Filter identifiers by namespace.
    pub fn filter(&self, namespace: &str) -> Identifiers {
        Identifiers(
            self.0
                .iter()
                .filter(|identifier| identifier.namespace == namespace)
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Series and citations
// ---------------------------------------------------------------------------

/// Descriptive series (`gmd:CI_Series`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    pub name: Option<String>,
    pub edition: Option<String>,
    pub page: Option<String>,
}

impl Series {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "series";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            name: opt_str(obj, "name", ctx)?,
            edition: opt_str(obj, "edition", ctx)?,
            page: opt_str(obj, "page", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        insert_opt_str(&mut obj, "name", self.name.as_deref());
        insert_opt_str(&mut obj, "edition", self.edition.as_deref());
        insert_opt_str(&mut obj, "page", self.page.as_deref());
        Value::Object(obj)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.edition.is_none() && self.page.is_none()
    }
}

/// Citation (`gmd:CI_Citation`).
///
/// The JSON form wraps `title` and `href` as `{"title": {"value": …,
/// "href": …}}`; the typed form flattens them.
#[derive(Clone, Debug, PartialEq)]
pub struct Citation {
    pub title: String,
    pub href: Option<String>,
    pub dates: Dates,
    pub edition: Option<String>,
    pub series: Series,
    pub identifiers: Identifiers,
    pub other_citation_details: Option<String>,
    pub contacts: Contacts,
}

impl Citation {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "citation";
        let obj = as_object(value, ctx)?;

        let title_obj = obj
            .get("title")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'title'"))?;
        let title_obj = as_object(title_obj, "citation title")?;
        let title = req_str(title_obj, "value", "citation title")?;
        let href = opt_str(title_obj, "href", "citation title")?;

        let dates = obj
            .get("dates")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'dates'"))?;

        Ok(Self {
            title,
            href,
            dates: Dates::structure(dates)?,
            edition: opt_str(obj, "edition", ctx)?,
            series: obj
                .get("series")
                .map(Series::structure)
                .transpose()?
                .unwrap_or_default(),
            identifiers: obj
                .get("identifiers")
                .map(Identifiers::structure)
                .transpose()?
                .unwrap_or_default(),
            other_citation_details: opt_str(obj, "other_citation_details", ctx)?,
            contacts: obj
                .get("contacts")
                .map(Contacts::structure)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();

        let mut title = Map::new();
        title.insert("value".into(), Value::String(self.title.clone()));
        insert_opt_str(&mut title, "href", self.href.as_deref());
        obj.insert("title".into(), Value::Object(title));

        obj.insert("dates".into(), self.dates.unstructure());
        insert_opt_str(&mut obj, "edition", self.edition.as_deref());
        if !self.series.is_empty() {
            obj.insert("series".into(), self.series.unstructure());
        }
        if !self.identifiers.is_empty() {
            obj.insert("identifiers".into(), self.identifiers.unstructure());
        }
        insert_opt_str(
            &mut obj,
            "other_citation_details",
            self.other_citation_details.as_deref(),
        );
        if !self.contacts.is_empty() {
            obj.insert("contacts".into(), self.contacts.unstructure());
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn poc() -> Contact {
        Contact::new(
            None,
            Some(ContactIdentity {
                name: "x".into(),
                href: None,
                title: None,
            }),
            vec![ContactRoleCode::PointOfContact],
        )
        .unwrap()
    }

    #[test]
    fn contact_requires_identity() {
        let result = Contact::new(None, None, vec![ContactRoleCode::PointOfContact]);
        assert!(result.is_err());
    }

    #[test]
    fn contact_requires_role() {
        let identity = ContactIdentity {
            name: "x".into(),
            href: None,
            title: None,
        };
        assert!(Contact::new(None, Some(identity), vec![]).is_err());
    }

    #[test]
    fn contact_roles_deduplicated() {
        let identity = ContactIdentity {
            name: "x".into(),
            href: None,
            title: None,
        };
        let contact = Contact::new(
            None,
            Some(identity),
            vec![
                ContactRoleCode::Author,
                ContactRoleCode::Author,
                ContactRoleCode::Publisher,
            ],
        )
        .unwrap();
        assert_eq!(
            contact.role,
            vec![ContactRoleCode::Author, ContactRoleCode::Publisher]
        );
    }

    #[test]
    fn contact_roundtrip() {
        let value = json!({"organisation": {"name": "x"}, "role": ["pointOfContact"]});
        let contact = Contact::structure(&value).unwrap();
        assert_eq!(contact, poc());
        assert_eq!(contact.unstructure(), value);
    }

    #[test]
    fn contacts_filter_by_role() {
        let mut author = poc();
        author.role = vec![ContactRoleCode::Author];
        let contacts = Contacts(vec![poc(), author]);
        let filtered = contacts.filter(&[ContactRoleCode::PointOfContact]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.0[0].role, vec![ContactRoleCode::PointOfContact]);
    }

    #[test]
    fn contact_eq_ignoring_roles() {
        let a = poc();
        let mut b = poc();
        b.role = vec![ContactRoleCode::Author];
        assert!(a.eq_no_roles(&b));

        let mut c = poc();
        c.role = vec![
            ContactRoleCode::PointOfContact,
            ContactRoleCode::Author,
        ];
        assert!(c.eq_contains_roles(&a));
        assert!(!a.eq_contains_roles(&c));
    }

    #[test]
    fn date_year_precision_roundtrip() {
        let date = Date::structure(&json!("2014")).unwrap();
        assert_eq!(date.precision, Some(DatePrecisionCode::Year));
        assert_eq!(date.isoformat(), "2014");
    }

    #[test]
    fn date_month_precision_roundtrip() {
        let date = Date::structure(&json!("2014-06")).unwrap();
        assert_eq!(date.precision, Some(DatePrecisionCode::Month));
        assert_eq!(date.isoformat(), "2014-06");
    }

    #[test]
    fn date_day_roundtrip() {
        let date = Date::structure(&json!("2014-06-30")).unwrap();
        assert_eq!(date.precision, None);
        assert_eq!(date.isoformat(), "2014-06-30");
    }

    #[test]
    fn date_instant_roundtrip() {
        let date = Date::structure(&json!("2014-06-30T14:30:45+00:00")).unwrap();
        assert_eq!(date.isoformat(), "2014-06-30T14:30:45+00:00");
    }

    #[test]
    fn date_instant_must_be_utc() {
        let result = Date::structure(&json!("2014-06-30T14:30:45+01:00"));
        assert!(result.is_err());
    }

    #[test]
    fn dates_requires_at_least_one() {
        assert!(Dates::structure(&json!({})).is_err());
    }

    #[test]
    fn dates_camel_case_keys_roundtrip() {
        let value = json!({"lastRevision": "2021"});
        let dates = Dates::structure(&value).unwrap();
        assert!(dates.last_revision.is_some());
        assert_eq!(dates.unstructure(), value);
    }

    #[test]
    fn identifiers_filter_by_namespace() {
        let identifiers = Identifiers(vec![
            Identifier {
                identifier: "a".into(),
                href: None,
                namespace: "doi".into(),
            },
            Identifier {
                identifier: "b".into(),
                href: None,
                namespace: "isbn".into(),
            },
        ]);
        let filtered = identifiers.filter("doi");
        assert_eq!(filtered.0.len(), 1);
        assert_eq!(filtered.0[0].identifier, "a");
    }

    #[test]
    fn citation_title_wrapping_roundtrip() {
        let value = json!({
            "title": {"value": "x", "href": "https://example.com"},
            "dates": {"creation": "2014-06-30"},
        });
        let citation = Citation::structure(&value).unwrap();
        assert_eq!(citation.title, "x");
        assert_eq!(citation.href.as_deref(), Some("https://example.com"));
        assert_eq!(citation.unstructure(), value);
    }
}
