// SPDX-License-Identifier: MIT OR Apache-2.0
//! Code lists used across record elements.
//!
//! Terms map 1:1 to the ISO 19115 code list values used in the canonical JSON
//! form, plus a small number of local codes (marked as such).

use serde::{Deserialize, Serialize};

/// Aggregation association code list (`DS_AssociationTypeCode`).
///
/// Contains additional local codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AggregationAssociationCode {
    #[serde(rename = "collectiveTitle")]
    CollectiveTitle,
    #[serde(rename = "crossReference")]
    CrossReference,
    #[serde(rename = "dependency")]
    Dependency,
    #[serde(rename = "isComposedOf")]
    IsComposedOf,
    #[serde(rename = "largerWorkCitation")]
    LargerWorkCitation,
    #[serde(rename = "partOfSeamlessDatabase")]
    PartOfSeamlessDatabase,
    #[serde(rename = "revisionOf")]
    RevisionOf,
    #[serde(rename = "series")]
    Series,
    #[serde(rename = "stereoMate")]
    StereoMate,
    /// Local code.
    #[serde(rename = "physicalReverseOf")]
    PhysicalReverseOf,
}

/// Aggregation initiative code list (`DS_InitiativeTypeCode`).
///
/// Contains additional local codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AggregationInitiativeCode {
    #[serde(rename = "campaign")]
    Campaign,
    #[serde(rename = "collection")]
    Collection,
    #[serde(rename = "exercise")]
    Exercise,
    #[serde(rename = "experiment")]
    Experiment,
    #[serde(rename = "investigation")]
    Investigation,
    #[serde(rename = "mission")]
    Mission,
    #[serde(rename = "operation")]
    Operation,
    #[serde(rename = "platform")]
    Platform,
    #[serde(rename = "process")]
    Process,
    #[serde(rename = "program")]
    Program,
    #[serde(rename = "project")]
    Project,
    #[serde(rename = "sensor")]
    Sensor,
    #[serde(rename = "study")]
    Study,
    #[serde(rename = "task")]
    Task,
    #[serde(rename = "trial")]
    Trial,
    #[serde(rename = "dataDictionary")]
    DataDictionary,
    #[serde(rename = "sciencePaper")]
    SciencePaper,
    #[serde(rename = "userGuide")]
    UserGuide,
    /// Local code.
    #[serde(rename = "paperMap")]
    PaperMap,
}

/// Contact role code list (`CI_RoleCode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactRoleCode {
    #[serde(rename = "author")]
    Author,
    #[serde(rename = "custodian")]
    Custodian,
    #[serde(rename = "distributor")]
    Distributor,
    #[serde(rename = "originator")]
    Originator,
    #[serde(rename = "owner")]
    Owner,
    #[serde(rename = "pointOfContact")]
    PointOfContact,
    #[serde(rename = "principalInvestigator")]
    PrincipalInvestigator,
    #[serde(rename = "processor")]
    Processor,
    #[serde(rename = "publisher")]
    Publisher,
    #[serde(rename = "resourceProvider")]
    ResourceProvider,
    #[serde(rename = "sponsor")]
    Sponsor,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "coAuthor")]
    CoAuthor,
    #[serde(rename = "collaborator")]
    Collaborator,
    #[serde(rename = "contributor")]
    Contributor,
    #[serde(rename = "editor")]
    Editor,
    #[serde(rename = "funder")]
    Funder,
    #[serde(rename = "mediator")]
    Mediator,
    #[serde(rename = "rightsHolder")]
    RightsHolder,
    #[serde(rename = "stakeholder")]
    Stakeholder,
}

/// Constraint restriction code list (`MD_RestrictionCode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintRestrictionCode {
    #[serde(rename = "license")]
    License,
    #[serde(rename = "restricted")]
    Restricted,
    #[serde(rename = "unrestricted")]
    Unrestricted,
}

/// Constraint type meta code list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintTypeCode {
    #[serde(rename = "access")]
    Access,
    #[serde(rename = "usage")]
    Usage,
}

/// Date type code list (`CI_DateTypeCode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DateTypeCode {
    #[serde(rename = "creation")]
    Creation,
    #[serde(rename = "publication")]
    Publication,
    #[serde(rename = "revision")]
    Revision,
    #[serde(rename = "adopted")]
    Adopted,
    #[serde(rename = "deprecated")]
    Deprecated,
    #[serde(rename = "distribution")]
    Distribution,
    #[serde(rename = "expiry")]
    Expiry,
    #[serde(rename = "inForce")]
    InForce,
    #[serde(rename = "lastRevision")]
    LastRevision,
    #[serde(rename = "lastUpdate")]
    LastUpdate,
    #[serde(rename = "nextUpdate")]
    NextUpdate,
    #[serde(rename = "released")]
    Released,
    #[serde(rename = "superseded")]
    Superseded,
    #[serde(rename = "unavailable")]
    Unavailable,
    #[serde(rename = "validityBegins")]
    ValidityBegins,
    #[serde(rename = "validityExpires")]
    ValidityExpires,
}

/// Date precision meta code list.
///
/// Records the precision of a date value so that partial dates (year or month
/// only) survive a round-trip through the canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePrecisionCode {
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
}

/// Hierarchical level code list (`MD_ScopeCode`).
///
/// Contains additional local codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyLevelCode {
    #[serde(rename = "aggregate")]
    Aggregate,
    #[serde(rename = "application")]
    Application,
    #[serde(rename = "attribute")]
    Attribute,
    #[serde(rename = "attributeType")]
    AttributeType,
    #[serde(rename = "collection")]
    Collection,
    #[serde(rename = "collectionHardware")]
    CollectionHardware,
    #[serde(rename = "collectionSession")]
    CollectionSession,
    #[serde(rename = "coverage")]
    Coverage,
    #[serde(rename = "dataset")]
    Dataset,
    #[serde(rename = "dimensionGroup")]
    DimensionGroup,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "feature")]
    Feature,
    #[serde(rename = "featureType")]
    FeatureType,
    #[serde(rename = "fieldSession")]
    FieldSession,
    #[serde(rename = "initiative")]
    Initiative,
    #[serde(rename = "metadata")]
    Metadata,
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "nonGeographicDataset")]
    NonGeographicDataset,
    #[serde(rename = "product")]
    Product,
    #[serde(rename = "propertyType")]
    PropertyType,
    #[serde(rename = "repository")]
    Repository,
    #[serde(rename = "sample")]
    Sample,
    #[serde(rename = "series")]
    Series,
    #[serde(rename = "service")]
    Service,
    #[serde(rename = "software")]
    Software,
    #[serde(rename = "tile")]
    Tile,
    /// Local code.
    #[serde(rename = "mapProduct")]
    MapProduct,
    /// Local code.
    #[serde(rename = "paperMapProduct")]
    PaperMapProduct,
    /// Local code.
    #[serde(rename = "webMapProduct")]
    WebMapProduct,
}

impl HierarchyLevelCode {
    /// Code list value as used in the canonical form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Application => "application",
            Self::Attribute => "attribute",
            Self::AttributeType => "attributeType",
            Self::Collection => "collection",
            Self::CollectionHardware => "collectionHardware",
            Self::CollectionSession => "collectionSession",
            Self::Coverage => "coverage",
            Self::Dataset => "dataset",
            Self::DimensionGroup => "dimensionGroup",
            Self::Document => "document",
            Self::Feature => "feature",
            Self::FeatureType => "featureType",
            Self::FieldSession => "fieldSession",
            Self::Initiative => "initiative",
            Self::Metadata => "metadata",
            Self::Model => "model",
            Self::NonGeographicDataset => "nonGeographicDataset",
            Self::Product => "product",
            Self::PropertyType => "propertyType",
            Self::Repository => "repository",
            Self::Sample => "sample",
            Self::Series => "series",
            Self::Service => "service",
            Self::Software => "software",
            Self::Tile => "tile",
            Self::MapProduct => "mapProduct",
            Self::PaperMapProduct => "paperMapProduct",
            Self::WebMapProduct => "webMapProduct",
        }
    }
}

/// Maintenance frequency code list (`MD_MaintenanceFrequencyCode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaintenanceFrequencyCode {
    #[serde(rename = "continual")]
    Continual,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "fortnightly")]
    Fortnightly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "biannually")]
    Biannually,
    #[serde(rename = "annually")]
    Annually,
    #[serde(rename = "asNeeded")]
    AsNeeded,
    #[serde(rename = "irregular")]
    Irregular,
    #[serde(rename = "notPlanned")]
    NotPlanned,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Online resource function code list (`CI_OnLineFunctionCode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnlineResourceFunctionCode {
    #[serde(rename = "download")]
    Download,
    #[serde(rename = "information")]
    Information,
    #[serde(rename = "offlineAccess")]
    OfflineAccess,
    #[serde(rename = "order")]
    Order,
    #[serde(rename = "search")]
    Search,
}

/// Progress code list (`MD_ProgressCode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressCode {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "historicalArchive")]
    HistoricalArchive,
    #[serde(rename = "obsolete")]
    Obsolete,
    #[serde(rename = "onGoing")]
    OnGoing,
    #[serde(rename = "planned")]
    Planned,
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "underDevelopment")]
    UnderDevelopment,
}
