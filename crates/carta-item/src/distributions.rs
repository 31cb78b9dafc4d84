// SPDX-License-Identifier: MIT OR Apache-2.0
//! Classification of record distributions into presentation variants.
//!
//! The catalogue supports a fixed set of distribution shapes. Each variant
//! provides a `matches` predicate over a distribution option (and, for
//! service-backed layers, its sibling options); unmatched options are
//! reported and skipped rather than failing an item.

use serde::Serialize;
use tracing::warn;

use carta_record::elements::distribution::Distribution;

// Media type hrefs used to classify distribution options.
pub const MEDIA_TYPE_GEOJSON: &str =
    "https://www.iana.org/assignments/media-types/application/geo+json";
pub const MEDIA_TYPE_GEOPACKAGE: &str =
    "https://www.iana.org/assignments/media-types/application/geopackage+sqlite3";
pub const MEDIA_TYPE_GEOPACKAGE_ZIP: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/application/geopackage+sqlite3+zip";
pub const MEDIA_TYPE_JPEG: &str = "https://www.iana.org/assignments/media-types/image/jpeg";
pub const MEDIA_TYPE_PDF: &str = "https://www.iana.org/assignments/media-types/application/pdf";
pub const MEDIA_TYPE_PDF_GEO: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/application/pdf+geo";
pub const MEDIA_TYPE_PNG: &str = "https://www.iana.org/assignments/media-types/image/png";
pub const MEDIA_TYPE_SHAPEFILE_ZIP: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/application/vnd.shp+zip";

pub const MEDIA_TYPE_ARCGIS_FEATURE_LAYER: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+layer+feature";
pub const MEDIA_TYPE_ARCGIS_FEATURE_SERVICE: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+service+feature";
pub const MEDIA_TYPE_ARCGIS_OGC_LAYER: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+layer+feature+ogc";
pub const MEDIA_TYPE_OGC_API_FEATURES_SERVICE: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/ogc+api+feature";
pub const MEDIA_TYPE_ARCGIS_VECTOR_TILE_LAYER: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+layer+tile+vector";
pub const MEDIA_TYPE_ARCGIS_VECTOR_TILE_SERVICE: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+service+tile+vector";
pub const MEDIA_TYPE_ARCGIS_RASTER_TILE_LAYER: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+layer+tile+raster";
pub const MEDIA_TYPE_ARCGIS_RASTER_TILE_SERVICE: &str =
    "https://metadata-resources.data.bas.ac.uk/media-types/x-service/arcgis+service+tile+raster";

/// Ordering page for published (paper) maps.
pub const PUBLISHED_MAP_URL: &str =
    "https://www.bas.ac.uk/data/our-data/maps/how-to-order-a-map/";

/// Scheme prefix identifying SAN path references.
pub const SAN_PREFIX: &str = "sftp://san";

/// A download-style option: access URL plus an optional display size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileOption {
    pub href: String,
    pub size: Option<String>,
    pub size_bytes: Option<u64>,
}

/// A service-backed layer: the layer endpoint plus its parent service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerOption {
    pub layer_href: String,
    pub service_href: String,
}

/// The presentation variants the catalogue supports.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum CatalogueDistribution {
    ArcGisFeatureLayer(LayerOption),
    ArcGisOgcApiFeatures(LayerOption),
    ArcGisVectorTileLayer(LayerOption),
    ArcGisRasterTileLayer(LayerOption),
    GeoJson(FileOption),
    GeoPackage {
        option: FileOption,
        zipped: bool,
    },
    Jpeg(FileOption),
    Pdf {
        option: FileOption,
        georeferenced: bool,
    },
    Png(FileOption),
    ShapefileZip(FileOption),
    /// Physical map ordering information.
    PublishedMap {
        href: String,
    },
    /// Path reference on the SAN, not directly accessible.
    SanReference {
        path: String,
    },
}

impl CatalogueDistribution {
    /// Display label for the data tab.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ArcGisFeatureLayer(_) => "ArcGIS Feature Layer",
            Self::ArcGisOgcApiFeatures(_) => "OGC API Features",
            Self::ArcGisVectorTileLayer(_) => "ArcGIS Vector Tile Layer",
            Self::ArcGisRasterTileLayer(_) => "ArcGIS Raster Tile Layer",
            Self::GeoJson(_) => "GeoJSON",
            Self::GeoPackage { zipped: false, .. } => "GeoPackage",
            Self::GeoPackage { zipped: true, .. } => "GeoPackage (Zipped)",
            Self::Jpeg(_) => "JPEG",
            Self::Pdf {
                georeferenced: false,
                ..
            } => "PDF",
            Self::Pdf {
                georeferenced: true,
                ..
            } => "PDF (Georeferenced)",
            Self::Png(_) => "PNG",
            Self::ShapefileZip(_) => "Shapefile (Zipped)",
            Self::PublishedMap { .. } => "Published Map",
            Self::SanReference { .. } => "SAN Path",
        }
    }

    /// The URL a user follows for this option, where one exists.
    pub fn href(&self) -> Option<&str> {
        match self {
            Self::ArcGisFeatureLayer(layer)
            | Self::ArcGisOgcApiFeatures(layer)
            | Self::ArcGisVectorTileLayer(layer)
            | Self::ArcGisRasterTileLayer(layer) => Some(&layer.layer_href),
            Self::GeoJson(option)
            | Self::GeoPackage { option, .. }
            | Self::Jpeg(option)
            | Self::Pdf { option, .. }
            | Self::Png(option)
            | Self::ShapefileZip(option) => Some(&option.href),
            Self::PublishedMap { href } => Some(href),
            Self::SanReference { .. } => None,
        }
    }
}

fn format_href(distribution: &Distribution) -> Option<&str> {
    distribution.format.as_ref()?.href.as_deref()
}

fn online_href(distribution: &Distribution) -> &str {
    &distribution.transfer_option.online_resource.href
}

fn size_bytes(distribution: &Distribution) -> Option<u64> {
    let size = distribution.transfer_option.size.as_ref()?;
    if size.unit != "bytes" {
        return None;
    }
    Some(size.magnitude as u64)
}

/// Human-readable size, binary units.
fn size_display(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn file_option(distribution: &Distribution) -> FileOption {
    let size_bytes = size_bytes(distribution);
    FileOption {
        href: online_href(distribution).to_owned(),
        size: size_bytes.map(size_display),
        size_bytes,
    }
}

/// Find a sibling option carrying the given format href.
fn sibling_href<'a>(options: &'a [Distribution], media_type: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| format_href(option) == Some(media_type))
        .map(online_href)
}

fn layer_option(
    distribution: &Distribution,
    options: &[Distribution],
    service_media_type: &str,
) -> Option<LayerOption> {
    let service_href = sibling_href(options, service_media_type)?;
    Some(LayerOption {
        layer_href: online_href(distribution).to_owned(),
        service_href: service_href.to_owned(),
    })
}

/// Classify one distribution option in the context of its siblings.
///
/// Service endpoints paired with a layer option are consumed by the layer
/// variant and return `None` themselves.
pub fn classify_distribution(
    distribution: &Distribution,
    options: &[Distribution],
) -> Option<CatalogueDistribution> {
    let href = online_href(distribution);
    if href == PUBLISHED_MAP_URL {
        return Some(CatalogueDistribution::PublishedMap {
            href: href.to_owned(),
        });
    }
    if href.starts_with(SAN_PREFIX) {
        return Some(CatalogueDistribution::SanReference {
            path: href.to_owned(),
        });
    }

    match format_href(distribution)? {
        MEDIA_TYPE_ARCGIS_FEATURE_LAYER => {
            layer_option(distribution, options, MEDIA_TYPE_ARCGIS_FEATURE_SERVICE)
                .map(CatalogueDistribution::ArcGisFeatureLayer)
        }
        MEDIA_TYPE_ARCGIS_OGC_LAYER => {
            layer_option(distribution, options, MEDIA_TYPE_OGC_API_FEATURES_SERVICE)
                .map(CatalogueDistribution::ArcGisOgcApiFeatures)
        }
        MEDIA_TYPE_ARCGIS_VECTOR_TILE_LAYER => {
            layer_option(distribution, options, MEDIA_TYPE_ARCGIS_VECTOR_TILE_SERVICE)
                .map(CatalogueDistribution::ArcGisVectorTileLayer)
        }
        MEDIA_TYPE_ARCGIS_RASTER_TILE_LAYER => {
            layer_option(distribution, options, MEDIA_TYPE_ARCGIS_RASTER_TILE_SERVICE)
                .map(CatalogueDistribution::ArcGisRasterTileLayer)
        }
        MEDIA_TYPE_GEOJSON => Some(CatalogueDistribution::GeoJson(file_option(distribution))),
        MEDIA_TYPE_GEOPACKAGE => Some(CatalogueDistribution::GeoPackage {
            option: file_option(distribution),
            zipped: false,
        }),
        MEDIA_TYPE_GEOPACKAGE_ZIP => Some(CatalogueDistribution::GeoPackage {
            option: file_option(distribution),
            zipped: true,
        }),
        MEDIA_TYPE_JPEG => Some(CatalogueDistribution::Jpeg(file_option(distribution))),
        MEDIA_TYPE_PDF => Some(CatalogueDistribution::Pdf {
            option: file_option(distribution),
            georeferenced: false,
        }),
        MEDIA_TYPE_PDF_GEO => Some(CatalogueDistribution::Pdf {
            option: file_option(distribution),
            georeferenced: true,
        }),
        MEDIA_TYPE_PNG => Some(CatalogueDistribution::Png(file_option(distribution))),
        MEDIA_TYPE_SHAPEFILE_ZIP => Some(CatalogueDistribution::ShapefileZip(file_option(
            distribution,
        ))),
        _ => None,
    }
}

fn is_service_endpoint(distribution: &Distribution) -> bool {
    matches!(
        format_href(distribution),
        Some(
            MEDIA_TYPE_ARCGIS_FEATURE_SERVICE
                | MEDIA_TYPE_OGC_API_FEATURES_SERVICE
                | MEDIA_TYPE_ARCGIS_VECTOR_TILE_SERVICE
                | MEDIA_TYPE_ARCGIS_RASTER_TILE_SERVICE
        )
    )
}

/// Classify all of a record's distribution options.
///
/// Service endpoints are consumed by their paired layer variants; options the
/// catalogue does not support are logged and skipped.
pub fn classify_distributions(distributions: &[Distribution]) -> Vec<CatalogueDistribution> {
    let mut classified = Vec::new();
    for distribution in distributions {
        if is_service_endpoint(distribution) {
            continue;
        }
        match classify_distribution(distribution, distributions) {
            Some(variant) => classified.push(variant),
            None => warn!(
                target: "carta.item",
                href = online_href(distribution),
                "unsupported distribution option, skipping"
            ),
        }
    }
    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn distribution(media_type: Option<&str>, href: &str, size: Option<u64>) -> Distribution {
        let mut value = json!({
            "distributor": {"organisation": {"name": "x"}, "role": ["distributor"]},
            "transfer_option": {
                "online_resource": {"href": href, "function": "download"},
            },
        });
        if let Some(media_type) = media_type {
            value["format"] = json!({"format": "x", "href": media_type});
        }
        if let Some(size) = size {
            value["transfer_option"]["size"] = json!({"unit": "bytes", "magnitude": size});
        }
        Distribution::structure(&value).unwrap()
    }

    #[test]
    fn geopackage_variants_by_media_type() {
        let plain = distribution(
            Some(MEDIA_TYPE_GEOPACKAGE),
            "https://example.com/x.gpkg",
            Some(1024),
        );
        let zipped = distribution(
            Some(MEDIA_TYPE_GEOPACKAGE_ZIP),
            "https://example.com/x.gpkg.zip",
            None,
        );
        let classified = classify_distributions(&[plain, zipped]);
        assert_eq!(classified.len(), 2);
        assert!(matches!(
            &classified[0],
            CatalogueDistribution::GeoPackage { zipped: false, option }
                if option.size.as_deref() == Some("1.0 KiB")
        ));
        assert!(matches!(
            &classified[1],
            CatalogueDistribution::GeoPackage { zipped: true, .. }
        ));
    }

    #[test]
    fn feature_layer_pairs_with_service() {
        let layer = distribution(
            Some(MEDIA_TYPE_ARCGIS_FEATURE_LAYER),
            "https://arcgis.example.com/item?id=abc",
            None,
        );
        let service = distribution(
            Some(MEDIA_TYPE_ARCGIS_FEATURE_SERVICE),
            "https://services.example.com/FeatureServer",
            None,
        );
        let classified = classify_distributions(&[layer, service]);

        // The service endpoint is consumed by the layer pair.
        assert_eq!(classified.len(), 1);
        match &classified[0] {
            CatalogueDistribution::ArcGisFeatureLayer(pair) => {
                assert_eq!(pair.layer_href, "https://arcgis.example.com/item?id=abc");
                assert_eq!(pair.service_href, "https://services.example.com/FeatureServer");
            }
            other => panic!("expected feature layer, got {other:?}"),
        }
    }

    #[test]
    fn unpaired_layer_is_skipped() {
        let layer = distribution(
            Some(MEDIA_TYPE_ARCGIS_VECTOR_TILE_LAYER),
            "https://arcgis.example.com/item?id=abc",
            None,
        );
        assert!(classify_distributions(&[layer]).is_empty());
    }

    #[test]
    fn published_map_matched_by_url() {
        let option = distribution(None, PUBLISHED_MAP_URL, None);
        let classified = classify_distributions(&[option]);
        assert!(matches!(
            classified.as_slice(),
            [CatalogueDistribution::PublishedMap { .. }]
        ));
    }

    #[test]
    fn san_reference_matched_by_scheme() {
        let option = distribution(None, "sftp://san.nerc-bas.ac.uk/data/x", None);
        let classified = classify_distributions(&[option]);
        match classified.as_slice() {
            [CatalogueDistribution::SanReference { path }] => {
                assert!(path.starts_with(SAN_PREFIX));
            }
            other => panic!("expected SAN reference, got {other:?}"),
        }
        assert_eq!(classified[0].href(), None);
    }

    #[test]
    fn pdf_georeferenced_flag() {
        let plain = distribution(Some(MEDIA_TYPE_PDF), "https://example.com/x.pdf", None);
        let geo = distribution(Some(MEDIA_TYPE_PDF_GEO), "https://example.com/x-geo.pdf", None);
        let classified = classify_distributions(&[plain, geo]);
        assert!(matches!(
            &classified[0],
            CatalogueDistribution::Pdf {
                georeferenced: false,
                ..
            }
        ));
        assert!(matches!(
            &classified[1],
            CatalogueDistribution::Pdf {
                georeferenced: true,
                ..
            }
        ));
        assert_eq!(classified[1].label(), "PDF (Georeferenced)");
    }

    #[test]
    fn unsupported_media_type_skipped() {
        let option = distribution(
            Some("https://www.iana.org/assignments/media-types/application/zip"),
            "https://example.com/x.zip",
            None,
        );
        assert!(classify_distributions(&[option]).is_empty());
    }

    #[test]
    fn size_display_scales_units() {
        assert_eq!(size_display(512), "512 Bytes");
        assert_eq!(size_display(2048), "2.0 KiB");
        assert_eq!(size_display(5 * 1024 * 1024), "5.0 MiB");
    }
}
