// Reading the region boundaries and writing the map layer.

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};

use crate::refmap::{io_common::simplify_file_name, *};

pub fn read_features(
    path: &str,
    src: &GeometrySource,
) -> RefmapResult<Vec<GeometryFeature<Geometry>>> {
    info!("Attempting to read boundaries {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let res = parse_features(&contents, path, src.region_code_property())?;
    info!("read {} boundaries from {}", res.len(), simplify_file_name(path));
    Ok(res)
}

/// Reads a FeatureCollection. Every feature must have a geometry and a
/// region code given as a string. Numeric codes are rejected: `1` cannot
/// be told apart from "01".
pub fn parse_features(
    contents: &str,
    path: &str,
    property: &str,
) -> RefmapResult<Vec<GeometryFeature<Geometry>>> {
    let gj: GeoJson = contents.parse().context(GeoJsonParseSnafu { path })?;
    let fc: FeatureCollection = match gj {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return GeoJsonNotCollectionSnafu { path }.fail(),
    };
    let mut res: Vec<GeometryFeature<Geometry>> = Vec::new();
    for (index, f) in fc.features.into_iter().enumerate() {
        let region_code = match f.property(property) {
            Some(JSValue::String(s)) if !s.is_empty() => s.clone(),
            Some(JSValue::Number(n)) => {
                return GeoJsonNumericCodeSnafu {
                    path,
                    index,
                    property,
                    value: n.to_string(),
                }
                .fail()
            }
            _ => {
                return GeoJsonMissingCodeSnafu {
                    path,
                    index,
                    property,
                }
                .fail()
            }
        };
        debug!("{}: feature #{}: region {}", path, index, region_code);
        let geometry = f
            .geometry
            .context(GeoJsonMissingGeometrySnafu { path, index })?;
        res.push(GeometryFeature {
            region_code,
            geometry,
        });
    }
    Ok(res)
}

/// One feature per boundary, with the region code under `property` and the
/// ratio under `ratio`.
pub fn spatial_to_collection(
    spatial: &[SpatialResult<Geometry>],
    property: &str,
) -> FeatureCollection {
    let features: Vec<Feature> = spatial
        .iter()
        .map(|r| {
            let mut props = JsonObject::new();
            props.insert(property.to_string(), json!(r.region_code));
            props.insert("ratio".to_string(), json!(r.ratio));
            Feature {
                bbox: None,
                geometry: Some(r.geometry.clone()),
                id: None,
                properties: Some(props),
                foreign_members: None,
            }
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_collection(path: &str, fc: &FeatureCollection) -> RefmapResult<()> {
    let s = serde_json::to_string_pretty(fc).context(SerializingJsonSnafu {})?;
    fs::write(path, s).context(WritingFileSnafu { path })?;
    info!("wrote {} boundaries to {}", fc.features.len(), path);
    Ok(())
}
