//! Literal field catalogs for each application variant.
//!
//! Column names match the trained pipelines' column contracts exactly, including
//! the hyphenated mushroom attribute names.

use crate::domain::{AppVariant, FieldSpec};
use crate::record::DerivedFeature;

/// Lease tenure of an HDB flat, in years.
pub const HDB_LEASE_YEARS: i64 = 99;

/// Earliest lease commencement year the price form accepts.
pub const HDB_MIN_LEASE_YEAR: i64 = 1900;

const FLAT_TYPES: &[&str] = &["1 ROOM", "2 ROOM", "3 ROOM", "4 ROOM", "5 ROOM", "EXECUTIVE"];

const STOREY_RANGES: &[&str] = &[
    "1-3", "4-6", "7-9", "10-12", "13-15", "16-18", "19-21", "22-24", "25-27", "28-30", "31-33", "34-36",
    "37-39", "40-42", "43-45", "46-48", "49-50",
];

const FLAT_MODELS: &[&str] = &[
    "New Generation",
    "Model A",
    "Model A2",
    "Premium Apartment",
    "Improved",
    "Maisonette",
    "Apartment",
    "Type S1",
    "Type S2",
];

/// `(column, label, options)` for every mushroom attribute, in model column order.
const MUSHROOM_FIELDS: &[(&str, &str, &[&str])] = &[
    ("cap-shape", "Cap Shape", &["convex", "bell", "conical", "flat", "knobbed", "sunken"]),
    ("cap-surface", "Cap Surface", &["smooth", "scaly", "fibrous", "grooves"]),
    (
        "cap-color",
        "Cap Color",
        &["brown", "buff", "cinnamon", "gray", "green", "pink", "purple", "red", "white", "yellow"],
    ),
    ("bruises", "Bruises", &["bruises", "no"]),
    (
        "odor",
        "Odor",
        &["almond", "anise", "creosote", "fishy", "foul", "musty", "none", "pungent", "spicy"],
    ),
    ("gill-attachment", "Gill Attachment", &["attached", "free"]),
    ("gill-spacing", "Gill Spacing", &["close", "crowded", "distant"]),
    ("gill-size", "Gill Size", &["broad", "narrow"]),
    (
        "gill-color",
        "Gill Color",
        &[
            "black", "brown", "buff", "chocolate", "gray", "green", "orange", "pink", "purple", "red", "white",
            "yellow",
        ],
    ),
    ("stalk-shape", "Stalk Shape", &["enlarging", "tapering"]),
    (
        "stalk-root",
        "Stalk Root",
        &["bulbous", "club", "equal", "rhizomorph", "rooted", "missing"],
    ),
    ("stalk-surface-above-ring", "Stalk Surface Above Ring", &["fibrous", "scaly", "smooth"]),
    ("stalk-surface-below-ring", "Stalk Surface Below Ring", &["fibrous", "scaly", "smooth"]),
    (
        "stalk-color-above-ring",
        "Stalk Color Above Ring",
        &["brown", "buff", "cinnamon", "gray", "orange", "pink", "red", "white", "yellow"],
    ),
    (
        "stalk-color-below-ring",
        "Stalk Color Below Ring",
        &["brown", "buff", "cinnamon", "gray", "orange", "pink", "red", "white", "yellow"],
    ),
    ("veil-type", "Veil Type", &["partial", "universal"]),
    ("veil-color", "Veil Color", &["brown", "orange", "white", "yellow"]),
    ("ring-number", "Ring Number", &["none", "one", "two"]),
    (
        "ring-type",
        "Ring Type",
        &["cobwebby", "evanescent", "flaring", "large", "none", "pendant", "sheathing"],
    ),
    (
        "spore-print-color",
        "Spore Print Color",
        &[
            "black", "brown", "buff", "chocolate", "green", "orange", "pink", "purple", "red", "white", "yellow",
        ],
    ),
    (
        "population",
        "Population",
        &["abundant", "clustered", "numerous", "scattered", "several", "solitary"],
    ),
    (
        "habitat",
        "Habitat",
        &["grasses", "leaves", "meadows", "paths", "urban", "waste", "woods"],
    ),
];

/// Parts of a schema before consistency checks.
pub(crate) struct CatalogEntry {
    pub fields: Vec<FieldSpec>,
    pub derived: Vec<DerivedFeature>,
    pub columns: Vec<String>,
}

/// Build the catalog entry for `variant`.
///
/// `options` receives `(config_key, literal_options)` for each choice field and
/// returns the domain to use; the literal registry simply hands the list back.
pub(crate) fn entry<F>(variant: AppVariant, mut options: F) -> CatalogEntry
where
    F: FnMut(&str, &[&str]) -> Vec<String>,
{
    match variant {
        AppVariant::HousePrice => house_price(&mut options),
        AppVariant::Mushroom => mushroom(&mut options),
    }
}

fn house_price<F>(options: &mut F) -> CatalogEntry
where
    F: FnMut(&str, &[&str]) -> Vec<String>,
{
    let fields = vec![
        FieldSpec::integer("block", "Block Number", None, None, 1),
        FieldSpec::text("street_name", "Street Name", "Bishan Street 1"),
        FieldSpec::text("town", "Town", "Bishan"),
        FieldSpec::choice("flat_type", "Flat Type", options("flat_type", FLAT_TYPES)),
        FieldSpec::choice("storey_range", "Storey Range", options("storey_range", STOREY_RANGES)),
        FieldSpec::integer("floor_area_sqm", "Floor Area (sqm)", Some(1), None, 50),
        FieldSpec::choice("flat_model", "Flat Model", options("flat_model", FLAT_MODELS)),
        FieldSpec::integer(
            "lease_commence_date",
            "Lease Commence Year",
            Some(HDB_MIN_LEASE_YEAR),
            None,
            2000,
        ),
        FieldSpec::real("cbd_dist", "Distance to CBD (m)", Some(0.0), None, 5.0),
        FieldSpec::real("min_dist_mrt", "Distance to Nearest MRT (m)", Some(0.0), None, 5.0),
    ];

    let derived = vec![DerivedFeature::remaining_lease(
        "remaining_years",
        "lease_commence_date",
        HDB_LEASE_YEARS,
    )];

    let columns = [
        "block",
        "street_name",
        "town",
        "flat_type",
        "storey_range",
        "floor_area_sqm",
        "flat_model",
        "remaining_years",
        "cbd_dist",
        "min_dist_mrt",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    CatalogEntry {
        fields,
        derived,
        columns,
    }
}

fn mushroom<F>(options: &mut F) -> CatalogEntry
where
    F: FnMut(&str, &[&str]) -> Vec<String>,
{
    let fields: Vec<FieldSpec> = MUSHROOM_FIELDS
        .iter()
        .map(|(name, label, literal)| FieldSpec::choice(name, label, options(&name.replace('-', "_"), literal)))
        .collect();
    let columns = fields.iter().map(|f| f.name.clone()).collect();

    CatalogEntry {
        fields,
        derived: Vec::new(),
        columns,
    }
}

/// Literal option lists keyed by config key, for writing a default config file.
pub fn literal_options(variant: AppVariant) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    let _ = entry(variant, |key, literal| {
        let list: Vec<String> = literal.iter().map(|s| s.to_string()).collect();
        out.push((key.to_string(), list.clone()));
        list
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mushroom_catalog_has_twenty_two_attributes() {
        assert_eq!(MUSHROOM_FIELDS.len(), 22);
        let opts = literal_options(AppVariant::Mushroom);
        assert_eq!(opts.len(), 22);
        assert_eq!(opts[0].0, "cap_shape");
        assert_eq!(opts[4].1.len(), 9);
    }

    #[test]
    fn house_literal_options_cover_choice_fields() {
        let keys: Vec<String> = literal_options(AppVariant::HousePrice)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["flat_type", "storey_range", "flat_model"]);
    }
}
