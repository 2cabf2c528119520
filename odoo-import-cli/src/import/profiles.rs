//! Built-in import profiles

use crate::import::types::{
    ExternalIdRule, Fallback, FieldMapping, ImportProfile, RelationMapping, Substitution,
    Transform, Value,
};

/// Namespace for external ids derived by the importer
pub const IMPORT_NAMESPACE: &str = "import_script";

/// All built-in profiles
pub fn builtin() -> Vec<ImportProfile> {
    vec![products(), templates(), lots()]
}

/// Find a profile by name, custom profiles first
pub fn find(name: &str, custom: &[ImportProfile]) -> Option<ImportProfile> {
    custom
        .iter()
        .find(|p| p.name == name)
        .cloned()
        .or_else(|| builtin().into_iter().find(|p| p.name == name))
}

/// Products CSV layout (one row per product template, optional vendor line)
pub fn products() -> ImportProfile {
    ImportProfile {
        name: "products".to_string(),
        model: "product.template".to_string(),
        description: "Product templates with routes and a vendor line".to_string(),
        header_row: 0,
        sheet: None,
        required: vec!["Name".to_string(), "Product Type".to_string()],
        display_column: "Name".to_string(),
        external_id: Some(ExternalIdRule::Derived {
            namespace: IMPORT_NAMESPACE.to_string(),
            prefix: "prod_".to_string(),
            from: vec!["Internal Reference".to_string(), "Name".to_string()],
        }),
        natural_keys: vec![vec!["default_code".to_string()], vec!["name".to_string()]],
        substitutions: vec![Substitution {
            pattern: r"^Arc34:\s*".to_string(),
            replacement: String::new(),
        }],
        fields: vec![
            FieldMapping::new("name", Transform::copy("Name")),
            FieldMapping::new("default_code", Transform::copy("Internal Reference")),
            FieldMapping::new("standard_price", Transform::number("Cost")),
            FieldMapping::new(
                "type",
                Transform::value_map(
                    "Product Type",
                    &[
                        ("Storable Product", "product"),
                        ("Consumable", "consu"),
                        ("Service", "service"),
                    ],
                    Fallback::Default {
                        value: Value::from("product"),
                    },
                ),
            ),
            FieldMapping::new(
                "tracking",
                Transform::value_map(
                    "Tracking",
                    &[
                        ("No Tracking", "none"),
                        ("By Lots", "lot"),
                        ("By Unique Serial Number", "serial"),
                    ],
                    Fallback::Default {
                        value: Value::from("none"),
                    },
                ),
            ),
            FieldMapping::new(
                "purchase_ok",
                Transform::Boolean {
                    column: "Can be Purchased".to_string(),
                    default: true,
                },
            ),
        ],
        relations: vec![
            RelationMapping::ReplaceAll {
                field: "route_ids".to_string(),
                column: "Routes".to_string(),
                lookup: "route".to_string(),
                separator: ",".to_string(),
            },
            RelationMapping::CreateAndAppend {
                field: "seller_ids".to_string(),
                when_present: "Vendor / Name".to_string(),
                values: vec![
                    FieldMapping::new("partner_id", Transform::lookup("Vendor / Name", "partner", true)),
                    FieldMapping::new("product_name", Transform::copy("Vendor / Product Name")),
                    FieldMapping::new("product_code", Transform::copy("Vendor / Product Code")),
                    FieldMapping::new("min_qty", Transform::number("Vendor / Minimum Quantity")),
                    FieldMapping::new(
                        "delay",
                        Transform::Integer {
                            column: "Vendor / Delivery Lead Time".to_string(),
                            default: 1,
                        },
                    ),
                ],
            },
        ],
    }
}

/// Product template workbook exported in the platform's own column names
pub fn templates() -> ImportProfile {
    ImportProfile {
        name: "templates".to_string(),
        model: "product.template".to_string(),
        description: "Product templates keyed by an `id` external id column".to_string(),
        header_row: 0,
        sheet: None,
        required: vec!["name".to_string()],
        display_column: "name".to_string(),
        external_id: Some(ExternalIdRule::Column {
            column: "id".to_string(),
            namespace: None,
        }),
        natural_keys: vec![vec!["default_code".to_string()], vec!["name".to_string()]],
        substitutions: Vec::new(),
        fields: vec![
            FieldMapping::new("name", Transform::copy("name")),
            FieldMapping::new("default_code", Transform::copy("default_code")),
            FieldMapping::new("list_price", Transform::number("list_price")),
            FieldMapping::new("standard_price", Transform::number("standard_price")),
            FieldMapping::new("categ_id", Transform::lookup("categ_id", "category", false)),
            FieldMapping::new("uom_id", Transform::lookup("uom_id", "uom", false)),
        ],
        relations: Vec::new(),
    }
}

/// Lot workbook; assigned parts are linked once every lot exists
pub fn lots() -> ImportProfile {
    ImportProfile {
        name: "lots".to_string(),
        model: "stock.lot".to_string(),
        description: "Lots and serial numbers with assigned part links".to_string(),
        header_row: 0,
        sheet: None,
        required: vec!["name".to_string(), "product_id".to_string()],
        display_column: "name".to_string(),
        external_id: Some(ExternalIdRule::Column {
            column: "id".to_string(),
            namespace: None,
        }),
        natural_keys: vec![vec!["name".to_string(), "product_id".to_string()]],
        substitutions: Vec::new(),
        fields: vec![
            FieldMapping::new("name", Transform::copy("name")),
            FieldMapping::new("product_id", Transform::lookup("product_id", "product", true)),
        ],
        relations: vec![RelationMapping::Link {
            field: "x_assigned_part_ids".to_string(),
            column: "x_assigned_part_ids/name".to_string(),
            lookup: "lot".to_string(),
            deferred: true,
        }],
    }
}
