//! Discovery DTOs: supported variants and valid categories

use serde::{Deserialize, Serialize};

use crate::domain::variant::Variant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInfo {
    pub name: Variant,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantList {
    pub variants: Vec<VariantInfo>,
    pub default: Variant,
}

impl VariantList {
    pub fn supported() -> Self {
        VariantList {
            variants: Variant::ALL
                .iter()
                .map(|v| VariantInfo {
                    name: *v,
                    description: v.description().to_string(),
                })
                .collect(),
            default: Variant::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}
