use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{Dimensions, Product},
    response::Meta,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub category: String,
    pub subcategory: Option<String>,
    /// Single image shorthand; merged in front of `images`.
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub weight: Option<f64>,
    pub dimensions: Option<Dimensions>,
}

impl CreateProductRequest {
    pub fn all_images(&self) -> Vec<String> {
        self.image
            .iter()
            .chain(self.images.iter())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub images: Option<Vec<String>>,
    pub key_features: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub weight: Option<f64>,
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Meta,
}
