//! Upper levels of the hierarchy: projects, products and specs.

use serde::{Deserialize, Serialize};

use crate::id::{ProductId, ProjectId, SpecId};

/// Root of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,

    /// Project name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,
}

/// A product inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: ProductId,

    /// Owning project
    pub project_id: ProjectId,

    /// Product name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,
}

/// A spec inside a product; tasks hang off specs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    /// Unique identifier
    pub id: SpecId,

    /// Owning product
    pub product_id: ProductId,

    /// Spec name
    pub name: String,

    /// Spec body
    #[serde(default)]
    pub content: String,
}

/// The account behind the configured API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account id
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Email address
    #[serde(default)]
    pub email: String,
}
