use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Current time at the millisecond precision every store keeps.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recipe as stored, holding ingredient ids. `Recipe<Ingredient>` is the
/// same recipe with its references expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe<I = Uuid> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default = "Vec::new")]
    pub ingredients: Vec<I>,
    pub steps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Replaces each ingredient id with the matching record. Ids with no
    /// record in `lookup` are dropped, the rest keep their order.
    pub fn populate(self, lookup: &HashMap<Uuid, Ingredient>) -> Recipe<Ingredient> {
        let ingredients = self
            .ingredients
            .iter()
            .filter_map(|id| lookup.get(id).cloned())
            .collect();
        Recipe {
            id: self.id,
            name: self.name,
            ingredients,
            steps: self.steps,
            region: self.region,
            dietary_info: self.dietary_info,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} validation failed: {} is required", .missing.join(", "))]
pub struct ValidationError {
    pub entity: &'static str,
    pub missing: Vec<&'static str>,
}

// Create payloads. Every field is optional at the serde level so that a
// missing required field is reported as a validation failure.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIngredient {
    pub name: Option<String>,
    pub description: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
    pub steps: Option<String>,
    pub region: Option<String>,
    pub dietary_info: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub name: Option<String>,
    pub location: Option<String>,
    pub cuisine: Option<String>,
    pub contact_info: Option<String>,
}

struct Required {
    entity: &'static str,
    missing: Vec<&'static str>,
}

impl Required {
    fn new(entity: &'static str) -> Self {
        Required {
            entity,
            missing: Vec::new(),
        }
    }

    fn field(&mut self, field: &'static str, value: Option<String>) -> String {
        match value {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                self.missing.push(field);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                entity: self.entity,
                missing: self.missing,
            })
        }
    }
}

impl NewIngredient {
    pub fn into_ingredient(self) -> Result<Ingredient, ValidationError> {
        let mut required = Required::new("Ingredient");
        let name = required.field("name", self.name);
        required.finish()?;

        let now = timestamp();
        Ok(Ingredient {
            id: Uuid::new_v4(),
            name,
            description: self.description,
            region: self.region,
            created_at: now,
            updated_at: now,
        })
    }
}

impl NewRecipe {
    pub fn into_recipe(self) -> Result<Recipe, ValidationError> {
        let mut required = Required::new("Recipe");
        let name = required.field("name", self.name);
        let steps = required.field("steps", self.steps);
        required.finish()?;

        let now = timestamp();
        Ok(Recipe {
            id: Uuid::new_v4(),
            name,
            ingredients: self.ingredients,
            steps,
            region: self.region,
            dietary_info: self.dietary_info,
            created_at: now,
            updated_at: now,
        })
    }
}

impl NewRestaurant {
    pub fn into_restaurant(self) -> Result<Restaurant, ValidationError> {
        let mut required = Required::new("Restaurant");
        let name = required.field("name", self.name);
        let location = required.field("location", self.location);
        required.finish()?;

        let now = timestamp();
        Ok(Restaurant {
            id: Uuid::new_v4(),
            name,
            location,
            cuisine: self.cuisine,
            contact_info: self.contact_info,
            created_at: now,
            updated_at: now,
        })
    }
}
