use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Ingredient, Recipe, Restaurant};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not get a database connection: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("malformed document {0}")]
    Malformed(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the store itself looks down, as opposed to one call failing.
    pub fn is_outage(&self) -> bool {
        match self {
            StoreError::Pool(_) | StoreError::Unavailable(_) => true,
            StoreError::Query(diesel::result::Error::DatabaseError(kind, _)) => matches!(
                kind,
                diesel::result::DatabaseErrorKind::UnableToSendCommand
            ),
            StoreError::Query(_) | StoreError::Malformed(_) => false,
        }
    }
}

/// The document collections behind the API.
///
/// Calls block, so request handlers run them on the blocking pool. Every
/// `list_*` returns records in insertion order.
pub trait Store: Send + Sync {
    /// Connects and makes sure the collections exist.
    fn setup(&self) -> Result<(), StoreError>;

    fn count_ingredients(&self) -> Result<i64, StoreError>;
    fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError>;
    fn find_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, StoreError>;
    /// Batch fetch. Unknown ids are ignored.
    fn find_ingredients(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, StoreError>;
    fn insert_ingredients(&self, ingredients: &[Ingredient]) -> Result<(), StoreError>;

    fn count_recipes(&self) -> Result<i64, StoreError>;
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;
    fn find_recipe(&self, id: Uuid) -> Result<Option<Recipe>, StoreError>;
    fn insert_recipes(&self, recipes: &[Recipe]) -> Result<(), StoreError>;

    fn count_restaurants(&self) -> Result<i64, StoreError>;
    fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError>;
    fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StoreError>;
    fn insert_restaurants(&self, restaurants: &[Restaurant]) -> Result<(), StoreError>;

    /// Fetches every ingredient referenced by `recipes`, keyed by id.
    fn referenced_ingredients(
        &self,
        recipes: &[Recipe],
    ) -> Result<HashMap<Uuid, Ingredient>, StoreError> {
        let ids: Vec<Uuid> = recipes
            .iter()
            .flat_map(|r| r.ingredients.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .find_ingredients(&ids)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect())
    }

    fn list_populated_recipes(&self) -> Result<Vec<Recipe<Ingredient>>, StoreError> {
        let recipes = self.list_recipes()?;
        let lookup = self.referenced_ingredients(&recipes)?;
        Ok(recipes.into_iter().map(|r| r.populate(&lookup)).collect())
    }

    fn find_populated_recipe(&self, id: Uuid) -> Result<Option<Recipe<Ingredient>>, StoreError> {
        match self.find_recipe(id)? {
            Some(recipe) => {
                let lookup = self.referenced_ingredients(std::slice::from_ref(&recipe))?;
                Ok(Some(recipe.populate(&lookup)))
            }
            None => Ok(None),
        }
    }
}
