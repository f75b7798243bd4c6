//! In-process store used by the test suite and by `STORE_BACKEND=memory`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::models::{Ingredient, Recipe, Restaurant};
use crate::store::{Store, StoreError};

#[derive(Default)]
struct Collections {
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    restaurants: Vec<Restaurant>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is failing".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.check()?;
        self.collections
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.check()?;
        self.collections
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn setup(&self) -> Result<(), StoreError> {
        self.check()
    }

    fn count_ingredients(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.ingredients.len() as i64)
    }

    fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        Ok(self.read()?.ingredients.clone())
    }

    fn find_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.read()?.ingredients.iter().find(|i| i.id == id).cloned())
    }

    fn find_ingredients(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, StoreError> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        Ok(self
            .read()?
            .ingredients
            .iter()
            .filter(|i| wanted.contains(&i.id))
            .cloned()
            .collect())
    }

    fn insert_ingredients(&self, ingredients: &[Ingredient]) -> Result<(), StoreError> {
        self.write()?.ingredients.extend_from_slice(ingredients);
        Ok(())
    }

    fn count_recipes(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.recipes.len() as i64)
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.read()?.recipes.clone())
    }

    fn find_recipe(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        Ok(self.read()?.recipes.iter().find(|r| r.id == id).cloned())
    }

    fn insert_recipes(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        self.write()?.recipes.extend_from_slice(recipes);
        Ok(())
    }

    fn count_restaurants(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.restaurants.len() as i64)
    }

    fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        Ok(self.read()?.restaurants.clone())
    }

    fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StoreError> {
        Ok(self.read()?.restaurants.iter().find(|r| r.id == id).cloned())
    }

    fn insert_restaurants(&self, restaurants: &[Restaurant]) -> Result<(), StoreError> {
        self.write()?.restaurants.extend_from_slice(restaurants);
        Ok(())
    }
}
