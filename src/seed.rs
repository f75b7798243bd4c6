//! Sample data inserted into empty collections on startup.

use log::{error, info, warn};
use uuid::Uuid;

use crate::models::{timestamp, Ingredient, Recipe, Restaurant};
use crate::store::{Store, StoreError};

const SAMPLE_INGREDIENTS: [(&str, &str, &str); 3] = [
    (
        "Tomato",
        "A juicy red fruit used in salads and cooking",
        "Mediterranean",
    ),
    (
        "Cumin",
        "Aromatic spice often used in curries and stews",
        "Middle East",
    ),
    (
        "Cassava",
        "A starchy root vegetable popular in African cuisines",
        "Africa",
    ),
];

struct SampleRecipe {
    name: &'static str,
    ingredients: &'static [&'static str],
    steps: &'static str,
    region: &'static str,
    dietary_info: &'static str,
}

const SAMPLE_RECIPES: [SampleRecipe; 2] = [
    SampleRecipe {
        name: "Spicy Cassava",
        ingredients: &["Cassava"],
        steps: "Peel and boil cassava, then fry with spices.",
        region: "Africa",
        dietary_info: "Vegan",
    },
    SampleRecipe {
        name: "Tomato Salad",
        ingredients: &["Tomato"],
        steps: "Chop tomatoes and mix with herbs.",
        region: "Mediterranean",
        dietary_info: "Vegetarian",
    },
];

const SAMPLE_RESTAURANTS: [(&str, &str, &str, &str); 2] = [
    ("Local Spice", "Cairo, Egypt", "Middle Eastern", "123-456-7890"),
    ("Fresh Harvest", "Nairobi, Kenya", "African", "987-654-3210"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted(usize),
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub ingredients: SeedOutcome,
    pub recipes: SeedOutcome,
    pub restaurants: SeedOutcome,
}

/// Fills each empty collection with sample records. Collections are seeded
/// independently: a failure is logged and the next one is still attempted.
/// Ingredients go first since the sample recipes refer to them by name.
pub fn seed(store: &dyn Store) -> SeedReport {
    let ingredients = settle("ingredients", seed_ingredients(store));
    let recipes = settle("recipes", seed_recipes(store));
    let restaurants = settle("restaurants", seed_restaurants(store));
    SeedReport {
        ingredients,
        recipes,
        restaurants,
    }
}

fn settle(collection: &str, result: Result<SeedOutcome, StoreError>) -> SeedOutcome {
    match result {
        Ok(SeedOutcome::Inserted(n)) => {
            info!("Sample {} added to the database ({})", collection, n);
            SeedOutcome::Inserted(n)
        }
        Ok(outcome) => {
            info!("Skipped sample {}", collection);
            outcome
        }
        Err(e) => {
            error!("Error seeding {}: {}", collection, e);
            SeedOutcome::Failed
        }
    }
}

fn seed_ingredients(store: &dyn Store) -> Result<SeedOutcome, StoreError> {
    if store.count_ingredients()? > 0 {
        return Ok(SeedOutcome::Skipped);
    }
    let now = timestamp();
    let ingredients: Vec<Ingredient> = SAMPLE_INGREDIENTS
        .iter()
        .map(|&(name, description, region)| Ingredient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
            region: Some(region.to_string()),
            created_at: now,
            updated_at: now,
        })
        .collect();
    store.insert_ingredients(&ingredients)?;
    Ok(SeedOutcome::Inserted(ingredients.len()))
}

fn seed_recipes(store: &dyn Store) -> Result<SeedOutcome, StoreError> {
    if store.count_recipes()? > 0 {
        return Ok(SeedOutcome::Skipped);
    }
    let available = store.list_ingredients()?;
    if available.is_empty() {
        warn!("No ingredients stored, not adding sample recipes");
        return Ok(SeedOutcome::Skipped);
    }

    let now = timestamp();
    let recipes: Vec<Recipe> = SAMPLE_RECIPES
        .iter()
        .map(|sample| {
            let ingredients = sample
                .ingredients
                .iter()
                .filter_map(|wanted| {
                    let found = available.iter().find(|i| i.name == *wanted).map(|i| i.id);
                    if found.is_none() {
                        warn!("Sample recipe {}: no ingredient named {}", sample.name, wanted);
                    }
                    found
                })
                .collect();
            Recipe {
                id: Uuid::new_v4(),
                name: sample.name.to_string(),
                ingredients,
                steps: sample.steps.to_string(),
                region: Some(sample.region.to_string()),
                dietary_info: Some(sample.dietary_info.to_string()),
                created_at: now,
                updated_at: now,
            }
        })
        .collect();
    store.insert_recipes(&recipes)?;
    Ok(SeedOutcome::Inserted(recipes.len()))
}

fn seed_restaurants(store: &dyn Store) -> Result<SeedOutcome, StoreError> {
    if store.count_restaurants()? > 0 {
        return Ok(SeedOutcome::Skipped);
    }
    let now = timestamp();
    let restaurants: Vec<Restaurant> = SAMPLE_RESTAURANTS
        .iter()
        .map(|&(name, location, cuisine, contact_info)| Restaurant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: location.to_string(),
            cuisine: Some(cuisine.to_string()),
            contact_info: Some(contact_info.to_string()),
            created_at: now,
            updated_at: now,
        })
        .collect();
    store.insert_restaurants(&restaurants)?;
    Ok(SeedOutcome::Inserted(restaurants.len()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::NewIngredient;

    fn names<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|i| name(i).to_string()).collect()
    }

    #[test]
    fn should_seed_empty_store() {
        let store = MemoryStore::new();

        let report = seed(&store);

        assert_eq!(
            report,
            SeedReport {
                ingredients: SeedOutcome::Inserted(3),
                recipes: SeedOutcome::Inserted(2),
                restaurants: SeedOutcome::Inserted(2),
            }
        );
        let ingredients = store.list_ingredients().expect("list ingredients");
        assert_eq!(
            names(&ingredients, |i| i.name.as_str()),
            vec!["Tomato", "Cumin", "Cassava"]
        );
        let recipes = store.list_populated_recipes().expect("list recipes");
        assert_eq!(
            names(&recipes, |r| r.name.as_str()),
            vec!["Spicy Cassava", "Tomato Salad"]
        );
        assert_eq!(names(&recipes[0].ingredients, |i| i.name.as_str()), vec!["Cassava"]);
        assert_eq!(names(&recipes[1].ingredients, |i| i.name.as_str()), vec!["Tomato"]);
    }

    #[test]
    fn seeding_twice_should_not_duplicate() {
        let store = MemoryStore::new();
        seed(&store);

        let report = seed(&store);

        assert_eq!(report.ingredients, SeedOutcome::Skipped);
        assert_eq!(report.recipes, SeedOutcome::Skipped);
        assert_eq!(report.restaurants, SeedOutcome::Skipped);
        assert_eq!(store.count_ingredients().expect("count"), 3);
        assert_eq!(store.count_recipes().expect("count"), 2);
        assert_eq!(store.count_restaurants().expect("count"), 2);
    }

    #[test]
    fn recipes_should_find_ingredients_by_name_not_position() {
        let store = MemoryStore::new();
        let existing: Vec<Ingredient> = ["Cassava", "Saffron", "Tomato"]
            .iter()
            .map(|name| {
                NewIngredient {
                    name: Some(name.to_string()),
                    ..Default::default()
                }
                .into_ingredient()
                .expect("valid ingredient")
            })
            .collect();
        store.insert_ingredients(&existing).expect("insert");

        let report = seed(&store);

        assert_eq!(report.ingredients, SeedOutcome::Skipped);
        let recipes = store.list_recipes().expect("list recipes");
        assert_eq!(recipes[0].ingredients, vec![existing[0].id]);
        assert_eq!(recipes[1].ingredients, vec![existing[2].id]);
    }

    #[test]
    fn should_omit_missing_named_ingredients() {
        let store = MemoryStore::new();
        let cumin = NewIngredient {
            name: Some("Cumin".to_string()),
            ..Default::default()
        }
        .into_ingredient()
        .expect("valid ingredient");
        store.insert_ingredients(&[cumin]).expect("insert");

        seed(&store);

        let recipes = store.list_recipes().expect("list recipes");
        assert_eq!(recipes.len(), 2);
        assert!(recipes.iter().all(|r| r.ingredients.is_empty()));
    }

    #[test]
    fn failing_store_should_report_every_collection() {
        let store = MemoryStore::new();
        store.set_failing(true);

        let report = seed(&store);

        assert_eq!(
            report,
            SeedReport {
                ingredients: SeedOutcome::Failed,
                recipes: SeedOutcome::Failed,
                restaurants: SeedOutcome::Failed,
            }
        );
    }
}
