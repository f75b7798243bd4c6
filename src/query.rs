use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::debug;
use uuid::Uuid;

use crate::models::{Ingredient, Recipe, Restaurant};
use crate::schema::{self, ingredients, recipe_ingredients, recipes, restaurants};
use crate::store::{Store, StoreError};

type DbPool = r2d2::Pool<ConnectionManager<MysqlConnection>>;

const DB_POOL_CONNECTION_TIMEOUT_SECONDS: u64 = 5;

// Documents keep their own string ids; `seq` only records insertion order.
const SETUP_SQL: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS ingredients (
        seq BIGINT NOT NULL AUTO_INCREMENT UNIQUE,
        id VARCHAR(36) NOT NULL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NULL,
        region TEXT NULL,
        created_at DATETIME(3) NOT NULL,
        updated_at DATETIME(3) NOT NULL
    ) DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS recipes (
        seq BIGINT NOT NULL AUTO_INCREMENT UNIQUE,
        id VARCHAR(36) NOT NULL PRIMARY KEY,
        name TEXT NOT NULL,
        steps TEXT NOT NULL,
        region TEXT NULL,
        dietary_info TEXT NULL,
        created_at DATETIME(3) NOT NULL,
        updated_at DATETIME(3) NOT NULL
    ) DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS recipe_ingredients (
        recipe_id VARCHAR(36) NOT NULL,
        position INT NOT NULL,
        ingredient_id VARCHAR(36) NOT NULL,
        PRIMARY KEY (recipe_id, position)
    ) DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS restaurants (
        seq BIGINT NOT NULL AUTO_INCREMENT UNIQUE,
        id VARCHAR(36) NOT NULL PRIMARY KEY,
        name TEXT NOT NULL,
        location TEXT NOT NULL,
        cuisine TEXT NULL,
        contact_info TEXT NULL,
        created_at DATETIME(3) NOT NULL,
        updated_at DATETIME(3) NOT NULL
    ) DEFAULT CHARSET=utf8mb4",
];

type IngredientRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    NaiveDateTime,
    NaiveDateTime,
);
type RecipeRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    NaiveDateTime,
    NaiveDateTime,
);
type RestaurantRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    NaiveDateTime,
    NaiveDateTime,
);

#[derive(Insertable)]
#[table_name = "ingredients"]
struct NewIngredientRow<'a> {
    id: String,
    name: &'a str,
    description: Option<&'a str>,
    region: Option<&'a str>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "recipes"]
struct NewRecipeRow<'a> {
    id: String,
    name: &'a str,
    steps: &'a str,
    region: Option<&'a str>,
    dietary_info: Option<&'a str>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "recipe_ingredients"]
struct NewRecipeIngredientRow {
    recipe_id: String,
    position: i32,
    ingredient_id: String,
}

#[derive(Insertable)]
#[table_name = "restaurants"]
struct NewRestaurantRow<'a> {
    id: String,
    name: &'a str,
    location: &'a str,
    cuisine: Option<&'a str>,
    contact_info: Option<&'a str>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// MySQL backed store. Each document collection is a table; recipe
/// ingredient references live in `recipe_ingredients` in list order.
pub struct MysqlStore {
    pool: DbPool,
}

impl MysqlStore {
    /// Builds the pool without connecting; `setup` makes the first connection.
    pub fn new(database_url: &str, pool_size: u32) -> Self {
        let manager = ConnectionManager::<MysqlConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .max_size(pool_size)
            .min_idle(Some(0))
            .connection_timeout(Duration::from_secs(DB_POOL_CONNECTION_TIMEOUT_SECONDS))
            .build_unchecked(manager);
        MysqlStore { pool }
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<ConnectionManager<MysqlConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl Store for MysqlStore {
    fn setup(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        for sql in SETUP_SQL.iter() {
            conn.batch_execute(sql)?;
        }
        debug!("Schema ready");
        Ok(())
    }

    fn count_ingredients(&self) -> Result<i64, StoreError> {
        Ok(schema::ingredients::table
            .count()
            .get_result(&*self.conn()?)?)
    }

    fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        find_all_ingredients(&*self.conn()?)
    }

    fn find_ingredient(&self, ingredient_id: Uuid) -> Result<Option<Ingredient>, StoreError> {
        use crate::schema::ingredients::dsl::*;

        let row = ingredients
            .select((id, name, description, region, created_at, updated_at))
            .filter(id.eq(ingredient_id.to_string()))
            .first::<IngredientRow>(&*self.conn()?)
            .optional()?;
        row.map(ingredient_from_row).transpose()
    }

    fn find_ingredients(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, StoreError> {
        use crate::schema::ingredients::dsl::*;

        let wanted: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        ingredients
            .select((id, name, description, region, created_at, updated_at))
            .filter(id.eq_any(wanted))
            .order(seq.asc())
            .load::<IngredientRow>(&*self.conn()?)?
            .into_iter()
            .map(ingredient_from_row)
            .collect()
    }

    fn insert_ingredients(&self, records: &[Ingredient]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewIngredientRow> = records
            .iter()
            .map(|i| NewIngredientRow {
                id: i.id.to_string(),
                name: &i.name,
                description: i.description.as_deref(),
                region: i.region.as_deref(),
                created_at: i.created_at.naive_utc(),
                updated_at: i.updated_at.naive_utc(),
            })
            .collect();
        let inserted = diesel::insert_into(schema::ingredients::table)
            .values(&rows)
            .execute(&*self.conn()?)?;
        debug!("Inserted {} ingredients", inserted);
        Ok(())
    }

    fn count_recipes(&self) -> Result<i64, StoreError> {
        Ok(schema::recipes::table.count().get_result(&*self.conn()?)?)
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        use crate::schema::recipes::dsl::*;

        let conn = self.conn()?;
        let rows = recipes
            .select((
                id,
                name,
                steps,
                region,
                dietary_info,
                created_at,
                updated_at,
            ))
            .order(seq.asc())
            .load::<RecipeRow>(&*conn)?;
        let mut refs = find_recipe_refs(rows.iter().map(|r| r.0.clone()).collect(), &conn)?;
        rows.into_iter()
            .map(|row| {
                let ingredient_ids = refs.remove(&row.0).unwrap_or_default();
                recipe_from_row(row, ingredient_ids)
            })
            .collect()
    }

    fn find_recipe(&self, recipe_id: Uuid) -> Result<Option<Recipe>, StoreError> {
        use crate::schema::recipes::dsl::*;

        let conn = self.conn()?;
        let row = recipes
            .select((
                id,
                name,
                steps,
                region,
                dietary_info,
                created_at,
                updated_at,
            ))
            .filter(id.eq(recipe_id.to_string()))
            .first::<RecipeRow>(&*conn)
            .optional()?;
        match row {
            Some(row) => {
                let ingredient_ids = find_recipe_refs(vec![row.0.clone()], &conn)?
                    .remove(&row.0)
                    .unwrap_or_default();
                recipe_from_row(row, ingredient_ids).map(Some)
            }
            None => Ok(None),
        }
    }

    fn insert_recipes(&self, records: &[Recipe]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewRecipeRow> = records
            .iter()
            .map(|r| NewRecipeRow {
                id: r.id.to_string(),
                name: &r.name,
                steps: &r.steps,
                region: r.region.as_deref(),
                dietary_info: r.dietary_info.as_deref(),
                created_at: r.created_at.naive_utc(),
                updated_at: r.updated_at.naive_utc(),
            })
            .collect();
        let ref_rows: Vec<NewRecipeIngredientRow> = records
            .iter()
            .flat_map(|r| {
                r.ingredients
                    .iter()
                    .enumerate()
                    .map(move |(position, ingredient_id)| NewRecipeIngredientRow {
                        recipe_id: r.id.to_string(),
                        position: position as i32,
                        ingredient_id: ingredient_id.to_string(),
                    })
            })
            .collect();

        let conn = self.conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|| {
            diesel::insert_into(schema::recipes::table)
                .values(&rows)
                .execute(&*conn)?;
            if !ref_rows.is_empty() {
                diesel::insert_into(schema::recipe_ingredients::table)
                    .values(&ref_rows)
                    .execute(&*conn)?;
            }
            Ok(())
        })?;
        debug!(
            "Inserted {} recipes with {} ingredient references",
            rows.len(),
            ref_rows.len()
        );
        Ok(())
    }

    fn count_restaurants(&self) -> Result<i64, StoreError> {
        Ok(schema::restaurants::table
            .count()
            .get_result(&*self.conn()?)?)
    }

    fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        use crate::schema::restaurants::dsl::*;

        restaurants
            .select((
                id,
                name,
                location,
                cuisine,
                contact_info,
                created_at,
                updated_at,
            ))
            .order(seq.asc())
            .load::<RestaurantRow>(&*self.conn()?)?
            .into_iter()
            .map(restaurant_from_row)
            .collect()
    }

    fn find_restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, StoreError> {
        use crate::schema::restaurants::dsl::*;

        let row = restaurants
            .select((
                id,
                name,
                location,
                cuisine,
                contact_info,
                created_at,
                updated_at,
            ))
            .filter(id.eq(restaurant_id.to_string()))
            .first::<RestaurantRow>(&*self.conn()?)
            .optional()?;
        row.map(restaurant_from_row).transpose()
    }

    fn insert_restaurants(&self, records: &[Restaurant]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewRestaurantRow> = records
            .iter()
            .map(|r| NewRestaurantRow {
                id: r.id.to_string(),
                name: &r.name,
                location: &r.location,
                cuisine: r.cuisine.as_deref(),
                contact_info: r.contact_info.as_deref(),
                created_at: r.created_at.naive_utc(),
                updated_at: r.updated_at.naive_utc(),
            })
            .collect();
        let inserted = diesel::insert_into(schema::restaurants::table)
            .values(&rows)
            .execute(&*self.conn()?)?;
        debug!("Inserted {} restaurants", inserted);
        Ok(())
    }
}

fn find_all_ingredients(conn: &MysqlConnection) -> Result<Vec<Ingredient>, StoreError> {
    use crate::schema::ingredients::dsl::*;

    ingredients
        .select((id, name, description, region, created_at, updated_at))
        .order(seq.asc())
        .load::<IngredientRow>(conn)?
        .into_iter()
        .map(ingredient_from_row)
        .collect()
}

/// Ingredient ids per recipe id, in list order.
fn find_recipe_refs(
    recipe_ids: Vec<String>,
    conn: &MysqlConnection,
) -> Result<HashMap<String, Vec<Uuid>>, StoreError> {
    use crate::schema::recipe_ingredients::dsl::*;

    let mut refs: HashMap<String, Vec<Uuid>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(refs);
    }
    let rows = recipe_ingredients
        .select((recipe_id, ingredient_id))
        .filter(recipe_id.eq_any(recipe_ids))
        .order((recipe_id.asc(), position.asc()))
        .load::<(String, String)>(conn)?;
    for (recipe, ingredient) in rows {
        let ingredient = parse_id(&ingredient)?;
        refs.entry(recipe).or_default().push(ingredient);
    }
    Ok(refs)
}

fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Malformed(format!("id {:?}: {}", raw, e)))
}

fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

fn ingredient_from_row(row: IngredientRow) -> Result<Ingredient, StoreError> {
    let (id, name, description, region, created_at, updated_at) = row;
    Ok(Ingredient {
        id: parse_id(&id)?,
        name,
        description,
        region,
        created_at: utc(created_at),
        updated_at: utc(updated_at),
    })
}

fn recipe_from_row(row: RecipeRow, ingredients: Vec<Uuid>) -> Result<Recipe, StoreError> {
    let (id, name, steps, region, dietary_info, created_at, updated_at) = row;
    Ok(Recipe {
        id: parse_id(&id)?,
        name,
        ingredients,
        steps,
        region,
        dietary_info,
        created_at: utc(created_at),
        updated_at: utc(updated_at),
    })
}

fn restaurant_from_row(row: RestaurantRow) -> Result<Restaurant, StoreError> {
    let (id, name, location, cuisine, contact_info, created_at, updated_at) = row;
    Ok(Restaurant {
        id: parse_id(&id)?,
        name,
        location,
        cuisine,
        contact_info,
        created_at: utc(created_at),
        updated_at: utc(updated_at),
    })
}
