use actix_web::{get, post, web, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{NewIngredient, NewRecipe, NewRestaurant};
use crate::state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::MalformedBody(err.to_string()).into()),
    )
    .service(list_ingredients)
    .service(get_ingredient)
    .service(create_ingredient)
    .service(list_recipes)
    .service(get_recipe)
    .service(create_recipe)
    .service(list_restaurants)
    .service(get_restaurant)
    .service(create_restaurant);
}

// A malformed id is a server error, not a 404.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId(raw.to_string()))
}

#[get("/ingredients")]
async fn list_ingredients(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let ingredients = state.run(|store| store.list_ingredients()).await?;
    Ok(HttpResponse::Ok().json(ingredients))
}

#[get("/ingredients/{id}")]
async fn get_ingredient(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&id)?;
    let ingredient = state
        .run(move |store| store.find_ingredient(id))
        .await?
        .ok_or(ApiError::NotFound("Ingredient"))?;
    Ok(HttpResponse::Ok().json(ingredient))
}

#[post("/ingredients")]
async fn create_ingredient(
    payload: web::Json<NewIngredient>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let ingredient = payload.into_inner().into_ingredient()?;
    let record = ingredient.clone();
    state
        .run_write(move |store| store.insert_ingredients(&[record]))
        .await
        .map_err(ApiError::rejected)?;
    info!("Created ingredient {}", ingredient.id);
    Ok(HttpResponse::Created().json(ingredient))
}

#[get("/recipes")]
async fn list_recipes(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let recipes = state.run(|store| store.list_populated_recipes()).await?;
    Ok(HttpResponse::Ok().json(recipes))
}

#[get("/recipes/{id}")]
async fn get_recipe(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&id)?;
    let recipe = state
        .run(move |store| store.find_populated_recipe(id))
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;
    Ok(HttpResponse::Ok().json(recipe))
}

/// Ingredient references are stored as given; they are not checked to exist.
#[post("/recipes")]
async fn create_recipe(
    payload: web::Json<NewRecipe>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let recipe = payload.into_inner().into_recipe()?;
    let record = recipe.clone();
    state
        .run_write(move |store| store.insert_recipes(&[record]))
        .await
        .map_err(ApiError::rejected)?;
    info!("Created recipe {}", recipe.id);
    Ok(HttpResponse::Created().json(recipe))
}

#[get("/restaurants")]
async fn list_restaurants(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let restaurants = state.run(|store| store.list_restaurants()).await?;
    Ok(HttpResponse::Ok().json(restaurants))
}

#[get("/restaurants/{id}")]
async fn get_restaurant(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&id)?;
    let restaurant = state
        .run(move |store| store.find_restaurant(id))
        .await?
        .ok_or(ApiError::NotFound("Restaurant"))?;
    Ok(HttpResponse::Ok().json(restaurant))
}

#[post("/restaurants")]
async fn create_restaurant(
    payload: web::Json<NewRestaurant>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let restaurant = payload.into_inner().into_restaurant()?;
    let record = restaurant.clone();
    state
        .run_write(move |store| store.insert_restaurants(&[record]))
        .await
        .map_err(ApiError::rejected)?;
    info!("Created restaurant {}", restaurant.id);
    Ok(HttpResponse::Created().json(restaurant))
}
