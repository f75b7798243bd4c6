table! {
    ingredients (id) {
        seq -> Bigint,
        id -> Varchar,
        name -> Varchar,
        description -> Nullable<Text>,
        region -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    recipes (id) {
        seq -> Bigint,
        id -> Varchar,
        name -> Varchar,
        steps -> Text,
        region -> Nullable<Varchar>,
        dietary_info -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    recipe_ingredients (recipe_id, position) {
        recipe_id -> Varchar,
        position -> Integer,
        ingredient_id -> Varchar,
    }
}

table! {
    restaurants (id) {
        seq -> Bigint,
        id -> Varchar,
        name -> Varchar,
        location -> Varchar,
        cuisine -> Nullable<Varchar>,
        contact_info -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

allow_tables_to_appear_in_same_query!(ingredients, recipes, recipe_ingredients, restaurants);
