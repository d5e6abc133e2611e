use crate::database::{Database, FromRow};
use anyhow::Result;
use ladle::api::EnumValue;
use ladle::recipe_json::{CatalogIngredient, RecipeForUpload};
use rusqlite::params;
use serde::Serialize;

pub fn sqlite_current_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The enum option categories the API will answer for.
pub const ENUM_CATEGORIES: [&str; 4] = ["cuisine_type", "category", "recipe_type", "difficulty"];

/// One stored marketplace recipe, as returned to clients. The structured
/// `recipe_json` document rides along so an author can reopen the recipe
/// for editing.
#[derive(Debug, Serialize, Clone)]
pub struct Recipe {
    pub recipe_id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub cooking_time: i64,
    pub cuisine_type: String,
    pub recipe_type: String,
    pub price: f64,
    pub serving_size: i64,
    pub ingredients: String,
    pub instructions: String,
    pub recipe_json: serde_json::Value,
    pub created_on: String,
}

impl FromRow for Recipe {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let raw_json: String = row.get("recipe_json")?;
        Ok(Self {
            recipe_id: row.get("recipe_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            category: row.get("category")?,
            difficulty: row.get("difficulty")?,
            cooking_time: row.get("cooking_time")?,
            cuisine_type: row.get("cuisine_type")?,
            recipe_type: row.get("recipe_type")?,
            price: row.get("price")?,
            serving_size: row.get("serving_size")?,
            ingredients: row.get("ingredients")?,
            instructions: row.get("instructions")?,
            recipe_json: serde_json::from_str(&raw_json).unwrap_or(serde_json::Value::Null),
            created_on: row.get("created_on")?,
        })
    }
}

impl Recipe {
    /// Re-check the authoring rules at the trust boundary. The client ran
    /// the same checks, but uploads are caller-controlled. Returns the
    /// first violated rule.
    pub fn validate(upload: &RecipeForUpload) -> std::result::Result<(), String> {
        let data = &upload.recipe_json;
        if data.meta.name.trim().is_empty() {
            return Err("recipe name is required".into());
        }
        if data.containers.iter().all(|c| c.ingredients.is_empty()) {
            return Err("add at least one ingredient to a container".into());
        }
        if let Some(step) = data.steps.iter().find(|s| s.description.trim().is_empty()) {
            return Err(format!("step {} has an empty description", step.id));
        }
        for (field, value) in [
            ("cuisine_type", &data.meta.cuisine_type),
            ("category", &data.meta.category),
            ("recipe_type", &data.meta.recipe_type),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} is required"));
            }
        }
        for container in &data.containers {
            if let Some(stray) = container
                .ingredients
                .iter()
                .find(|i| !container.class.accepts(i.kind))
            {
                return Err(format!(
                    "container {} is a {} container but holds {}",
                    container.id, container.class, stray.name
                ));
            }
        }
        Ok(())
    }

    /// Store a new recipe and return its id.
    pub fn push(
        db: &Database,
        upload: &RecipeForUpload,
        thumbnail: Option<Vec<u8>>,
    ) -> Result<i64> {
        let conn = db.pool.get()?;
        let meta = &upload.recipe_json.meta;
        conn.execute(
            "INSERT INTO Recipe (name, description, category, difficulty, cooking_time,
                cuisine_type, recipe_type, price, serving_size, ingredients, instructions,
                recipe_json, thumbnail, created_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                meta.name,
                meta.description,
                meta.category,
                meta.difficulty,
                meta.cooking_time,
                meta.cuisine_type,
                meta.recipe_type,
                meta.price,
                meta.serving_size,
                upload.ingredients,
                upload.instructions,
                serde_json::to_string(&upload.recipe_json)?,
                thumbnail,
                sqlite_current_timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Replace a stored recipe in place. A missing thumbnail keeps the
    /// existing one. Returns false when the id is unknown.
    pub fn update(
        db: &Database,
        recipe_id: i64,
        upload: &RecipeForUpload,
        thumbnail: Option<Vec<u8>>,
    ) -> Result<bool> {
        let meta = &upload.recipe_json.meta;
        let changed = db.execute(
            "UPDATE Recipe SET name = ?, description = ?, category = ?, difficulty = ?,
                cooking_time = ?, cuisine_type = ?, recipe_type = ?, price = ?,
                serving_size = ?, ingredients = ?, instructions = ?, recipe_json = ?,
                thumbnail = coalesce(?, thumbnail)
            WHERE recipe_id = ?",
            params![
                meta.name,
                meta.description,
                meta.category,
                meta.difficulty,
                meta.cooking_time,
                meta.cuisine_type,
                meta.recipe_type,
                meta.price,
                meta.serving_size,
                upload.ingredients,
                upload.instructions,
                serde_json::to_string(&upload.recipe_json)?,
                thumbnail,
                recipe_id
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(db: &Database, recipe_id: i64) -> Result<bool> {
        let changed = db.execute(
            "DELETE FROM Recipe WHERE recipe_id = ?",
            params![recipe_id],
        )?;
        Ok(changed > 0)
    }

    pub fn get_by_id(db: &Database, recipe_id: i64) -> Result<Option<Self>> {
        Ok(db
            .collect_rows(
                "SELECT * FROM Recipe WHERE recipe_id = ?",
                params![recipe_id],
            )?
            .pop())
    }

    pub fn get_thumbnail(db: &Database, recipe_id: i64) -> Result<Option<Vec<u8>>> {
        let conn = db.pool.get()?;
        let thumbnail = conn
            .query_row(
                "SELECT thumbnail FROM Recipe WHERE recipe_id = ?",
                params![recipe_id],
                |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .unwrap_or(None);
        Ok(thumbnail)
    }

    /// Storefront listing, newest first.
    pub fn list_summaries(db: &Database, limit: usize) -> Result<Vec<RecipeSummary>> {
        db.collect_rows(
            "SELECT recipe_id, name, category, price, cooking_time, created_on
            FROM Recipe
            ORDER BY created_on DESC, recipe_id DESC
            LIMIT ?",
            params![limit as i64],
        )
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct RecipeSummary {
    pub recipe_id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub cooking_time: i64,
    pub created_on: String,
}

impl FromRow for RecipeSummary {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            recipe_id: row.get("recipe_id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            price: row.get("price")?,
            cooking_time: row.get("cooking_time")?,
            created_on: row.get("created_on")?,
        })
    }
}

impl FromRow for CatalogIngredient {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let kind: String = row.get("kind")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            kind: kind.parse().map_err(|e: strum::ParseError| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            image_ref: row.get("image_ref")?,
        })
    }
}

/// The whole ingredient catalog, as the authoring UI fetches it.
pub fn list_catalog(db: &Database) -> Result<Vec<CatalogIngredient>> {
    db.collect_rows("SELECT * FROM Ingredient ORDER BY name", params![])
}

/// Option values for one enum category.
pub fn enum_options(db: &Database, category: &str) -> Result<Vec<EnumValue>> {
    let values: Vec<String> = {
        let conn = db.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT value FROM EnumOption WHERE category = ? ORDER BY value")?;
        let rows = stmt.query(params![category])?;
        rows.mapped(|row| row.get(0))
            .collect::<rusqlite::Result<_>>()?
    };
    Ok(values.into_iter().map(|value| EnumValue { value }).collect())
}

/// Validate an uploaded thumbnail and normalize it: must decode as webp,
/// is capped at 1024x1024, and is re-encoded lossy.
pub fn process_thumbnail(bytes: &[u8]) -> Result<Vec<u8>> {
    anyhow::ensure!(bytes.len() < 20_000_000, "Image is too large");
    let mut img = image::load_from_memory_with_format(bytes, image::ImageFormat::WebP)?;
    if img.width() > 1024 || img.height() > 1024 {
        img = img.resize_to_fill(1024, 1024, image::imageops::FilterType::Lanczos3);
    }
    let encoded = webp::Encoder::from_image(&img)
        .map_err(|e| anyhow::anyhow!("WebP encoding error: {:?}", e))?
        .encode(75.0);
    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladle::recipe_json::{
        Container, ContainerClass, IngredientKind, PlacedIngredient, RecipeData, RecipeMeta,
        RecipeStep,
    };

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::connect(path.to_str().unwrap()).unwrap();
        (dir, db)
    }

    fn sample_upload(name: &str) -> RecipeForUpload {
        RecipeForUpload {
            ingredients: "200 gm Lentils".into(),
            instructions: "1. Add Lentils (200gm); Boil".into(),
            recipe_json: RecipeData {
                meta: RecipeMeta {
                    name: name.into(),
                    description: "A test".into(),
                    category: "Curry".into(),
                    difficulty: "easy".into(),
                    cooking_time: 40,
                    cuisine_type: "Indian".into(),
                    recipe_type: "veg".into(),
                    price: 8.0,
                    serving_size: 2,
                },
                containers: vec![Container {
                    id: 1,
                    name: "Container 1".into(),
                    class: ContainerClass::Main,
                    ingredients: vec![PlacedIngredient {
                        id: "lentils".into(),
                        name: "Lentils".into(),
                        kind: IngredientKind::Ingredient,
                        quantity: 200.0,
                        units: "gm".into(),
                        prep_type: None,
                    }],
                }],
                steps: vec![RecipeStep {
                    id: 1,
                    description: "Add Lentils (200gm)\nBoil".into(),
                    time: Some(20),
                    temperature: None,
                    additional_data: None,
                }],
                instructions_array: vec![],
            },
        }
    }

    #[test]
    fn migrations_seed_catalog_and_enums() {
        let (_dir, db) = test_db();
        let catalog = list_catalog(&db).unwrap();
        assert!(catalog.iter().any(|i| i.id == "water"));
        assert!(catalog
            .iter()
            .any(|i| i.id == "salt" && i.kind == IngredientKind::Seasoning));
        let cuisines = enum_options(&db, "cuisine_type").unwrap();
        assert!(cuisines.iter().any(|v| v.value == "Indian"));
        assert!(enum_options(&db, "nonsense").unwrap().is_empty());
    }

    #[test]
    fn migrations_are_idempotent_across_reconnects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::connect(path.to_str().unwrap()).unwrap();
        drop(db);
        let db = Database::connect(path.to_str().unwrap()).unwrap();
        assert!(!list_catalog(&db).unwrap().is_empty());
    }

    #[test]
    fn push_and_get_round_trip_the_structured_document() {
        let (_dir, db) = test_db();
        let upload = sample_upload("Dal");
        let id = Recipe::push(&db, &upload, None).unwrap();
        let stored = Recipe::get_by_id(&db, id).unwrap().unwrap();
        assert_eq!(stored.name, "Dal");
        assert_eq!(stored.ingredients, "200 gm Lentils");
        let data: RecipeData = serde_json::from_value(stored.recipe_json).unwrap();
        assert_eq!(data, upload.recipe_json);
        assert!(Recipe::get_thumbnail(&db, id).unwrap().is_none());
    }

    #[test]
    fn update_replaces_in_place_and_reports_missing_ids() {
        let (_dir, db) = test_db();
        let id = Recipe::push(&db, &sample_upload("Before"), None).unwrap();
        let mut changed = sample_upload("After");
        changed.recipe_json.meta.price = 12.0;
        assert!(Recipe::update(&db, id, &changed, None).unwrap());
        let stored = Recipe::get_by_id(&db, id).unwrap().unwrap();
        assert_eq!(stored.name, "After");
        assert_eq!(stored.price, 12.0);
        assert!(!Recipe::update(&db, id + 100, &changed, None).unwrap());
    }

    #[test]
    fn delete_removes_the_row() {
        let (_dir, db) = test_db();
        let id = Recipe::push(&db, &sample_upload("Gone"), None).unwrap();
        assert!(Recipe::delete(&db, id).unwrap());
        assert!(Recipe::get_by_id(&db, id).unwrap().is_none());
        assert!(!Recipe::delete(&db, id).unwrap());
    }

    #[test]
    fn list_summaries_respects_the_limit() {
        let (_dir, db) = test_db();
        for n in 0..5 {
            Recipe::push(&db, &sample_upload(&format!("Recipe {n}")), None).unwrap();
        }
        let summaries = Recipe::list_summaries(&db, 3).unwrap();
        assert_eq!(summaries.len(), 3);
    }

    #[test]
    fn validate_rejects_rule_violations_in_order() {
        let mut upload = sample_upload("");
        assert_eq!(
            Recipe::validate(&upload).unwrap_err(),
            "recipe name is required"
        );
        upload.recipe_json.meta.name = "Dal".into();
        upload.recipe_json.containers[0].ingredients.clear();
        assert_eq!(
            Recipe::validate(&upload).unwrap_err(),
            "add at least one ingredient to a container"
        );

        let mut upload = sample_upload("Dal");
        upload.recipe_json.steps[0].description = " ".into();
        assert_eq!(
            Recipe::validate(&upload).unwrap_err(),
            "step 1 has an empty description"
        );

        let mut upload = sample_upload("Dal");
        upload.recipe_json.meta.category = "".into();
        assert_eq!(Recipe::validate(&upload).unwrap_err(), "category is required");
    }

    #[test]
    fn validate_enforces_the_container_class_invariant() {
        let mut upload = sample_upload("Dal");
        upload.recipe_json.containers[0].ingredients[0].kind = IngredientKind::Seasoning;
        let message = Recipe::validate(&upload).unwrap_err();
        assert!(message.contains("container 1"), "{message}");
        assert!(Recipe::validate(&sample_upload("Dal")).is_ok());
    }
}
