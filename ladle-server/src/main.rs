use anyhow::{Context, Result};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use ladle::api::{ApiResponse, EnumValue};
use ladle::recipe_json::{CatalogIngredient, RecipeForUpload};
use ladle_server::{
    auth::ServicePrincipal,
    cache::{new_cache, CacheQuery, CacheValue, LadleCache},
    database::Database,
    errors::{WebError, WebResult},
    models::{self, Recipe, RecipeSummary, ENUM_CATEGORIES},
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// The address and optionally port to bind to
    #[clap(long, default_value = "0.0.0.0:3000")]
    address: String,

    /// Path to the sqlite database file
    #[clap(long, default_value = "data/ladle.db")]
    database: String,

    /// Directory the access log rolls into
    #[clap(long, default_value = ".")]
    log_dir: String,

    /// Whether to use HTTPS / TLS
    #[clap(long)]
    tls: bool,

    /// TLS certificate chain, PEM
    #[clap(long, default_value = "certs/fullchain.pem")]
    tls_cert: String,

    /// TLS private key, PEM
    #[clap(long, default_value = "certs/privkey.pem")]
    tls_key: String,
}

#[derive(Clone)]
struct AllStates {
    db: Database,
    cache: LadleCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // Parse command line arguments
    let args = Args::parse();

    // initialize tracing
    let file_appender = tracing_appender::rolling::daily(&args.log_dir, "access.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Some(parent) = std::path::Path::new(&args.database).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::connect(&args.database).context("Connecting to database")?;

    // build our application with a route
    let app = Router::new()
        // `GET /health` goes to `health`
        .route("/health", get(health))
        // `GET /api/v1/ingredients` goes to `list_ingredients`
        .route("/api/v1/ingredients", get(list_ingredients))
        // `GET /api/v1/enums/:category` goes to `list_enum_options`
        .route("/api/v1/enums/:category", get(list_enum_options))
        // `GET/POST /api/v1/recipes` go to `list_recipes` / `create_recipe`
        .route("/api/v1/recipes", get(list_recipes).post(create_recipe))
        // `GET /api/v1/recipes/featured` goes to `featured_recipes`
        .route("/api/v1/recipes/featured", get(featured_recipes))
        // `GET/PUT/DELETE /api/v1/recipes/:id` fetch, replace or remove one recipe
        .route(
            "/api/v1/recipes/:recipe_id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        // `GET /api/v1/recipes/:id/thumbnail` goes to `get_thumbnail`
        .route("/api/v1/recipes/:recipe_id/thumbnail", get(get_thumbnail))
        .layer(
            tower_http::compression::CompressionLayer::new()
                .quality(tower_http::CompressionLevel::Fastest),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(AllStates {
            db,
            cache: new_cache(),
        });

    // In development, use HTTP. In production, use HTTPS.
    if args.tls {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
        let tls_config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(&args.tls_cert, &args.tls_key)
                .await
                .context("Loading TLS certificate")?;

        let addr = args.address.parse()?;
        tracing::info!("Listening on {}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .context("Starting TLS server")?;
    } else {
        let listener = tokio::net::TcpListener::bind(args.address).await?;
        axum::serve(listener, app).await?;
    }
    Ok(())
}

// Just reply that everything is okay
async fn health() -> StatusCode {
    StatusCode::OK
}

/// The catalog the authoring UI populates its drag panels from.
async fn list_ingredients(
    State(allstates): State<AllStates>,
) -> WebResult<Json<ApiResponse<Vec<CatalogIngredient>>>> {
    let catalog = match allstates
        .cache
        .get_value_or_guard_async(&CacheQuery::Catalog)
        .await
    {
        Ok(CacheValue::Catalog(items)) => items,
        Ok(_) => unreachable!(),
        Err(guard) => {
            let items = models::list_catalog(&allstates.db)?;
            guard
                .insert(CacheValue::Catalog(items.clone()))
                .unwrap_or_default();
            items
        }
    };
    Ok(Json(ApiResponse::ok(catalog)))
}

/// Option values for the cuisine/category/recipe-type/difficulty pickers.
async fn list_enum_options(
    State(allstates): State<AllStates>,
    Path(category): Path<String>,
) -> WebResult<Json<ApiResponse<Vec<EnumValue>>>> {
    if !ENUM_CATEGORIES.contains(&category.as_str()) {
        return Err(WebError::NotFound);
    }
    let query = CacheQuery::EnumList {
        category: category.clone(),
    };
    let values = match allstates.cache.get_value_or_guard_async(&query).await {
        Ok(CacheValue::EnumList(values)) => values,
        Ok(_) => unreachable!(),
        Err(guard) => {
            let values = models::enum_options(&allstates.db, &category)?;
            guard
                .insert(CacheValue::EnumList(values.clone()))
                .unwrap_or_default();
            values
        }
    };
    Ok(Json(ApiResponse::ok(values)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn list_recipes(
    State(allstates): State<AllStates>,
    Query(query): Query<ListQuery>,
) -> WebResult<Json<ApiResponse<Vec<RecipeSummary>>>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let summaries = Recipe::list_summaries(&allstates.db, limit)?;
    Ok(Json(ApiResponse::ok(summaries)))
}

/// A random storefront sample, up to eight recipes.
async fn featured_recipes(
    State(allstates): State<AllStates>,
) -> WebResult<Json<ApiResponse<Vec<RecipeSummary>>>> {
    let pool = Recipe::list_summaries(&allstates.db, 100)?;
    let featured = pool
        .choose_multiple(&mut rand::thread_rng(), 8)
        .cloned()
        .collect();
    Ok(Json(ApiResponse::ok(featured)))
}

async fn get_recipe(
    State(allstates): State<AllStates>,
    Path(recipe_id): Path<i64>,
) -> WebResult<Json<ApiResponse<Recipe>>> {
    let recipe = Recipe::get_by_id(&allstates.db, recipe_id)?.ok_or(WebError::NotFound)?;
    Ok(Json(ApiResponse::ok(recipe)))
}

async fn get_thumbnail(
    State(allstates): State<AllStates>,
    Path(recipe_id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let thumbnail =
        Recipe::get_thumbnail(&allstates.db, recipe_id)?.ok_or(WebError::NotFound)?;
    Ok(([(header::CONTENT_TYPE, "image/webp")], thumbnail))
}

/// Store a new recipe uploaded by the authoring client.
async fn create_recipe(
    State(allstates): State<AllStates>,
    _: ServicePrincipal,
    multipart: Multipart,
) -> WebResult<Json<ApiResponse<Recipe>>> {
    let (upload, thumbnail) = read_upload(multipart).await?;
    let recipe_id = Recipe::push(&allstates.db, &upload, thumbnail)?;
    let stored = Recipe::get_by_id(&allstates.db, recipe_id)?.ok_or(WebError::NotFound)?;
    Ok(Json(ApiResponse::ok_with("Recipe created", stored)))
}

/// Replace a stored recipe; the edit cycle re-submits the whole payload.
async fn update_recipe(
    State(allstates): State<AllStates>,
    Path(recipe_id): Path<i64>,
    _: ServicePrincipal,
    multipart: Multipart,
) -> WebResult<Json<ApiResponse<Recipe>>> {
    let (upload, thumbnail) = read_upload(multipart).await?;
    if !Recipe::update(&allstates.db, recipe_id, &upload, thumbnail)? {
        return Err(WebError::NotFound);
    }
    let stored = Recipe::get_by_id(&allstates.db, recipe_id)?.ok_or(WebError::NotFound)?;
    Ok(Json(ApiResponse::ok_with("Recipe updated", stored)))
}

async fn delete_recipe(
    State(allstates): State<AllStates>,
    Path(recipe_id): Path<i64>,
    _: ServicePrincipal,
) -> WebResult<Json<ApiResponse<i64>>> {
    if !Recipe::delete(&allstates.db, recipe_id)? {
        return Err(WebError::NotFound);
    }
    Ok(Json(ApiResponse::ok_with("Recipe deleted", recipe_id)))
}

/// Pull the `recipe` JSON part and the optional `image` part out of a
/// multipart upload, re-validating both at the trust boundary.
async fn read_upload(
    mut multipart: Multipart,
) -> WebResult<(RecipeForUpload, Option<Vec<u8>>)> {
    let mut recipe: Option<RecipeForUpload> = None;
    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::Validation(format!("multipart: {e}")))?
    {
        match field.name() {
            Some("recipe") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| WebError::Validation(format!("recipe part: {e}")))?;
                recipe = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| WebError::Validation(format!("recipe payload: {e}")))?,
                );
            }
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::Validation(format!("image part: {e}")))?;
                image = Some(bytes.to_vec());
            }
            _ => {}
        }
    }
    let upload = recipe.ok_or_else(|| WebError::Validation("missing recipe part".into()))?;
    Recipe::validate(&upload).map_err(WebError::Validation)?;
    let thumbnail = match image {
        Some(bytes) => Some(
            models::process_thumbnail(&bytes)
                .map_err(|e| WebError::Validation(format!("image: {e}")))?,
        ),
        None => None,
    };
    Ok((upload, thumbnail))
}
