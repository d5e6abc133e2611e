use anyhow::{Context, Result};
use clap::Parser;
use ladle::recipe_json::RecipeData;
use ladle_client::session::RecipeAuthoringSession;
use ladle_client::submit::MarketplaceClient;

/// Validate a recipe draft and upload it to the marketplace
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Path to a recipe_json draft file
    draft: std::path::PathBuf,
    /// webp image to attach as the recipe thumbnail
    #[arg(short, long)]
    image: Option<std::path::PathBuf>,
    /// Update this existing recipe instead of creating a new one
    #[arg(short, long)]
    update: Option<i64>,
    /// URL of the server to upload to
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,
    /// Dry run mode: validate and assemble, but don't upload
    #[arg(long)]
    dry: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.draft).context("Reading the draft file")?;
    let data: RecipeData = serde_json::from_str(&text).context("Parsing the draft file")?;
    let session = RecipeAuthoringSession::from_recipe_data(data);
    let upload = session.assemble().context("Validating the draft")?;

    let placed: usize = upload
        .recipe_json
        .containers
        .iter()
        .map(|c| c.ingredients.len())
        .sum();
    println!(
        "Recipe: {} ({} placed ingredients, {} steps)",
        upload.recipe_json.meta.name,
        placed,
        upload.recipe_json.steps.len()
    );

    if args.dry {
        println!("Dry run mode enabled, skipping upload");
        return Ok(());
    }

    let image = match &args.image {
        Some(path) => Some(std::fs::read(path).context("Reading the thumbnail")?),
        None => None,
    };
    let token = dotenvy::var("PRINCIPAL_SECRET").context("PRINCIPAL_SECRET must be set")?;
    let client = MarketplaceClient::new(&args.server, token);

    let receipt = match args.update {
        Some(recipe_id) => client.update(recipe_id, &upload, image).await?,
        None => client.submit(&upload, image).await?,
    };
    tracing::info!(recipe_id = ?receipt.recipe_id, "Recipe uploaded successfully");
    if let Some(recipe_id) = receipt.recipe_id {
        println!("Stored as recipe {recipe_id}");
    }
    Ok(())
}
