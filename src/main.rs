use dotenvy::dotenv;
use plano_trabalho::{
    config::{database, engine},
    core::{plan, report},
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load and validate the engine configuration
    let config = engine::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        organizations = config.organizations.len(),
        overrides = config.categories.len(),
        "Configuration loaded"
    );

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Print the report of the plan given as first argument, or list plans
    match std::env::args().nth(1) {
        Some(arg) => {
            let plan_id: i64 = arg.parse().map_err(|_| Error::Validation {
                message: format!("Invalid plan id: {arg}"),
            })?;
            let plan_report = report::generate_plan_report(&db, plan_id).await?;
            println!("{}", report::format_plan_report(&plan_report));
        }
        None => {
            for p in plan::get_all_plans(&db).await? {
                println!("{:>4}  {}  {}  ({} / UG {})", p.id, p.number, p.operation, p.om, p.ug);
            }
        }
    }

    Ok(())
}
