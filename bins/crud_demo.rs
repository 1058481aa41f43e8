use std::process::ExitCode;

use configs::AppConfig;
use dotenvy::dotenv;
use service::crud::CrudAppService;
use service::upstream::{upstream_app_service, CreateUpstream, UpdateUpstream, UpstreamListInput};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env first so RUST_LOG, CONFIG_PATH and DATABASE_URL apply.
    dotenv().ok();

    let (cfg, load_err) = match AppConfig::load_and_validate() {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    common::utils::logging::init_logging(cfg.logging.json);
    if let Some(e) = load_err {
        warn!(error = %e, "config_not_loaded_using_defaults");
    }

    match run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "crud_demo_failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::ensure_schema(&db).await?;
    let svc = upstream_app_service(db, &cfg.paging);

    let mut ids = Vec::new();
    for (name, base_url) in [
        ("billing", "https://billing.internal"),
        ("search", "https://search.internal"),
        ("search-canary", "https://canary.search.internal"),
    ] {
        let created = svc
            .create(CreateUpstream { name: name.into(), base_url: base_url.into(), health_url: None, active: true })
            .await?;
        info!(id = %created.id, name = %created.name, "upstream_created");
        ids.push(created.id);
    }

    let page = svc.list(UpstreamListInput { sorting: Some("name asc".into()), ..Default::default() }).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    let updated = svc
        .update(ids[2], UpdateUpstream { active: Some(false), health_url: Some("https://canary.search.internal/healthz".into()), ..Default::default() })
        .await?;
    println!("{}", serde_json::to_string_pretty(&updated)?);

    svc.delete(ids[0]).await?;

    let active_search = svc
        .list(UpstreamListInput { name: Some("search".into()), active: Some(true), ..Default::default() })
        .await?;
    println!("{}", serde_json::to_string_pretty(&active_search)?);
    Ok(())
}
