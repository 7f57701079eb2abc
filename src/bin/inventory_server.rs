use std::sync::Arc;

use coah::{
    init_logging, inventory_router, log_app_bind, log_app_start, log_source_selected,
    logging_config_from_env, site_config_from_env, CsvInventorySource, InMemoryInventorySource,
    InventorySource, SheetInventorySource, SiteConfig, SourceChoice,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;

    let site_cfg = site_config_from_env();
    log_app_start(&logging_cfg, &site_cfg);

    // The sheet source owns a blocking HTTP client, which must be created and
    // dropped outside the async runtime.
    let source = source_from_config(&site_cfg)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(Arc::clone(&source), &site_cfg));
    drop(runtime);
    drop(source);

    served
}

async fn serve(
    source: Arc<dyn InventorySource>,
    cfg: &SiteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = inventory_router(source, cfg.lock_policy);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn source_from_config(
    cfg: &SiteConfig,
) -> Result<Arc<dyn InventorySource>, Box<dyn std::error::Error>> {
    match (cfg.source_choice(), &cfg.sheet_url, &cfg.items_csv) {
        (SourceChoice::Sheet, Some(url), _) => {
            log_source_selected("sheet", Some(url));
            Ok(Arc::new(SheetInventorySource::new(
                url.clone(),
                cfg.http_timeout_ms,
            )?))
        }
        (SourceChoice::Csv, _, Some(path)) => {
            let location = path.display().to_string();
            log_source_selected("csv", Some(&location));
            Ok(Arc::new(CsvInventorySource::new(path.clone())))
        }
        _ => {
            log_source_selected("demo", None);
            Ok(Arc::new(InMemoryInventorySource::demo()))
        }
    }
}
