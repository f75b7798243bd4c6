use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use log::{error, info};

use local_food_api::config::{AppConfig, StoreBackend};
use local_food_api::gate::{Readiness, ReadinessGate};
use local_food_api::memory::MemoryStore;
use local_food_api::query::MysqlStore;
use local_food_api::state::AppState;
use local_food_api::store::Store;
use local_food_api::{bootstrap, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Err(err) = run().await {
        error!("local food api failed to start: {:?}", err);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;

    let store: Arc<dyn Store> = match cfg.backend {
        StoreBackend::Mysql => Arc::new(MysqlStore::new(&cfg.database_url, cfg.pool_size)),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    let state = AppState::new(store);
    let readiness = Readiness::new();

    // connect and seed in the background; the gate answers 503 until done
    {
        let store = state.store().clone();
        let readiness = readiness.clone();
        let seed_sample_data = cfg.seed_sample_data;
        actix_web::rt::spawn(async move {
            let result =
                web::block(move || bootstrap(store.as_ref(), &readiness, seed_sample_data)).await;
            match result {
                Ok(Ok(_)) => info!("Ready to serve requests"),
                Ok(Err(_)) => error!("Storage is not connected, every request will get 503"),
                Err(e) => error!("Bootstrap did not run: {}", e),
            }
        });
    }

    info!("starting HTTP server at http://{}", cfg.listen_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(ReadinessGate::new(readiness.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::init_routes)
    })
    .bind(cfg.listen_addr.as_str())?
    .run()
    .await?;

    Ok(())
}
