use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use event_planner::config::{LoggingSettings, Settings};
use event_planner::core::{
    FieldSerializer, PlaceQueryClient, PlannerPipeline, RankingAgent, ResponseExtractor,
};
use event_planner::routes::{self, AppState};
use event_planner::services::{CompletionProvider, GoogleMapsClient, InferenceClient, PlacesProvider};
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn startup_error(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(startup_error(e));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting Event Planner service...");

    if let Err(e) = settings.validate() {
        error!("{}", e);
        return Err(startup_error(e));
    }

    info!("Configuration loaded successfully");

    let inference: Arc<dyn CompletionProvider> = Arc::new(
        InferenceClient::new(
            settings.inference.base_url.clone(),
            settings.inference.api_key.clone(),
            settings.inference.timeout_secs,
        )
        .map_err(startup_error)?,
    );

    let maps: Arc<dyn PlacesProvider> = Arc::new(
        GoogleMapsClient::new(
            settings.places.base_url.clone(),
            settings.places.api_key.clone(),
            settings.places.timeout_secs,
        )
        .map_err(startup_error)?,
    );

    info!(
        "Inference client initialized (serializer: {}, ranking: {})",
        settings.inference.serializer_model, settings.inference.ranking_model
    );

    let planner_settings = &settings.planner;
    let extractor = ResponseExtractor::new(planner_settings.extraction_mode);

    let planner = PlannerPipeline::new(
        FieldSerializer::new(
            Arc::clone(&inference),
            settings.inference.serializer_model.clone(),
            extractor,
            planner_settings.cuisine_policy,
            planner_settings.default_cuisine.clone(),
        ),
        PlaceQueryClient::new(maps, planner_settings.dietary_qualifier.clone()),
        RankingAgent::new(inference, settings.inference.ranking_model.clone(), extractor),
        planner_settings.parallel_cuisines,
    );

    info!("Planner initialized with {:?}", planner_settings);

    // Build application state
    let app_state = AppState {
        planner: Arc::new(planner),
        default_result_count: planner_settings.default_result_count,
        default_radius_m: planner_settings.default_radius_m,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
