use crate::core::PlannerPipeline;
use crate::models::{ErrorResponse, HealthResponse, PlanEventRequest, PlanEventResponse, StatusResponse};
use actix_web::{web, HttpResponse, Responder};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<PlannerPipeline>,
    pub default_result_count: usize,
    pub default_radius_m: u32,
}

/// Liveness and health routes, mounted at the root
pub fn configure_status(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health_check));
}

/// Planning routes, mounted under /api
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/plan-event", web::post().to(plan_event));
}

async fn root() -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        status: "online".to_string(),
        message: "Event Planner API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check endpoint
///
/// Static: upstream services are not contacted.
async fn health_check() -> impl Responder {
    let services: BTreeMap<String, String> = ["api", "serializer", "maps", "ranking"]
        .into_iter()
        .map(|name| (name.to_string(), "online".to_string()))
        .collect();

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        services,
        timestamp: chrono::Utc::now(),
    })
}

/// Plan an event
///
/// POST /api/plan-event
///
/// Request body:
/// ```json
/// {
///   "prompt": "string",
///   "result_count": 15,
///   "radius": 20000
/// }
/// ```
async fn plan_event(state: web::Data<AppState>, req: web::Json<PlanEventRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for plan-event request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let request = req.into_inner();
    let result_count = request
        .result_count
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(state.default_result_count);
    let radius_m = request
        .radius
        .and_then(|r| u32::try_from(r).ok())
        .unwrap_or(state.default_radius_m);

    tracing::info!(
        "Planning event: result_count={}, radius={}m, prompt_chars={}",
        result_count,
        radius_m,
        request.prompt.len()
    );

    let planner = Arc::clone(&state.planner);
    let prompt = request.prompt;
    let task = tokio::spawn(async move { planner.plan(&prompt, result_count, radius_m).await });

    match task.await {
        Ok(Ok(plan)) => HttpResponse::Ok().json(PlanEventResponse::from(plan)),
        Ok(Err(e)) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Planning failed".to_string(),
            message: e.to_string(),
            status_code: 400,
        }),
        Err(e) => {
            tracing::error!("Planning task aborted: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Internal server error".to_string(),
                message: "Planning task failed unexpectedly".to_string(),
                status_code: 500,
            })
        }
    }
}
