use anyhow::{Context, Result};
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api;
use crate::config::ServerConfig;
use crate::models::TourRequest;
use crate::planner::{LogProgress, TourPlanner};
use crate::render::Renderer;

/// Shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TourPlanner>,
    pub renderer: Arc<Renderer>,
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(form_page))
        .route("/tours", post(results_page))
        .nest("/api", api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(server: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web server running at http://localhost:{}", server.port);
    axum::serve(listener, app(state))
        .await
        .context("Web server stopped unexpectedly")
}

async fn form_page(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    state
        .renderer
        .form_page(&TourRequest::default())
        .map(Html)
        .map_err(|e| {
            error!("Failed to render form: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn results_page(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Html<String>, StatusCode> {
    let request = TourRequest::from_form_fields(&fields).map_err(|e| {
        warn!("Rejected form submission: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    info!("Planning tours for: {}", request.cities);
    let batch = state.planner.plan_tours(&request, &mut LogProgress).await;

    state
        .renderer
        .results_page(&request, &batch)
        .await
        .map(Html)
        .map_err(|e| {
            error!("Failed to render results: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ItineraryGenerator, ItineraryRequest};
    use crate::geocoding::Geocoder;
    use crate::images::NoImages;
    use crate::models::{Coordinates, CurrentWeather, DiningStyle, ItineraryPayload, RestaurantGuide};
    use crate::weather::WeatherProvider;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    struct MildWeather;

    #[async_trait]
    impl WeatherProvider for MildWeather {
        async fn current(&self, city: &str) -> anyhow::Result<CurrentWeather> {
            if city == "Atlantis" {
                anyhow::bail!("No matching location found.");
            }
            Ok(CurrentWeather::new(18.0, "Partly cloudy"))
        }
    }

    struct OneDish;

    #[async_trait]
    impl ItineraryGenerator for OneDish {
        async fn generate(&self, request: ItineraryRequest) -> anyhow::Result<ItineraryPayload> {
            Ok(ItineraryPayload {
                dining: DiningStyle::Outdoor,
                dishes: vec![format!("{} noodles", request.city)],
                restaurants: RestaurantGuide::new(vec![(
                    format!("{} noodles", request.city),
                    vec!["Noodle Bar".into()],
                )]),
                itinerary: "Eat noodles.".into(),
                bonus_stop: None,
                trivia: "Noodles are long.".into(),
            })
        }
    }

    struct Everywhere;

    #[async_trait]
    impl Geocoder for Everywhere {
        async fn locate(&self, _name: &str, _city: &str) -> Option<Coordinates> {
            Coordinates::new(48.85, 2.35)
        }
    }

    fn test_app() -> Router {
        let planner = TourPlanner::new(Arc::new(MildWeather), Arc::new(OneDish), Arc::new(Everywhere));
        app(AppState {
            planner: Arc::new(planner),
            renderer: Arc::new(Renderer::new(Arc::new(NoImages)).unwrap()),
        })
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn index_serves_form() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Generate Tours"));
    }

    #[tokio::test]
    async fn form_submission_renders_results() {
        let form = "cities=Paris%2C+Atlantis&prefs=Vegan&prefs=Halal&surprise=on";
        let response = test_app()
            .oneshot(
                Request::post("/tours")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Paris — Partly cloudy, 18°C"));
        assert!(html.contains("Could not plan Atlantis"));
        assert!(html.contains("value=\"Vegan\" checked"));
    }

    #[tokio::test]
    async fn form_rejects_unknown_preference() {
        let response = test_app()
            .oneshot(
                Request::post("/tours")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("cities=Paris&prefs=Carnivore"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn json_api_returns_batch() {
        let response = test_app()
            .oneshot(
                Request::post("/api/tours")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"cities": "Paris, Tokyo", "prefs": ["Gluten-Free"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        let tours = body["tours"].as_array().unwrap();
        assert_eq!(tours.len(), 2);
        assert_eq!(tours[0]["city"], "Paris");
        assert_eq!(tours[1]["city"], "Tokyo");
        assert_eq!(tours[1]["stops"][0]["name"], "Noodle Bar");
        assert!(body["failures"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_api_requires_cities() {
        let response = test_app()
            .oneshot(
                Request::post("/api/tours")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"cities": " , "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
