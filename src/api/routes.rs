//! HTTP routes for searches, trip planning and the travel chat.

use crate::agents::{
    ConversationStore, FlightSearchResult, TravelAgent, TravelCoordinator, TripPlan, TripRequest,
};
use crate::api::models::{
    validate_trip, ActivitySearchRequest, ChatRequest, ChatResponse, ErrorBody,
    FlightSearchRequest, HealthResponse, HotelSearchRequest, RestaurantSearchRequest,
};
use crate::error::TravelError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state
pub struct AppState {
    pub agent: TravelAgent,
    pub conversations: ConversationStore,
    pub coordinator: TravelCoordinator,
}

impl AppState {
    pub fn new(agent: TravelAgent, coordinator: TravelCoordinator) -> Self {
        Self::with_store(agent, coordinator, ConversationStore::new())
    }

    pub fn with_store(
        agent: TravelAgent,
        coordinator: TravelCoordinator,
        conversations: ConversationStore,
    ) -> Self {
        Self {
            agent,
            conversations,
            coordinator,
        }
    }
}

/// A failed request, rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<TravelError> for ApiError {
    fn from(err: TravelError) -> Self {
        let status = match &err {
            TravelError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TravelError::LoopExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            TravelError::UnknownTool(_) => StatusCode::BAD_GATEWAY,
            TravelError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = self.detail.as_str(), "Request failed");
        } else {
            warn!(status = %self.status, detail = self.detail.as_str(), "Request rejected");
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/flights/search", post(search_flights))
        .route("/api/hotels/search", post(search_hotels))
        .route("/api/activities/search", post(search_activities))
        .route("/api/restaurants/search", post(search_restaurants))
        .route("/api/trips/plan", post(plan_trip))
        .route("/api/chat", post(chat))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn search_flights(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FlightSearchRequest>,
) -> ApiResult<FlightSearchResult> {
    request.trip.validate()?;

    let result = state
        .coordinator
        .flights()
        .search(
            &request.departure_city,
            &request.arrival_city,
            request.trip.start_date,
            Some(request.trip.end_date),
            request.trip.budget,
            request.trip.travelers,
        )
        .await;

    match result.error {
        Some(error) => Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, error)),
        None => Ok(Json(result)),
    }
}

async fn search_hotels(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HotelSearchRequest>,
) -> ApiResult<Vec<Value>> {
    request.trip.validate()?;

    let hotels = state
        .coordinator
        .hotels()
        .search(
            &request.city,
            request.trip.start_date,
            request.trip.end_date,
            request.trip.budget,
            request.trip.travelers,
            request.room_count,
        )
        .await?;
    Ok(Json(hotels))
}

async fn search_activities(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActivitySearchRequest>,
) -> ApiResult<Vec<Value>> {
    request.trip.validate()?;

    let activities = state
        .coordinator
        .activities()
        .search(
            &request.city,
            request.trip.start_date,
            request.trip.end_date,
            request.trip.budget,
            request.activity_type.as_deref(),
        )
        .await?;
    Ok(Json(activities))
}

async fn search_restaurants(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RestaurantSearchRequest>,
) -> ApiResult<Vec<Value>> {
    request.trip.validate()?;

    let restaurants = state
        .coordinator
        .restaurants()
        .search(
            &request.city,
            request.trip.start_date,
            request.trip.end_date,
            request.trip.budget,
            request.cuisine_type.as_deref(),
            request.price_level.as_deref(),
        )
        .await?;
    Ok(Json(restaurants))
}

async fn plan_trip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TripRequest>,
) -> ApiResult<TripPlan> {
    validate_trip(request.start_date, request.end_date, request.budget)?;
    Ok(Json(state.coordinator.plan_trip(&request).await))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.message.trim().is_empty() {
        return Err(TravelError::InvalidRequest("message must not be empty".to_string()).into());
    }

    let slot = state.conversations.checkout(request.conversation_id)?;
    let mut conversation = slot.lock().await;
    let conversation_id = conversation.id();
    info!(
        %conversation_id,
        conversations = state.conversations.len(),
        "Chat request"
    );

    // History is only committed once the run succeeds
    let run = match state.agent.run(conversation.clone(), &request.message).await {
        Ok(run) => run,
        Err(e) => {
            drop(conversation);
            drop(slot);
            state.conversations.discard_if_empty(&conversation_id);
            return Err(e.into());
        }
    };
    *conversation = run.conversation;

    Ok(Json(ChatResponse {
        conversation_id,
        answer: run.answer,
        turns: run.turns,
        tool_invocations: run.tool_invocations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ConversationId;
    use crate::error::{LoopLimit, Result};
    use crate::llm::tools::{ToolDescriptor, ToolRegistry, UnknownToolPolicy};
    use crate::llm::{CompletionConfig, LlmGateway, LlmGatewayResponse, LlmMessage, LlmToolCall};
    use crate::search::SerpApiClient;
    use async_trait::async_trait;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    // Answers with the number of messages it was sent
    struct CountingGateway;

    #[async_trait]
    impl LlmGateway for CountingGateway {
        async fn complete(
            &self,
            _model: &str,
            messages: &[LlmMessage],
            _tools: &[ToolDescriptor],
            _config: &CompletionConfig,
        ) -> Result<LlmGatewayResponse> {
            Ok(LlmGatewayResponse::text(format!("seen {}", messages.len())))
        }
    }

    // Always asks for a tool that does not exist
    struct RogueGateway;

    #[async_trait]
    impl LlmGateway for RogueGateway {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[LlmMessage],
            _tools: &[ToolDescriptor],
            _config: &CompletionConfig,
        ) -> Result<LlmGatewayResponse> {
            Ok(LlmGatewayResponse::calls(vec![LlmToolCall::new(
                "restaurant_api",
                HashMap::new(),
            )]))
        }
    }

    // Fails every request until switched on
    struct FlakyGateway {
        healthy: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl LlmGateway for FlakyGateway {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[LlmMessage],
            _tools: &[ToolDescriptor],
            _config: &CompletionConfig,
        ) -> Result<LlmGatewayResponse> {
            if self.healthy.load(std::sync::atomic::Ordering::SeqCst) {
                Ok(LlmGatewayResponse::text("Here you go"))
            } else {
                Err(TravelError::GatewayError("model unavailable".to_string()))
            }
        }
    }

    fn state_with(
        gateway: Arc<dyn LlmGateway>,
        policy: UnknownToolPolicy,
        serp_url: &str,
    ) -> Arc<AppState> {
        let serpapi = SerpApiClient::with_base_url("key", serp_url).unwrap();
        let agent = TravelAgent::builder(gateway, "test-model")
            .tools(ToolRegistry::builder().build().unwrap())
            .max_turns(2)
            .deadline(Duration::from_secs(5))
            .unknown_tool_policy(policy)
            .build();
        Arc::new(AppState::new(agent, TravelCoordinator::with_serpapi(serpapi)))
    }

    fn state(gateway: Arc<dyn LlmGateway>) -> Arc<AppState> {
        state_with(gateway, UnknownToolPolicy::default(), "http://127.0.0.1:9")
    }

    fn chat_request(message: &str, conversation_id: Option<ConversationId>) -> Json<ChatRequest> {
        Json(ChatRequest {
            message: message.to_string(),
            conversation_id,
        })
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (TravelError::InvalidRequest("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                TravelError::LoopExceeded(LoopLimit::TurnLimit { turns: 8 }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                TravelError::LoopExceeded(LoopLimit::Deadline {
                    after: Duration::from_secs(1),
                }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (TravelError::UnknownTool("x".into()), StatusCode::BAD_GATEWAY),
            (TravelError::CapacityExceeded("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (TravelError::GatewayError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (TravelError::ApiError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_chat_keeps_history_per_conversation() {
        let state = state(Arc::new(CountingGateway));

        let first = chat(State(state.clone()), chat_request("Hello", None)).await.unwrap().0;
        assert_eq!(first.answer, "seen 1");
        assert_eq!(first.turns, 1);

        let second = chat(
            State(state.clone()),
            chat_request("Any events in Atlanta?", Some(first.conversation_id)),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(second.conversation_id, first.conversation_id);
        // user + assistant from the first exchange, plus the new user message
        assert_eq!(second.answer, "seen 3");

        let other = chat(State(state.clone()), chat_request("Hello", None)).await.unwrap().0;
        assert_ne!(other.conversation_id, first.conversation_id);
        assert_eq!(other.answer, "seen 1");
        assert_eq!(state.conversations.len(), 2);
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let err = chat(State(state(Arc::new(CountingGateway))), chat_request("  ", None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_chat_unknown_tool_abort_is_bad_gateway() {
        let state = state_with(
            Arc::new(RogueGateway),
            UnknownToolPolicy::Abort,
            "http://127.0.0.1:9",
        );

        let id = ConversationId::new();
        let err = chat(State(state.clone()), chat_request("Book dinner", Some(id)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.detail().contains("restaurant_api"));

        // The failed run left nothing behind
        assert!(state.conversations.is_empty());
    }

    #[tokio::test]
    async fn test_failed_chats_with_new_ids_leave_store_unchanged() {
        let gateway = Arc::new(FlakyGateway {
            healthy: std::sync::atomic::AtomicBool::new(false),
        });
        let state = state(gateway.clone());

        for _ in 0..200 {
            let err = chat(State(state.clone()), chat_request("Hi", Some(ConversationId::new())))
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        chat(State(state.clone()), chat_request("Hi", None)).await.unwrap_err();

        assert_eq!(state.conversations.len(), 0);
    }

    #[tokio::test]
    async fn test_failed_chat_keeps_existing_history() {
        let gateway = Arc::new(FlakyGateway {
            healthy: std::sync::atomic::AtomicBool::new(true),
        });
        let state = state(gateway.clone());

        let first = chat(State(state.clone()), chat_request("Hello", None)).await.unwrap().0;

        gateway.healthy.store(false, std::sync::atomic::Ordering::SeqCst);
        chat(State(state.clone()), chat_request("Again", Some(first.conversation_id)))
            .await
            .unwrap_err();
        assert_eq!(state.conversations.len(), 1);

        gateway.healthy.store(true, std::sync::atomic::Ordering::SeqCst);
        let next = chat(State(state.clone()), chat_request("Again", Some(first.conversation_id)))
            .await
            .unwrap()
            .0;
        assert_eq!(next.conversation_id, first.conversation_id);
        assert_eq!(state.conversations.len(), 1);
    }

    #[tokio::test]
    async fn test_chat_turn_limit_is_gateway_timeout() {
        let state = state(Arc::new(RogueGateway));

        let err = chat(State(state), chat_request("Book dinner", None)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_search_flights_rejects_reversed_dates() {
        let request: FlightSearchRequest = serde_json::from_value(json!({
            "departure_city": "ATL",
            "arrival_city": "AUS",
            "start_date": "2024-09-05",
            "end_date": "2024-09-02",
            "budget": 500
        }))
        .unwrap();

        let err = search_flights(State(state(Arc::new(CountingGateway))), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_search_hotels_returns_filtered_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::UrlEncoded("engine".into(), "google_hotels".into()))
            .with_status(200)
            .with_body(
                json!({"properties": [
                    {"name": "Cheap", "price_per_night": 80},
                    {"name": "Dear", "price_per_night": 300}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let state = state_with(
            Arc::new(CountingGateway),
            UnknownToolPolicy::default(),
            &server.url(),
        );
        let request: HotelSearchRequest = serde_json::from_value(json!({
            "city": "Atlanta",
            "start_date": "2024-09-02",
            "end_date": "2024-09-04",
            "budget": 300
        }))
        .unwrap();

        let hotels = search_hotels(State(state), Json(request)).await.unwrap().0;
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0]["name"], "Cheap");
    }

    #[tokio::test]
    async fn test_search_flights_error_is_internal_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let state = state_with(
            Arc::new(CountingGateway),
            UnknownToolPolicy::default(),
            &server.url(),
        );
        let request: FlightSearchRequest = serde_json::from_value(json!({
            "departure_city": "ATL",
            "arrival_city": "AUS",
            "start_date": "2024-09-02",
            "end_date": "2024-09-05",
            "budget": 500
        }))
        .unwrap();

        let err = search_flights(State(state), Json(request)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail().contains("500"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let health = health_check().await.0;
        assert_eq!(health.status, "ok");
    }
}
