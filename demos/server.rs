//! Simple REST API server example for the concessions engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /programs` - Register a sponsoring program
//! - `POST /items` - Upsert a catalog item
//! - `POST /purchases` - Intake a vendor receipt
//! - `POST /sessions` - Create a session
//! - `POST /sessions/{id}/start` - Count the drawer in and activate
//! - `POST /sessions/{id}/orders` - Place an order
//! - `POST /sessions/{id}/close` - Count the drawer out and close
//! - `GET /sessions/{id}` - Session snapshot
//! - `GET /items/{id}/stock` - Stock snapshot (lots, on-hand, value)
//! - `GET /journal` - Audit journal
//!
//! ## Example Usage
//!
//! ```bash
//! # Register a program
//! curl -X POST http://localhost:3000/programs \
//!   -H "Content-Type: application/json" -d '{"name": "Robotics"}'
//!
//! # Create and start a session
//! curl -X POST http://localhost:3000/sessions \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday game", "program_id": 1}'
//! curl -X POST http://localhost:3000/sessions/1/start \
//!   -H "Content-Type: application/json" \
//!   -d '{"drawer": {"quarters": 20, "ones": 15, "fives": 4, "tens": 1, "twenties": 0, "fifties": 0, "hundreds": 0}}'
//!
//! # Place a cash order
//! curl -X POST http://localhost:3000/sessions/1/orders \
//!   -H "Content-Type: application/json" \
//!   -d '{"lines": [{"item_id": 1, "quantity": 2, "unit_price": null}], "amount_tendered": "5.00"}'
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use concession_ledger_rs::{
    Allocation, CatalogItem, ChargeTarget, DrawerCount, Engine, ItemId, LedgerError,
    OrderLineInput, OrderRequest, PaymentMethod, ProgramId, PurchaseInput, PurchaseLine,
    SessionId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
struct CreateProgramRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateProgramResponse {
    program_id: ProgramId,
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    name: String,
    program_id: ProgramId,
    #[serde(default)]
    is_test: bool,
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    session_id: SessionId,
}

#[derive(Debug, Deserialize)]
struct DrawerRequest {
    drawer: DrawerCount,
}

#[derive(Debug, Serialize)]
struct StartSessionResponse {
    start_total: Decimal,
}

#[derive(Debug, Deserialize)]
struct PlaceOrderRequest {
    lines: Vec<OrderLineInput>,
    #[serde(default)]
    payment: PaymentMethod,
    #[serde(default)]
    amount_tendered: Decimal,
    #[serde(default)]
    discount_amount: Decimal,
    #[serde(default)]
    charged_to: ChargeTarget,
    #[serde(default)]
    is_comp: bool,
}

impl PlaceOrderRequest {
    fn into_order_request(self) -> OrderRequest {
        OrderRequest {
            lines: self.lines,
            payment: self.payment,
            amount_tendered: self.amount_tendered,
            discount_amount: self.discount_amount,
            charged_to: self.charged_to,
            is_comp: self.is_comp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatePurchaseRequest {
    vendor: String,
    date: NaiveDate,
    lines: Vec<PurchaseLine>,
    #[serde(default)]
    tax: Decimal,
    #[serde(default)]
    delivery_fee: Decimal,
    #[serde(default)]
    other_fees: Decimal,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DistributeRequest {
    allocations: Vec<Allocation>,
}

#[derive(Debug, Serialize)]
struct DistributeResponse {
    remaining: Decimal,
}

// === Error mapping ===

struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LedgerError::UnknownItem(_)
            | LedgerError::UnknownSession(_)
            | LedgerError::UnknownProgram(_)
            | LedgerError::UnknownPurchase(_) => StatusCode::NOT_FOUND,
            LedgerError::InsufficientStock(_) | LedgerError::CannotReverseConsumedLot(_) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// === Handlers ===

async fn create_program(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<CreateProgramRequest>,
) -> Json<CreateProgramResponse> {
    let program_id = engine.register_program(&req.name);
    Json(CreateProgramResponse { program_id })
}

async fn upsert_item(
    State(engine): State<Arc<Engine>>,
    Json(item): Json<CatalogItem>,
) -> StatusCode {
    engine.upsert_item(item);
    StatusCode::CREATED
}

async fn create_session(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let session_id = engine.create_session(&req.name, req.program_id, req.is_test)?;
    Ok(Json(CreateSessionResponse { session_id }))
}

async fn start_session(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<u64>,
    Json(req): Json<DrawerRequest>,
) -> Result<Json<StartSessionResponse>, AppError> {
    let start_total = engine.start_session(SessionId(id), req.drawer)?;
    Ok(Json(StartSessionResponse { start_total }))
}

async fn place_order(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<u64>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = engine.place_order(SessionId(id), req.into_order_request())?;
    Ok(Json(receipt))
}

async fn close_session(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<u64>,
    Json(req): Json<DrawerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let closeout = engine.close_session(SessionId(id), req.drawer)?;
    Ok(Json(closeout))
}

async fn get_session(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = engine.session_snapshot(SessionId(id))?;
    Ok(Json(snapshot))
}

async fn distribute_profit(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<u64>,
    Json(req): Json<DistributeRequest>,
) -> Result<Json<DistributeResponse>, AppError> {
    let remaining = engine.distribute_profit(SessionId(id), &req.allocations)?;
    Ok(Json(DistributeResponse { remaining }))
}

async fn create_purchase(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = engine.create_purchase(PurchaseInput {
        vendor: req.vendor,
        date: req.date,
        lines: req.lines,
        tax: req.tax,
        delivery_fee: req.delivery_fee,
        other_fees: req.other_fees,
        notes: req.notes,
    })?;
    Ok(Json(serde_json::json!({
        "purchase_id": receipt.purchase_id,
        "lot_ids": receipt.lot_ids,
        "unlinked_lines": receipt.unlinked_lines,
    })))
}

async fn get_stock(State(engine): State<Arc<Engine>>, Path(id): Path<u32>) -> impl IntoResponse {
    Json(engine.stock_snapshot(ItemId(id)))
}

async fn get_journal(State(engine): State<Arc<Engine>>) -> impl IntoResponse {
    Json(engine.journal_snapshot())
}

fn app(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/programs", post(create_program))
        .route("/items", post(upsert_item))
        .route("/items/{id}/stock", get(get_stock))
        .route("/purchases", post(create_purchase))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/orders", post(place_order))
        .route("/sessions/{id}/close", post(close_session))
        .route("/sessions/{id}/distribute", post(distribute_profit))
        .route("/journal", get(get_journal))
        .with_state(engine)
}

#[tokio::main]
async fn main() {
    let engine = Arc::new(Engine::new());

    let listener = TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("failed to bind 127.0.0.1:3000");
    println!("concession ledger listening on http://127.0.0.1:3000");

    axum::serve(listener, app(engine))
        .await
        .expect("server error");
}
