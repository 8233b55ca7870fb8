use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitledger::config::CONFIG;
use splitledger::models::{Expense, NetBalance, OwedDetail, Share};
use splitledger::{InMemoryExpenses, InMemoryGraph, LedgerError, LedgerService};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

type Service = Arc<LedgerService<InMemoryGraph, InMemoryExpenses>>;

// Request structs for JSON payloads
#[derive(Deserialize)]
struct CreateExpenseRequest {
    amount: Decimal,
    payer_shares: Vec<Share>,
    debtor_shares: Vec<Share>,
    category: Option<String>,
    requesting_user_id: Uuid,
}

#[derive(Deserialize)]
struct UpdateExpenseRequest {
    amount: Decimal,
    payer_shares: Vec<Share>,
    debtor_shares: Vec<Share>,
    category: Option<String>,
    requesting_user_id: Uuid,
}

#[derive(Deserialize)]
struct DeleteExpenseRequest {
    requesting_user_id: Uuid,
}

#[derive(Deserialize)]
struct SettleRequest {
    payer_id: Uuid,
    payee_id: Uuid,
    amount: Decimal,
    requesting_user_id: Uuid,
}

#[derive(Serialize)]
struct UserBalanceResponse {
    balance: Decimal,
    owed: OwedDetail,
}

// Error response struct
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    /// Variant-shaped payload (ids, amounts) so clients can react without
    /// parsing the message text.
    details: serde_json::Value,
}

// Newtype wrapper for LedgerError to implement IntoResponse
struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

fn error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidExpense(_) | LedgerError::InvalidSettlementAmount => {
            StatusCode::BAD_REQUEST
        }
        LedgerError::AmountExceedsDebt { .. } => StatusCode::BAD_REQUEST,
        LedgerError::ExpenseNotFound(_) | LedgerError::NoSuchDebt { .. } => StatusCode::NOT_FOUND,
        LedgerError::Unauthorized(_) => StatusCode::FORBIDDEN,
        LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::GraphError(_) | LedgerError::StorageError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_body(err: &LedgerError) -> ErrorResponse {
    ErrorResponse {
        error: err.to_string(),
        details: serde_json::to_value(err).unwrap_or(serde_json::Value::Null),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (error_status(&self.0), Json(error_body(&self.0))).into_response()
    }
}

async fn create_expense(
    State(service): State<Service>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = service
        .create_expense(
            group_id,
            req.amount,
            req.payer_shares,
            req.debtor_shares,
            req.category,
            req.requesting_user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn update_expense(
    State(service): State<Service>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service
        .update_expense(
            expense_id,
            req.amount,
            req.payer_shares,
            req.debtor_shares,
            req.category,
            req.requesting_user_id,
        )
        .await?;
    Ok(Json(expense))
}

async fn delete_expense(
    State(service): State<Service>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<DeleteExpenseRequest>,
) -> Result<StatusCode, ApiError> {
    service
        .delete_expense(expense_id, req.requesting_user_id)
        .await?;
    Ok(StatusCode::OK)
}

async fn list_expenses(
    State(service): State<Service>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = service.list_expenses(group_id).await?;
    Ok(Json(expenses))
}

async fn settle(
    State(service): State<Service>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<SettleRequest>,
) -> Result<StatusCode, ApiError> {
    service
        .settle(
            group_id,
            req.payer_id,
            req.payee_id,
            req.amount,
            req.requesting_user_id,
        )
        .await?;
    Ok(StatusCode::OK)
}

async fn get_all_balances(
    State(service): State<Service>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<NetBalance>>, ApiError> {
    let balances = service.all_balances(group_id).await?;
    Ok(Json(balances))
}

async fn get_user_balance(
    State(service): State<Service>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UserBalanceResponse>, ApiError> {
    let balance = service.net_balance_of(user_id, group_id).await?;
    let owed = service.owed_detail(user_id, group_id).await?;
    Ok(Json(UserBalanceResponse { balance, owed }))
}

async fn remove_member(
    State(service): State<Service>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    service.remove_member(group_id, user_id).await?;
    Ok(StatusCode::OK)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.as_str())
        .init();

    let graph = InMemoryGraph::new();
    let expenses = InMemoryExpenses::new();
    let ledger = Arc::new(LedgerService::new(graph, expenses).with_netting(CONFIG.netting_enabled));

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route(
            "/groups/{group_id}/expenses",
            post(create_expense).get(list_expenses),
        )
        .route(
            "/expenses/{expense_id}",
            put(update_expense).delete(delete_expense),
        )
        .route("/groups/{group_id}/settle", post(settle))
        .route("/groups/{group_id}/balances", get(get_all_balances))
        .route("/groups/{group_id}/balances/{user_id}", get(get_user_balance))
        .route("/groups/{group_id}/members/{user_id}", delete(remove_member))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(ledger);

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Ledger service running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn errors_map_to_the_documented_status_codes() {
        assert_eq!(
            error_status(&LedgerError::InvalidExpense("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&LedgerError::AmountExceedsDebt {
                requested: dec!(50),
                outstanding: dec!(30),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&LedgerError::ExpenseNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&LedgerError::Unauthorized(Uuid::new_v4())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            error_status(&LedgerError::StoreUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(&LedgerError::GraphError("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_carries_machine_readable_details() {
        let body = error_body(&LedgerError::AmountExceedsDebt {
            requested: dec!(50),
            outstanding: dec!(30),
        });
        assert!(body.error.contains("50"));
        let details = &body.details["AmountExceedsDebt"];
        assert_eq!(details["requested"], serde_json::json!("50"));
        assert_eq!(details["outstanding"], serde_json::json!("30"));

        let payer = Uuid::new_v4();
        let payee = Uuid::new_v4();
        let body = error_body(&LedgerError::NoSuchDebt { payer, payee });
        assert_eq!(
            body.details["NoSuchDebt"]["payer"],
            serde_json::json!(payer)
        );
        assert_eq!(
            body.details["NoSuchDebt"]["payee"],
            serde_json::json!(payee)
        );
    }
}
