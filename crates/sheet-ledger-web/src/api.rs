use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::{Local, NaiveDate};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use sheet_ledger::locate::Criteria;
use sheet_ledger::report::Summary;
use sheet_ledger::{
    Decimal, Error, Field, Item, NewTransaction, Outcome, Transaction, TransactionKind,
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::ItemNotFound(_)
            | Error::RecordNotMatched { .. }
            | Error::PositionOutOfRange { .. } => StatusCode::NOT_FOUND,
            Error::InsufficientStock { .. } | Error::InvalidInput(_) | Error::Overflow { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::MissingColumn { .. } | Error::InvalidValue { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self.0);
        } else {
            tracing::info!("Rejected request: {}", self.0);
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub item: String,
    pub quantity: u32,
    /// Required for purchases. Sales default to the item's sell price.
    pub price: Option<Decimal>,
}

impl RecordRequest {
    fn into_transaction(self, price: Decimal) -> NewTransaction {
        NewTransaction {
            date: self.date.unwrap_or_else(|| Local::now().date_naive()),
            item: self.item,
            quantity: self.quantity,
            price,
        }
    }
}

/// Either a position, or fields the record has to match.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteRequest {
    pub position: Option<usize>,
    pub date: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<u32>,
}

impl DeleteRequest {
    fn criteria(&self) -> Criteria {
        Criteria::new()
            .with_opt(Field::Date, self.date.as_deref())
            .with_opt(Field::Item, self.item.as_deref())
            .with_opt(Field::Quantity, self.quantity)
    }
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub warnings: Vec<String>,
}

impl From<Outcome> for ActionResponse {
    fn from(outcome: Outcome) -> Self {
        ActionResponse {
            ok: true,
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

pub async fn inventory(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state.lock().inventory()?;
    Ok(Json(items))
}

pub async fn sales(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, ApiError> {
    let sales = state.lock().sales()?;
    Ok(Json(sales))
}

pub async fn purchases(
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let purchases = state.lock().purchases()?;
    Ok(Json(purchases))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    let summary = state.lock().dashboard()?;
    Ok(Json(summary))
}

pub async fn record_sale(
    State(state): State<AppState>,
    Json(payload): Json<RecordRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let mut book = state.lock();
    let price = match payload.price {
        Some(price) => price,
        None => book.sell_price(&payload.item)?,
    };
    let outcome = book.record_sale(&payload.into_transaction(price))?;
    Ok(Json(outcome.into()))
}

pub async fn record_purchase(
    State(state): State<AppState>,
    Json(payload): Json<RecordRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let price = payload
        .price
        .ok_or_else(|| Error::InvalidInput("a purchase needs a price".into()))?;
    let outcome = state
        .lock()
        .record_purchase(&payload.into_transaction(price))?;
    Ok(Json(outcome.into()))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    delete(&state, TransactionKind::Sale, &payload)
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    delete(&state, TransactionKind::Purchase, &payload)
}

fn delete(
    state: &AppState,
    kind: TransactionKind,
    payload: &DeleteRequest,
) -> Result<Json<ActionResponse>, ApiError> {
    let criteria = payload.criteria();
    let mut book = state.lock();
    let outcome = match payload.position {
        Some(_) if !criteria.is_empty() => {
            return Err(Error::InvalidInput(
                "give either a position or fields to match, not both".into(),
            )
            .into());
        }
        Some(position) => book.delete_at(kind, position)?,
        None => book.delete_matching(kind, &criteria)?,
    };
    Ok(Json(outcome.into()))
}

pub async fn file_changes_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscriber_count = state.file_change_tx.receiver_count();
    tracing::info!("New SSE connection. Total subscribers: {subscriber_count}",);

    let rx = state.file_change_tx.subscribe();
    let stream = BroadcastStream::new(rx).map(|_| Ok(Event::default().data("reload")));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
