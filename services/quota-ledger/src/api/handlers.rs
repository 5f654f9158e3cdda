use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use crate::history::{HistoryError, NewHistoryItem};
use crate::ledger::{Feature, LedgerError, Plan, PlanDetails, QuotaLedger, UserValidationError};

use super::auth::UserIdentity;
use super::types::{
    ChangePlanRequest, CheckUsageRequest, CheckUsageResponse, ConsumeRequest, ErrorResponse,
    HistoryItemResponse, HistoryListResponse, LedgerResponse, PlanInfo, PlansResponse,
    RecordUsageRequest, RemainingResponse, RemainingSummary, RemoveHistoryRequest,
    RemoveHistoryResponse, SuccessResponse,
};
use super::ApiState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn list_plans() -> ApiResult<PlansResponse> {
    let plans = Plan::ALL
        .iter()
        .map(|plan| PlanInfo {
            plan: *plan,
            is_premium: plan.is_premium(),
            limits: plan.limits(),
        })
        .collect();
    Ok(Json(PlansResponse { plans }))
}

pub async fn load_ledger(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
) -> ApiResult<LedgerResponse> {
    let record = state
        .ledger
        .load_or_initialize(user.as_str())
        .map_err(ledger_error)?;
    Ok(Json(ledger_response(&state.ledger, record)))
}

pub async fn check_usage(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Json(request): Json<CheckUsageRequest>,
) -> ApiResult<CheckUsageResponse> {
    let cost = request.cost.unwrap_or(1);
    if cost == 0 {
        return Err(ledger_error(LedgerError::InvalidAmount));
    }

    let record = state
        .ledger
        .load_or_initialize(user.as_str())
        .map_err(ledger_error)?;
    let allowed = state.ledger.can_use_feature(&record, request.feature, cost);

    Ok(Json(CheckUsageResponse {
        allowed,
        feature: request.feature,
        cost,
        remaining: state.ledger.remaining(&record, request.feature),
        upgrade_required: !allowed,
    }))
}

pub async fn record_usage(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Json(request): Json<RecordUsageRequest>,
) -> ApiResult<LedgerResponse> {
    let amount = request.amount.unwrap_or(1);
    let record = state
        .ledger
        .record_usage(user.as_str(), request.feature, amount)
        .map_err(ledger_error)?;
    Ok(Json(ledger_response(&state.ledger, record)))
}

pub async fn consume(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Json(request): Json<ConsumeRequest>,
) -> ApiResult<LedgerResponse> {
    let cost = request.cost.unwrap_or(1);
    let record = state
        .ledger
        .try_consume(user.as_str(), request.feature, cost)
        .map_err(ledger_error)?;
    Ok(Json(ledger_response(&state.ledger, record)))
}

pub async fn change_plan(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Json(request): Json<ChangePlanRequest>,
) -> ApiResult<LedgerResponse> {
    let record = state
        .ledger
        .change_plan(user.as_str(), request.plan)
        .map_err(ledger_error)?;

    info!(user_id = %user.as_str(), plan = %request.plan, "plan change confirmed");
    Ok(Json(ledger_response(&state.ledger, record)))
}

pub async fn remaining(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Path(feature): Path<String>,
) -> ApiResult<RemainingResponse> {
    let feature: Feature = feature
        .parse()
        .map_err(|err: String| bad_request("invalid_feature", &err))?;

    let record = state
        .ledger
        .load_or_initialize(user.as_str())
        .map_err(ledger_error)?;
    let remaining = state.ledger.remaining(&record, feature);

    Ok(Json(RemainingResponse {
        feature,
        remaining,
        display: remaining.for_display(),
    }))
}

pub async fn list_history(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
) -> ApiResult<HistoryListResponse> {
    let items = state
        .history
        .list(user.as_str())
        .map_err(history_error)?;
    Ok(Json(HistoryListResponse {
        items,
        limit: state.history.limit(),
    }))
}

pub async fn add_history(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Json(request): Json<NewHistoryItem>,
) -> ApiResult<HistoryItemResponse> {
    let item = state
        .history
        .add(user.as_str(), request)
        .map_err(history_error)?;
    Ok(Json(HistoryItemResponse { item }))
}

pub async fn get_history_item(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Path(id): Path<String>,
) -> ApiResult<HistoryItemResponse> {
    match state
        .history
        .get(user.as_str(), &id)
        .map_err(history_error)?
    {
        Some(item) => Ok(Json(HistoryItemResponse { item })),
        None => Err(not_found("history_item_not_found", "history item not found")),
    }
}

pub async fn remove_history_item(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Path(id): Path<String>,
) -> ApiResult<RemoveHistoryResponse> {
    let removed = state
        .history
        .remove(user.as_str(), &id)
        .map_err(history_error)?;
    Ok(Json(RemoveHistoryResponse {
        removed: usize::from(removed),
    }))
}

pub async fn remove_history_items(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
    Json(request): Json<RemoveHistoryRequest>,
) -> ApiResult<RemoveHistoryResponse> {
    let removed = state
        .history
        .remove_many(user.as_str(), &request.ids)
        .map_err(history_error)?;
    Ok(Json(RemoveHistoryResponse { removed }))
}

pub async fn clear_history(
    State(state): State<Arc<ApiState>>,
    user: UserIdentity,
) -> ApiResult<SuccessResponse> {
    state
        .history
        .clear(user.as_str())
        .map_err(history_error)?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn health_check() -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "quota-ledger"
    })))
}

fn ledger_response(ledger: &QuotaLedger, record: PlanDetails) -> LedgerResponse {
    let remaining = RemainingSummary {
        expansions: ledger.remaining(&record, Feature::Expansions),
        file_uploads: ledger.remaining(&record, Feature::FileUploads),
    };
    LedgerResponse { record, remaining }
}

pub(crate) fn user_rejection(err: &UserValidationError) -> ApiError {
    match err {
        UserValidationError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: err.to_string(),
                code: "unauthenticated".to_string(),
                details: None,
            }),
        ),
        UserValidationError::InvalidUserId(_) => bad_request("invalid_user_id", &err.to_string()),
    }
}

fn ledger_error(err: LedgerError) -> ApiError {
    match err {
        LedgerError::User(err) => user_rejection(&err),
        LedgerError::InvalidAmount => bad_request("invalid_amount", &err.to_string()),
        LedgerError::QuotaExceeded {
            feature,
            limit,
            current,
            cost,
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: format!("daily {feature} quota exceeded"),
                code: "quota_exceeded".to_string(),
                details: Some(serde_json::json!({
                    "feature": feature,
                    "limit": limit,
                    "current": current,
                    "cost": cost,
                    "upgradeRequired": true,
                })),
            }),
        ),
        other => internal_error(other),
    }
}

fn history_error(err: HistoryError) -> ApiError {
    match err {
        HistoryError::User(err) => user_rejection(&err),
        other => internal_error(other),
    }
}

fn bad_request(code: &str, message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn not_found(code: &str, message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    error!(error = %err, "ledger API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: Some(serde_json::json!({ "message": err.to_string() })),
        }),
    )
}
