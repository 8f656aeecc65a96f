use actix_web::{web, HttpResponse};
use std::future::Future;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::order::OrderStatus;
use crate::engine::{EngineError, OrderFilter};
use crate::utils::{retry_on_transient, RetryResult};

use super::dto::*;
use super::errors::ApiError;
use super::extractors::{ActorContext, Role};
use super::state::AppState;

// ============================================================================
// Order Handlers
// ============================================================================

/// Retry an engine call while it reports a concurrency conflict
async fn with_retry<T, F, Fut>(state: &AppState, operation: &'static str, mut call: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let metrics = state.metrics.clone();
    let result = retry_on_transient(state.retry.clone(), |attempt| {
        if attempt > 1 {
            metrics.record_retry_attempt(operation, attempt);
        }
        call()
    })
    .await;

    if !matches!(result, RetryResult::PermanentFailure(_)) {
        metrics.record_retry_outcome(operation, result.outcome());
    }
    Ok(result.into_result()?)
}

/// The order must be within the caller's scope before anything changes
async fn ensure_visible(state: &AppState, actor: &ActorContext, order_id: Uuid) -> Result<(), ApiError> {
    state.engine.get_order(&actor.viewer(), order_id).await?;
    Ok(())
}

#[instrument(
    name = "handler::create_order",
    skip(state, body, actor),
    fields(actor_id = %actor.actor_id, shop_id = %body.shop_id)
)]
pub async fn create_order(
    state: web::Data<AppState>,
    actor: ActorContext,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    actor.require(&[Role::Customer])?;

    let new_order = body.into_inner().into_new_order(actor.actor_id);
    let view = with_retry(&state, "create_order", || {
        state.engine.create_order(new_order.clone(), actor.actor_id)
    })
    .await?;

    Ok(HttpResponse::Created().json(view))
}

#[instrument(name = "handler::list_orders", skip(state, actor, filter), fields(actor_id = %actor.actor_id))]
pub async fn list_orders(
    state: web::Data<AppState>,
    actor: ActorContext,
    filter: web::Query<OrderFilter>,
) -> Result<HttpResponse, ApiError> {
    let orders = state.engine.list_orders(&actor.viewer(), &filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(state, actor), fields(actor_id = %actor.actor_id))]
pub async fn get_order(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let view = state.engine.get_order(&actor.viewer(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::order_history", skip(state, actor), fields(actor_id = %actor.actor_id))]
pub async fn order_history(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let history = state.engine.history(&actor.viewer(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(history))
}

#[instrument(
    name = "handler::transition_status",
    skip(state, actor, body),
    fields(actor_id = %actor.actor_id, to = %body.status)
)]
pub async fn transition_status(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    body: web::Json<TransitionRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let TransitionRequest { status, note } = body.into_inner();

    // Customers may only withdraw their own order
    if status != OrderStatus::Cancelled {
        actor.require(&[Role::ShopOwner, Role::Admin])?;
    }
    ensure_visible(&state, &actor, order_id).await?;

    let view = with_retry(&state, "transition_status", || {
        state.engine.transition_status(order_id, status, actor.actor_id, note.clone())
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::cancel_order", skip(state, actor, body), fields(actor_id = %actor.actor_id))]
pub async fn cancel_order(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    body: Option<web::Json<CancelRequest>>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let reason = body.map(|body| body.into_inner()).unwrap_or_default().reason;
    ensure_visible(&state, &actor, order_id).await?;

    let view = with_retry(&state, "cancel_order", || {
        state.engine.cancel_order(order_id, actor.actor_id, reason.clone())
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

// ============================================================================
// Credit Handlers
// ============================================================================

#[instrument(name = "handler::decide_credit", skip(state, actor, body), fields(actor_id = %actor.actor_id))]
pub async fn decide_credit(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    body: web::Json<CreditDecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    actor.require(&[Role::ShopOwner, Role::Admin])?;
    let order_id = path.into_inner();
    let CreditDecisionRequest { decision, note } = body.into_inner();
    ensure_visible(&state, &actor, order_id).await?;

    let view = with_retry(&state, "decide_credit", || {
        state.engine.decide_credit(order_id, decision, actor.actor_id, note.clone())
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::mark_credit_paid", skip(state, actor), fields(actor_id = %actor.actor_id))]
pub async fn mark_credit_paid(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    actor.require(&[Role::ShopOwner, Role::Admin])?;
    let order_id = path.into_inner();
    ensure_visible(&state, &actor, order_id).await?;

    let view = with_retry(&state, "mark_credit_paid", || {
        state.engine.mark_credit_paid(order_id, actor.actor_id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::credit_summary", skip(state, actor), fields(actor_id = %actor.actor_id))]
pub async fn credit_summary(state: web::Data<AppState>, actor: ActorContext) -> Result<HttpResponse, ApiError> {
    actor.require(&[Role::ShopOwner, Role::Admin])?;
    let summary = state.engine.credit_summary(&actor.viewer()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[instrument(name = "handler::credits_by_customer", skip(state, actor), fields(actor_id = %actor.actor_id))]
pub async fn credits_by_customer(state: web::Data<AppState>, actor: ActorContext) -> Result<HttpResponse, ApiError> {
    actor.require(&[Role::ShopOwner, Role::Admin])?;
    let credits = state.engine.credits_by_customer(&actor.viewer()).await?;
    Ok(HttpResponse::Ok().json(credits))
}

// ============================================================================
// Stock Handlers
// ============================================================================

#[instrument(name = "handler::get_stock", skip(state, _actor))]
pub async fn get_stock(
    state: web::Data<AppState>,
    _actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let product_id = path.into_inner();
    let available_quantity = state.engine.stock_level(product_id)?;
    Ok(HttpResponse::Ok().json(StockLevelResponse { product_id, available_quantity }))
}

#[instrument(name = "handler::set_stock", skip(state, actor, body), fields(actor_id = %actor.actor_id))]
pub async fn set_stock(
    state: web::Data<AppState>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    body: web::Json<SetStockRequest>,
) -> Result<HttpResponse, ApiError> {
    actor.require(&[Role::Admin])?;
    let product_id = path.into_inner();
    let available_quantity = state.engine.set_stock(product_id, body.quantity, actor.actor_id)?;
    Ok(HttpResponse::Ok().json(StockLevelResponse { product_id, available_quantity }))
}
