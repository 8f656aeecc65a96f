use actix_web::web;

use crate::metrics::{health_handler, metrics_handler};

use super::handlers;

/// Mount every route. Handlers expect `web::Data<AppState>` and
/// `web::Data<Arc<Metrics>>` in the app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/orders")
                        .route("", web::post().to(handlers::create_order))
                        .route("", web::get().to(handlers::list_orders))
                        .route("/{order_id}", web::get().to(handlers::get_order))
                        .route("/{order_id}/history", web::get().to(handlers::order_history))
                        .route("/{order_id}/status", web::patch().to(handlers::transition_status))
                        .route("/{order_id}/cancel", web::post().to(handlers::cancel_order))
                        .route("/{order_id}/credit/decision", web::patch().to(handlers::decide_credit))
                        .route("/{order_id}/credit/mark-paid", web::patch().to(handlers::mark_credit_paid)),
                )
                .service(
                    web::scope("/credits")
                        .route("/summary", web::get().to(handlers::credit_summary))
                        .route("/by-customer", web::get().to(handlers::credits_by_customer)),
                )
                .service(
                    web::scope("/stock")
                        .route("/{product_id}", web::get().to(handlers::get_stock))
                        .route("/{product_id}", web::put().to(handlers::set_stock)),
                ),
        );
}
