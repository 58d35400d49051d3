// seatflow-server/src/web/routes.rs

use crate::web::handlers::webhook_handlers;
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/payments")
          .service(
            web::resource("/payu/webhook")
              .route(web::post().to(webhook_handlers::payu_webhook_handler))
              .route(web::get().to(webhook_handlers::payu_webhook_info)),
          )
          .service(
            web::resource("/cashfree/webhook")
              .route(web::post().to(webhook_handlers::cashfree_webhook_handler))
              .route(web::get().to(webhook_handlers::cashfree_webhook_info)),
          ),
      ),
  );
}
