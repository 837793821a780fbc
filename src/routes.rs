use crate::{
    api::{applications, chat, logs, reports, users},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Chat transport webhook
    cfg.service(
        web::scope("/chat")
            .wrap(build_limiter(config.rate_chat_per_min))
            .service(web::resource("/event").route(web::post().to(chat::chat_event))),
    );

    // Admin surface
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(build_limiter(config.rate_admin_per_min))
            .service(
                web::scope("/applications")
                    // /applications
                    .service(
                        web::resource("")
                            .route(web::get().to(applications::list_applications)),
                    )
                    // /applications/history
                    .service(
                        web::resource("/history")
                            .route(web::get().to(applications::application_history)),
                    )
                    // /applications/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(applications::get_application)),
                    )
                    // /applications/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(applications::approve_application)),
                    )
                    // /applications/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(applications::reject_application)),
                    ),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(users::list_users)))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    ),
            )
            .service(web::scope("/logs").service(web::resource("").route(web::get().to(logs::list_logs))))
            .service(
                web::scope("/reports")
                    .service(web::resource("/period").route(web::post().to(reports::period_report)))
                    .service(
                        web::resource("/departments")
                            .route(web::post().to(reports::department_report)),
                    )
                    .service(
                        web::resource("/employee").route(web::post().to(reports::employee_report)),
                    ),
            ),
    );
}
