use crate::{
    api::{
        attendance, camera, contractor, dashboard, meal, plant, report, system_code, visitor,
        worker,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
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

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/workers")
                    // /workers
                    .service(
                        web::resource("")
                            .route(web::post().to(worker::create_worker))
                            .route(web::get().to(worker::list_workers)),
                    )
                    // /workers/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(worker::update_worker))
                            .route(web::get().to(worker::get_worker))
                            .route(web::delete().to(worker::delete_worker)),
                    ),
            )
            .service(
                web::scope("/contractors")
                    .service(
                        web::resource("")
                            .route(web::post().to(contractor::create_contractor))
                            .route(web::get().to(contractor::list_contractors)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(contractor::update_contractor))
                            .route(web::get().to(contractor::get_contractor))
                            .route(web::delete().to(contractor::delete_contractor)),
                    ),
            )
            .service(
                web::scope("/plants")
                    .service(
                        web::resource("")
                            .route(web::post().to(plant::create_plant))
                            .route(web::get().to(plant::list_plants)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(plant::update_plant))
                            .route(web::get().to(plant::get_plant))
                            .route(web::delete().to(plant::delete_plant)),
                    ),
            )
            .service(
                web::scope("/visitors")
                    .service(
                        web::resource("")
                            .route(web::post().to(visitor::register_visitor))
                            .route(web::get().to(visitor::list_visitors)),
                    )
                    .service(
                        web::resource("/{ticket_id}/process")
                            .route(web::put().to(visitor::process_visitor)),
                    )
                    .service(
                        web::resource("/{ticket_id}/entry")
                            .route(web::post().to(visitor::visitor_entry)),
                    )
                    .service(
                        web::resource("/{ticket_id}/entries")
                            .route(web::get().to(visitor::visitor_entries)),
                    )
                    .service(
                        web::resource("/{ticket_id}").route(web::get().to(visitor::get_visitor)),
                    ),
            )
            .service(
                web::scope("/meals")
                    .service(
                        web::resource("")
                            .route(web::post().to(meal::create_meal))
                            .route(web::get().to(meal::list_meals)),
                    )
                    .service(
                        web::resource("/requests")
                            .route(web::post().to(meal::request_meal))
                            .route(web::get().to(meal::list_meal_requests)),
                    )
                    .service(
                        web::resource("/requests/{ticket_id}")
                            .route(web::put().to(meal::process_meal_request))
                            .route(web::get().to(meal::meal_request_status)),
                    )
                    .service(
                        web::resource("/entries/{ticket_id}")
                            .route(web::post().to(meal::meal_entry))
                            .route(web::get().to(meal::meal_entries)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(meal::delete_meal))),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/{worker_id}")
                            .route(web::get().to(attendance::worker_attendance)),
                    ),
            )
            .service(
                web::scope("/camera")
                    // manual reconciliation trigger + scheduler introspection
                    .service(web::resource("/fetch").route(web::get().to(camera::fetch_attendance)))
                    .service(
                        web::resource("/status").route(web::get().to(camera::scheduler_status)),
                    )
                    .service(web::resource("/search").route(web::get().to(camera::search_users))),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/daily").route(web::get().to(report::daily_report)))
                    .service(web::resource("/custom").route(web::get().to(report::custom_report))),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::summary)))
            .service(
                web::scope("/system-codes")
                    .service(
                        web::resource("").route(web::get().to(system_code::list_system_codes)),
                    )
                    .service(
                        web::resource("/{module_type}")
                            .route(web::put().to(system_code::update_system_code)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
