use crate::{
    api::{punch, timesheet},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
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

    let punch_limiter = Arc::new(build_limiter(config.rate_punch_per_min));
    let timesheet_limiter = Arc::new(build_limiter(config.rate_timesheet_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/punch")
                    // /punch
                    .service(
                        web::resource("")
                            .wrap(punch_limiter.clone())
                            .route(web::post().to(punch::submit_punch)),
                    )
                    // /punch/status/{employee_id}
                    .service(
                        web::resource("/status/{employee_id}")
                            .route(web::get().to(punch::punch_status)),
                    )
                    // /punch/outside-geofence/{employee_id}
                    .service(
                        web::resource("/outside-geofence/{employee_id}")
                            .route(web::get().to(punch::outside_geofence)),
                    )
                    // /punch/{nsr}/verify
                    .service(
                        web::resource("/{nsr}/verify").route(web::get().to(punch::verify_punch)),
                    ),
            )
            .service(
                web::scope("/timesheet")
                    .wrap(timesheet_limiter)
                    // /timesheet/reconcile
                    .service(
                        web::resource("/reconcile")
                            .route(web::post().to(timesheet::reconcile_day)),
                    )
                    // /timesheet/reconcile-batch
                    .service(
                        web::resource("/reconcile-batch")
                            .route(web::post().to(timesheet::reconcile_batch)),
                    )
                    // /timesheet/consolidated/{employee_id}
                    .service(
                        web::resource("/consolidated/{employee_id}")
                            .route(web::get().to(timesheet::consolidated_range)),
                    )
                    // /timesheet/balance/{employee_id}
                    .service(
                        web::resource("/balance/{employee_id}")
                            .route(web::get().to(timesheet::current_balance)),
                    )
                    // /timesheet/statistics/{employee_id}
                    .service(
                        web::resource("/statistics/{employee_id}")
                            .route(web::get().to(timesheet::range_statistics)),
                    ),
            ),
    );
}
