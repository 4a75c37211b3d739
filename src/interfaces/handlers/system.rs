use actix_web::{get, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use humantime::format_duration;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::{
    sync::{atomic::{AtomicI64, Ordering}, RwLock},
    time::Duration,
};
use sysinfo::System;

use crate::{use_cases::extractors::AdminClaims, AppState};

/// Process start; forced in `main` so uptime does not begin at the first check.
pub static STARTED_AT: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Seconds a computed report is served from cache.
const CACHE_TTL_SECONDS: i64 = 5;

#[derive(Serialize, Clone, Default)]
struct SystemInfo {
    os: String,
    kernel: String,
    hostname: String,
    cpu_count: usize,
    memory_total: String,
}

#[derive(Serialize, Clone, Default)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    registered_users: Option<u64>,
    permissions_in_sync: Option<bool>,
    version: String,
    memory_usage: String,
    system: SystemInfo,
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthCheckResponse>> = Lazy::new(||
    RwLock::new(HealthCheckResponse::default())
);

async fn build_health_response(state: &web::Data<AppState>) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_duration = now_utc.signed_duration_since(*STARTED_AT);
    let human_uptime = format_duration(Duration::from_secs(uptime_duration.num_seconds().max(0) as u64));

    let mut sys = System::new_all();
    sys.refresh_all();

    let system_info = SystemInfo {
        os: System::name().unwrap_or_else(|| "Unknown".to_string()),
        kernel: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
        hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        cpu_count: sys.cpus().len(),
        memory_total: format!("{:.2} GB", sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0),
    };

    let user_repo = &state.auth_handler.user_repo;
    let database_up = user_repo.check_connection().await.is_ok();

    let registered_users = if database_up {
        user_repo.count_users().await.ok()
    } else {
        None
    };

    let permissions_in_sync = if database_up {
        match state.access_handler.permission_repo.snapshot().await {
            Ok(snapshot) => {
                let policy = state.access_handler.policy;
                Some(snapshot.permissions.is_superset(&policy.permissions())
                    && policy.declared_grants().iter().all(|(role, grants)| snapshot.roles.get(role) == Some(grants)))
            }
            Err(e) => {
                tracing::warn!("Permission snapshot failed: {}", e);
                None
            }
        }
    } else {
        None
    };

    let process = sysinfo::get_current_pid().ok().and_then(|pid| sys.process(pid));
    let memory_usage = process.map_or("Unknown".to_string(), |p|
        format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
    );

    HealthCheckResponse {
        status: if database_up { "healthy" } else { "degraded" }.to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: STARTED_AT.to_rfc3339(),
        database: if database_up { "OK" } else { "Unavailable" }.to_string(),
        registered_users,
        permissions_in_sync,
        version: env!("CARGO_PKG_VERSION").to_string(),
        memory_usage,
        system: system_info,
    }
}

#[get("/health")]
pub async fn admin_health_check(_claims: AdminClaims, state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    if now - last > CACHE_TTL_SECONDS {
        let response = build_health_response(&state).await;

        if let Ok(mut cache) = CACHED_STATUS.write() {
            *cache = response.clone();
            LAST_CHECK.store(now, Ordering::Relaxed);
        }

        HttpResponse::Ok().json(response)
    } else {
        match CACHED_STATUS.read() {
            Ok(response) => HttpResponse::Ok().json(response.clone()),
            Err(e) => {
                tracing::warn!("HealthCheck cache lock poisoned: {}", e);
                let response = build_health_response(&state).await;
                HttpResponse::Ok().json(response)
            }
        }
    }
}
