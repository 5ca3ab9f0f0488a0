pub mod types;

use actix_cors::Cors;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::{
    aggregate_for_bar, aggregate_for_map, aggregate_for_trend, export_csv, export_file_name,
    key_metrics, preview, summarize_by, unique_values, DashboardSession,
};
use crate::domain::boundary::Boundaries;
use crate::domain::dashboard_config::DashboardConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::Dataset;
use crate::infrastructure::geo::{build_map_payload, BoundaryLoader};

pub use types::{
    AnalysisRequest, CategoryRequest, LogEntry, MapRequest, TableRequest, TableResponse,
    TrendRequest,
};

const MAX_LOG_ENTRIES: usize = 100;

pub struct HttpState {
    pub config: DashboardConfig,
    /// Loaded on first use, then shared by every session
    pub boundaries: OnceCell<Boundaries>,
    pub session: Mutex<Option<DashboardSession>>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn new(config: DashboardConfig, logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        Self {
            config,
            boundaries: OnceCell::new(),
            session: Mutex::new(None),
            logs,
        }
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
            .get_or_init(|| BoundaryLoader::new(&self.config.boundary_path).load())
            .clone()
    }

    fn session_guard(&self) -> MutexGuard<'_, Option<DashboardSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current session
    fn with_session<T>(&self, f: impl FnOnce(&DashboardSession) -> Result<T>) -> Result<T> {
        let guard = self.session_guard();
        let session = guard
            .as_ref()
            .ok_or_else(|| AppError::NotFound("No dataset uploaded".to_string()))?;
        f(session)
    }

    /// Run `f` against the session's dataset restricted by `scope`
    fn with_scope<T>(
        &self,
        scope: &AnalysisRequest,
        f: impl FnOnce(&DashboardSession, Dataset) -> Result<T>,
    ) -> Result<T> {
        self.with_session(|session| {
            let filtered = session.filtered(&scope.filters, scope.mat_period.as_deref())?;
            f(session, filtered)
        })
    }
}

fn error_response(logs: &Mutex<Vec<LogEntry>>, context: &str, err: &AppError) -> HttpResponse {
    add_log(logs, "ERROR", "HttpApi", &format!("{}: {}", context, err));

    let mut response = match err {
        AppError::NotFound(_) | AppError::MissingBoundaryData(_) => HttpResponse::NotFound(),
        AppError::ValidationError(_)
        | AppError::ParseError(_)
        | AppError::EncodingError(_)
        | AppError::MissingColumn(_)
        | AppError::EmptyDataset => HttpResponse::BadRequest(),
        AppError::Internal(_) | AppError::ConfigError(_) | AppError::IoError(_) => {
            HttpResponse::InternalServerError()
        }
    };
    response.body(err.to_string())
}

fn respond<T: serde::Serialize>(
    data: &HttpState,
    context: &str,
    result: Result<T>,
) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&data.logs, context, &e),
    }
}

#[post("/upload")]
async fn post_upload(data: web::Data<HttpState>, body: web::Bytes) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Uploading sales file ({} bytes)", body.len()),
    );

    match DashboardSession::from_upload(&body, data.boundaries(), &data.config) {
        Ok(session) => {
            let info = session.dataset_info();
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!(
                    "Loaded {} records ({})",
                    info.record_count,
                    session.report.encoding.label()
                ),
            );
            *data.session_guard() = Some(session);
            HttpResponse::Ok().json(info)
        }
        Err(e) => error_response(&data.logs, "Upload failed", &e),
    }
}

#[get("/session")]
async fn get_session(data: web::Data<HttpState>) -> impl Responder {
    let result = data.with_session(|session| Ok(session.dataset_info()));
    respond(&data, "Session lookup failed", result)
}

#[get("/periods")]
async fn get_periods(data: web::Data<HttpState>) -> impl Responder {
    let result = data.with_session(|session| Ok(session.mat_periods.clone()));
    respond(&data, "Period lookup failed", result)
}

#[get("/values/{column}")]
async fn get_values(data: web::Data<HttpState>, column: web::Path<String>) -> impl Responder {
    let result = data.with_session(|session| Ok(unique_values(&session.dataset, &column)));
    respond(&data, "Value lookup failed", result)
}

#[post("/metrics")]
async fn post_metrics(data: web::Data<HttpState>, req: web::Json<AnalysisRequest>) -> impl Responder {
    let result = data.with_scope(&req, |_, filtered| Ok(key_metrics(&filtered)));
    respond(&data, "Metrics failed", result)
}

#[post("/map")]
async fn post_map(data: web::Data<HttpState>, req: web::Json<MapRequest>) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Building map of {} by {}", req.value, req.group),
    );

    let color_scale = req.color_scale.unwrap_or(data.config.default_color_scale);
    let result = data.with_scope(&req.scope, |session, filtered| {
        let set = match &session.boundaries {
            Boundaries::Available(set) => set,
            Boundaries::Unavailable(reason) => {
                return Err(AppError::MissingBoundaryData(reason.clone()))
            }
        };
        let map_table = aggregate_for_map(&filtered, &session.boundaries, &req.group, &req.value);
        Ok(build_map_payload(set, &map_table, color_scale))
    });
    respond(&data, "Map failed", result)
}

#[post("/trend")]
async fn post_trend(data: web::Data<HttpState>, req: web::Json<TrendRequest>) -> impl Responder {
    let result = data.with_scope(&req.scope, |_, filtered| {
        Ok(aggregate_for_trend(
            &filtered,
            &req.time,
            &req.value,
            &req.group_by,
            req.aggregation,
        ))
    });
    respond(&data, "Trend failed", result)
}

#[post("/bar")]
async fn post_bar(data: web::Data<HttpState>, req: web::Json<CategoryRequest>) -> impl Responder {
    let result = data.with_scope(&req.scope, |_, filtered| {
        Ok(aggregate_for_bar(&filtered, &req.category, &req.value))
    });
    respond(&data, "Bar chart failed", result)
}

#[post("/summary")]
async fn post_summary(data: web::Data<HttpState>, req: web::Json<CategoryRequest>) -> impl Responder {
    let result = data.with_scope(&req.scope, |_, filtered| {
        Ok(summarize_by(&filtered, &req.category, &req.value))
    });
    respond(&data, "Summary failed", result)
}

#[post("/table")]
async fn post_table(data: web::Data<HttpState>, req: web::Json<TableRequest>) -> impl Responder {
    let limit = req
        .limit
        .unwrap_or(data.config.display_row_limit)
        .min(data.config.display_row_limit);

    let result = data.with_scope(&req.scope, |_, filtered| {
        Ok(TableResponse::from_view(&preview(&filtered, limit), filtered.len()))
    });
    respond(&data, "Table failed", result)
}

#[post("/export")]
async fn post_export(data: web::Data<HttpState>, req: web::Json<AnalysisRequest>) -> impl Responder {
    let result = data.with_scope(&req, |_, filtered| export_csv(&filtered));

    match result {
        Ok(content) => {
            let file_name = export_file_name(Local::now());
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!("Exported {}", file_name),
            );
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(file_name)],
                })
                .body(content)
        }
        Err(e) => error_response(&data.logs, "Export failed", &e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(PoisonError::into_inner);
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(PoisonError::into_inner);
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Register the `/api` routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(post_upload)
            .service(get_session)
            .service(get_periods)
            .service(get_values)
            .service(post_metrics)
            .service(post_map)
            .service(post_trend)
            .service(post_bar)
            .service(post_summary)
            .service(post_table)
            .service(post_export)
            .service(get_logs),
    );
}

pub fn start_server(
    config: DashboardConfig,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let bind = (config.host.clone(), config.port);
    let payload_limit = config.max_upload_bytes();
    let state = web::Data::new(HttpState::new(config, logs));

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .configure(configure)
    })
    .bind(bind)?
    .run();

    Ok(server)
}
