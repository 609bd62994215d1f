// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::run_scraper::RunScraperUseCase;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::auth_service::AuthService;
use crate::infrastructure::repositories::scrape_record_repo_impl::ScrapeRecordRepositoryImpl;
use crate::infrastructure::repositories::scraper_repo_impl::ScraperRepositoryImpl;
use crate::infrastructure::repositories::user_repo_impl::UserRepositoryImpl;
use crate::presentation::handlers::{auth_handler, data_handler, scraper_handler};
use crate::presentation::middleware::auth_middleware::{
    api_key_middleware, auth_middleware, AuthState,
};
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type Users = UserRepositoryImpl;
type Scrapers = ScraperRepositoryImpl;
type Records = ScrapeRecordRepositoryImpl;

/// 使用数据库仓库的运行用例
pub type ScrapeRunner = RunScraperUseCase<Users, Scrapers, Records>;

/// 路由依赖
#[derive(Clone)]
pub struct ApiContext {
    pub users: Arc<Users>,
    pub scrapers: Arc<Scrapers>,
    pub records: Arc<Records>,
    pub runner: Arc<ScrapeRunner>,
    pub auth: AuthService,
}

/// 创建应用路由
///
/// # 参数
///
/// * `ctx` - 仓库、运行用例与认证服务
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(ctx: ApiContext) -> Router {
    let auth_state = AuthState {
        auth: ctx.auth.clone(),
        users: ctx.users.clone() as Arc<dyn UserRepository>,
    };

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/version", get(version))
        .route("/api/auth/register", post(auth_handler::register::<Users>))
        .route("/api/auth/login", post(auth_handler::login::<Users>));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_handler::me))
        .route(
            "/api/auth/regenerate-api-key",
            post(auth_handler::regenerate_api_key::<Users>),
        )
        .route(
            "/api/auth/webhook",
            post(auth_handler::update_webhook::<Users>),
        )
        .route(
            "/api/scrapers",
            post(scraper_handler::create_scraper::<Scrapers>)
                .get(scraper_handler::list_scrapers::<Scrapers>),
        )
        .route(
            "/api/scrapers/{id}",
            get(scraper_handler::get_scraper::<Scrapers>)
                .put(scraper_handler::update_scraper::<Scrapers>)
                .delete(scraper_handler::delete_scraper::<Scrapers>),
        )
        .route(
            "/api/scrapers/{id}/run",
            post(scraper_handler::run_scraper::<Users, Scrapers, Records>),
        )
        .route(
            "/api/scrapers/{id}/data",
            get(scraper_handler::get_scraped_data::<Scrapers, Records>),
        )
        .route(
            "/api/data/export/csv/{id}",
            get(data_handler::export_csv::<Records>),
        )
        .route(
            "/api/data/export/json/{id}",
            get(data_handler::export_json::<Records>),
        )
        .route(
            "/api/data/visualization/{scraper_id}",
            get(data_handler::visualization::<Scrapers, Records>),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ));

    let external_routes = Router::new()
        .route(
            "/api/external/scrapers/{id}/run",
            post(scraper_handler::run_scraper::<Users, Scrapers, Records>),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            api_key_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(external_routes)
        .layer(Extension(ctx.users))
        .layer(Extension(ctx.scrapers))
        .layer(Extension(ctx.records))
        .layer(Extension(ctx.runner))
        .layer(Extension(ctx.auth))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
