use axum::{
    Json, Router,
    response::Html,
    routing::{get, post},
};

use querydesk_types::api::{Access, RouteInfo};

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_student};
use crate::queries;
use crate::session::Session;
use crate::views;

/// Every endpoint the router registers, served by `GET /routes`.
pub const ROUTES: &[RouteInfo] = &[
    RouteInfo { methods: &["GET"], path: "/", access: Access::Public },
    RouteInfo { methods: &["GET", "POST"], path: "/admin-login", access: Access::Public },
    RouteInfo { methods: &["GET", "POST"], path: "/student-login", access: Access::Public },
    RouteInfo { methods: &["GET", "POST"], path: "/admin-forgot-password", access: Access::Public },
    RouteInfo { methods: &["GET", "POST"], path: "/student-forgot-password", access: Access::Public },
    RouteInfo { methods: &["GET", "POST"], path: "/guest-query", access: Access::Public },
    RouteInfo { methods: &["POST"], path: "/submit_query", access: Access::Public },
    RouteInfo { methods: &["GET"], path: "/student_dashboard", access: Access::Student },
    RouteInfo { methods: &["GET"], path: "/admin_dashboard", access: Access::Admin },
    RouteInfo { methods: &["GET"], path: "/view_queries", access: Access::Admin },
    RouteInfo { methods: &["POST"], path: "/update_status", access: Access::Admin },
    RouteInfo { methods: &["GET"], path: "/logout", access: Access::Public },
    RouteInfo { methods: &["GET"], path: "/routes", access: Access::Public },
];

pub fn router(state: AppState) -> Router {
    let public_routes: Router<AppState> = Router::new()
        .route("/", get(home))
        .route("/admin-login", get(auth::admin_login_page).post(auth::admin_login))
        .route("/student-login", get(auth::student_login_page).post(auth::student_login))
        .route(
            "/admin-forgot-password",
            get(auth::admin_forgot_password_page).post(auth::admin_forgot_password),
        )
        .route(
            "/student-forgot-password",
            get(auth::student_forgot_password_page).post(auth::student_forgot_password),
        )
        .route("/guest-query", get(queries::guest_query_page).post(queries::guest_query))
        .route("/submit_query", post(queries::submit_query))
        .route("/logout", get(auth::logout))
        .route("/routes", get(list_routes));

    let student_routes: Router<AppState> = Router::new()
        .route("/student_dashboard", get(queries::student_dashboard))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_student));

    let admin_routes: Router<AppState> = Router::new()
        .route("/admin_dashboard", get(queries::admin_dashboard))
        .route("/view_queries", get(queries::admin_dashboard))
        .route("/update_status", post(queries::update_status))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(student_routes)
        .merge(admin_routes)
        .with_state(state)
}

async fn home(mut session: Session) -> (Session, Html<String>) {
    let flashes = session.take_flashes();
    (session, views::home(&flashes))
}

async fn list_routes() -> Json<&'static [RouteInfo]> {
    Json(ROUTES)
}
