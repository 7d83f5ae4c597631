use axum::{
    Form,
    extract::{OriginalUri, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::warn;

use querydesk_types::api::{GuestQueryForm, SubmitQueryForm, UpdateStatusForm};

use crate::auth::AppState;
use crate::error::AppError;
use crate::service::run_blocking;
use crate::session::{FlashLevel, Session};
use crate::views;

pub async fn guest_query_page(mut session: Session) -> (Session, Html<String>) {
    let flashes = session.take_flashes();
    (session, views::guest_query(&flashes))
}

/// POST /guest-query, posted with the guest page's field names.
pub async fn guest_query(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GuestQueryForm>,
) -> Result<(Session, Redirect), AppError> {
    submit(state, session, form.into()).await
}

/// POST /submit_query. A logged-in student's identifier is attached; anyone
/// else submits as a guest.
pub async fn submit_query(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SubmitQueryForm>,
) -> Result<(Session, Redirect), AppError> {
    submit(state, session, form).await
}

async fn submit(
    state: AppState,
    mut session: Session,
    form: SubmitQueryForm,
) -> Result<(Session, Redirect), AppError> {
    let student_id = session.student_id().map(str::to_owned);
    let back = if student_id.is_some() {
        "/student_dashboard"
    } else {
        "/guest-query"
    };

    let result = run_blocking(&state, move |service| {
        service.submit(
            form.name.as_deref(),
            form.email.as_deref(),
            form.message.as_deref(),
            student_id.as_deref(),
        )
    })
    .await;

    match result {
        Ok(_) => session.flash(FlashLevel::Success, "Your query has been sent successfully!"),
        Err(AppError::Validation(msg)) => {
            session.flash(FlashLevel::Error, format!("{} Please fill in all fields.", msg))
        }
        Err(e) => return Err(e),
    }
    Ok((session, Redirect::to(back)))
}

pub async fn student_dashboard(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    // The route guard has already checked the flag.
    let Some(student_id) = session.student_id().map(str::to_owned) else {
        return Ok(Redirect::to("/student-login").into_response());
    };

    let lookup = student_id.clone();
    let queries = run_blocking(&state, move |service| service.list_for_student(&lookup)).await?;

    let flashes = session.take_flashes();
    Ok((session, views::student_dashboard(&flashes, &student_id, &queries)).into_response())
}

/// GET /admin_dashboard and GET /view_queries.
pub async fn admin_dashboard(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    mut session: Session,
) -> Result<(Session, Html<String>), AppError> {
    let queries = run_blocking(&state, |service| service.list_all()).await?;

    let title = if uri.path() == "/view_queries" {
        "All Queries"
    } else {
        "Admin Dashboard"
    };
    let flashes = session.take_flashes();
    Ok((session, views::admin_dashboard(&flashes, title, &queries)))
}

pub async fn update_status(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<UpdateStatusForm>,
) -> Result<(Session, Redirect), AppError> {
    let back = Redirect::to("/admin_dashboard");

    let Some(id) = form
        .query_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
    else {
        warn!("update_status without a usable query_id: {:?}", form.query_id);
        session.flash(FlashLevel::Error, "A valid query id is required.");
        return Ok((session, back));
    };

    let result = run_blocking(&state, move |service| {
        service.update(id, form.status.as_deref(), form.response.as_deref())
    })
    .await;

    match result {
        Ok(query) => session.flash(FlashLevel::Success, format!("Query #{} updated.", query.id)),
        Err(e @ (AppError::Validation(_) | AppError::NotFound(_))) => {
            warn!("Rejected update for query #{}: {}", id, e);
            session.flash(FlashLevel::Error, e.to_string());
        }
        Err(e) => return Err(e),
    }
    Ok((session, back))
}
