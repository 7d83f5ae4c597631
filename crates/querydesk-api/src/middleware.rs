use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::session::{FlashLevel, Session};

/// Let the request through only when the admin flag is set; otherwise send
/// the caller to the admin login page with a notice.
pub async fn require_admin(mut session: Session, req: Request, next: Next) -> Response {
    if session.is_admin() {
        return next.run(req).await;
    }

    debug!("Admin session required for {}", req.uri().path());
    session.flash(FlashLevel::Error, "Please log in as an admin to continue.");
    (session, Redirect::to("/admin-login")).into_response()
}

/// Student counterpart of [`require_admin`].
pub async fn require_student(mut session: Session, req: Request, next: Next) -> Response {
    if session.is_student() {
        return next.run(req).await;
    }

    debug!("Student session required for {}", req.uri().path());
    session.flash(FlashLevel::Error, "Please log in as a student to continue.");
    (session, Redirect::to("/student-login")).into_response()
}
