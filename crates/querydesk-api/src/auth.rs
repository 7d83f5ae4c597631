use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use tracing::{error, info, warn};

use querydesk_db::Database;
use querydesk_types::api::{
    AdminForgotPasswordForm, AdminLoginForm, StudentForgotPasswordForm, StudentLoginForm,
};

use crate::error::AppError;
use crate::session::{FlashLevel, Session, SessionKeys};
use crate::views;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

const RESET_SENT: &str = "Password reset instructions have been sent to your registered email.";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session: Arc<SessionKeys>,
    pub student: StudentCredential,
}

/// The single student login accepted until real student accounts exist.
pub struct StudentCredential {
    pub student_id: String,
    pub password_hash: String,
}

/// Auth-related settings the binary reads from its environment.
pub struct AuthSettings {
    pub session_secret: String,
    pub session_ttl: chrono::Duration,
    pub student_id: String,
    pub student_password: String,
}

impl AppStateInner {
    pub fn new(db: Database, settings: AuthSettings) -> anyhow::Result<AppState> {
        let student = StudentCredential {
            password_hash: hash_password(&settings.student_password)?,
            student_id: settings.student_id,
        };

        Ok(Arc::new(Self {
            db,
            session: Arc::new(SessionKeys::new(&settings.session_secret, settings.session_ttl)),
            student,
        }))
    }
}

/// Hash with Argon2id and a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// False for a wrong password and for a stored hash that cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Seed the `admin` account when the admins table is empty.
pub fn seed_default_admin(db: &Database, password: &str) -> anyhow::Result<()> {
    if db.count_admins()? > 0 {
        return Ok(());
    }

    let hash = hash_password(password)?;
    if db.seed_admin_if_empty(DEFAULT_ADMIN_USERNAME, &hash)? {
        info!("Seeded default admin account '{}'", DEFAULT_ADMIN_USERNAME);
    }
    Ok(())
}

// -- Admin --

pub async fn admin_login_page(mut session: Session) -> (Session, Html<String>) {
    let flashes = session.take_flashes();
    (session, views::admin_login(&flashes))
}

pub async fn admin_login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Result<(Session, Redirect), AppError> {
    let username = form.username.trim().to_string();

    let db = state.clone();
    let lookup = username.clone();
    let verified = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        // No such admin fails the same way as a wrong password.
        Ok(match db.db.get_admin_by_username(&lookup)? {
            Some(admin) => verify_password(&form.password, &admin.password_hash),
            None => false,
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    if !verified {
        warn!("Failed admin login for '{}'", username);
        session.flash(FlashLevel::Error, "Incorrect Admin ID or Password");
        return Ok((session, Redirect::to("/admin-login")));
    }

    info!("Admin '{}' logged in", username);
    session.login_admin(username);
    session.flash(FlashLevel::Success, "Logged in as admin.");
    Ok((session, Redirect::to("/admin_dashboard")))
}

pub async fn admin_forgot_password_page(mut session: Session) -> (Session, Html<String>) {
    let flashes = session.take_flashes();
    (session, views::admin_forgot_password(&flashes))
}

/// Stub reset flow: reports whether the admin exists, sends nothing.
pub async fn admin_forgot_password(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<AdminForgotPasswordForm>,
) -> Result<(Session, Redirect), AppError> {
    let admin_id = form.admin_id.trim().to_string();

    let db = state.clone();
    let lookup = admin_id.clone();
    let known = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        Ok(!lookup.is_empty() && db.db.get_admin_by_username(&lookup)?.is_some())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    if known {
        info!("Password reset requested for admin '{}'", admin_id);
        session.flash(FlashLevel::Success, RESET_SENT);
    } else {
        session.flash(FlashLevel::Error, "Admin ID not found.");
    }
    Ok((session, Redirect::to("/admin-forgot-password")))
}

// -- Student --

pub async fn student_login_page(mut session: Session) -> (Session, Html<String>) {
    let flashes = session.take_flashes();
    (session, views::student_login(&flashes))
}

pub async fn student_login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<StudentLoginForm>,
) -> Result<(Session, Redirect), AppError> {
    let student_id = form.student_id.trim().to_string();

    let verifier = state.clone();
    let verified = tokio::task::spawn_blocking(move || {
        student_id_matches(&verifier.student, &form.student_id)
            && verify_password(&form.password, &verifier.student.password_hash)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?;

    if !verified {
        warn!("Failed student login for '{}'", student_id);
        session.flash(FlashLevel::Error, "Incorrect Student ID or Password");
        return Ok((session, Redirect::to("/student-login")));
    }

    info!("Student '{}' logged in", student_id);
    session.login_student(student_id);
    session.flash(FlashLevel::Success, "Logged in as student.");
    Ok((session, Redirect::to("/student_dashboard")))
}

pub async fn student_forgot_password_page(mut session: Session) -> (Session, Html<String>) {
    let flashes = session.take_flashes();
    (session, views::student_forgot_password(&flashes))
}

pub async fn student_forgot_password(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<StudentForgotPasswordForm>,
) -> (Session, Redirect) {
    if student_id_matches(&state.student, &form.student_id) {
        info!("Password reset requested for student '{}'", form.student_id.trim());
        session.flash(FlashLevel::Success, RESET_SENT);
    } else {
        session.flash(FlashLevel::Error, "Student ID not found.");
    }
    (session, Redirect::to("/student-forgot-password"))
}

fn student_id_matches(credential: &StudentCredential, submitted: &str) -> bool {
    let submitted = submitted.trim();
    !submitted.is_empty() && submitted == credential.student_id
}

// -- Both --

pub async fn logout(mut session: Session) -> (Session, Redirect) {
    if let Some(admin) = session.admin() {
        info!("Admin '{}' logged out", admin);
    }
    if let Some(student) = session.student_id() {
        info!("Student '{}' logged out", student);
    }
    session.logout();
    session.flash(FlashLevel::Info, "You have been logged out.");
    (session, Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let hash = hash_password("admin123").unwrap();
        assert_ne!(hash, "admin123");
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
    }

    #[test]
    fn unreadable_hash_fails_closed() {
        assert!(!verify_password("admin123", "admin123"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn default_admin_is_seeded_once() {
        let db = Database::open_in_memory().unwrap();
        seed_default_admin(&db, "first").unwrap();
        seed_default_admin(&db, "second").unwrap();

        assert_eq!(db.count_admins().unwrap(), 1);
        let admin = db.get_admin_by_username(DEFAULT_ADMIN_USERNAME).unwrap().unwrap();
        assert!(verify_password("first", &admin.password_hash));
        assert!(!verify_password("second", &admin.password_hash));
    }
}
