use serde::{Deserialize, Serialize};

// -- Auth --

/// Admin login form. The original page posts `admin_id`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default, alias = "admin_id")]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentLoginForm {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminForgotPasswordForm {
    #[serde(default)]
    pub admin_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentForgotPasswordForm {
    #[serde(default)]
    pub student_id: String,
}

// -- Queries --

/// Submission form posted to `/submit_query`.
/// Missing fields deserialize to `None` so validation can report them.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQueryForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Form posted to `/guest-query`. The guest page uses `guest_*` names; the
/// shared names are accepted too, and a non-blank `guest_*` value wins.
#[derive(Debug, Default, Deserialize)]
pub struct GuestQueryForm {
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_query: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<GuestQueryForm> for SubmitQueryForm {
    fn from(form: GuestQueryForm) -> Self {
        Self {
            name: prefer(form.guest_name, form.name),
            email: prefer(form.guest_email, form.email),
            message: prefer(form.guest_query, form.message),
        }
    }
}

fn prefer(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    if primary.as_deref().is_some_and(|value| !value.trim().is_empty()) {
        primary
    } else {
        fallback.or(primary)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusForm {
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

// -- Diagnostics --

/// Who may call a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Student,
    Admin,
}

/// One entry of the `/routes` listing.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    pub methods: &'static [&'static str],
    pub path: &'static str,
    pub access: Access,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_fields_win_over_shared_names() {
        let form: SubmitQueryForm = GuestQueryForm {
            guest_name: Some("Ann".into()),
            name: Some("Other".into()),
            guest_email: Some("  ".into()),
            email: Some("ann@x.com".into()),
            message: Some("Help".into()),
            ..GuestQueryForm::default()
        }
        .into();

        assert_eq!(form.name.as_deref(), Some("Ann"));
        assert_eq!(form.email.as_deref(), Some("ann@x.com"));
        assert_eq!(form.message.as_deref(), Some("Help"));
    }

    #[test]
    fn blank_guest_field_without_fallback_stays_blank() {
        let form: SubmitQueryForm = GuestQueryForm {
            guest_name: Some("".into()),
            ..GuestQueryForm::default()
        }
        .into();

        assert_eq!(form.name.as_deref(), Some(""));
        assert_eq!(form.email, None);
    }
}
