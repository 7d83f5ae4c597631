//! HTML pages. Each function takes plain data and returns a full document.

use std::fmt::Write;

use axum::http::StatusCode;
use axum::response::Html;

use querydesk_types::models::{Query, QueryStatus};

use crate::session::{Flash, FlashLevel};

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:2rem auto;padding:0 1rem}\
nav a{margin-right:1rem}.flash{padding:.5rem 1rem;margin:.5rem 0;border-radius:4px}\
.flash-success{background:#e6f4ea}.flash-info{background:#e8f0fe}.flash-error{background:#fce8e6}\
table{border-collapse:collapse;width:100%}td,th{border:1px solid #ccc;padding:.4rem;vertical-align:top}\
form.inline{display:flex;gap:.5rem;flex-wrap:wrap}label{display:block;margin:.5rem 0}";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> Html<String> {
    let mut notices = String::new();
    for flash in flashes {
        let class = match flash.level {
            FlashLevel::Success => "flash-success",
            FlashLevel::Info => "flash-info",
            FlashLevel::Error => "flash-error",
        };
        let _ = write!(
            notices,
            r#"<div class="flash {}">{}</div>"#,
            class,
            escape(&flash.message)
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | QueryDesk</title><style>{STYLE}</style></head>
<body>
<nav><a href="/">Home</a><a href="/guest-query">Ask a question</a><a href="/logout">Log out</a></nav>
<h1>{title}</h1>
{notices}
{body}
</body>
</html>"#,
        title = escape(title),
    ))
}

pub fn home(flashes: &[Flash]) -> Html<String> {
    layout(
        "QueryDesk",
        flashes,
        r#"<p>Questions for the school office, answered by staff.</p>
<p><a href="/student-login">Student Login</a></p>
<p><a href="/admin-login">Admin Login</a></p>
<p><a href="/guest-query">Guest Query</a></p>"#,
    )
}

fn login_form(action: &str, id_field: &str, id_label: &str, forgot: &str) -> String {
    format!(
        r#"<form method="post" action="{action}">
<label>{id_label} <input name="{id_field}" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p><a href="{forgot}">Forgot password?</a></p>"#
    )
}

pub fn admin_login(flashes: &[Flash]) -> Html<String> {
    layout(
        "Admin Login",
        flashes,
        &login_form("/admin-login", "admin_id", "Admin ID", "/admin-forgot-password"),
    )
}

pub fn student_login(flashes: &[Flash]) -> Html<String> {
    layout(
        "Student Login",
        flashes,
        &login_form("/student-login", "student_id", "Student ID", "/student-forgot-password"),
    )
}

fn forgot_form(action: &str, id_field: &str, id_label: &str) -> String {
    format!(
        r#"<form method="post" action="{action}">
<label>{id_label} <input name="{id_field}" required></label>
<button type="submit">Send reset instructions</button>
</form>"#
    )
}

pub fn admin_forgot_password(flashes: &[Flash]) -> Html<String> {
    layout(
        "Admin Password Reset",
        flashes,
        &forgot_form("/admin-forgot-password", "admin_id", "Admin ID"),
    )
}

pub fn student_forgot_password(flashes: &[Flash]) -> Html<String> {
    layout(
        "Student Password Reset",
        flashes,
        &forgot_form("/student-forgot-password", "student_id", "Student ID"),
    )
}

fn submit_form() -> &'static str {
    r#"<form method="post" action="/submit_query">
<label>Name <input name="name" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Message <textarea name="message" rows="5" required></textarea></label>
<button type="submit">Send query</button>
</form>"#
}

pub fn guest_query(flashes: &[Flash]) -> Html<String> {
    layout(
        "Guest Query",
        flashes,
        r#"<form method="post" action="/guest-query">
<label>Name <input name="guest_name" required></label>
<label>Email <input name="guest_email" type="email" required></label>
<label>Message <textarea name="guest_query" rows="5" required></textarea></label>
<button type="submit">Send query</button>
</form>"#,
    )
}

pub fn student_dashboard(flashes: &[Flash], student_id: &str, queries: &[Query]) -> Html<String> {
    let mut body = format!("<p>Signed in as <strong>{}</strong>.</p>", escape(student_id));
    body.push_str("<h2>New query</h2>");
    body.push_str(submit_form());
    body.push_str("<h2>Your queries</h2>");

    if queries.is_empty() {
        body.push_str("<p>You have not submitted any queries yet.</p>");
    } else {
        body.push_str("<table><tr><th>Submitted</th><th>Message</th><th>Status</th><th>Response</th></tr>");
        for q in queries {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                q.created_at.format("%Y-%m-%d %H:%M"),
                escape(&q.message),
                q.status.label(),
                escape(q.response.as_deref().unwrap_or("-")),
            );
        }
        body.push_str("</table>");
    }

    layout("Student Dashboard", flashes, &body)
}

pub fn admin_dashboard(flashes: &[Flash], title: &str, queries: &[Query]) -> Html<String> {
    let mut body = String::new();
    if queries.is_empty() {
        body.push_str("<p>No queries yet.</p>");
        return layout(title, flashes, &body);
    }

    body.push_str(
        "<table><tr><th>#</th><th>From</th><th>Message</th><th>Status</th><th>Response</th><th>Update</th></tr>",
    );
    for q in queries {
        let from = match &q.student_id {
            Some(id) => format!("{} &lt;{}&gt;<br>student {}", escape(&q.name), escape(&q.email), escape(id)),
            None => format!("{} &lt;{}&gt;<br>guest", escape(&q.name), escape(&q.email)),
        };

        let mut options = String::from(r#"<option value="">(keep)</option>"#);
        for status in QueryStatus::ALL {
            let _ = write!(
                options,
                r#"<option value="{}"{}>{}</option>"#,
                status.as_str(),
                if status == q.status { " selected" } else { "" },
                status.label()
            );
        }

        let _ = write!(
            body,
            r#"<tr><td>{id}</td><td>{from}<br>{created}</td><td>{message}</td><td>{status}</td><td>{response}</td>
<td><form class="inline" method="post" action="/update_status">
<input type="hidden" name="query_id" value="{id}">
<select name="status">{options}</select>
<textarea name="response" rows="2" placeholder="Response"></textarea>
<button type="submit">Save</button>
</form></td></tr>"#,
            id = q.id,
            created = q.created_at.format("%Y-%m-%d %H:%M"),
            message = escape(&q.message),
            status = q.status.label(),
            response = escape(q.response.as_deref().unwrap_or("-")),
        );
    }
    body.push_str("</table>");

    layout(title, flashes, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(
        title,
        &[],
        &format!(r#"<p>{}</p><p><a href="/">Back to the home page</a></p>"#, escape(message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b a="1">&'"#), "&lt;b a=&quot;1&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn flashes_and_user_text_are_escaped() {
        let flashes = [Flash {
            level: FlashLevel::Error,
            message: "<script>".into(),
        }];
        let Html(page) = student_dashboard(&flashes, "<me>", &[]);
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("&lt;me&gt;"));
        assert!(!page.contains("<script>"));
    }
}
