use axum::{http::StatusCode, response::Html};
use serde_json::Value;

use super::{escape, field, Layout};
use crate::handlers::paths;
use crate::models::{Account, AccountForm, Member, MemberForm, SavedSignUpForm, UserRecord};
use crate::session::FlashMessage;

pub fn error(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    Layout {
        title,
        user: None,
        messages: &[],
        error: None,
    }
    .wrap(&format!(
        r#"<p class="status">{}</p><p>{}</p><p><a href="{}">Back to home</a></p>"#,
        status.as_u16(),
        escape(message),
        paths::HOME
    ))
}

pub fn sign_in(saved_username: &str, error: Option<&str>, messages: &[FlashMessage]) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="{action}">{username}{email}{password}<button type="submit">Log in</button></form>
<p>No account yet? <a href="{sign_up}">Sign up</a></p>"#,
        action = paths::LOGIN,
        username = field("Username", "username", "text", saved_username),
        email = field("Email", "email", "email", ""),
        password = field("Password", "password", "password", ""),
        sign_up = paths::SIGN_UP,
    );
    Layout {
        title: "Sign in",
        user: None,
        messages,
        error,
    }
    .wrap(&body)
}

pub fn sign_up(form: &SavedSignUpForm, error: Option<&str>) -> Html<String> {
    let fields = [
        field("Username", "username", "text", &form.username),
        field("Email", "email", "email", &form.email),
        field("Password", "password1", "password", ""),
        field("Confirm password", "password2", "password", ""),
        field("First name", "first_name", "text", &form.first_name),
        field("Last name", "last_name", "text", &form.last_name),
        field("Date of birth", "dob", "date", &form.dob),
        field("Relationship", "relationship", "text", ""),
        field("Vital status", "vital_status", "text", ""),
    ]
    .concat();

    let body = format!(
        r#"<form method="post" action="{}">{}<button type="submit">Sign up</button></form>"#,
        paths::SIGN_UP,
        fields
    );
    Layout {
        title: "Sign up",
        user: None,
        messages: &[],
        error,
    }
    .wrap(&body)
}

pub fn home(
    user: &UserRecord,
    account: Option<&Account>,
    messages: &[FlashMessage],
    error: Option<&str>,
) -> Html<String> {
    let mut body = String::new();

    match account {
        Some(account) => {
            let details = account.user.clone().unwrap_or_default();
            body.push_str("<section class=\"account\"><h2>Your account</h2><dl>");
            for (label, value) in [
                ("Name", format!("{} {}", details.first_name, details.last_name)),
                ("Email", details.email),
                ("Date of birth", account.dob.clone().unwrap_or_default()),
            ] {
                body.push_str(&format!("<dt>{}</dt><dd>{}</dd>", label, escape(value.trim())));
            }
            body.push_str("</dl>");
            if let Some(id) = account.id {
                body.push_str(&format!(
                    r#"<p><a href="{}">Update account</a></p>"#,
                    paths::account_update(id)
                ));
            }
            body.push_str("</section>");
            body.push_str(&member_list(account));
        }
        None => body.push_str("<p>No account details are available.</p>"),
    }

    body.push_str(&format!(
        r#"<p><a href="{}">Add a family member</a></p>"#,
        paths::MEMBERS
    ));

    Layout {
        title: "Home",
        user: Some(user),
        messages,
        error,
    }
    .wrap(&body)
}

/// Members embedded in the account record, when the backend includes them.
fn member_list(account: &Account) -> String {
    let Some(Value::Array(members)) = account.extra.get("members") else {
        return String::new();
    };

    let mut out = String::from("<section class=\"members\"><h2>Family</h2><ul>");
    for member in members {
        let Ok(member) = serde_json::from_value::<Member>(member.clone()) else {
            continue;
        };
        let Some(id) = member.id else { continue };
        out.push_str(&format!(
            r#"<li>{} {} <a href="{}">Edit</a> <a href="{}">Delete</a></li>"#,
            escape(&member.first_name),
            escape(&member.last_name),
            paths::member_update(id),
            paths::member_delete(id),
        ));
    }
    out.push_str("</ul></section>");
    out
}

fn member_fields(form: &MemberForm) -> String {
    [
        field("First name", "first_name", "text", &form.first_name),
        field("Last name", "last_name", "text", &form.last_name),
        field("Date of birth", "dob", "date", &form.dob),
        field("Relationship", "relationship", "text", &form.relationship),
        field("Vital status", "vital_status", "text", &form.vital_status),
    ]
    .concat()
}

pub fn add_member(user: &UserRecord, form: &MemberForm, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="{}">{}<button type="submit">Add member</button></form>"#,
        paths::MEMBERS,
        member_fields(form)
    );
    Layout {
        title: "Add a family member",
        user: Some(user),
        messages: &[],
        error,
    }
    .wrap(&body)
}

pub fn update_member(user: &UserRecord, id: i64, form: &MemberForm, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="{}">{}<button type="submit">Save</button></form>"#,
        paths::member_update(id),
        member_fields(form)
    );
    Layout {
        title: "Update family member",
        user: Some(user),
        messages: &[],
        error,
    }
    .wrap(&body)
}

pub fn delete_member(user: &UserRecord, id: i64, member: &Member, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<p>Remove <strong>{} {}</strong> from your family?</p>
<form method="post" action="{}"><button type="submit">Delete</button> <a href="{}">Cancel</a></form>"#,
        escape(&member.first_name),
        escape(&member.last_name),
        paths::member_delete(id),
        paths::HOME
    );
    Layout {
        title: "Delete family member",
        user: Some(user),
        messages: &[],
        error,
    }
    .wrap(&body)
}

pub fn update_account(user: &UserRecord, id: i64, form: &AccountForm, error: Option<&str>) -> Html<String> {
    let fields = [
        field("First name", "first_name", "text", &form.first_name),
        field("Last name", "last_name", "text", &form.last_name),
        field("Email", "email", "email", &form.email),
        field("Date of birth", "dob", "date", &form.dob),
    ]
    .concat();
    let body = format!(
        r#"<form method="post" action="{}">{}<button type="submit">Save</button></form>"#,
        paths::account_update(id),
        fields
    );
    Layout {
        title: "Update account",
        user: Some(user),
        messages: &[],
        error,
    }
    .wrap(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ada() -> UserRecord {
        serde_json::from_value(json!({"id": 1, "first_name": "Ada", "last_name": "Byron"})).unwrap()
    }

    #[test]
    fn sign_in_prefills_saved_username() {
        let Html(page) = sign_in("ada<", Some("Invalid credentials"), &[]);
        assert!(page.contains(r#"name="username" type="text" value="ada&lt;""#));
        assert!(page.contains("Invalid credentials"));
    }

    #[test]
    fn home_links_account_and_embedded_members() {
        let account: Account = serde_json::from_value(json!({
            "id": 4,
            "dob": "1990-01-01",
            "user": {"email": "ada@example.com", "first_name": "Ada", "last_name": "Byron"},
            "members": [{"id": 9, "first_name": "Anne", "last_name": "Byron"}]
        }))
        .unwrap();

        let Html(page) = home(&ada(), Some(&account), &[], None);
        assert!(page.contains("/account/update/4/"));
        assert!(page.contains("/members/update/9/"));
        assert!(page.contains("/members/delete/9/"));
        assert!(page.contains("ada@example.com"));
    }

    #[test]
    fn error_page_shows_status_and_message() {
        let Html(page) = error(StatusCode::SERVICE_UNAVAILABLE, "backend down");
        assert!(page.contains("503"));
        assert!(page.contains("backend down"));
    }
}
