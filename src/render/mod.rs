//! Server-side HTML for the site's pages.
//!
//! Pages are plain functions returning [`Html`]; every dynamic value passes
//! through [`escape`].

pub mod pages;

use axum::response::Html;

use crate::handlers::paths;
use crate::models::UserRecord;
use crate::session::{FlashMessage, Level};

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

/// Page chrome shared by every view.
pub struct Layout<'a> {
    pub title: &'a str,
    pub user: Option<&'a UserRecord>,
    pub messages: &'a [FlashMessage],
    pub error: Option<&'a str>,
}

impl Layout<'_> {
    pub fn wrap(&self, body: &str) -> Html<String> {
        let nav = match self.user {
            Some(user) => format!(
                r#"<span class="user">{}</span> <a href="{}">Home</a> <a href="{}">Log out</a>"#,
                escape(&user.display_name()),
                paths::HOME,
                paths::LOGOUT
            ),
            None => format!(
                r#"<a href="{}">Log in</a> <a href="{}">Sign up</a>"#,
                paths::LOGIN,
                paths::SIGN_UP
            ),
        };

        let mut notices = String::new();
        for message in self.messages {
            let class = match message.level {
                Level::Info => "info",
                Level::Error => "error",
            };
            notices.push_str(&format!(
                r#"<p class="message {}">{}</p>"#,
                class,
                escape(&message.text)
            ));
        }
        if let Some(error) = self.error {
            notices.push_str(&format!(r#"<p class="message error">{}</p>"#, escape(error)));
        }

        Html(format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
             <body><nav>{nav}</nav><main><h1>{title}</h1>{notices}{body}</main></body></html>",
            title = escape(self.title),
            nav = nav,
            notices = notices,
            body = body,
        ))
    }
}

/// `<label><input></label>` pair for a form.
pub(crate) fn field(label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        r#"<p><label for="{name}">{label}</label> <input id="{name}" name="{name}" type="{kind}" value="{value}"></p>"#,
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<b onclick="x">Tom & 'Jerry'</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn layout_shows_messages_and_error() {
        let messages = vec![FlashMessage {
            level: Level::Info,
            text: "Saved".into(),
        }];
        let Html(page) = Layout {
            title: "Home",
            user: None,
            messages: &messages,
            error: Some("Bad <thing>"),
        }
        .wrap("<p>body</p>");

        assert!(page.contains(r#"<p class="message info">Saved</p>"#));
        assert!(page.contains("Bad &lt;thing&gt;"));
        assert!(page.contains("/login/"));
    }
}
