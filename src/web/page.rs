//! HTML rendering for the chat page

use crate::prompts::GREETING;
use crate::providers::Message;
use crate::storage::StoredSession;

use chrono::{Local, TimeZone};

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;display:flex;height:100vh}\
nav{width:260px;background:#f4f4f6;padding:1rem;overflow-y:auto;border-right:1px solid #ddd}\
nav a{display:block;padding:.4rem;color:#222;text-decoration:none;border-radius:4px}\
nav a.active{background:#dfe6f3}\
main{flex:1;display:flex;flex-direction:column}\
#messages{flex:1;overflow-y:auto;padding:1rem}\
.msg{max-width:46rem;margin:.5rem 0;padding:.6rem .8rem;border-radius:6px;white-space:pre-wrap}\
.user{background:#e8f0fe;margin-left:auto}\
.assistant{background:#f1f1f1}\
.error{background:#fdecea}\
form.send{display:flex;gap:.5rem;padding:1rem;border-top:1px solid #ddd}\
form.send input{flex:1;padding:.6rem}\
small{color:#777}";

/// Escape text for inclusion in HTML
///
/// # Examples
///
/// ```
/// use aura::web::page::escape_html;
///
/// assert_eq!(escape_html("<b>E-401</b> & \"x\""), "&lt;b&gt;E-401&lt;/b&gt; &amp; &quot;x&quot;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_time(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Messages worth showing: user input and assistant text
///
/// Tool results and assistant messages that only carry tool calls are
/// part of the stored conversation but not of the visible chat.
pub fn visible_messages(messages: &[Message]) -> Vec<&Message> {
    messages
        .iter()
        .filter(|m| match m.role.as_str() {
            "user" => true,
            "assistant" => !m.text().trim().is_empty(),
            _ => false,
        })
        .collect()
}

fn render_message(message: &Message) -> String {
    let class = if message.is_error() {
        "msg assistant error"
    } else if message.role == "user" {
        "msg user"
    } else {
        "msg assistant"
    };
    let stamp = message
        .timestamp
        .map(|ts| format!("<br><small>{}</small>", format_time(ts)))
        .unwrap_or_default();
    format!(
        "<div class=\"{}\">{}{}</div>\n",
        class,
        escape_html(message.text()),
        stamp
    )
}

/// Render the full chat page for one session
pub fn render_chat_page(session_id: &str, sessions: &[StoredSession], messages: &[Message]) -> String {
    let id = escape_html(session_id);

    let mut sidebar = String::new();
    for session in sessions {
        let active = if session.session_id == session_id {
            " class=\"active\""
        } else {
            ""
        };
        sidebar.push_str(&format!(
            "<a href=\"/sessions/{}\"{}>{}<br><small>{} messages</small></a>\n",
            escape_html(&session.session_id),
            active,
            escape_html(&session.title),
            session.message_count
        ));
    }

    let visible = visible_messages(messages);
    let body = if visible.is_empty() {
        format!("<div class=\"msg assistant\">{}</div>\n", escape_html(GREETING))
    } else {
        visible.into_iter().map(render_message).collect()
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Aura - IoT Troubleshooting Assistant</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <nav>\n<h3>Aura</h3>\n\
         <form method=\"post\" action=\"/sessions\"><button type=\"submit\">+ New chat</button></form>\n\
         <h4>Recent chats</h4>\n{sidebar}\
         <form method=\"post\" action=\"/sessions/{id}/delete\"><button type=\"submit\">Delete this chat</button></form>\n\
         </nav>\n<main>\n<div id=\"messages\">\n{body}</div>\n\
         <form class=\"send\" method=\"post\" action=\"/sessions/{id}/messages\">\
         <input name=\"message\" placeholder=\"Describe the problem, e.g. My device AURA-1 shows error E-401\" autofocus>\
         <button type=\"submit\">Send</button></form>\n\
         </main>\n</body>\n</html>\n",
        style = STYLE,
        sidebar = sidebar,
        id = id,
        body = body
    )
}
