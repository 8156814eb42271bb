//! The static "website blocked" page.

use chrono::{DateTime, Local};

const STYLE: &str = "body{font-family:Arial,sans-serif;background:linear-gradient(135deg,#667eea 0%,#764ba2 100%);\
margin:0;display:flex;align-items:center;justify-content:center;min-height:100vh;color:white;text-align:center}\
h1{font-size:2.5rem;margin-bottom:1rem}p{font-size:1.2rem;opacity:0.9}\
.domain{background:rgba(255,255,255,0.2);padding:0.5rem 1rem;border-radius:0.5rem;margin:1rem 0;font-family:monospace}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render the block page naming `domain`. `blocked_at` adds a timestamp line.
pub fn render(domain: &str, blocked_at: Option<DateTime<Local>>) -> String {
    let stamp = blocked_at
        .map(|at| format!("<p><small>Blocked at {}</small></p>", at.format("%H:%M:%S")))
        .unwrap_or_default();
    format!(
        "<html><head><meta charset=\"utf-8\"><title>Blocked by focusbee</title><style>{STYLE}</style></head>\
<body><div><h1>Website Blocked!</h1><p>This website has been blocked to help you stay focused.</p>\
<div class=\"domain\">{}</div>{stamp}<p><small>You can disable blocking in the extension popup</small></p>\
</div></body></html>",
        escape(domain)
    )
}

/// `data:` URL carrying the block page, used as the redirect target.
pub fn redirect_url(domain: &str) -> String {
    format!("data:text/html,{}", urlencoding::encode(&render(domain, None)))
}
