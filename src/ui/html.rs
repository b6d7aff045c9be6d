//! HTML rendering of the demo form

use super::{Form, FormItem, MessageBarType};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>AutoML Studio - Save and load</title>
<style>
body { font-family: sans-serif; margin: 2em; background: #f5f5f5; color: #222; }
.card { background: white; border-radius: 8px; padding: 1.5em; max-width: 48em; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.card > * { margin: 0.8em 0; }
.buttons button { padding: 0.5em 1.4em; margin-right: 0.5em; border: 0; border-radius: 4px; cursor: pointer; }
.buttons button.primary { background: #2563eb; color: white; }
.buttons button:disabled { background: #bbb; cursor: not-allowed; }
.message-bar { padding: 0.6em 1em; border-radius: 4px; }
.message-bar.warning { background: #fff4ce; }
.message-bar.success { background: #dff6dd; }
.text { line-height: 1.5; min-height: 1em; }
</style>
</head>
<body>
<form class="card" method="post" action="/demo">
"#;

const PAGE_TAIL: &str = "</form>\n</body>\n</html>\n";

/// Render `form` as a standalone page posting button presses to `/demo`.
pub fn to_html(form: &Form) -> String {
    let mut html = String::from(PAGE_HEAD);

    for item in &form.items {
        match item {
            FormItem::Text { content } => {
                let lines: Vec<String> = content.lines().map(escape).collect();
                html.push_str(&format!("<div class=\"text\">{}</div>\n", lines.join("<br />")));
            }
            FormItem::Buttons { items } => {
                html.push_str("<div class=\"buttons\">\n");
                for button in items {
                    html.push_str(&format!(
                        "<button type=\"submit\" name=\"{name}\" value=\"true\"{class}{disabled}>{label}</button>\n",
                        name = escape(&button.name),
                        class = if button.primary { " class=\"primary\"" } else { "" },
                        disabled = if button.disabled { " disabled" } else { "" },
                        label = escape(&button.label),
                    ));
                }
                html.push_str("</div>\n");
            }
            FormItem::MessageBar { kind, text } => {
                let class = match kind {
                    MessageBarType::Warning => "warning",
                    MessageBarType::Success => "success",
                };
                html.push_str(&format!(
                    "<div class=\"message-bar {}\" role=\"status\">{}</div>\n",
                    class,
                    escape(text)
                ));
            }
        }
    }

    html.push_str(PAGE_TAIL);
    html
}

fn escape(text: &str) -> String {
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
