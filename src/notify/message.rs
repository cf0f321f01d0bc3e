use chrono::Utc;
use chrono_tz::Tz;

use crate::domain::{Classification, Priority};

/// A rendered notification, ready for any transport: plain text for
/// email bodies, an HTML-subset variant for Telegram.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl ChannelMessage {
    /// Combine description, target name, matched keywords and the link
    /// into the operator-facing message. Transports never compose
    /// content beyond this.
    pub fn render(
        target_name: &str,
        target_url: &str,
        timezone: &str,
        change: &Classification,
    ) -> Self {
        let emoji = priority_emoji(change.priority);
        let subject = format!("{emoji} {}: {target_name}", change.priority.as_str());

        let tz: Tz = timezone.parse().unwrap_or(chrono_tz::Europe::Berlin);
        let checked_at = Utc::now()
            .with_timezone(&tz)
            .format("%d.%m.%Y %H:%M:%S")
            .to_string();

        let keywords = change
            .matched_keywords
            .as_ref()
            .filter(|kws| !kws.is_empty())
            .map(|kws| kws.join(", "));

        let mut html_body = format!(
            "{emoji} <b>{}</b>\n\n<b>{}</b>\n{}\n\n",
            change.priority.as_str(),
            escape_html(target_name),
            escape_html(&change.description),
        );
        if let Some(keywords) = &keywords {
            html_body.push_str(&format!("🔍 Keywords: {}\n\n", escape_html(keywords)));
        }
        html_body.push_str(&format!("🕒 {checked_at}\n"));
        html_body.push_str(&format!("🔗 <a href=\"{target_url}\">Zur Seite</a>"));

        let mut text_body = format!(
            "Priority: {}\n\nURL: {target_name}\n{}\n\n",
            change.priority.as_str(),
            change.description,
        );
        if let Some(keywords) = &keywords {
            text_body.push_str(&format!("Matched Keywords: {keywords}\n\n"));
        }
        text_body.push_str(&format!(
            "Checked: {checked_at}\nLink: {target_url}\n\n---\nslipwatch\n"
        ));

        Self {
            subject,
            text_body,
            html_body,
        }
    }

    /// Short operational notice (startup, shutdown). Not tied to any
    /// target or change.
    pub fn notice(text: &str) -> Self {
        Self {
            subject: format!("slipwatch: {text}"),
            text_body: format!("{text}\n\n---\nslipwatch\n"),
            html_body: escape_html(text),
        }
    }
}

fn priority_emoji(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "🚨",
        Priority::Important => "⚠️",
        Priority::Info => "ℹ️",
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
