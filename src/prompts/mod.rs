//! Prompts and fixed assistant text
//!
//! The system prompt steers the model through the diagnostic workflow:
//! search the guides first, then check connectivity and logs, then answer
//! with numbered steps.

use chrono::{DateTime, Local};

/// System prompt prepended to every model call
pub const SYSTEM_PROMPT: &str = "You are Aura, an expert IoT troubleshooting assistant. \
Your goal is to help users diagnose and resolve issues with their IoT devices.

When a user reports a problem:
1. First, use search_troubleshooting_guides to find relevant documentation for error codes or symptoms
2. If needed, use check_device_connectivity to verify the device's network status
3. If needed, use get_device_error_logs to review recent device logs
4. After gathering sufficient information, provide a clear, step-by-step troubleshooting guide

Be concise, helpful, and prioritize the most likely solutions first. \
Always explain technical terms in simple language.";

/// Greeting shown while a session has no messages
pub const GREETING: &str =
    "Hello! I'm Aura, your IoT troubleshooting assistant. How can I help you today?";

/// Assistant text recorded when a turn fails
pub const ANSWER_UNAVAILABLE: &str =
    "I'm sorry, I couldn't complete an answer this time. Please try again in a moment.";

/// Default session title for the given local time
///
/// # Examples
///
/// ```
/// use aura::prompts::title_for;
/// use chrono::{Local, TimeZone};
///
/// let at = Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 0).unwrap();
/// assert_eq!(title_for(at), "Chat - 2026-03-14 09:05");
/// ```
pub fn title_for(at: DateTime<Local>) -> String {
    at.format("Chat - %Y-%m-%d %H:%M").to_string()
}

/// Default session title for the current time
pub fn default_title() -> String {
    title_for(Local::now())
}

/// Compose a one-shot query with optional device context
///
/// # Examples
///
/// ```
/// use aura::prompts::compose_query;
///
/// let q = compose_query("Suction is weak", Some("AURA-1"), Some("E-401"));
/// assert_eq!(q, "Suction is weak\n\nDevice ID: AURA-1\nError code: E-401");
/// assert_eq!(compose_query("Hi", None, None), "Hi");
/// ```
pub fn compose_query(query: &str, device_id: Option<&str>, error_code: Option<&str>) -> String {
    let mut context = Vec::new();
    if let Some(device_id) = device_id.filter(|d| !d.trim().is_empty()) {
        context.push(format!("Device ID: {}", device_id.trim()));
    }
    if let Some(code) = error_code.filter(|c| !c.trim().is_empty()) {
        context.push(format!("Error code: {}", code.trim()));
    }

    if context.is_empty() {
        query.to_string()
    } else {
        format!("{}\n\n{}", query, context.join("\n"))
    }
}
