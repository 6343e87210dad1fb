//! Placeholder substitution for notification templates.
//!
//! Full template engines and localization stay with the broker; the only
//! contract here is that `{{code}}` carries the generated code into the
//! rendered message.

use std::collections::HashMap;

/// Replace every `{{key}}` placeholder with its context value.
/// Unknown placeholders are left as-is.
pub fn render(template: &str, context: &HashMap<&str, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in context {
        let placeholder = format!("{{{{{}}}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }
    rendered
}

/// Returns true if the template references `{{key}}`.
pub fn references(template: &str, key: &str) -> bool {
    template.contains(&format!("{{{{{}}}}}", key))
}
