use colored::Colorize;

/// Cuts `text` to at most `max_chars` characters, never splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Cuts `text` to at most `max_units` UTF-16 code units, never splitting a char.
pub fn truncate_utf16(text: &str, max_units: usize) -> String {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return text[..idx].to_string();
        }
    }
    text.to_string()
}

/// Length in UTF-16 units of Telegram HTML as the client displays it:
/// tags dropped, the entities `html::escape` produces decoded.
pub fn visible_utf16_len(html: &str) -> usize {
    let mut len = 0;
    let mut rest = html;
    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            if let Some(end) = rest.find('>') {
                rest = &rest[end + 1..];
                continue;
            }
        }
        if ch == '&' {
            if let Some(entity) = ["&lt;", "&gt;", "&amp;", "&quot;"]
                .into_iter()
                .find(|entity| rest.starts_with(entity))
            {
                len += 1;
                rest = &rest[entity.len()..];
                continue;
            }
        }
        len += ch.len_utf16();
        rest = &rest[ch.len_utf8()..];
    }
    len
}

/// Format a notification flag with color
pub fn format_flag(enabled: bool) -> String {
    if enabled {
        "enabled".green().to_string()
    } else {
        "disabled".red().to_string()
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", col, width = width));
    }
    println!("{}", row.trim_end());
}
