/// Escapes special characters in a filename for safe use as a path component.
///
/// Replaced characters:
/// - `/`, `\` -> `_` (path separators)
/// - `:`, `*`, `?`, `<`, `>`, `|` -> `_` (reserved on Windows)
/// - `"` -> `'`
/// - control characters (0x00-0x1F) -> `_`
///
/// Leading/trailing whitespace and dots are trimmed. An empty result
/// becomes "unnamed".
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}

/// Escapes special characters for Telegram's MarkdownV2 format.
///
/// MarkdownV2 requires escaping:
/// `_`, `*`, `[`, `]`, `(`, `)`, `~`, `` ` ``, `>`, `#`, `+`, `-`, `=`,
/// `|`, `{`, `}`, `.`, `!`
///
/// The backslash is escaped first to avoid double escaping.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '_' => result.push_str("\\_"),
            '*' => result.push_str("\\*"),
            '[' => result.push_str("\\["),
            ']' => result.push_str("\\]"),
            '(' => result.push_str("\\("),
            ')' => result.push_str("\\)"),
            '~' => result.push_str("\\~"),
            '`' => result.push_str("\\`"),
            '>' => result.push_str("\\>"),
            '#' => result.push_str("\\#"),
            '+' => result.push_str("\\+"),
            '-' => result.push_str("\\-"),
            '=' => result.push_str("\\="),
            '|' => result.push_str("\\|"),
            '{' => result.push_str("\\{"),
            '}' => result.push_str("\\}"),
            '.' => result.push_str("\\."),
            '!' => result.push_str("\\!"),
            _ => result.push(c),
        }
    }

    result
}

/// Formats a duration in seconds as `M:SS` (hours fold into minutes).
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Formats a view count with thousands separators: 1234567 -> "1,234,567".
pub fn format_views(views: u64) -> String {
    let digits = views.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a byte count as "45.2 MB".
pub fn format_size(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Truncates a title to `max` characters, appending "..." when cut.
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ==================== escape_filename Tests ====================

    #[test]
    fn test_escape_filename_basic() {
        assert_eq!(escape_filename("song_name.mp3"), "song_name.mp3");
        assert_eq!(escape_filename("song/name*.mp3"), "song_name_.mp3");
    }

    #[test]
    fn test_escape_filename_full_unsafe_set() {
        let escaped = escape_filename("Song: \"Best\" / Mix?");
        for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            assert!(!escaped.contains(c), "escaped name still contains {:?}: {}", c, escaped);
        }
        assert_eq!(escaped, "Song_ 'Best' _ Mix");
    }

    #[test]
    fn test_escape_filename_control_chars() {
        assert_eq!(escape_filename("a\nb\tc"), "a_b_c");
    }

    #[test]
    fn test_escape_filename_never_empty() {
        assert_eq!(escape_filename(""), "unnamed");
        assert_eq!(escape_filename("..."), "unnamed");
        assert_eq!(escape_filename("   "), "unnamed");
        assert_eq!(escape_filename("???"), "unnamed");
    }

    #[test]
    fn test_escape_filename_trims_dots_and_spaces() {
        assert_eq!(escape_filename("  name.  "), "name");
    }

    // ==================== escape_markdown_v2 Tests ====================

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown_v2("Hello World"), "Hello World");
        assert_eq!(escape_markdown_v2("Test_file.mp3"), "Test\\_file\\.mp3");
        assert_eq!(escape_markdown_v2("Song [2024]"), "Song \\[2024\\]");
    }

    #[test]
    fn test_escape_markdown_all_special() {
        let input = r"_*[]()~`>#+-=|{}.!";
        let expected = r"\_\*\[\]\(\)\~\`\>\#\+\-\=\|\{\}\.\!";
        assert_eq!(escape_markdown_v2(input), expected);
    }

    #[test]
    fn test_escape_markdown_backslash() {
        assert_eq!(escape_markdown_v2("a\\b"), "a\\\\b");
    }

    // ==================== Formatting Tests ====================

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(61), "1:01");
        assert_eq!(format_duration(213), "3:33");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn test_format_views() {
        assert_eq!(format_views(0), "0");
        assert_eq!(format_views(999), "999");
        assert_eq!(format_views(1000), "1,000");
        assert_eq!(format_views(1234567), "1,234,567");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(47395635), "45.2 MB");
        assert_eq!(format_size(0), "0.0 MB");
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("short", 50), "short");
        let long = "x".repeat(60);
        let cut = truncate_title(&long, 50);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }
}
