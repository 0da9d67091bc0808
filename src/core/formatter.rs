//! Pattern-based record formatting
//!
//! A pattern is compiled once into a list of items; rendering a record walks
//! the list and appends to a single `String`.
//!
//! | Directive | Output |
//! |-----------|--------|
//! | `%d{fmt}` | timestamp in strftime `fmt` (default `%H:%M:%S`) |
//! | `%t`      | thread name or id |
//! | `%c`      | logger name |
//! | `%f`      | source file |
//! | `%l`      | source line |
//! | `%p`      | level |
//! | `%T`      | tab |
//! | `%m`      | payload |
//! | `%n`      | newline |
//! | `%%`      | literal `%` |

use super::error::{LoggerError, Result};
use super::log_record::LogRecord;
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write;

/// Pattern used when a logger is built without one
pub const DEFAULT_PATTERN: &str = "[%d{%H:%M:%S}][%t][%c][%f:%l][%p]%T%m%n";

const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Renders a record into one complete, newline-terminated line.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormatItem {
    Literal(String),
    Time(String),
    Thread,
    Logger,
    File,
    Line,
    Level,
    Tab,
    Message,
    Newline,
}

#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    items: Vec<FormatItem>,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
}

impl PatternFormatter {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns `FormatPattern` for a trailing lone `%`, an unterminated
    /// `{`, an unknown directive or a `{...}` argument on a directive that
    /// takes none.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let items = Self::parse(&pattern)?;
        Ok(Self {
            pattern,
            items,
            use_colors: false,
        })
    }

    /// Color the level text with ANSI escapes (console output only)
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn parse(pattern: &str) -> Result<Vec<FormatItem>> {
        let mut items = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((_, ch)) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }

            let Some((pos, key)) = chars.next() else {
                return Err(LoggerError::format_pattern(pattern, "trailing '%' without directive"));
            };
            if key == '%' {
                literal.push('%');
                continue;
            }

            // Optional `{...}` argument right after the directive
            let mut arg = None;
            if let Some(&(_, '{')) = chars.peek() {
                let start = pos + key.len_utf8() + 1;
                let Some(len) = pattern[start..].find('}') else {
                    return Err(LoggerError::format_pattern(
                        pattern,
                        format!("unterminated '{{' after '%{}'", key),
                    ));
                };
                arg = Some(pattern[start..start + len].to_string());
                while let Some(&(idx, _)) = chars.peek() {
                    if idx > start + len {
                        break;
                    }
                    chars.next();
                }
            }

            if !literal.is_empty() {
                items.push(FormatItem::Literal(std::mem::take(&mut literal)));
            }

            let item = match key {
                'd' => {
                    let fmt = arg.clone()
                        .filter(|fmt| !fmt.is_empty())
                        .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
                    if StrftimeItems::new(&fmt).any(|item| item == Item::Error) {
                        return Err(LoggerError::format_pattern(
                            pattern,
                            format!("invalid time format '{}'", fmt),
                        ));
                    }
                    FormatItem::Time(fmt)
                }
                't' => FormatItem::Thread,
                'c' => FormatItem::Logger,
                'f' => FormatItem::File,
                'l' => FormatItem::Line,
                'p' => FormatItem::Level,
                'T' => FormatItem::Tab,
                'm' => FormatItem::Message,
                'n' => FormatItem::Newline,
                other => {
                    return Err(LoggerError::format_pattern(
                        pattern,
                        format!("unknown directive '%{}'", other),
                    ))
                }
            };
            if arg.is_some() && key != 'd' {
                return Err(LoggerError::format_pattern(
                    pattern,
                    format!("'%{}' takes no argument", key),
                ));
            }
            items.push(item);
        }

        if !literal.is_empty() {
            items.push(FormatItem::Literal(literal));
        }
        Ok(items)
    }

    fn write_level(&self, out: &mut String, record: &LogRecord) {
        #[cfg(feature = "console")]
        if self.use_colors {
            use colored::Colorize;
            let _ = write!(out, "{}", record.level.to_str().color(record.level.color_code()));
            return;
        }
        out.push_str(record.level.to_str());
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            items: vec![
                FormatItem::Literal("[".to_string()),
                FormatItem::Time(DEFAULT_TIME_FORMAT.to_string()),
                FormatItem::Literal("][".to_string()),
                FormatItem::Thread,
                FormatItem::Literal("][".to_string()),
                FormatItem::Logger,
                FormatItem::Literal("][".to_string()),
                FormatItem::File,
                FormatItem::Literal(":".to_string()),
                FormatItem::Line,
                FormatItem::Literal("][".to_string()),
                FormatItem::Level,
                FormatItem::Literal("]".to_string()),
                FormatItem::Tab,
                FormatItem::Message,
                FormatItem::Newline,
            ],
            use_colors: false,
        }
    }
}

impl Formatter for PatternFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(64 + record.payload.len());
        for item in &self.items {
            match item {
                FormatItem::Literal(text) => out.push_str(text),
                FormatItem::Time(fmt) => {
                    let _ = write!(out, "{}", record.timestamp.format(fmt));
                }
                FormatItem::Thread => out.push_str(record.thread_label()),
                FormatItem::Logger => out.push_str(&record.logger_name),
                FormatItem::File => out.push_str(&record.file),
                FormatItem::Line => {
                    let _ = write!(out, "{}", record.line);
                }
                FormatItem::Level => self.write_level(&mut out, record),
                FormatItem::Tab => out.push('\t'),
                FormatItem::Message => out.push_str(&record.payload),
                FormatItem::Newline => out.push('\n'),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::{Local, TimeZone};

    fn record() -> LogRecord {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        let mut record = LogRecord::new("net", "server.rs", 42, LogLevel::Warn, "listening");
        record.thread_name = Some("main".to_string());
        record.with_timestamp(ts)
    }

    #[test]
    fn test_default_pattern_matches_compiled() {
        let compiled = PatternFormatter::new(DEFAULT_PATTERN).unwrap();
        assert_eq!(compiled.items, PatternFormatter::default().items);
    }

    #[test]
    fn test_default_layout() {
        let line = PatternFormatter::default().format(&record());
        assert_eq!(line, "[07:05:03][main][net][server.rs:42][WARN]\tlistening\n");
    }

    #[test]
    fn test_custom_time_and_escape() {
        let formatter = PatternFormatter::new("%d{%Y-%m-%d} 100%% %p %m%n").unwrap();
        assert_eq!(formatter.format(&record()), "2024-03-09 100% WARN listening\n");
    }

    #[test]
    fn test_empty_time_argument_uses_default() {
        let formatter = PatternFormatter::new("%d{}|%m").unwrap();
        assert_eq!(formatter.format(&record()), "07:05:03|listening");
    }

    #[test]
    fn test_message_only() {
        let formatter = PatternFormatter::new("%m").unwrap();
        assert_eq!(formatter.format(&record()), "listening");
    }

    #[test]
    fn test_invalid_patterns() {
        let err = PatternFormatter::new("abc%").unwrap_err();
        assert!(matches!(err, LoggerError::FormatPattern { .. }));

        let err = PatternFormatter::new("%d{%H").unwrap_err();
        assert!(err.to_string().contains("unterminated"));

        let err = PatternFormatter::new("%q").unwrap_err();
        assert!(err.to_string().contains("unknown directive '%q'"));

        let err = PatternFormatter::new("%d{%Q}").unwrap_err();
        assert!(err.to_string().contains("invalid time format"));
    }

    #[test]
    fn test_argument_only_allowed_on_time() {
        let err = PatternFormatter::new("%m{x}%n").unwrap_err();
        assert!(matches!(err, LoggerError::FormatPattern { .. }));
        assert!(err.to_string().contains("'%m' takes no argument"));

        assert!(PatternFormatter::new("%p{}").is_err());
        assert!(PatternFormatter::new("%d{%Y} %m").is_ok());
    }

    #[test]
    fn test_non_ascii_literals() {
        let formatter = PatternFormatter::new("日志 %c → %m").unwrap();
        assert_eq!(formatter.format(&record()), "日志 net → listening");
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_colored_level() {
        colored::control::set_override(true);
        let formatter = PatternFormatter::new("%p").unwrap().with_colors(true);
        let line = formatter.format(&record());
        assert!(line.contains("WARN"));
        assert!(line.contains("\u{1b}["));
    }
}
