//! Minimal TOML parser for the embedded settings file
//!
//! Handles only the subset `marquee.toml` uses, without an allocator.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers: broker, display, link, portal
//! - Comments (# ...), including trailing comments
//!
//! Keys the parser does not know are skipped so older firmware can read a
//! newer file. Values that do not fit their field are errors.

use heapless::String as HString;

use marquee_core::config::Settings;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// String longer than its field
    TooLong,
    /// Key/value line outside any section
    MissingSection,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Broker,
    Display,
    Link,
    Portal,
}

/// Parse TOML text into settings, starting from the built-in defaults
pub fn parse_settings(input: &str) -> Result<Settings, ParseError> {
    let mut settings = Settings::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut settings)?;
        }
    }

    Ok(settings)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "broker" => Ok(Section::Broker),
        "display" => Ok(Section::Display),
        "link" => Ok(Section::Link),
        "portal" => Ok(Section::Portal),
        _ => Err(ParseError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Strip a trailing comment unless the '#' sits inside a string
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string<const N: usize>(value: &str) -> Result<HString<N>, ParseError> {
    let text = if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    };
    HString::try_from(text).map_err(|_| ParseError::TooLong)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    settings: &mut Settings,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::MissingSection),
        Section::Broker => {
            let broker = &mut settings.broker;
            match key {
                "host" => broker.host = parse_string(value)?,
                "port" => broker.port = parse_int(value)?,
                "user" => broker.user = parse_string(value)?,
                "key" => broker.key = parse_string(value)?,
                "anonymous" => broker.anonymous = parse_bool(value)?,
                "topic" => broker.topic = parse_string(value)?,
                _ => {}
            }
        }
        Section::Display => {
            let display = &mut settings.display;
            match key {
                "modules" => {
                    display.modules = parse_int(value)?;
                    if display.modules == 0 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "scroll_interval_ms" => {
                    display.scroll_interval_ms = parse_int(value)?;
                    if display.scroll_interval_ms == 0 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "char_spacing" => display.char_spacing = parse_int(value)?,
                "end_gap" => display.end_gap = Some(parse_int(value)?),
                "intensity" => {
                    display.intensity = parse_int(value)?;
                    if display.intensity > 15 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "reverse_columns" => display.reverse_columns = parse_bool(value)?,
                _ => {}
            }
        }
        Section::Link => {
            let link = &mut settings.link;
            match key {
                "retry_ceiling" => link.retry_ceiling = parse_int(value)?,
                "retry_delay_ms" => link.retry_delay_ms = parse_int(value)?,
                "ping_interval_ms" => link.ping_interval_ms = parse_int(value)?,
                "connect_timeout_ms" => link.connect_timeout_ms = parse_int(value)?,
                "ping_timeout_ms" => link.ping_timeout_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Portal => {
            let portal = &mut settings.portal;
            match key {
                "ap_name" => portal.ap_name = parse_string(value)?,
                "ap_password" => portal.ap_password = parse_string(value)?,
                "timeout_s" => portal.timeout_s = parse_int(value)?,
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let input = r#"
# Marquee settings
[broker]
host = "broker.example.net"
port = 8883
user = "display"
key = "s3cret#1"   # hash inside a string survives
anonymous = false
topic = "office/marquee"

[display]
modules = 8
scroll_interval_ms = 40
char_spacing = 2
end_gap = 10
intensity = 7
reverse_columns = true

[link]
retry_ceiling = 7
retry_delay_ms = 1000
ping_interval_ms = 20000

[portal]
ap_name = "Marquee-Setup"
ap_password = "letmein1"
timeout_s = 300
"#;

        let settings = parse_settings(input).unwrap();
        assert_eq!(settings.broker.host.as_str(), "broker.example.net");
        assert_eq!(settings.broker.port, 8883);
        assert_eq!(settings.broker.key.as_str(), "s3cret#1");
        assert_eq!(settings.broker.topic.as_str(), "office/marquee");
        assert_eq!(settings.display.modules, 8);
        assert_eq!(settings.display.end_gap, Some(10));
        assert!(settings.display.reverse_columns);
        assert_eq!(settings.link.retry_ceiling, 7);
        assert_eq!(settings.link.ping_timeout_ms, 2_000);
        assert_eq!(settings.portal.ap_name.as_str(), "Marquee-Setup");
        assert_eq!(settings.portal.timeout_s, 300);
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_settings("").unwrap(), Settings::new());
        assert_eq!(parse_settings("# nothing here\n\n").unwrap(), Settings::new());
    }

    #[test]
    fn test_unknown_key_skipped() {
        let settings = parse_settings("[broker]\ncolour = \"red\"\nport = 1884\n").unwrap();
        assert_eq!(settings.broker.port, 1884);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert_eq!(
            parse_settings("[stepper]\nspeed = 3\n"),
            Err(ParseError::InvalidSection)
        );
    }

    #[test]
    fn test_key_outside_section_rejected() {
        assert_eq!(
            parse_settings("port = 1883\n"),
            Err(ParseError::MissingSection)
        );
    }

    #[test]
    fn test_overlong_string_rejected() {
        let input = "[broker]\nuser = \"abcdefghijklmnopqrstuvwxyz\"\n";
        assert_eq!(parse_settings(input), Err(ParseError::TooLong));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert_eq!(
            parse_settings("[broker]\nport = 70000\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_settings("[display]\nintensity = 16\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_settings("[display]\nmodules = 0\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_settings("[broker]\nanonymous = yes\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a = 1"), Some(("a", "1")));
        assert_eq!(parse_key_value("a = 1 # note"), Some(("a", "1")));
        assert_eq!(parse_key_value("a = "), None);
        assert_eq!(parse_key_value("no equals"), None);
    }
}
