//! Build script for marquee-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates marquee.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_settings();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Field lengths enforced by the firmware's bounded strings
const STRING_LIMITS: &[(&str, &str, usize)] = &[
    ("broker", "host", 64),
    ("broker", "user", 20),
    ("broker", "key", 32),
    ("broker", "topic", 64),
    ("portal", "ap_name", 32),
    ("portal", "ap_password", 64),
];

/// Integer ranges enforced by the firmware parser
const INT_LIMITS: &[(&str, &str, i64, i64)] = &[
    ("broker", "port", 1, 65535),
    ("display", "modules", 1, 255),
    ("display", "scroll_interval_ms", 1, 65535),
    ("display", "char_spacing", 0, 255),
    ("display", "end_gap", 0, 255),
    ("display", "intensity", 0, 15),
    ("link", "retry_ceiling", 0, 255),
    ("link", "retry_delay_ms", 0, u32::MAX as i64),
    ("link", "ping_interval_ms", 1, u32::MAX as i64),
    ("link", "connect_timeout_ms", 1, u32::MAX as i64),
    ("link", "ping_timeout_ms", 1, u32::MAX as i64),
    ("portal", "timeout_s", 1, 65535),
];

const SECTIONS: &[&str] = &["broker", "display", "link", "portal"];

/// Validate marquee.toml at compile time
fn validate_settings() {
    println!("cargo:rerun-if-changed=marquee.toml");

    let path = Path::new("marquee.toml");
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read marquee.toml", &[e.to_string()]),
    };

    let settings: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in marquee.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();

    if let Some(table) = settings.as_table() {
        for (name, value) in table {
            if !SECTIONS.contains(&name.as_str()) {
                errors.push(format!("unknown section [{}]", name));
            } else if !value.is_table() {
                errors.push(format!("[{}] must be a table", name));
            }
        }
    }

    for (section, key, max) in STRING_LIMITS {
        match settings.get(section).and_then(|s| s.get(key)) {
            Some(toml::Value::String(text)) if text.len() > *max => {
                errors.push(format!("[{}] {} longer than {} bytes", section, key, max))
            }
            Some(toml::Value::String(_)) | None => {}
            Some(_) => errors.push(format!("[{}] {} must be a string", section, key)),
        }
    }

    for (section, key, min, max) in INT_LIMITS {
        match settings.get(section).and_then(|s| s.get(key)) {
            Some(toml::Value::Integer(n)) if n < min || n > max => {
                errors.push(format!("[{}] {} must be {}-{}", section, key, min, max))
            }
            Some(toml::Value::Integer(_)) | None => {}
            Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
        }
    }

    if !errors.is_empty() {
        fail("Invalid settings in marquee.toml", &errors);
    }

    println!("cargo:warning=marquee.toml validated successfully");
}

fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let line = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", line)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}
