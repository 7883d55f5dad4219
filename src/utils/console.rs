//! Console helpers: color stripping, centered printing, platform detection

use std::io::IsTerminal;
use std::sync::OnceLock;

use regex_lite::Regex;

fn color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid color regex"))
}

/// Strip all ANSI color codes from a string
pub fn strip_color(text: &str) -> String {
    color_regex().replace_all(text, "").into_owned()
}

/// Current terminal width, if stdout is a terminal
pub fn terminal_width() -> Option<usize> {
    if !std::io::stdout().is_terminal() {
        return None;
    }
    crossterm::terminal::size().ok().map(|(cols, _)| cols as usize)
}

/// Center `text` within `width` columns, ignoring color codes when measuring
pub fn center(text: &str, width: usize, fill: char) -> String {
    let visible = strip_color(text).chars().count();
    if visible >= width {
        return text.to_string();
    }
    let total = width - visible;
    let left = total / 2;
    let right = total - left;
    let pad = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
    format!("{}{}{}", pad(left), text, pad(right))
}

/// Print text in the middle of the terminal if possible, and normally if not
pub fn mprint(text: &str) {
    match terminal_width() {
        Some(width) => println!("{}", center(text, width, ' ').trim_end()),
        None => println!("{}", text),
    }
}

/// Whether we are running inside a Docker container
pub fn is_docker() -> bool {
    if std::path::Path::new("/.dockerenv").exists() {
        return true;
    }
    std::fs::read_to_string("/proc/self/cgroup")
        .map(|cgroup| cgroup.lines().any(|line| line.contains("docker")))
        .unwrap_or(false)
}

/// Whether log output to stderr should carry ANSI colors
pub fn stderr_supports_color() -> bool {
    let is_tty = std::io::stderr().is_terminal();

    if std::env::var_os("PYCHARM_HOSTED").is_some()
        || std::env::var("TERM_PROGRAM").map(|v| v == "vscode").unwrap_or(false)
    {
        return is_tty;
    }

    if cfg!(windows) {
        return is_tty
            && (std::env::var_os("ANSICON").is_some() || std::env::var_os("WT_SESSION").is_some());
    }

    // Docker does not consistently have a tty attached
    is_tty || is_docker()
}

/// Human readable platform name
pub fn detect_platform() -> String {
    if std::env::var_os("ANDROID_ROOT").is_some() {
        return match std::env::var("TERMUX_APP__APK_RELEASE") {
            Ok(release) if release == "F_DROID" => "android/termux-(f-droid)".to_string(),
            Ok(_) => "android/termux-(google play store)".to_string(),
            Err(_) => "android".to_string(),
        };
    }

    match std::env::consts::OS {
        "linux" => format!("linux/{}", std::env::consts::ARCH),
        "macos" => format!("macos/{}", std::env::consts::ARCH),
        "windows" => format!("windows/{}", std::env::consts::ARCH),
        "" => "other".to_string(),
        other => other.to_string(),
    }
}

/// Log crate and platform versions
pub fn print_versions() {
    tracing::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("platform {}", detect_platform());
}

/// Log the detected terminal size
pub fn print_terminal_size() {
    match crossterm::terminal::size() {
        Ok((cols, rows)) => tracing::info!("detected current terminal size: {}x{}", cols, rows),
        Err(_) => tracing::warn!("could not detect terminal size"),
    }
}
