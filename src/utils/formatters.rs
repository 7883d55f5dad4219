//! Text and number formatting helpers

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("max_length ({max}) must be greater than or equal to the length of the suffix ({suffix})")]
    SuffixTooLong { max: usize, suffix: usize },

    #[error("Invalid unit type '{0}'")]
    InvalidUnit(String),
}

/// Wrap text in a fenced code block. Blank text gives an empty string.
pub fn code(text: &str, language: Option<&str>) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    format!("```{}\n{}\n```", language.unwrap_or(""), text)
}

/// Render an error as a short `prolog` block:
///
/// ```text
/// [ERROR]: TypeName
///  -> message
/// ```
pub fn error(type_name: &str, message: impl fmt::Display) -> String {
    code(&format!("[ERROR]: {}\n -> {}\n", type_name, message), Some("prolog"))
}

/// Replace `{name}` placeholders in a reply template. Unknown placeholders
/// are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

/// Remove code fences (or inline backticks) around a snippet
pub fn cleanup_code(content: &str) -> String {
    if content.starts_with("```") && content.ends_with("```") {
        let lines: Vec<&str> = content.split('\n').collect();
        if lines.len() < 2 {
            return String::new();
        }
        return lines[1..lines.len() - 1].join("\n");
    }

    content
        .trim_matches(|c| c == '`' || c == ' ' || c == '\n')
        .to_string()
}

/// Upper-case the first letter of every alphanumeric run
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut punctuate = true;
    for c in s.chars() {
        if punctuate {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        punctuate = !c.is_ascii_alphanumeric();
    }
    out
}

/// Cut `input` down to `max_length` characters, ending with `suffix` when
/// something was removed.
pub fn trim_and_add_suffix(input: &str, max_length: usize, suffix: &str) -> Result<String, FormatError> {
    let suffix_len = suffix.chars().count();
    if max_length < suffix_len {
        return Err(FormatError::SuffixTooLong {
            max: max_length,
            suffix: suffix_len,
        });
    }

    if input.chars().count() > max_length {
        let kept: String = input.chars().take(max_length - suffix_len).collect();
        Ok(kept + suffix)
    } else {
        Ok(input.to_string())
    }
}

/// `MM:SS`, or `HH:MM:SS` once there is at least one hour
pub fn timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Shorten large numbers with K/M/B/T suffixes.
///
/// Trailing zeroes are dropped from the decimals unless `pad_decimal`.
pub fn format_number(number: u64, decimal_points: usize, pad_decimal: bool) -> String {
    const SUFFIXES: [&str; 4] = ["K", "M", "B", "T"];

    if number < 1000 {
        return number.to_string();
    }

    let mut magnitude = 0;
    let mut num = number as f64;
    while num >= 1000.0 && magnitude < SUFFIXES.len() {
        magnitude += 1;
        num /= 1000.0;
    }

    let mut formatted = if decimal_points > 0 {
        format!("{:.*}", decimal_points, num)
    } else {
        (num.trunc() as u64).to_string()
    };

    if !pad_decimal && decimal_points > 0 {
        formatted = strip_decimal_zeroes(&formatted);
    }

    format!("{}{}", formatted, SUFFIXES[magnitude - 1])
}

fn strip_decimal_zeroes(number: &str) -> String {
    if !number.contains('.') {
        return number.to_string();
    }
    number.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// What a size is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBase {
    Bytes,
    Bits,
}

/// 1000-based or 1024-based prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePrefix {
    Decimal,
    Binary,
}

impl SizePrefix {
    fn step(self) -> f64 {
        match self {
            SizePrefix::Decimal => 1000.0,
            SizePrefix::Binary => 1024.0,
        }
    }
}

/// A unit of size. `power` 0 units are shared by both prefix families.
#[derive(Debug, PartialEq, Eq)]
pub struct SizeUnit {
    pub short: &'static str,
    pub full: &'static str,
    pub base: SizeBase,
    pub prefix: SizePrefix,
    pub power: i32,
    aliases: &'static [&'static str],
}

macro_rules! unit {
    ($short:literal, $full:literal, $base:ident, $prefix:ident, $power:literal, [$($alias:literal),*]) => {
        SizeUnit {
            short: $short,
            full: $full,
            base: SizeBase::$base,
            prefix: SizePrefix::$prefix,
            power: $power,
            aliases: &[$($alias),*],
        }
    };
}

/// Every known unit and the (lowercase) names that select it.
///
/// `b` means bytes; bits are only selected with `bit` or `bits`.
pub static SIZE_UNITS: &[SizeUnit] = &[
    unit!("B", "bytes", Bytes, Decimal, 0, ["b", "byte", "bytes"]),
    unit!("KB", "kilobytes", Bytes, Decimal, 1, ["kb", "kilobyte", "kilobytes"]),
    unit!("MB", "megabytes", Bytes, Decimal, 2, ["mb", "megabyte", "megabytes"]),
    unit!("GB", "gigabytes", Bytes, Decimal, 3, ["gb", "gigabyte", "gigabytes"]),
    unit!("TB", "terabytes", Bytes, Decimal, 4, ["tb", "terabyte", "terabytes"]),
    unit!("PB", "petabytes", Bytes, Decimal, 5, ["pb", "petabyte", "petabytes"]),
    unit!("KiB", "kibibytes", Bytes, Binary, 1, ["kib", "kibibyte", "kibibytes"]),
    unit!("MiB", "mebibytes", Bytes, Binary, 2, ["mib", "mebibyte", "mebibytes"]),
    unit!("GiB", "gibibytes", Bytes, Binary, 3, ["gib", "gibibyte", "gibibytes"]),
    unit!("TiB", "tebibytes", Bytes, Binary, 4, ["tib", "tebibyte", "tebibytes"]),
    unit!("PiB", "pebibytes", Bytes, Binary, 5, ["pib", "pebibyte", "pebibytes"]),
    unit!("b", "bits", Bits, Decimal, 0, ["bit", "bits"]),
    unit!("Kb", "kilobits", Bits, Decimal, 1, ["kbit", "kilobit", "kilobits"]),
    unit!("Mb", "megabits", Bits, Decimal, 2, ["mbit", "megabit", "megabits"]),
    unit!("Gb", "gigabits", Bits, Decimal, 3, ["gbit", "gigabit", "gigabits"]),
    unit!("Tb", "terabits", Bits, Decimal, 4, ["tbit", "terabit", "terabits"]),
    unit!("Pb", "petabits", Bits, Decimal, 5, ["pbit", "petabit", "petabits"]),
    unit!("Kib", "kibibits", Bits, Binary, 1, ["kibit", "kibibit", "kibibits"]),
    unit!("Mib", "mebibits", Bits, Binary, 2, ["mibit", "mebibit", "mebibits"]),
    unit!("Gib", "gibibits", Bits, Binary, 3, ["gibit", "gibibit", "gibibits"]),
    unit!("Tib", "tebibits", Bits, Binary, 4, ["tibit", "tebibit", "tebibits"]),
    unit!("Pib", "pebibits", Bits, Binary, 5, ["pibit", "pebibit", "pebibits"]),
];

impl SizeUnit {
    /// Look a unit up by any of its names, ignoring case
    pub fn find(name: &str) -> Option<&'static SizeUnit> {
        let name = name.to_lowercase();
        SIZE_UNITS.iter().find(|u| u.aliases.contains(&name.as_str()))
    }

    fn family(base: SizeBase, prefix: SizePrefix) -> impl Iterator<Item = &'static SizeUnit> {
        SIZE_UNITS
            .iter()
            .filter(move |u| u.base == base && (u.power == 0 || u.prefix == prefix))
    }
}

/// Which unit to convert to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitChoice {
    /// Largest unit of the family the size reaches
    Highest(SizeBase, SizePrefix),
    Fixed(&'static SizeUnit),
}

impl Default for UnitChoice {
    fn default() -> Self {
        UnitChoice::Highest(SizeBase::Bytes, SizePrefix::Decimal)
    }
}

impl UnitChoice {
    /// `highest` or any unit name from [`SIZE_UNITS`]
    pub fn parse(name: &str) -> Result<Self, FormatError> {
        if name.eq_ignore_ascii_case("highest") {
            return Ok(UnitChoice::default());
        }
        SizeUnit::find(name)
            .map(UnitChoice::Fixed)
            .ok_or_else(|| FormatError::InvalidUnit(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitFormat {
    /// `KB`
    #[default]
    Short,
    /// `kilobytes`
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitCase {
    #[default]
    Standard,
    Lowercase,
    Uppercase,
    Capitalized,
}

/// Options for [`format_size`]
#[derive(Debug, Clone)]
pub struct SizeFormat {
    pub decimal_places: usize,
    pub unit: UnitChoice,
    pub unit_format: UnitFormat,
    pub case: UnitCase,
    pub separator: String,
    /// Keep trailing zeroes in the decimals
    pub fix_decimal: bool,
}

impl Default for SizeFormat {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            unit: UnitChoice::default(),
            unit_format: UnitFormat::Short,
            case: UnitCase::Standard,
            separator: " ".to_string(),
            fix_decimal: false,
        }
    }
}

/// A converted size. `Display` gives number, separator and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedSize {
    pub value: f64,
    pub unit: String,
    decimal_places: usize,
    fix_decimal: bool,
    separator: String,
}

impl FormattedSize {
    pub fn number(&self) -> String {
        if self.decimal_places == 0 {
            return (self.value.trunc() as u64).to_string();
        }
        let formatted = format!("{:.*}", self.decimal_places, self.value);
        if self.fix_decimal {
            formatted
        } else {
            strip_decimal_zeroes(&formatted)
        }
    }
}

impl fmt::Display for FormattedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.number(), self.separator, self.unit)
    }
}

/// Convert a byte count to another unit.
///
/// ```
/// use cogbot::utils::formatters::{format_size, SizeFormat};
///
/// assert_eq!(format_size(1500, &SizeFormat::default()).to_string(), "1.5 KB");
/// ```
pub fn format_size(size_bytes: u64, options: &SizeFormat) -> FormattedSize {
    let (base, prefix) = match options.unit {
        UnitChoice::Highest(base, prefix) => (base, prefix),
        UnitChoice::Fixed(unit) => (unit.base, unit.prefix),
    };

    let size = match base {
        SizeBase::Bytes => size_bytes as f64,
        SizeBase::Bits => size_bytes as f64 * 8.0,
    };
    let step = prefix.step();

    let (unit, value) = match options.unit {
        UnitChoice::Fixed(unit) => (unit, size / step.powi(unit.power)),
        UnitChoice::Highest(..) => {
            let mut family: Vec<&'static SizeUnit> = SizeUnit::family(base, prefix).collect();
            family.sort_by_key(|u| std::cmp::Reverse(u.power));
            let smallest = family[family.len() - 1];
            family
                .iter()
                .find(|u| size >= step.powi(u.power))
                .map(|u| (*u, size / step.powi(u.power)))
                .unwrap_or((smallest, size))
        }
    };

    let name = match options.unit_format {
        UnitFormat::Short => unit.short,
        UnitFormat::Full => unit.full,
    };
    let unit_str = match options.case {
        UnitCase::Standard => name.to_string(),
        UnitCase::Lowercase => name.to_lowercase(),
        UnitCase::Uppercase => name.to_uppercase(),
        UnitCase::Capitalized => capitalize(name),
    };

    FormattedSize {
        value,
        unit: unit_str,
        decimal_places: options.decimal_places,
        fix_decimal: options.fix_decimal,
        separator: options.separator.clone(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
