//! Filename normalization steps
//!
//! Vendors spell the same code family several ways (`WVR-1001`, `WVR-10-001`,
//! `WVR-100001`). Each rewrite below collapses one spelling; they run in the
//! listed order and later steps rely on the output of earlier ones.

use once_cell::sync::Lazy;
use regex::Regex;

/// One named, case-insensitive rewrite anchored on a literal
pub struct Rewrite {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    /// Replace every occurrence rather than the first
    global: bool,
}

impl Rewrite {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(&format!("(?i){}", pattern)).expect("valid rewrite pattern"),
            replacement,
            global: false,
        }
    }

    fn global(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            global: true,
            ..Self::new(name, pattern, replacement)
        }
    }

    pub fn apply(&self, name: &str) -> String {
        if self.global {
            self.pattern.replace_all(name, self.replacement).into_owned()
        } else {
            self.pattern.replace(name, self.replacement).into_owned()
        }
    }
}

static REWRITES: Lazy<Vec<Rewrite>> = Lazy::new(|| {
    vec![
        Rewrite::global("strip_180_lr", r"\.180\.LR\b", ""),
        Rewrite::new("strip_scene_prefix", r"^scene-\d+\.", ""),
        Rewrite::global(
            "strip_depth_estimation",
            r"\bdiv-\d+\.\d+ con-\d+\.\d+ fg-\d+\.\d+ ipd-\d+\b",
            "",
        ),
        Rewrite::new("wvr1_padded", r"^WVR-10*?(\D)", "WVR1${1}"),
        Rewrite::new("wvr1_digit", r"^WVR-1(\d)", "WVR1${1}"),
        Rewrite::new("wvr11_dash", r"^WVR-11-(\d\d\d)", "WVR1-${1}"),
        Rewrite::new("wvr2_dash", r"^WVR-2-(\d\d\d)", "WVR1-${1}"),
        Rewrite::new("wvr101", r"^WVR-101(\d\d\d)", "WVR1${1}"),
        Rewrite::new("wvr11", r"^WVR-11(\d\d\d)", "WVR1${1}"),
        Rewrite::new("wvr2", r"^WVR-2(\d)", "WVR1${1}"),
        Rewrite::new("wvr6d_dash", r"^WVR6D-", "WVR6-"),
        Rewrite::new("wvr6_dash_d", r"^WVR6-D(\d)", "WVR6-${1}"),
        Rewrite::new("wvr6d", r"^WVR6D(\d\d\d)", "WVR6${1}"),
        Rewrite::new("wvr8_short", r"^WVR8(\d\d\w)\b", "WVR80${1}"),
        Rewrite::new("wvr8_dash", r"^WVR-0*8", "WVR8"),
        Rewrite::new("wvr9_dash", r"^WVR-9(\d\d\d)", "WVR9${1}"),
        Rewrite::new("wvr9_letter", r"^WVR9[cd]\b", "WVR9"),
        Rewrite::new("wvr9_letter_digit", r"^WVR9[cd](\d)", "WVR9${1}"),
        Rewrite::new("wvr91", r"^WVR-91(\d\d\d)", "WVR9${1}"),
        Rewrite::new("3dsvr", r"^3DSVR(\b|\d)", "DSVR${1}"),
    ]
});

/// Resolution, codec and download-site tokens removed after the extension
static DECORATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)[-_]mkx199",
        r"(?i)[-_]mkx219",
        r"(?i)[-_]*(299|320|640|720|\d\d\d\d)p",
        r"(?i)179-SBS\b",
        r"(?i)179_LR\b",
        r"(?i)_\d+-SLR\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid decoration pattern"))
    .collect()
});

/// The ordered rewrite pipeline
pub fn rewrites() -> &'static [Rewrite] {
    &REWRITES
}

/// Run every rewrite in order
pub fn apply_rewrites(name: &str) -> String {
    REWRITES
        .iter()
        .fold(name.to_string(), |acc, step| step.apply(&acc))
}

/// Remove resolution and download decorations
pub fn strip_decorations(name: &str) -> String {
    DECORATIONS
        .iter()
        .fold(name.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

/// Canonical release number: at least 3 digits, no leading zero beyond that
///
/// `7` → `007`, `0051` → `051`, `00404` → `404`, `1234` unchanged.
pub fn normalize_release_id(id: &str) -> String {
    let mut id = format!("{:0>3}", id);
    while id.len() >= 4 && id.starts_with('0') {
        id.remove(0);
    }
    id
}
