//! Filename identity classification
//!
//! Extracts a `(studio, id, variant)` release identity from a media filename:
//! exclusions → ordered rewrites → extension and decoration stripping →
//! one structural match → year tie-break → variant and id normalization.
//! A filename that does not fit the convention is a miss (`Ok(None)`), not an error.

pub mod normalize;
pub mod slr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::trace;
use vroom_common::{Error, Result};

pub use normalize::normalize_release_id;
pub use slr::SlrInfo;

/// `<studio><connector><id>[<connector><variant>]`
static RELEASE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(WVR0|WVR1|WVR4|WVR8|WVR9|WVR6|[a-z]{3,9})([-_\s\.0]*?)(\d{2,6})(?:([-_\s\.0]*?|vrv18khia)(\d\d?(?:\b|_)|[a-z]\b|part\d+))?",
    )
    .expect("valid release pattern")
});

static PART_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^part").expect("valid part pattern"));

static TRAILING_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\D+$").expect("valid noise pattern"));

/// Legacy 180° export suffix that reuses release-like numbers
const LEGACY_SUFFIX: &str = "-180_180x180_3dh_LR.mp4";

/// Vendors whose filenames embed numbers that are not release ids
const VENDOR_PREFIXES: [&str; 8] = [
    "SLR-",
    "SLR_",
    "JillVR_",
    "realhotvr-",
    "wankzvr-",
    "reality-lovers-",
    "sexbabesvr-",
    "only2xvr-",
];

/// Years in this range are treated as dates, not release numbers
const YEAR_RANGE: std::ops::RangeInclusive<u32> = 2010..=2029;

/// Structured release identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Uppercased studio code
    pub studio: String,
    /// Connector text between studio code and release number
    pub mid: String,
    /// Release number, normalized with [`normalize_release_id`]
    pub numeric_id: String,
    /// Uppercased part/take marker, empty when absent
    pub variant: String,
}

/// Filename classifier
#[derive(Debug, Clone)]
pub struct IdentityClassifier {
    extension: Option<Regex>,
}

impl IdentityClassifier {
    /// Build a classifier stripping the given video extensions (without dots)
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self> {
        let mut alternatives: Vec<String> = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| regex::escape(&e))
            .collect();
        alternatives.sort();
        alternatives.dedup();

        let extension = if alternatives.is_empty() {
            None
        } else {
            let pattern = format!(r"(?i)\.({})$", alternatives.join("|"));
            let re = Regex::new(&pattern)
                .map_err(|e| Error::Config(format!("Invalid extension list: {}", e)))?;
            Some(re)
        };

        Ok(Self { extension })
    }

    /// Classify a filename or path (only the basename is examined)
    pub fn classify(&self, path: &str) -> Result<Option<Identity>> {
        let filename = basename(path);
        if filename.is_empty() {
            return Err(Error::InvalidInput(format!("No filename in {:?}", path)));
        }

        if let Some(reason) = exclusion(filename) {
            trace!(filename, reason, "Excluded from release classification");
            return Ok(None);
        }

        let cleaned = self.normalize(filename);
        let Some(caps) = RELEASE_PATTERN.captures(&cleaned) else {
            return Ok(None);
        };

        let raw_id = &caps[3];
        if raw_id.len() == 4 && raw_id.parse::<u32>().map_or(false, |y| YEAR_RANGE.contains(&y)) {
            trace!(filename, year = raw_id, "Release number looks like a year");
            return Ok(None);
        }

        let variant = caps.get(5).map(|m| clean_variant(m.as_str())).unwrap_or_default();

        Ok(Some(Identity {
            studio: caps[1].to_uppercase(),
            mid: caps[2].to_string(),
            numeric_id: normalize_release_id(raw_id),
            variant,
        }))
    }

    /// Rewritten name with extension and decorations removed
    ///
    /// Classifying `normalize(name)` plus an extension yields the same identity
    /// as classifying `name`.
    pub fn normalize(&self, filename: &str) -> String {
        let rewritten = normalize::apply_rewrites(filename);
        let stripped = match &self.extension {
            Some(re) => re.replace(&rewritten, "").into_owned(),
            None => rewritten,
        };
        normalize::strip_decorations(&stripped)
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn exclusion(filename: &str) -> Option<&'static str> {
    if slr::parse(filename).is_some() {
        return Some("slr convention");
    }
    if filename.ends_with(LEGACY_SUFFIX) {
        return Some("legacy suffix");
    }
    let lower = filename.to_ascii_lowercase();
    if VENDOR_PREFIXES
        .iter()
        .any(|p| lower.starts_with(&p.to_ascii_lowercase()))
    {
        return Some("vendor prefix");
    }
    None
}

fn clean_variant(raw: &str) -> String {
    let without_part = PART_PREFIX.replace(raw, "");
    TRAILING_NOISE
        .replace(&without_part, "${1}")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IdentityClassifier {
        IdentityClassifier::new(&["mp4", "m4v", "mkv", "avi", "webm", "wmv", "mov"]).unwrap()
    }

    fn identity(studio: &str, mid: &str, id: &str, variant: &str) -> Option<Identity> {
        Some(Identity {
            studio: studio.to_string(),
            mid: mid.to_string(),
            numeric_id: id.to_string(),
            variant: variant.to_string(),
        })
    }

    #[test]
    fn test_basic_release() {
        let c = classifier();
        assert_eq!(
            c.classify("CBIKMV-068.24399-SLR.mp4").unwrap(),
            identity("CBIKMV", "-", "068", "")
        );
        assert_eq!(
            c.classify("dandyhqvr-011-b.MP4").unwrap(),
            identity("DANDYHQVR", "-", "011", "B")
        );
    }

    #[test]
    fn test_path_uses_basename() {
        let c = classifier();
        assert_eq!(
            c.classify("/media/vr/dandyhqvr-011-b.MP4").unwrap(),
            identity("DANDYHQVR", "-", "011", "B")
        );
        assert_eq!(
            c.classify(r"D:\vr\cafr333.mp4").unwrap(),
            identity("CAFR", "", "333", "")
        );
    }

    #[test]
    fn test_empty_filename_is_error() {
        let c = classifier();
        assert!(matches!(c.classify(""), Err(Error::InvalidInput(_))));
        assert!(matches!(c.classify("/media/vr/"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_vendor_prefix_case_insensitive() {
        let c = classifier();
        assert_eq!(c.classify("WankzVR-Some-Title-180.mp4").unwrap(), None);
        assert_eq!(c.classify("slr-AsianSexVR-Title-1920p-48493-LR-180.mp4").unwrap(), None);
    }

    #[test]
    fn test_clean_variant() {
        assert_eq!(clean_variant("part2"), "2");
        assert_eq!(clean_variant("PART12"), "12");
        assert_eq!(clean_variant("1_"), "1");
        assert_eq!(clean_variant("b"), "B");
    }

    #[test]
    fn test_no_extensions_configured() {
        let c = IdentityClassifier::new::<&str>(&[]).unwrap();
        assert_eq!(c.classify("cafr333").unwrap(), identity("CAFR", "", "333", ""));
    }

    #[test]
    fn test_extension_list_normalized() {
        let c = IdentityClassifier::new(&[".MP4", " mkv ", "", "mp4"]).unwrap();
        assert_eq!(c.normalize("ABC-123.mkv"), "ABC-123");
        assert_eq!(c.normalize("ABC-123.mp4"), "ABC-123");
        assert_eq!(c.normalize("ABC-123.avi"), "ABC-123.avi");
    }
}
