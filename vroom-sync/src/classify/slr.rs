//! SLR/DeoVR download naming convention
//!
//! `SLR_<studio>_<title>_<resolution>_<id>_<projection>.mp4`, as produced by the
//! SexLikeReal and DeoVR download buttons. Files in this convention carry their
//! own site id and are never given a studio-code identity.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static SLR_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(SLR|DeoVR|JillVR)_(.+?)_(.+)_(original|\d+p)_(\d+)_(LR_180|TB_360|FISHEYE190_alpha|FISHEYE190|FISHEYE|MKX200)(\.fix|\.mp4)?\.mp4$",
    )
    .expect("valid SLR pattern")
});

/// Fields parsed from an SLR-style filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlrInfo {
    pub site: String,
    pub studio: String,
    pub title: String,
    /// `original` or e.g. `2900p`
    pub resolution: String,
    pub slr_id: u64,
    /// Projection tag; the `_alpha` passthrough flavour is folded into `FISHEYE190`
    pub projection: String,
}

/// Parse a bare filename in the SLR download convention
pub fn parse(filename: &str) -> Option<SlrInfo> {
    let caps = SLR_NAME.captures(filename)?;

    let projection = match &caps[6] {
        p if p.eq_ignore_ascii_case("FISHEYE190_alpha") => "FISHEYE190".to_string(),
        p => p.to_string(),
    };

    Some(SlrInfo {
        site: caps[1].to_string(),
        studio: caps[2].to_string(),
        title: caps[3].to_string(),
        resolution: caps[4].to_string(),
        slr_id: caps[5].parse().ok()?,
        projection,
    })
}
