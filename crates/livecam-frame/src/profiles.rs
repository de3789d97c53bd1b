//! Camera profile database.
//!
//! Maps a profile name to the raw layout and row alignment a camera (or
//! capture tool) produces. Profile files are embedded at compile time from
//! `contrib/profiles/*.toml`.

use crate::layout::RawLayout;
use serde::Deserialize;
use std::sync::OnceLock;

const PROFILE_GENERIC_I420: &str = include_str!("../../../contrib/profiles/generic-i420.toml");
const PROFILE_ANDROID_NV21: &str = include_str!("../../../contrib/profiles/android-nv21.toml");
const PROFILE_V4L2_NV12: &str = include_str!("../../../contrib/profiles/v4l2-nv12.toml");

static PROFILE_DB: OnceLock<Vec<Profile>> = OnceLock::new();

/// Top-level profile file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub profile: ProfileInfo,
    pub layout: LayoutInfo,
}

/// The `[profile]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The `[layout]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutInfo {
    pub format: RawLayout,
    #[serde(default = "default_row_alignment")]
    pub row_alignment: usize,
}

fn default_row_alignment() -> usize {
    1
}

impl Profile {
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

/// Parse one profile file.
pub fn parse_profile(src: &str) -> Result<Profile, toml::de::Error> {
    toml::from_str(src)
}

fn profile_db() -> &'static Vec<Profile> {
    PROFILE_DB.get_or_init(|| {
        let mut db = Vec::new();
        for src in [PROFILE_GENERIC_I420, PROFILE_ANDROID_NV21, PROFILE_V4L2_NV12] {
            match parse_profile(src) {
                Ok(p) if p.layout.row_alignment > 0 => db.push(p),
                Ok(p) => tracing::warn!(profile = %p.profile.name, "profile has zero row alignment; skipped"),
                Err(e) => tracing::warn!(error = %e, "bad profile TOML; skipped"),
            }
        }
        db
    })
}

/// Look up a profile by name.
pub fn lookup_profile(name: &str) -> Option<&'static Profile> {
    profile_db().iter().find(|p| p.profile.name == name)
}

/// List all known profiles.
pub fn list_profiles() -> &'static [Profile] {
    profile_db()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_profiles_parse() {
        assert_eq!(list_profiles().len(), 3);
    }

    #[test]
    fn test_lookup_profile() {
        let p = lookup_profile("android-nv21").unwrap();
        assert_eq!(p.layout.format, RawLayout::Nv21);
        assert_eq!(p.layout.row_alignment, 64);
        assert!(lookup_profile("missing").is_none());
    }

    #[test]
    fn test_parse_profile_default_alignment() {
        let p = parse_profile(
            r#"
            [profile]
            name = "test"

            [layout]
            format = "yv12"
            "#,
        )
        .unwrap();
        assert_eq!(p.name(), "test");
        assert_eq!(p.layout.format, RawLayout::Yv12);
        assert_eq!(p.layout.row_alignment, 1);
        assert!(p.profile.description.is_empty());
    }

    #[test]
    fn test_parse_profile_rejects_unknown_format() {
        let err = parse_profile(
            r#"
            [profile]
            name = "bad"

            [layout]
            format = "rgb24"
            "#,
        );
        assert!(err.is_err());
    }
}
