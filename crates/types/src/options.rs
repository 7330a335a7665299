//! Patch option type definitions

use apkm_errors::{Error, PatchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Release channel to fetch the base package from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPreference {
    #[default]
    Stable,
    Beta,
    Alpha,
    Custom,
}

impl fmt::Display for VersionPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
            Self::Custom => "custom",
        };
        f.write_str(s)
    }
}

impl clap::ValueEnum for VersionPreference {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Stable, Self::Beta, Self::Alpha, Self::Custom]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Stable => clap::builder::PossibleValue::new("stable"),
            Self::Beta => clap::builder::PossibleValue::new("beta"),
            Self::Alpha => clap::builder::PossibleValue::new("alpha"),
            Self::Custom => clap::builder::PossibleValue::new("custom"),
        })
    }
}

/// An ARGB color, `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    /// The default Aliucord background color.
    pub const ALIUCORD: Color = Color(0xFF00_C853);
    /// The default Wintry background color.
    pub const WINTRY: Color = Color(0xFF13_3E87);
    /// The new Discord blurple used in icons.
    pub const BLURPLE: Color = Color(0xFF58_65F2);
    /// The old Discord icon color (before the accessibility redesign).
    pub const OLD_BLURPLE: Color = Color(0xFF72_89DA);
    /// Fully transparent.
    pub const TRANSPARENT: Color = Color(0);

    /// Parse `#RRGGBB` or `#AARRGGBB` (the `#` is optional).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not 6 or 8 hex digits.
    pub fn parse_hex(value: &str) -> Result<Self, Error> {
        let digits = value.trim().trim_start_matches('#');
        let invalid = || PatchError::InvalidOptions {
            field: "color".to_string(),
            reason: format!("`{value}` is not a #RRGGBB or #AARRGGBB color"),
        };
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid().into());
        }
        let raw = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        match digits.len() {
            6 => Ok(Self(0xFF00_0000 | raw)),
            8 => Ok(Self(raw)),
            _ => Err(invalid().into()),
        }
    }

    #[must_use]
    pub fn alpha(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Android resource notation, `#AARRGGBB`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:08X}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Replacement of the user-facing launcher icon
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IconReplacement {
    /// Keeps the original icons that are present in the APK.
    Original,
    /// Old Discord logo colors, like prior to early 2021.
    OldDiscord,
    /// Changes the icon background without altering the foreground or
    /// monochrome variants.
    #[serde(rename = "color")]
    CustomColor { color: Color },
    /// Replaces the foreground image entirely and makes the background
    /// transparent. The monochrome icon is left alone.
    #[serde(rename = "image")]
    CustomImage {
        #[serde(with = "base64_bytes")]
        image_bytes: Vec<u8>,
    },
}

impl IconReplacement {
    /// Background color the icon ends up with, if it changes.
    #[must_use]
    pub fn background(&self) -> Option<Color> {
        match self {
            Self::Original => None,
            Self::OldDiscord => Some(Color::OLD_BLURPLE),
            Self::CustomColor { color } => Some(*color),
            Self::CustomImage { .. } => Some(Color::TRANSPARENT),
        }
    }
}

/// Immutable description of the desired output package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOptions {
    /// The app name that's user-facing in launchers.
    pub app_name: String,
    /// Changes the installation package name.
    pub package_name: String,
    /// Adds the debuggable flag to the manifest.
    pub debuggable: bool,
    /// Replacement of the user-facing launcher icon.
    pub icon_replacement: IconReplacement,
    /// Version channel to fetch and install.
    pub version_preference: VersionPreference,
    /// Version to fetch when `version_preference` is `Custom`.
    #[serde(default)]
    pub custom_version_code: String,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            app_name: "Wintry".to_string(),
            package_name: "dev.wintry.app".to_string(),
            debuggable: false,
            icon_replacement: IconReplacement::CustomColor {
                color: Color::WINTRY,
            },
            version_preference: VersionPreference::Stable,
            custom_version_code: String::new(),
        }
    }
}

impl PatchOptions {
    /// Check the options before a pipeline is assembled from them.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::InvalidOptions`] naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.app_name.trim().is_empty() {
            return Err(invalid("appName", "must not be empty"));
        }

        if !is_valid_package_name(&self.package_name) {
            return Err(invalid(
                "packageName",
                "must be at least two dot-separated segments of letters, digits or '_', each starting with a letter",
            ));
        }

        if self.version_preference == VersionPreference::Custom {
            let code = self.custom_version_code.trim();
            if code.is_empty() {
                return Err(invalid(
                    "customVersionCode",
                    "required when the custom version preference is selected",
                ));
            }
            if !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("customVersionCode", "must contain only digits"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    PatchError::InvalidOptions {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn is_valid_package_name(name: &str) -> bool {
    let mut segments = 0;
    for segment in name.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
