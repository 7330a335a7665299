//! Manifest and launcher icon editing on decoded XML resources

use super::ApkEditor;
use apkm_errors::{Error, PatchError};
use apkm_types::{IconReplacement, PatchOptions};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;
use tokio::fs;

const ANDROID_LABEL: &str = "android:label";
const ANDROID_DEBUGGABLE: &str = "android:debuggable";
const ANDROID_AUTHORITIES: &str = "android:authorities";
const ANDROID_NAME: &str = "android:name";
const ANDROID_DRAWABLE: &str = "android:drawable";

const ADAPTIVE_ICONS: [&str; 2] = [
    "res/mipmap-anydpi-v26/ic_launcher.xml",
    "res/mipmap-anydpi-v26/ic_launcher_round.xml",
];
const ICON_COLOR_RES: &str = "res/values/apkm_icon.xml";
const ICON_FOREGROUND_RES: &str = "res/drawable/apkm_icon_foreground.png";

/// Manifest fields rewritten for the output package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPatch {
    pub app_name: String,
    pub package_name: String,
    pub debuggable: bool,
}

impl From<&PatchOptions> for ManifestPatch {
    fn from(options: &PatchOptions) -> Self {
        Self {
            app_name: options.app_name.clone(),
            package_name: options.package_name.clone(),
            debuggable: options.debuggable,
        }
    }
}

/// Editor for packages whose manifest and resources are plain text XML
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlApkEditor;

#[async_trait]
impl ApkEditor for XmlApkEditor {
    async fn patch_manifest(&self, apk_dir: &Path, patch: &ManifestPatch) -> Result<(), Error> {
        let path = apk_dir.join("AndroidManifest.xml");
        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        let patched = patch_manifest_xml(&text, patch)?;
        fs::write(&path, patched)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))
    }

    async fn patch_icons(&self, apk_dir: &Path, icon: &IconReplacement) -> Result<(), Error> {
        let Some(background) = icon.background() else {
            return Ok(());
        };
        let replace_foreground = matches!(icon, IconReplacement::CustomImage { .. });

        let mut patched_any = false;
        for relative in ADAPTIVE_ICONS {
            let path = apk_dir.join(relative);
            let text = match fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io_with_path(&e, &path)),
            };
            let patched = patch_adaptive_icon_xml(&text, replace_foreground)?;
            fs::write(&path, patched)
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
            patched_any = true;
        }

        if !patched_any {
            return Err(PatchError::IconFailed {
                message: "package has no adaptive launcher icon".to_string(),
            }
            .into());
        }

        write_resource(
            apk_dir,
            ICON_COLOR_RES,
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n    <color name=\"apkm_icon_background\">{}</color>\n</resources>\n",
                background.to_hex()
            )
            .as_bytes(),
        )
        .await?;

        if let IconReplacement::CustomImage { image_bytes } = icon {
            write_resource(apk_dir, ICON_FOREGROUND_RES, image_bytes).await?;
        }
        Ok(())
    }
}

async fn write_resource(apk_dir: &Path, relative: &str, contents: &[u8]) -> Result<(), Error> {
    let path = apk_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }
    fs::write(&path, contents)
        .await
        .map_err(|e| Error::io_with_path(&e, &path))
}

fn manifest_failed(message: String) -> Error {
    PatchError::ManifestFailed { message }.into()
}

fn icon_failed(message: String) -> Error {
    PatchError::IconFailed { message }.into()
}

/// Rewrite the manifest: package id, label, debuggable flag, and every
/// provider authority or permission name scoped to the old package id.
///
/// # Errors
///
/// Returns [`PatchError::ManifestFailed`] on malformed XML or a manifest
/// without a `package` attribute.
pub fn patch_manifest_xml(xml: &str, patch: &ManifestPatch) -> Result<String, Error> {
    let mut old_package: Option<String> = None;

    rewrite_elements(xml, manifest_failed, |elem| {
        match elem.name().as_ref() {
            b"manifest" => {
                let current = attribute(elem, "package", manifest_failed)?
                    .ok_or_else(|| manifest_failed("manifest has no package attribute".to_string()))?;
                old_package = Some(current);
                set_attributes(elem, &[("package", patch.package_name.as_str())], manifest_failed).map(Some)
            }
            b"application" => {
                let mut attrs = vec![(ANDROID_LABEL, patch.app_name.as_str())];
                if patch.debuggable {
                    attrs.push((ANDROID_DEBUGGABLE, "true"));
                }
                set_attributes(elem, &attrs, manifest_failed).map(Some)
            }
            b"provider" => {
                let Some(old) = old_package.as_deref() else {
                    return Ok(None);
                };
                let Some(authorities) = attribute(elem, ANDROID_AUTHORITIES, manifest_failed)? else {
                    return Ok(None);
                };
                let renamed = authorities
                    .split(';')
                    .map(|a| rescope(a, old, &patch.package_name))
                    .collect::<Vec<_>>()
                    .join(";");
                set_attributes(elem, &[(ANDROID_AUTHORITIES, renamed.as_str())], manifest_failed).map(Some)
            }
            b"permission" | b"uses-permission" => {
                let Some(old) = old_package.as_deref() else {
                    return Ok(None);
                };
                match attribute(elem, ANDROID_NAME, manifest_failed)? {
                    Some(name) if name.starts_with(&format!("{old}.")) => {
                        let renamed = rescope(&name, old, &patch.package_name);
                        set_attributes(elem, &[(ANDROID_NAME, renamed.as_str())], manifest_failed).map(Some)
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    })
}

/// Point the adaptive icon background (and optionally foreground) at the
/// resources written by the icon step.
///
/// # Errors
///
/// Returns [`PatchError::IconFailed`] on malformed XML.
pub fn patch_adaptive_icon_xml(xml: &str, replace_foreground: bool) -> Result<String, Error> {
    rewrite_elements(xml, icon_failed, |elem| match elem.name().as_ref() {
        b"background" => set_attributes(
            elem,
            &[(ANDROID_DRAWABLE, "@color/apkm_icon_background")],
            icon_failed,
        )
        .map(Some),
        b"foreground" if replace_foreground => set_attributes(
            elem,
            &[(ANDROID_DRAWABLE, "@drawable/apkm_icon_foreground")],
            icon_failed,
        )
        .map(Some),
        _ => Ok(None),
    })
}

fn rescope(value: &str, old: &str, new: &str) -> String {
    match value.strip_prefix(old) {
        Some(rest) if rest.is_empty() || rest.starts_with('.') => format!("{new}{rest}"),
        _ => value.to_string(),
    }
}

/// Stream `xml` through, letting `edit` replace any start or empty element.
fn rewrite_elements<E, F>(xml: &str, err: E, mut edit: F) -> Result<String, Error>
where
    E: Fn(String) -> Error + Copy,
    F: FnMut(&BytesStart<'_>) -> Result<Option<BytesStart<'static>>, Error>,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    loop {
        let event = reader.read_event().map_err(|e| err(e.to_string()))?;
        let event = match event {
            Event::Eof => break,
            Event::Start(elem) => Event::Start(edit(&elem)?.unwrap_or_else(|| elem.into_owned())),
            Event::Empty(elem) => Event::Empty(edit(&elem)?.unwrap_or_else(|| elem.into_owned())),
            other => other,
        };
        writer.write_event(event).map_err(|e| err(e.to_string()))?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| err(e.to_string()))
}

fn attribute<E>(elem: &BytesStart<'_>, key: &str, err: E) -> Result<Option<String>, Error>
where
    E: Fn(String) -> Error,
{
    match elem.try_get_attribute(key).map_err(|e| err(e.to_string()))? {
        Some(attr) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|e| err(e.to_string())),
        None => Ok(None),
    }
}

/// Copy `elem`, replacing or appending the given attributes
fn set_attributes<E>(
    elem: &BytesStart<'_>,
    values: &[(&str, &str)],
    err: E,
) -> Result<BytesStart<'static>, Error>
where
    E: Fn(String) -> Error,
{
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    let mut written = vec![false; values.len()];

    for attr in elem.attributes() {
        let attr = attr.map_err(|e| err(e.to_string()))?;
        match values
            .iter()
            .position(|(key, _)| attr.key.as_ref() == key.as_bytes())
        {
            Some(index) => {
                out.push_attribute(values[index]);
                written[index] = true;
            }
            None => out.push_attribute(attr),
        }
    }
    for (index, value) in values.iter().enumerate() {
        if !written[index] {
            out.push_attribute(*value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescope() {
        assert_eq!(rescope("com.discord.provider", "com.discord", "dev.x"), "dev.x.provider");
        assert_eq!(rescope("com.discord", "com.discord", "dev.x"), "dev.x");
        assert_eq!(rescope("com.discordapp.a", "com.discord", "dev.x"), "com.discordapp.a");
    }

    #[test]
    fn test_adaptive_icon_foreground_only_for_images() {
        let xml = r#"<adaptive-icon xmlns:android="http://schemas.android.com/apk/res/android"><background android:drawable="@color/bg"/><foreground android:drawable="@drawable/fg"/></adaptive-icon>"#;

        let colored = patch_adaptive_icon_xml(xml, false).unwrap();
        assert!(colored.contains("@color/apkm_icon_background"));
        assert!(colored.contains("@drawable/fg"));

        let image = patch_adaptive_icon_xml(xml, true).unwrap();
        assert!(image.contains("@drawable/apkm_icon_foreground"));
        assert!(!image.contains("@drawable/fg"));
    }
}
