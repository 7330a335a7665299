//! Integration tests for types

#[cfg(test)]
mod tests {
    use apkm_types::*;

    fn options() -> PatchOptions {
        PatchOptions {
            app_name: "Test".to_string(),
            package_name: "com.test.x".to_string(),
            debuggable: false,
            icon_replacement: IconReplacement::Original,
            version_preference: VersionPreference::Stable,
            custom_version_code: String::new(),
        }
    }

    #[test]
    fn test_default_options_are_valid() {
        PatchOptions::default().validate().unwrap();
        options().validate().unwrap();
    }

    #[test]
    fn test_custom_version_requires_code() {
        let mut opts = options();
        opts.version_preference = VersionPreference::Custom;
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("customVersionCode"));

        opts.custom_version_code = "126.21".to_string();
        assert!(opts.validate().is_err());

        opts.custom_version_code = "126021".to_string();
        opts.validate().unwrap();
    }

    #[test]
    fn test_custom_code_ignored_for_channels() {
        let mut opts = options();
        opts.custom_version_code = "not a number".to_string();
        opts.validate().unwrap();
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut opts = options();
        opts.app_name = "   ".to_string();
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_icon_serialization_tags() {
        let json = serde_json::to_value(IconReplacement::OldDiscord).unwrap();
        assert_eq!(json["type"], "old_discord");

        let json = serde_json::to_value(IconReplacement::CustomColor {
            color: Color::BLURPLE,
        })
        .unwrap();
        assert_eq!(json["type"], "color");
        assert_eq!(json["color"], 0xFF58_65F2_u32);

        let json = serde_json::to_value(IconReplacement::CustomImage {
            image_bytes: vec![0x89, b'P', b'N', b'G'],
        })
        .unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["image_bytes"], "iVBORw==");
    }

    #[test]
    fn test_options_json_shape() {
        let json = serde_json::to_value(PatchOptions::default()).unwrap();
        assert_eq!(json["appName"], "Wintry");
        assert_eq!(json["packageName"], "dev.wintry.app");
        assert_eq!(json["versionPreference"], "stable");

        let back: PatchOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, PatchOptions::default());
    }

    #[test]
    fn test_icon_backgrounds() {
        assert_eq!(IconReplacement::Original.background(), None);
        assert_eq!(
            IconReplacement::OldDiscord.background(),
            Some(Color::OLD_BLURPLE)
        );
        let image = IconReplacement::CustomImage {
            image_bytes: vec![1],
        };
        assert_eq!(image.background().map(Color::alpha), Some(0));
    }

    #[test]
    fn test_session_state_terminal() {
        assert!(!SessionState::Working.is_terminal());
        assert!(SessionState::Success.is_terminal());
        assert!(SessionState::CloseScreen.is_terminal());
        assert!(SessionState::Failed {
            install_id: Uuid::new_v4()
        }
        .is_terminal());
    }
}
