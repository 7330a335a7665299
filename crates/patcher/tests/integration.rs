//! Integration tests for the patching pipeline

#[cfg(test)]
mod tests {
    use apkm_config::PathManager;
    use apkm_errors::{Error, NetworkError, PatchError, StorageError};
    use apkm_events::{channel, AppEvent, StepEvent};
    use apkm_patcher::steps::{DownloadBaseApkStep, InstallStep};
    use apkm_patcher::toolchain::{ManifestPatch, XmlApkEditor, ZipApkArchive};
    use apkm_patcher::*;
    use apkm_types::{IconReplacement, PatchOptions, SkipCause, StepGroup, StepState};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        Hang,
        Panic,
    }

    struct FakeReleases;

    #[async_trait]
    impl ReleaseSource for FakeReleases {
        async fn resolve(
            &self,
            _preference: apkm_types::VersionPreference,
            _custom_version_code: &str,
        ) -> Result<ResolvedRelease, Error> {
            Ok(ResolvedRelease {
                version: "228".to_string(),
                assets: vec![
                    ReleaseAsset {
                        name: BASE_APK_ASSET.to_string(),
                        url: "https://example.invalid/base.apk".to_string(),
                    },
                    ReleaseAsset {
                        name: INJECTOR_ASSET.to_string(),
                        url: "https://example.invalid/injector.dex".to_string(),
                    },
                ],
            })
        }
    }

    struct FakeDownloader {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(
            &self,
            _url: &str,
            dest: &Path,
            _events: Option<&apkm_events::EventSender>,
        ) -> Result<u64, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::create_dir_all(dest.parent().unwrap()).await?;
            tokio::fs::write(dest, b"part").await?;
            match self.behavior {
                Behavior::Succeed => Ok(4),
                Behavior::Fail => Err(NetworkError::DownloadFailed("reset".to_string()).into()),
                Behavior::Hang => std::future::pending().await,
                Behavior::Panic => panic!("downloader exploded"),
            }
        }
    }

    struct FakeArchive;

    #[async_trait]
    impl ApkArchive for FakeArchive {
        async fn extract(&self, _apk: &Path, dest: &Path, _: &BlockingScope) -> Result<(), Error> {
            tokio::fs::create_dir_all(dest).await?;
            tokio::fs::write(dest.join("classes.dex"), b"dex").await?;
            Ok(())
        }

        async fn repack(&self, _src_dir: &Path, out: &Path, _: &BlockingScope) -> Result<(), Error> {
            tokio::fs::write(out, b"PK").await?;
            Ok(())
        }
    }

    /// Extracts one small file at a time on the blocking pool
    #[derive(Default)]
    struct SlowArchive {
        written: Arc<AtomicUsize>,
    }

    const SLOW_ENTRIES: usize = 400;

    #[async_trait]
    impl ApkArchive for SlowArchive {
        async fn extract(&self, _apk: &Path, dest: &Path, scope: &BlockingScope) -> Result<(), Error> {
            let dest = dest.to_path_buf();
            let written = self.written.clone();
            scope
                .run("extract", move |cancel| {
                    std::fs::create_dir_all(&dest)?;
                    for i in 0..SLOW_ENTRIES {
                        if cancel.is_cancelled() {
                            return Err(Error::Cancelled);
                        }
                        std::fs::write(dest.join(format!("{i}.bin")), b"x")?;
                        written.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Ok(())
                })
                .await
        }

        async fn repack(&self, _src_dir: &Path, out: &Path, _: &BlockingScope) -> Result<(), Error> {
            tokio::fs::write(out, b"PK").await?;
            Ok(())
        }
    }

    struct FakeEditor {
        icon_calls: AtomicUsize,
    }

    #[async_trait]
    impl ApkEditor for FakeEditor {
        async fn patch_manifest(&self, _apk_dir: &Path, _patch: &ManifestPatch) -> Result<(), Error> {
            Ok(())
        }

        async fn patch_icons(&self, _apk_dir: &Path, _icon: &IconReplacement) -> Result<(), Error> {
            self.icon_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeSigner;

    #[async_trait]
    impl ApkSigner for FakeSigner {
        async fn sign(&self, unsigned: &Path, signed: &Path) -> Result<(), Error> {
            tokio::fs::copy(unsigned, signed).await?;
            Ok(())
        }
    }

    struct FakeInstaller {
        behavior: Behavior,
    }

    #[async_trait]
    impl PackageInstaller for FakeInstaller {
        async fn install(&self, _apk: &Path) -> Result<(), Error> {
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(StorageError::InsufficientStorage {
                    path: "device".to_string(),
                }
                .into()),
                Behavior::Hang => std::future::pending().await,
                Behavior::Panic => panic!("installer exploded"),
            }
        }

        async fn launch(&self, _package: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    struct Harness {
        dir: TempDir,
        downloader: Arc<FakeDownloader>,
        editor: Arc<FakeEditor>,
        toolchain: Toolchain,
    }

    fn harness(download: Behavior, install: Behavior) -> Harness {
        let downloader = Arc::new(FakeDownloader {
            behavior: download,
            calls: AtomicUsize::new(0),
        });
        let editor = Arc::new(FakeEditor {
            icon_calls: AtomicUsize::new(0),
        });
        let toolchain = Toolchain {
            releases: Arc::new(FakeReleases),
            downloader: downloader.clone(),
            archive: Arc::new(FakeArchive),
            editor: editor.clone(),
            signer: Arc::new(FakeSigner),
            installer: Arc::new(FakeInstaller { behavior: install }),
        };
        Harness {
            dir: TempDir::new().unwrap(),
            downloader,
            editor,
            toolchain,
        }
    }

    impl Harness {
        fn paths(&self) -> PathManager {
            PathManager::new(self.dir.path().join("data"), self.dir.path().join("cache"))
        }

        fn context(&self, options: PatchOptions) -> StepContext {
            StepContext::new(options, self.paths(), self.toolchain.clone())
        }
    }

    fn runner() -> StepRunner {
        PatchRunner::new(PatchOptions::default())
            .unwrap()
            .into_runner()
            .unwrap()
    }

    fn states(runner: &StepRunner) -> Vec<(StepState, Option<SkipCause>)> {
        runner.snapshots().iter().map(|s| (s.state, s.cause)).collect()
    }

    #[test]
    fn test_assembled_order() {
        let runner = runner();
        let kinds: Vec<StepKind> = runner.steps().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::FetchInfo,
                StepKind::DownloadBaseApk,
                StepKind::DownloadInjector,
                StepKind::ExtractApk,
                StepKind::PatchManifest,
                StepKind::PatchIcons,
                StepKind::InjectMod,
                StepKind::Repack,
                StepKind::Sign,
                StepKind::Install,
            ]
        );

        let groups: Vec<StepGroup> = runner.steps().map(|s| s.group()).collect();
        assert!(groups.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            runner.grouped().keys().copied().collect::<Vec<_>>(),
            StepGroup::ALL.to_vec()
        );
        assert!(runner
            .steps()
            .all(|s| s.core().state() == StepState::Pending));
    }

    #[test]
    fn test_invalid_options_fail_assembly() {
        let options = PatchOptions {
            version_preference: apkm_types::VersionPreference::Custom,
            custom_version_code: "12a".to_string(),
            ..PatchOptions::default()
        };
        assert!(matches!(
            PatchRunner::new(options),
            Err(Error::Patch(PatchError::InvalidOptions { .. }))
        ));
    }

    #[test]
    fn test_duplicate_kinds_rejected() {
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(InstallStep::new()),
            Box::new(InstallStep::new()),
        ];
        assert!(matches!(
            StepRunner::new(steps),
            Err(Error::Patch(PatchError::DuplicateStep { .. }))
        ));
    }

    #[tokio::test]
    async fn test_empty_runner() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let runner = StepRunner::new(Vec::new()).unwrap();
        assert!(runner.execute_all(&h.context(PatchOptions::default())).await.is_none());
        assert_eq!(runner.total_duration(), Duration::ZERO);
        assert_eq!(runner.log(), "");
    }

    #[tokio::test]
    async fn test_full_success() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let (tx, mut rx) = channel();
        let ctx = h.context(PatchOptions::default()).with_event_sender(tx);
        let runner = runner();

        assert!(runner.execute_all(&ctx).await.is_none());
        assert!(runner
            .steps()
            .all(|s| s.core().state() == StepState::Success));
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.editor.icon_calls.load(Ordering::SeqCst), 1);
        assert!(h.paths().patched_apk().exists());
        assert!(h.paths().unpacked_apk_dir().join("classes2.dex").exists());

        let total: Duration = runner.steps().map(|s| s.core().duration()).sum();
        assert_eq!(runner.total_duration(), total);

        let log = runner.log();
        assert_eq!(log.lines().count(), 10);
        assert!(log.starts_with("- [Prepare] Fetch release info: Success in "));
        assert!(log.contains("- [Install] Install: Success in "));

        let mut running = 0;
        let mut finished = false;
        while let Ok(message) = rx.try_recv() {
            match message.event {
                AppEvent::Step(StepEvent::StateChanged {
                    state: StepState::Running,
                    ..
                }) => running += 1,
                AppEvent::Step(StepEvent::PipelineFinished { success, .. }) => finished = success,
                _ => {}
            }
        }
        assert_eq!(running, 10);
        assert!(finished);
    }

    #[tokio::test]
    async fn test_download_failure_skips_rest() {
        let h = harness(Behavior::Fail, Behavior::Succeed);
        let ctx = h.context(PatchOptions::default());
        let runner = runner();

        let error = runner.execute_all(&ctx).await.unwrap();
        assert!(matches!(error, Error::Network(NetworkError::DownloadFailed(_))));

        let states = states(&runner);
        assert_eq!(states[0], (StepState::Success, None));
        assert_eq!(states[1], (StepState::Failed, None));
        for state in &states[2..] {
            assert_eq!(*state, (StepState::Skipped, Some(SkipCause::PriorFailure)));
        }
        for step in runner.steps().skip(2) {
            assert_eq!(step.core().duration(), Duration::ZERO);
        }

        assert!(!h.paths().cached_base_apk("228").exists());
        assert!(runner.step(StepKind::DownloadBaseApk).core().error().is_some());
        assert!(runner.log().contains("Download base APK: Failed"));
        assert!(runner.log().contains("Repack APK: Skipped (prior failure)"));
    }

    #[tokio::test]
    async fn test_cached_downloads_are_skipped() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let paths = h.paths();
        for target in [paths.cached_base_apk("228"), paths.cached_injector("228")] {
            tokio::fs::create_dir_all(target.parent().unwrap()).await.unwrap();
            tokio::fs::write(&target, b"cached").await.unwrap();
        }

        let runner = runner();
        assert!(runner.execute_all(&h.context(PatchOptions::default())).await.is_none());

        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 0);
        let base = runner.step(StepKind::DownloadBaseApk).core();
        assert_eq!(base.state(), StepState::Skipped);
        assert_eq!(base.skip_cause(), Some(SkipCause::NotNeeded));
        assert_eq!(
            runner.step(StepKind::Install).core().state(),
            StepState::Success
        );
    }

    #[tokio::test]
    async fn test_original_icon_is_not_patched() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let options = PatchOptions {
            icon_replacement: IconReplacement::Original,
            ..PatchOptions::default()
        };
        let runner = PatchRunner::new(options.clone()).unwrap().into_runner().unwrap();

        assert!(runner.execute_all(&h.context(options)).await.is_none());
        let icons = runner.step(StepKind::PatchIcons).core();
        assert_eq!(icons.state(), StepState::Skipped);
        assert_eq!(icons.skip_cause(), Some(SkipCause::NotNeeded));
        assert_eq!(h.editor.icon_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_install_failure_keeps_storage_classification() {
        let h = harness(Behavior::Succeed, Behavior::Fail);
        let runner = runner();
        let error = runner
            .execute_all(&h.context(PatchOptions::default()))
            .await
            .unwrap();
        assert!(error.is_insufficient_storage());
        assert_eq!(
            runner.step(StepKind::Install).core().state(),
            StepState::Failed
        );
    }

    #[tokio::test]
    async fn test_cancel_during_install() {
        let h = harness(Behavior::Succeed, Behavior::Hang);
        let token = CancellationToken::new();
        let ctx = Arc::new(
            h.context(PatchOptions::default())
                .with_cancel_token(token.clone()),
        );
        let runner = Arc::new(runner());

        let task = {
            let ctx = ctx.clone();
            let runner = runner.clone();
            tokio::spawn(async move { runner.execute_all(&ctx).await })
        };

        for _ in 0..200 {
            if runner.step(StepKind::Install).core().state() == StepState::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        token.cancel();
        assert!(task.await.unwrap().is_none());

        let install = runner.get_step::<InstallStep>().core();
        assert_eq!(install.state(), StepState::Skipped);
        assert_eq!(install.skip_cause(), Some(SkipCause::Cancelled));
        assert_eq!(
            runner.step(StepKind::Sign).core().state(),
            StepState::Success
        );
    }

    #[tokio::test]
    async fn test_interrupted_download_is_reported() {
        let h = harness(Behavior::Hang, Behavior::Succeed);
        let token = CancellationToken::new();
        let ctx = Arc::new(
            h.context(PatchOptions::default())
                .with_cancel_token(token.clone()),
        );
        let runner = Arc::new(runner());

        let task = {
            let ctx = ctx.clone();
            let runner = runner.clone();
            tokio::spawn(async move { runner.execute_all(&ctx).await })
        };

        let mut target = None;
        for _ in 0..100 {
            target = runner.get_step::<DownloadBaseApkStep>().download_target();
            if target.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(target, Some(h.paths().cached_base_apk("228")));
        // still running, so nothing counts as interrupted yet
        assert!(runner.interrupted_downloads().is_empty());

        token.cancel();
        assert!(task.await.unwrap().is_none());
        assert_eq!(
            runner.interrupted_downloads(),
            vec![h.paths().cached_base_apk("228")]
        );
        for (state, cause) in states(&runner).into_iter().skip(1) {
            assert_eq!(state, StepState::Skipped);
            assert_eq!(cause, Some(SkipCause::Cancelled));
        }
    }

    #[tokio::test]
    async fn test_cancel_waits_for_blocking_extract() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let archive = Arc::new(SlowArchive::default());
        let toolchain = Toolchain {
            archive: archive.clone(),
            ..h.toolchain.clone()
        };
        let token = CancellationToken::new();
        let ctx = Arc::new(
            StepContext::new(PatchOptions::default(), h.paths(), toolchain)
                .with_cancel_token(token.clone()),
        );
        let runner = Arc::new(runner());

        let task = {
            let ctx = ctx.clone();
            let runner = runner.clone();
            tokio::spawn(async move { runner.execute_all(&ctx).await })
        };
        for _ in 0..300 {
            if archive.written.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(archive.written.load(Ordering::SeqCst) > 0);

        token.cancel();
        assert!(task.await.unwrap().is_none());
        assert_eq!(ctx.blocking().in_flight(), 0);

        // the extraction loop has stopped for good once the run returns
        let written = archive.written.load(Ordering::SeqCst);
        assert!(written < SLOW_ENTRIES);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(archive.written.load(Ordering::SeqCst), written);

        let extract = runner.step(StepKind::ExtractApk).core();
        assert_eq!(extract.state(), StepState::Skipped);
        assert_eq!(extract.skip_cause(), Some(SkipCause::Cancelled));
    }

    #[tokio::test]
    async fn test_cached_download_is_never_interrupted() {
        let h = harness(Behavior::Succeed, Behavior::Hang);
        let cached = h.paths().cached_base_apk("228");
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, b"complete").unwrap();

        let token = CancellationToken::new();
        let ctx = Arc::new(
            h.context(PatchOptions::default())
                .with_cancel_token(token.clone()),
        );
        let runner = Arc::new(runner());
        let task = {
            let ctx = ctx.clone();
            let runner = runner.clone();
            tokio::spawn(async move { runner.execute_all(&ctx).await })
        };
        for _ in 0..300 {
            if runner.step(StepKind::Install).core().state() == StepState::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        token.cancel();
        assert!(task.await.unwrap().is_none());
        assert!(runner.interrupted_downloads().is_empty());
        assert_eq!(std::fs::read(&cached).unwrap(), b"complete");
    }

    #[tokio::test]
    async fn test_pre_cancelled_never_runs() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let token = CancellationToken::new();
        token.cancel();
        let runner = runner();

        let ctx = h.context(PatchOptions::default()).with_cancel_token(token);
        assert!(runner.execute_all(&ctx).await.is_none());
        assert!(states(&runner)
            .iter()
            .all(|s| *s == (StepState::Skipped, Some(SkipCause::Cancelled))));
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let h = harness(Behavior::Panic, Behavior::Succeed);
        let runner = runner();
        let error = runner
            .execute_all(&h.context(PatchOptions::default()))
            .await
            .unwrap();

        assert!(matches!(error, Error::Patch(PatchError::StepPanicked { .. })));
        assert_eq!(
            runner.step(StepKind::DownloadBaseApk).core().state(),
            StepState::Failed
        );
        assert_eq!(
            runner.step(StepKind::DownloadInjector).core().skip_cause(),
            Some(SkipCause::PriorFailure)
        );
    }

    #[tokio::test]
    async fn test_steps_never_rerun() {
        let h = harness(Behavior::Succeed, Behavior::Succeed);
        let ctx = h.context(PatchOptions::default());
        let runner = runner();
        let _ = runner.execute_all(&ctx).await;

        let fetch = runner.step(StepKind::FetchInfo);
        assert_eq!(execute_step(fetch, &ctx).await, StepState::Success);
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "not part of this pipeline")]
    fn test_missing_kind_panics() {
        let runner = StepRunner::new(vec![Box::new(InstallStep::new()) as Box<dyn Step>]).unwrap();
        let _ = runner.step(StepKind::Sign);
    }

    #[tokio::test]
    async fn test_zip_extract_and_repack() {
        use std::io::Write;

        let dir = TempDir::new().unwrap();
        let apk = dir.path().join("base.apk");
        {
            let file = std::fs::File::create(&apk).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("AndroidManifest.xml", options).unwrap();
            writer.write_all(b"<manifest package=\"com.discord\"/>").unwrap();
            writer.start_file("res/values/strings.xml", options).unwrap();
            writer.write_all(b"<resources/>").unwrap();
            writer.start_file("resources.arsc", options).unwrap();
            writer.write_all(b"arsc").unwrap();
            writer.finish().unwrap();
        }

        let scope = BlockingScope::default();
        let unpacked = dir.path().join("apk");
        ZipApkArchive.extract(&apk, &unpacked, &scope).await.unwrap();
        assert!(unpacked.join("res/values/strings.xml").exists());

        let out = dir.path().join("out").join("unsigned.apk");
        ZipApkArchive.repack(&unpacked, &out, &scope).await.unwrap();

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["AndroidManifest.xml", "res/values/strings.xml", "resources.arsc"]
        );
        let arsc = archive.by_name("resources.arsc").unwrap();
        assert_eq!(arsc.compression(), zip::CompressionMethod::Stored);
    }

    #[tokio::test]
    async fn test_extract_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let apk = dir.path().join("base.apk");
        tokio::fs::write(&apk, b"not a zip").await.unwrap();
        let err = ZipApkArchive
            .extract(&apk, &dir.path().join("apk"), &BlockingScope::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Patch(PatchError::InvalidArchive { .. })));
    }

    #[tokio::test]
    async fn test_manifest_patch() {
        let dir = TempDir::new().unwrap();
        let manifest = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.discord">
    <uses-permission android:name="android.permission.INTERNET"/>
    <permission android:name="com.discord.DYNAMIC_RECEIVER_NOT_EXPORTED_PERMISSION"/>
    <application android:label="Discord" android:icon="@mipmap/ic_launcher">
        <provider android:name="androidx.core.content.FileProvider" android:authorities="com.discord.files;com.discord.mediaprovider"/>
    </application>
</manifest>
"#;
        tokio::fs::write(dir.path().join("AndroidManifest.xml"), manifest)
            .await
            .unwrap();

        let patch = ManifestPatch {
            app_name: "Wintry".to_string(),
            package_name: "dev.wintry.app".to_string(),
            debuggable: true,
        };
        XmlApkEditor.patch_manifest(dir.path(), &patch).await.unwrap();

        let patched = tokio::fs::read_to_string(dir.path().join("AndroidManifest.xml"))
            .await
            .unwrap();
        assert!(patched.contains(r#"package="dev.wintry.app""#));
        assert!(patched.contains(r#"android:label="Wintry""#));
        assert!(patched.contains(r#"android:debuggable="true""#));
        assert!(patched.contains(r#"android:icon="@mipmap/ic_launcher""#));
        assert!(patched.contains("dev.wintry.app.files;dev.wintry.app.mediaprovider"));
        assert!(patched.contains("dev.wintry.app.DYNAMIC_RECEIVER_NOT_EXPORTED_PERMISSION"));
        assert!(patched.contains("android.permission.INTERNET"));
        assert!(!patched.contains("com.discord"));
    }

    #[tokio::test]
    async fn test_icon_patch_requires_adaptive_icon() {
        let dir = TempDir::new().unwrap();
        let err = XmlApkEditor
            .patch_icons(dir.path(), &IconReplacement::OldDiscord)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Patch(PatchError::IconFailed { .. })));

        let icon_dir = dir.path().join("res/mipmap-anydpi-v26");
        tokio::fs::create_dir_all(&icon_dir).await.unwrap();
        tokio::fs::write(
            icon_dir.join("ic_launcher.xml"),
            r#"<adaptive-icon xmlns:android="http://schemas.android.com/apk/res/android"><background android:drawable="@color/brand"/><foreground android:drawable="@drawable/logo"/></adaptive-icon>"#,
        )
        .await
        .unwrap();

        XmlApkEditor
            .patch_icons(
                dir.path(),
                &IconReplacement::CustomImage {
                    image_bytes: vec![0x89, b'P', b'N', b'G'],
                },
            )
            .await
            .unwrap();

        let colors = tokio::fs::read_to_string(dir.path().join("res/values/apkm_icon.xml"))
            .await
            .unwrap();
        assert!(colors.contains("#00000000"));
        assert!(dir
            .path()
            .join("res/drawable/apkm_icon_foreground.png")
            .exists());
    }
}
