//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use apkm_events::{channel, AppEvent, DownloadEvent};
    use apkm_net::*;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn test_client() -> NetClient {
        NetClient::new(NetConfig {
            retry_count: 1,
            retry_delay: Duration::from_millis(10),
            ..NetConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_download_file() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let content = b"dex\n035\0payload";
        let mock = server.mock(|when, then| {
            when.method(GET).path("/injector.dex");
            then.status(200)
                .header("content-length", content.len().to_string())
                .body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("injector").join("injector-1.dex");
        let client = test_client();
        let url = server.url("/injector.dex");
        let seen = AtomicU64::new(0);

        let size = download_file(&client, &url, &dest, Some(&tx), |p| {
            seen.store(p.downloaded, Ordering::SeqCst);
        })
        .await
        .unwrap();

        mock.assert();
        assert_eq!(size, content.len() as u64);
        assert_eq!(seen.load(Ordering::SeqCst), content.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), content);

        let mut saw_start = false;
        let mut saw_complete = false;
        while let Ok(message) = rx.try_recv() {
            match message.event {
                AppEvent::Download(DownloadEvent::Started { .. }) => saw_start = true,
                AppEvent::Download(DownloadEvent::Completed { .. }) => saw_complete = true,
                _ => {}
            }
        }
        assert!(saw_start);
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/base.apk");
            then.status(404);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("base.apk");
        let client = test_client();

        let err = download_file(&client, &server.url("/base.apk"), &dest, Some(&tx), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            apkm_errors::Error::Network(apkm_errors::NetworkError::HttpError { status: 404, .. })
        ));
        assert!(!dest.exists());

        let mut saw_failed = false;
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Download(DownloadEvent::Failed { .. }) = message.event {
                saw_failed = true;
            }
        }
        assert!(saw_failed);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let client = test_client();
        let result = client.get(&server.url("/flaky")).await;

        assert!(result.is_err());
        // initial attempt plus one retry
        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_fetch_releases_sorted_newest_first() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/releases");
            then.status(200).body(
                r#"[
                  {"tag_name": "v100", "name": "old", "created_at": "2024-01-01T00:00:00Z",
                   "prerelease": false, "assets": []},
                  {"tag_name": "v101-alpha", "name": null, "created_at": "2024-03-01T00:00:00Z",
                   "prerelease": true,
                   "assets": [{"name": "base.apk", "browser_download_url": "https://x/base.apk", "size": 3}]}
                ]"#,
            );
        });

        let releases = fetch_releases(&test_client(), &server.url("/releases"))
            .await
            .unwrap();

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag_name, "v101-alpha");
        assert_eq!(releases[0].version(), "101-alpha");
        assert!(releases[0].asset("base.apk").is_some());
        assert!(releases[1].asset("base.apk").is_none());
    }

    #[tokio::test]
    async fn test_fetch_releases_rejects_garbage() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/releases");
            then.status(200).body("<html>rate limited</html>");
        });

        let err = fetch_releases(&test_client(), &server.url("/releases"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            apkm_errors::Error::Network(apkm_errors::NetworkError::InvalidResponse { .. })
        ));
    }
}
