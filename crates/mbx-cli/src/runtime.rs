// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use mbx_api::{Client, RELEASES_URL, ReleaseChecker, release_differs};
use mbx_app::{LoadCompleted, LoadPayload, LoadRequest, RequestId};
use mbx_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime backed by a live Metabase server. Every fetch gets its own thread
/// so the event loop keeps drawing while the server thinks.
pub struct ApiRuntime {
    client: Client,
    check_updates: bool,
}

impl ApiRuntime {
    pub fn new(client: Client, check_updates: bool) -> Self {
        Self {
            client,
            check_updates,
        }
    }
}

impl mbx_tui::AppRuntime for ApiRuntime {
    fn fetch(&mut self, request: &LoadRequest) -> Result<LoadPayload> {
        self.client.fetch(request)
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("open {url} in a browser"))
    }

    fn spawn_fetch(
        &mut self,
        id: RequestId,
        request: LoadRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("mbx-fetch-{id}"))
            .spawn(move || {
                let result = client.fetch(&request).map_err(|error| {
                    tracing::warn!(id, kind = request.kind().as_str(), "fetch failed: {error:#}");
                    format!("{error:#}")
                });
                // The receiver is gone once the UI has quit.
                let _ = tx.send(InternalEvent::Loaded(LoadCompleted { id, result }));
            })
            .context("spawn fetch thread")?;
        Ok(())
    }

    fn spawn_update_check(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        if !self.check_updates {
            return Ok(());
        }
        thread::Builder::new()
            .name("mbx-update-check".to_owned())
            .spawn(move || {
                let latest = match latest_release() {
                    Ok(tag) => tag,
                    Err(error) => {
                        tracing::debug!("update check failed: {error:#}");
                        None
                    }
                };
                let _ = tx.send(InternalEvent::UpdateChecked(latest));
            })
            .context("spawn update check thread")?;
        Ok(())
    }
}

fn latest_release() -> Result<Option<String>> {
    let tag = ReleaseChecker::new(RELEASES_URL, UPDATE_CHECK_TIMEOUT)?.latest_tag()?;
    let current = env!("CARGO_PKG_VERSION");
    Ok(release_differs(current, &tag).then_some(tag))
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::Result;
    use mbx_api::Client;
    use mbx_app::{LoadPayload, LoadRequest};
    use mbx_testkit::{MetabaseFaker, MockMetabase, MockRoute};
    use mbx_tui::{AppRuntime, InternalEvent};
    use serde_json::json;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn spawn_fetch_reports_back_on_channel() -> Result<()> {
        let mut faker = MetabaseFaker::new(3);
        let databases = faker.databases(2);
        let server = MockMetabase::start(vec![MockRoute::json(
            "/api/database",
            json!({ "data": databases }),
        )])?;
        let client = Client::new(server.url(), "mb_test", Some(Duration::from_secs(5)))?;
        let mut runtime = ApiRuntime::new(client, false);

        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(7, LoadRequest::Databases, tx)?;
        let event = rx.recv_timeout(Duration::from_secs(5))?;
        let InternalEvent::Loaded(completed) = event else {
            panic!("expected a load completion");
        };
        assert_eq!(completed.id, 7);
        let Ok(LoadPayload::Databases(loaded)) = completed.result else {
            panic!("expected databases");
        };
        assert_eq!(loaded, databases);
        Ok(())
    }

    #[test]
    fn spawn_fetch_sends_error_text() -> Result<()> {
        let server = MockMetabase::start(vec![MockRoute::status(
            "/api/database",
            401,
            r#"{"message":"Unauthenticated"}"#,
        )])?;
        let client = Client::new(server.url(), "mb_bad", Some(Duration::from_secs(5)))?;
        let mut runtime = ApiRuntime::new(client, false);

        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(1, LoadRequest::Databases, tx)?;
        let InternalEvent::Loaded(completed) = rx.recv_timeout(Duration::from_secs(5))? else {
            panic!("expected a load completion");
        };
        let error = completed.result.expect_err("401 should fail");
        assert!(error.contains("401"), "{error}");
        Ok(())
    }

    #[test]
    fn update_check_is_skipped_when_disabled() -> Result<()> {
        let client = Client::new("http://127.0.0.1:9", "mb_test", None)?;
        let mut runtime = ApiRuntime::new(client, false);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_update_check(tx)?;
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        Ok(())
    }
}
