//! Session launcher: boots one isolated browser per `start` command.
//!
//! The launcher composes the hardened flag set, starts Chromium through
//! chromiumoxide, opens the session's single page, wires the page-fault
//! observer, and reports the remote-debugging address to the parent before
//! any sandboxed code gets to run.

use crate::actions::{PageActions, WorkerPage};
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::{EventExceptionThrown, ExceptionDetails};
use futures_util::stream::StreamExt;
use glovebox_core::config::BrowserSettings;
use glovebox_core::protocol::{EventSink, LaunchRequest, LaunchedInfo, WorkerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Flags appended to every launch. The worker itself runs inside an outer
/// container, where Chromium's own sandbox and /dev/shm are unavailable.
pub const HARDENING_FLAGS: &[&str] = &["--no-sandbox", "--disable-dev-shm-usage"];

/// Final flag set for a launch: caller flags first, hardening flags last.
#[must_use]
pub fn compose_flags(flags: &[String]) -> Vec<String> {
    flags
        .iter()
        .cloned()
        .chain(HARDENING_FLAGS.iter().map(ToString::to_string))
        .collect()
}

/// The executable override for a request, if any. `None` falls back to
/// chromiumoxide's default binary resolution.
pub(crate) fn resolve_executable<'a>(
    request: &LaunchRequest,
    settings: &'a BrowserSettings,
) -> Option<&'a str> {
    request
        .use_chrome_stable
        .then_some(settings.stable_executable.as_str())
}

/// Extract the listening port from the browser's websocket endpoint.
pub(crate) fn parse_devtools_port(endpoint: &str) -> Result<u16> {
    let parsed = url::Url::parse(endpoint)
        .map_err(|e| BrowserError::Endpoint(format!("{endpoint}: {e}")))?;
    parsed
        .port()
        .ok_or_else(|| BrowserError::Endpoint(format!("no port in {endpoint}")))
}

/// Devtools path of a page, derived from its CDP target identifier.
#[must_use]
pub(crate) fn devtools_path(target_id: &str) -> String {
    format!("/devtools/page/{target_id}")
}

fn describe_exception(details: &ExceptionDetails) -> String {
    if let Some(description) = details
        .exception
        .as_ref()
        .and_then(|remote| remote.description.as_ref())
    {
        return description.clone();
    }
    format!(
        "{} (line {}, column {})",
        details.text, details.line_number, details.column_number
    )
}

/// One launched, isolated browser process plus its single open page.
///
/// Owned exclusively by the invocation that launched it. Dropping the
/// session tears down the CDP connection; until then the page-fault
/// observer keeps reporting.
pub struct Session {
    browser: Browser,
    page: Arc<WorkerPage>,
    info: LaunchedInfo,
    handler_task: JoinHandle<()>,
    observer_task: JoinHandle<()>,
}

impl Session {
    /// Where the parent can attach to this session.
    #[must_use]
    pub fn info(&self) -> &LaunchedInfo {
        &self.info
    }

    /// The session's page as the seam the sandbox drives.
    #[must_use]
    pub fn actions(&self) -> Arc<dyn PageActions> {
        Arc::clone(&self.page) as Arc<dyn PageActions>
    }

    /// The underlying browser handle.
    #[must_use]
    pub fn browser(&self) -> &Browser {
        &self.browser
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.observer_task.abort();
        self.handler_task.abort();
    }
}

/// Boots browser sessions for `start` commands.
pub struct SessionLauncher {
    settings: BrowserSettings,
    sink: Arc<dyn EventSink>,
}

impl SessionLauncher {
    pub fn new(settings: BrowserSettings, sink: Arc<dyn EventSink>) -> Self {
        Self { settings, sink }
    }

    /// Launch one isolated session for the given request.
    ///
    /// On success the `launched` event has already been delivered to the
    /// parent: the parent always learns of a session before any sandboxed
    /// code can touch it. Launch failures (missing binary, timeout,
    /// unreachable endpoint) propagate to the caller.
    pub async fn launch(&self, request: &LaunchRequest) -> Result<Session> {
        let flags = compose_flags(&request.flags);
        debug!(?flags, use_chrome_stable = request.use_chrome_stable, "launching browser session");

        let mut builder = BrowserConfig::builder()
            .window_size(self.settings.window_width, self.settings.window_height)
            .args(flags);
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = resolve_executable(request, &self.settings) {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(BrowserError::Chromium)?;

        let launch_timeout = Duration::from_secs(self.settings.launch_timeout_secs);
        let (browser, mut handler) = tokio::time::timeout(launch_timeout, Browser::launch(config))
            .await
            .map_err(|_| BrowserError::LaunchTimeout {
                secs: self.settings.launch_timeout_secs,
            })?
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        // The handler stream must be polled for the session to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        // Page-fault observer: uncaught in-page errors become `error` events.
        // Faults are reported, never fatal; the session keeps running.
        let mut exceptions = page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        let sink = Arc::clone(&self.sink);
        let observer_task = tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let message = describe_exception(&event.exception_details);
                warn!(%message, "page fault");
                sink.emit(WorkerEvent::error(message));
            }
        });

        let port = parse_devtools_port(browser.websocket_address())?;
        let page = Arc::new(WorkerPage::new(page));
        let info = LaunchedInfo {
            port,
            url: devtools_path(page.target_id()),
        };

        info!(port = info.port, url = %info.url, "browser session launched");
        self.sink.emit(WorkerEvent::launched(info.clone()));

        Ok(Session {
            browser,
            page,
            info,
            handler_task,
            observer_task,
        })
    }
}
