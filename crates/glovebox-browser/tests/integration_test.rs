use glovebox_browser::SessionLauncher;
use glovebox_core::config::BrowserSettings;
use glovebox_core::protocol::{EventSink, LaunchRequest, WorkerEvent};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<WorkerEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: WorkerEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}

fn start_request(code: &str) -> LaunchRequest {
    LaunchRequest {
        code: code.to_string(),
        flags: Vec::new(),
        use_chrome_stable: false,
    }
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_launch_reports_session_before_returning() {
    let sink = Arc::new(RecordingSink::default());
    let launcher = SessionLauncher::new(BrowserSettings::default(), sink.clone());

    let session = launcher
        .launch(&start_request("async () => {}"))
        .await
        .expect("launch session");

    let events = sink.events.lock().expect("sink lock");
    assert_eq!(events.len(), 1);
    match &events[0] {
        WorkerEvent::Launched { context } => {
            assert!(context.port > 0);
            assert!(context.url.starts_with("/devtools/page/"));
            assert_eq!(context, session.info());
        }
        other => panic!("expected launched event, got {other:?}"),
    }
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_page_fault_is_reported_and_session_survives() {
    let sink = Arc::new(RecordingSink::default());
    let launcher = SessionLauncher::new(BrowserSettings::default(), sink.clone());

    let session = launcher
        .launch(&start_request("async () => {}"))
        .await
        .expect("launch session");

    // An uncaught in-page exception must surface as exactly one error event.
    let _ = session
        .actions()
        .evaluate("setTimeout(() => { throw new Error('simulated fault'); }, 0)")
        .await
        .expect("schedule fault");
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let events = sink.events.lock().expect("sink lock");
    let faults: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, WorkerEvent::Error { .. }))
        .collect();
    assert_eq!(faults.len(), 1);

    // Session is still usable afterwards.
    drop(events);
    let value = session
        .actions()
        .evaluate("1 + 1")
        .await
        .expect("evaluate after fault");
    assert_eq!(value, serde_json::json!(2));
}
