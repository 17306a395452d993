use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use filedrop_engine::{
    ChannelSettings, ChannelState, EngineEvent, EngineHandle, EventSink, FailureKind, UploadError,
    UploadSource, Uploader,
};

/// Completes uploads with scripted outcomes after emitting one half-way tick.
#[derive(Default)]
struct ScriptedUploader {
    outcomes: Mutex<HashMap<u64, Result<String, UploadError>>>,
}

#[async_trait::async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(
        &self,
        item_id: u64,
        source: UploadSource,
        sink: Arc<dyn EventSink>,
    ) -> Result<String, UploadError> {
        sink.emit(EngineEvent::UploadProgress {
            item_id,
            bytes_sent: source.size / 2,
            bytes_total: source.size,
        });
        self.outcomes
            .lock()
            .unwrap()
            .remove(&item_id)
            .unwrap_or_else(|| Ok(format!("https://host/{}", source.file_name)))
    }
}

fn collect(engine: &EngineHandle, count: usize) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while events.len() < count && Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            events.push(event);
        }
    }
    events
}

fn source(name: &str, size: u64) -> UploadSource {
    UploadSource {
        path: format!("/data/{name}").into(),
        file_name: name.to_string(),
        size,
    }
}

#[test]
fn upload_reports_progress_then_completion() {
    let engine = EngineHandle::with_uploader(
        Arc::new(ScriptedUploader::default()),
        ChannelSettings::disabled(),
    );
    engine.upload(0, source("a.txt", 10));

    let events = collect(&engine, 2);
    assert_eq!(
        events,
        vec![
            EngineEvent::UploadProgress {
                item_id: 0,
                bytes_sent: 5,
                bytes_total: 10,
            },
            EngineEvent::UploadCompleted {
                item_id: 0,
                result: Ok("https://host/a.txt".to_string()),
            },
        ]
    );
}

#[test]
fn upload_failures_are_reported_as_events() {
    let uploader = ScriptedUploader::default();
    uploader.outcomes.lock().unwrap().insert(
        3,
        Err(UploadError {
            kind: FailureKind::Network,
            message: "connection reset".to_string(),
        }),
    );
    let engine = EngineHandle::with_uploader(Arc::new(uploader), ChannelSettings::disabled());
    engine.upload(3, source("b.txt", 4));

    let completed = collect(&engine, 2).into_iter().find_map(|event| match event {
        EngineEvent::UploadCompleted { item_id, result } => Some((item_id, result)),
        _ => None,
    });
    let (item_id, result) = completed.expect("completion event");
    assert_eq!(item_id, 3);
    assert_eq!(result.unwrap_err().kind, FailureKind::Network);
}

#[test]
fn fetch_without_channel_reports_lost_once() {
    let engine = EngineHandle::with_uploader(
        Arc::new(ScriptedUploader::default()),
        ChannelSettings::disabled(),
    );
    engine.fetch(0, "http://x/a.bin");
    engine.fetch(1, "http://x/b.bin");

    let events = collect(&engine, 2);
    assert_eq!(
        events,
        vec![EngineEvent::ChannelState(ChannelState::Lost)]
    );
}

#[test]
fn unreachable_channel_reports_lost() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let engine = EngineHandle::with_uploader(
        Arc::new(ScriptedUploader::default()),
        ChannelSettings::new(format!("ws://{addr}/fromurl")),
    );
    engine.fetch(0, "http://x/a.bin");

    let events = collect(&engine, 1);
    assert_eq!(events, vec![EngineEvent::ChannelState(ChannelState::Lost)]);
}

/// Accepts TCP connections through the listen backlog but never answers the
/// websocket handshake.
fn silent_server() -> (std::net::TcpListener, String) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}/fromurl", listener.local_addr().unwrap());
    (listener, url)
}

#[test]
fn stalled_handshake_does_not_hold_up_uploads() {
    let (_listener, url) = silent_server();
    let engine =
        EngineHandle::with_uploader(Arc::new(ScriptedUploader::default()), ChannelSettings::new(url));

    engine.fetch(0, "http://x/a.bin");
    engine.upload(1, source("b.txt", 8));
    assert_eq!(
        collect(&engine, 2),
        vec![
            EngineEvent::UploadProgress {
                item_id: 1,
                bytes_sent: 4,
                bytes_total: 8,
            },
            EngineEvent::UploadCompleted {
                item_id: 1,
                result: Ok("https://host/b.txt".to_string()),
            },
        ]
    );

    engine.fetch(2, "http://x/c.bin");
    engine.upload(3, source("d.txt", 2));
    assert_eq!(
        collect(&engine, 2),
        vec![
            EngineEvent::UploadProgress {
                item_id: 3,
                bytes_sent: 1,
                bytes_total: 2,
            },
            EngineEvent::UploadCompleted {
                item_id: 3,
                result: Ok("https://host/d.txt".to_string()),
            },
        ]
    );
}

#[test]
fn handshake_timeout_reports_lost_once() {
    let (_listener, url) = silent_server();
    let channel = ChannelSettings {
        url: Some(url),
        connect_timeout: Some(Duration::from_millis(200)),
    };
    let engine = EngineHandle::with_uploader(Arc::new(ScriptedUploader::default()), channel);

    engine.fetch(0, "http://x/a.bin");
    engine.fetch(1, "http://x/b.bin");

    let events = collect(&engine, 2);
    assert_eq!(events, vec![EngineEvent::ChannelState(ChannelState::Lost)]);
}
