use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use filedrop_engine::{
    EngineEvent, EventSink, FailureKind, ReqwestUploader, UploadSettings, UploadSource, Uploader,
};
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn temp_file(content: &[u8]) -> (NamedTempFile, UploadSource) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    let source = UploadSource {
        path: file.path().to_path_buf(),
        file_name: "notes.txt".to_string(),
        size: content.len() as u64,
    };
    (file, source)
}

#[tokio::test]
async fn uploads_multipart_and_returns_trimmed_locator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"notes.txt\""))
        .and(body_string_contains("hello upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://host/Ab12.txt\n"))
        .expect(1)
        .mount(&server)
        .await;

    let uploader = ReqwestUploader::new(UploadSettings::new(format!("{}/upload", server.uri())));
    let sink = Arc::new(TestSink::default());
    let (_file, source) = temp_file(b"hello upload");

    let link = uploader
        .upload(4, source, sink.clone())
        .await
        .expect("upload ok");
    assert_eq!(link, "https://host/Ab12.txt");

    let progress: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::UploadProgress {
                item_id,
                bytes_sent,
                bytes_total,
            } => Some((item_id, bytes_sent, bytes_total)),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    assert_eq!(progress.last().copied(), Some((4, 12, 12)));
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let uploader = ReqwestUploader::new(UploadSettings::new(format!("{}/upload", server.uri())));
    let (_file, source) = temp_file(b"data");

    let err = uploader
        .upload(1, source, Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn missing_file_is_an_io_failure() {
    let uploader = ReqwestUploader::new(UploadSettings::new("http://127.0.0.1:9/upload"));
    let source = UploadSource {
        path: "/definitely/not/here.bin".into(),
        file_name: "here.bin".to_string(),
        size: 3,
    };

    let err = uploader
        .upload(2, source, Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn invalid_endpoint_is_rejected() {
    let uploader = ReqwestUploader::new(UploadSettings::new("not an endpoint"));
    let (_file, source) = temp_file(b"data");

    let err = uploader
        .upload(3, source, Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidEndpoint);
}

#[tokio::test]
async fn optional_request_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_string("late"),
        )
        .mount(&server)
        .await;

    let settings = UploadSettings {
        request_timeout: Some(Duration::from_millis(50)),
        ..UploadSettings::new(format!("{}/upload", server.uri()))
    };
    let uploader = ReqwestUploader::new(settings);
    let (_file, source) = temp_file(b"data");

    let err = uploader
        .upload(5, source, Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}
