use etl::error::ErrorKind;
use etl::source::RawDataSource;
use etl::source::http::HttpSource;
use etl::test_utils::fixtures::test_date;
use telemetry::init_test_tracing;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answers the first request on a local port with `status` and `body`, then closes.
///
/// Returns the base URL to point a source at and a handle resolving to the request head.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut request: Vec<u8> = Vec::new();
        let mut buffer = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buffer).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{address}"), handle)
}

#[tokio::test]
async fn unreachable_source_is_a_connection_failure() {
    init_test_tracing();
    // Nothing listens on the discard port of the loopback interface.
    let source = HttpSource::with_client(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();

    let err = source
        .fetch(test_date(), &["wind_speed".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceConnectionFailed);
}

#[test]
fn data_path_is_appended_to_the_base_url() {
    let source = HttpSource::with_client(reqwest::Client::new(), "http://localhost:8000/").unwrap();

    assert_eq!(source.data_url().as_str(), "http://localhost:8000/data");
}

#[tokio::test]
async fn error_status_is_a_failed_request() {
    init_test_tracing();
    let (url, server) = serve_once("500 Internal Server Error", r#"{"detail": "boom"}"#).await;
    let source = HttpSource::with_client(reqwest::Client::new(), &url).unwrap();

    let err = source
        .fetch(test_date(), &["wind_speed".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceRequestFailed);
    server.await.unwrap();
}

#[tokio::test]
async fn empty_array_is_no_data() {
    init_test_tracing();
    let (url, server) = serve_once("200 OK", "[]").await;
    let source = HttpSource::with_client(reqwest::Client::new(), &url).unwrap();

    let err = source
        .fetch(test_date(), &["wind_speed".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceNoData);
    server.await.unwrap();
}

#[tokio::test]
async fn requests_the_whole_day_with_inclusive_bounds() {
    init_test_tracing();
    let body = r#"[
        {"timestamp": "2024-01-15T10:00:00", "wind_speed": 10.5, "power": 100.0},
        {"timestamp": "2024-01-15T10:01:00", "wind_speed": 11.5}
    ]"#;
    let (url, server) = serve_once("200 OK", body).await;
    let source = HttpSource::with_client(reqwest::Client::new(), &url).unwrap();

    let table = source
        .fetch(test_date(), &["wind_speed".to_string(), "power".to_string()])
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.observations()[1].value("power"), None);

    let request = server.await.unwrap();
    let request_line = request.lines().next().unwrap();
    assert!(request_line.starts_with("GET /data?"));
    assert!(request_line.contains("start=2024-01-15T00%3A00%3A00"));
    assert!(request_line.contains("end=2024-01-15T23%3A59%3A59"));
    assert!(request_line.contains("variables=wind_speed&variables=power"));
}
