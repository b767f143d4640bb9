use std::time::Duration;

use report_core::TransportResponse;
use report_engine::{ReqwestTransport, Transport, TransportError, TransportSettings};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(base_url: String) -> TransportSettings {
    TransportSettings {
        base_url,
        ..TransportSettings::default()
    }
}

fn form() -> Vec<(String, String)> {
    vec![
        ("brand".to_string(), "Acme & Sons".to_string()),
        ("product".to_string(), "Wine,Olive oil".to_string()),
        ("ai_model".to_string(), "gpt-5".to_string()),
    ]
}

#[tokio::test]
async fn generate_posts_urlencoded_form_with_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("cookie", "access_token=secret"))
        .and(body_string_contains("brand=Acme+%26+Sons"))
        .and(body_string_contains("product=Wine%2COlive+oil"))
        .and(body_string_contains("ai_model=gpt-5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"success","redirect_url":"/report/x.html"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(TransportSettings {
        session_token: Some("secret".to_string()),
        ..settings(server.uri())
    })
    .expect("transport");

    let response = transport.generate(&form()).await;
    assert_eq!(
        response,
        TransportResponse::Http {
            status: 200,
            body: r#"{"status":"success","redirect_url":"/report/x.html"}"#.to_string(),
        }
    );
}

#[tokio::test]
async fn server_errors_are_passed_through_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Error</h1>"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(settings(server.uri())).expect("transport");

    let response = transport.generate(&form()).await;
    assert_eq!(
        response,
        TransportResponse::Http {
            status: 500,
            body: "<h1>Error</h1>".to_string(),
        }
    );
}

#[tokio::test]
async fn slow_generate_reports_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(TransportSettings {
        request_timeout: Duration::from_millis(50),
        ..settings(server.uri())
    })
    .expect("transport");

    assert_eq!(
        transport.generate(&form()).await,
        TransportResponse::TimedOut
    );
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let transport =
        ReqwestTransport::new(settings(format!("http://127.0.0.1:{port}"))).expect("transport");

    assert_eq!(
        transport.job_status("abc").await,
        TransportResponse::Unreachable
    );
}

#[tokio::test]
async fn job_status_uses_encoded_id_under_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/job-status/a%20b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":"processing","progress":25}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport =
        ReqwestTransport::new(settings(format!("{}/app", server.uri()))).expect("transport");

    assert_eq!(
        transport.job_status("a b").await,
        TransportResponse::Http {
            status: 200,
            body: r#"{"status":"processing","progress":25}"#.to_string(),
        }
    );
    assert_eq!(
        transport.absolute_url("/report/x.html?brand=Acme"),
        format!("{}/app/report/x.html?brand=Acme", server.uri())
    );
}

#[tokio::test]
async fn oversized_bodies_are_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("x".repeat(100)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(TransportSettings {
        max_body_bytes: 10,
        ..settings(server.uri())
    })
    .expect("transport");

    match transport.generate(&form()).await {
        TransportResponse::Http { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body.len(), 10);
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[test]
fn non_http_base_url_is_rejected() {
    let err = ReqwestTransport::new(settings("ftp://example.com".to_string())).unwrap_err();
    assert!(matches!(err, TransportError::InvalidBaseUrl { .. }));
}
