//! Tests for `Transport`.

use super::test_fixtures::{
    MockClient, RecordingSleeper, TEST_TOKEN, base_url, response, response_with_header, transport,
};
use super::{
    ErrorKind, FilePart, HttpError, MultipartForm, RateLimiter, RequestDescriptor, RetryPolicy,
    Transport, TransportError,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod construction {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        let result = Transport::new(MockClient::default(), base_url(), "v23.0", "  ");

        assert!(matches!(result, Err(TransportError::Validation(_))));
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let result = Transport::new(MockClient::default(), base_url(), "v23.0", "abc\ndef");

        assert!(matches!(result, Err(TransportError::Validation(_))));
    }

    #[test]
    fn empty_api_version_is_rejected() {
        let result = Transport::new(MockClient::default(), base_url(), "", TEST_TOKEN);

        assert!(matches!(result, Err(TransportError::Validation(_))));
    }

    #[test]
    fn non_base_url_is_rejected() {
        let url = url::Url::parse("mailto:ops@example.com").unwrap();
        let result = Transport::new(MockClient::default(), url, "v23.0", TEST_TOKEN);

        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn debug_output_hides_token() {
        let transport = Transport::new(MockClient::default(), base_url(), "v23.0", TEST_TOKEN).unwrap();

        let debug = format!("{transport:?}");
        assert!(!debug.contains(TEST_TOKEN));
    }

    #[test]
    fn defaults_apply() {
        let transport = Transport::new(MockClient::default(), base_url(), "v23.0", TEST_TOKEN).unwrap();

        assert_eq!(transport.api_version(), "v23.0");
        assert_eq!(transport.retry_policy(), &RetryPolicy::default());
        assert_eq!(
            transport.rate_limiter().requests_per_second(),
            RateLimiter::DEFAULT_REQUESTS_PER_SECOND
        );
    }
}

mod url_building {
    use super::*;

    #[test]
    fn path_is_joined_under_version() {
        let transport = transport(Arc::new(MockClient::default()));

        let url = transport.resolve("1234567890/messages").unwrap();
        assert_eq!(url.as_str(), "https://graph.example.com/v23.0/1234567890/messages");
    }

    #[test]
    fn slashes_around_path_are_ignored() {
        let transport = transport(Arc::new(MockClient::default()));

        let url = transport.resolve("/media_1/").unwrap();
        assert_eq!(url.as_str(), "https://graph.example.com/v23.0/media_1");
    }

    #[test]
    fn base_url_with_path_prefix_is_kept() {
        let base = url::Url::parse("http://127.0.0.1:8080/graph/").unwrap();
        let transport = Transport::new(MockClient::default(), base, "v19.0", TEST_TOKEN).unwrap();

        let url = transport.resolve("me").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/graph/v19.0/me");
    }

    #[test]
    fn empty_path_is_a_validation_error() {
        let transport = transport(Arc::new(MockClient::default()));

        let err = transport.resolve(" / ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn empty_path_makes_no_network_call() {
        let client = Arc::new(MockClient::default());
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn query_parameters_are_encoded() {
        let client = Arc::new(MockClient::statuses(&[200], "{}"));
        let transport = transport(Arc::clone(&client));

        let descriptor = RequestDescriptor::get("media_1").with_query("phone_number_id", "1 2&3");
        transport.send(&descriptor).await.unwrap();

        let url = client.last_request().url;
        assert_eq!(url.query(), Some("phone_number_id=1+2%263"));
    }

    #[tokio::test]
    async fn no_query_leaves_url_without_question_mark() {
        let client = Arc::new(MockClient::statuses(&[200], "{}"));
        let transport = transport(Arc::clone(&client));

        transport.send(&RequestDescriptor::get("me")).await.unwrap();

        assert_eq!(client.last_request().url.query(), None);
    }
}

mod request_encoding {
    use super::*;

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let client = Arc::new(MockClient::statuses(&[200], "{}"));
        let transport = transport(Arc::clone(&client));

        transport.send(&RequestDescriptor::get("me")).await.unwrap();

        let request = client.last_request();
        assert_eq!(
            request.header(&AUTHORIZATION),
            Some(format!("Bearer {TEST_TOKEN}").as_str())
        );
    }

    #[tokio::test]
    async fn json_body_sets_content_type() {
        let client = Arc::new(MockClient::statuses(&[200], "{}"));
        let transport = transport(Arc::clone(&client));
        let body = json!({"messaging_product": "whatsapp", "to": "15551234567"});

        transport
            .send(&RequestDescriptor::post("1/messages").with_json(body.clone()))
            .await
            .unwrap();

        let request = client.last_request();
        assert_eq!(request.method, http::Method::POST);
        assert_eq!(request.header(&CONTENT_TYPE), Some("application/json"));
        let sent: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[tokio::test]
    async fn descriptor_without_json_sends_no_body() {
        let client = Arc::new(MockClient::statuses(&[200], "{}"));
        let transport = transport(Arc::clone(&client));

        transport.send(&RequestDescriptor::delete("media_1")).await.unwrap();

        let request = client.last_request();
        assert_eq!(request.method, http::Method::DELETE);
        assert!(request.body.is_none());
        assert!(request.header(&CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn extra_headers_are_forwarded_but_auth_is_not_overridden() {
        let client = Arc::new(MockClient::statuses(&[200], "{}"));
        let transport = transport(Arc::clone(&client));

        let descriptor = RequestDescriptor::get("me")
            .with_header(
                http::HeaderName::from_static("x-request-id"),
                http::HeaderValue::from_static("r-1"),
            )
            .with_header(AUTHORIZATION, http::HeaderValue::from_static("Bearer other"));
        transport.send(&descriptor).await.unwrap();

        let request = client.last_request();
        assert_eq!(
            request.header(&http::HeaderName::from_static("x-request-id")),
            Some("r-1")
        );
        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(
            request.header(&AUTHORIZATION),
            Some(format!("Bearer {TEST_TOKEN}").as_str())
        );
    }

    #[tokio::test]
    async fn multipart_body_and_content_type() {
        let client = Arc::new(MockClient::statuses(&[200], r#"{"id":"media_1"}"#));
        let transport = transport(Arc::clone(&client));
        let form = MultipartForm::with_boundary("B")
            .text("messaging_product", "whatsapp")
            .file("file", FilePart::new(b"img".to_vec()).with_mime_type("image/png"));

        let result = transport
            .send_multipart(&RequestDescriptor::post("1/media"), &form)
            .await
            .unwrap();

        assert_eq!(result["id"], "media_1");
        let request = client.last_request();
        assert_eq!(
            request.header(&CONTENT_TYPE),
            Some("multipart/form-data; boundary=B")
        );
        assert_eq!(request.body.unwrap(), form.encode());
    }
}

mod responses {
    use super::*;

    #[tokio::test]
    async fn json_object_is_returned() {
        let client = Arc::new(MockClient::statuses(&[200], r#"{"id":"abc","n":2}"#));
        let transport = transport(client);

        let map = transport.send(&RequestDescriptor::get("x")).await.unwrap();

        assert_eq!(map["id"], "abc");
        assert_eq!(map["n"], 2);
    }

    #[tokio::test]
    async fn empty_body_is_empty_map() {
        let client = Arc::new(MockClient::statuses(&[204], ""));
        let transport = transport(client);

        let map = transport.send(&RequestDescriptor::delete("x")).await.unwrap();

        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let client = Arc::new(MockClient::statuses(&[200], "<html>"));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn json_array_is_parse_error() {
        let client = Arc::new(MockClient::statuses(&[200], "[1,2]"));
        let transport = transport(client);

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert!(matches!(err, TransportError::Parse { status, .. } if status == 200));
    }
}

mod retries {
    use super::*;

    #[tokio::test]
    async fn transient_statuses_then_success() {
        let client = Arc::new(MockClient::new(vec![
            Ok(response(500, "")),
            Ok(response(500, "")),
            Ok(response(200, r#"{"id":"abc"}"#)),
        ]));
        let transport = transport(Arc::clone(&client));

        let map = transport.send(&RequestDescriptor::get("x")).await.unwrap();

        assert_eq!(map["id"], "abc");
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn retry_resends_identical_request() {
        let client = Arc::new(MockClient::new(vec![
            Ok(response(503, "")),
            Ok(response(200, "{}")),
        ]));
        let transport = transport(Arc::clone(&client));

        transport
            .send(&RequestDescriptor::post("1/messages").with_json(json!({"a": 1})))
            .await
            .unwrap();

        let requests = client.captured_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, requests[1].url);
        assert_eq!(requests[0].body, requests[1].body);
        assert_eq!(requests[0].headers, requests[1].headers);
    }

    #[tokio::test]
    async fn delays_follow_exponential_backoff() {
        let client = Arc::new(MockClient::statuses(&[502, 502, 502], ""));
        let sleeper = RecordingSleeper::default();
        let transport = transport(Arc::clone(&client)).with_sleeper(sleeper.clone());

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert!(matches!(err, TransportError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(
            sleeper.delays(),
            [Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn never_exceeds_max_attempts_and_delays_do_not_decrease() {
        for max_attempts in 1..=5 {
            let client = Arc::new(MockClient::statuses(&[503; 5], ""));
            let sleeper = RecordingSleeper::default();
            let transport = transport(Arc::clone(&client))
                .with_retry_policy(
                    RetryPolicy::new()
                        .with_max_attempts(max_attempts)
                        .with_initial_delay(Duration::from_millis(10))
                        .with_max_delay(Duration::from_millis(25)),
                )
                .with_sleeper(sleeper.clone());

            let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

            assert_eq!(client.calls(), max_attempts as usize);
            assert_eq!(err.attempts(), Some(max_attempts));
            let delays = sleeper.delays();
            assert_eq!(delays.len(), max_attempts as usize - 1);
            assert!(delays.windows(2).all(|w| w[0] <= w[1]));
            assert!(delays.iter().all(|d| *d <= Duration::from_millis(25)));
        }
    }

    #[tokio::test]
    async fn connection_failures_then_success() {
        let client = Arc::new(MockClient::new(vec![
            Err(HttpError::Timeout),
            Err(HttpError::Connection("reset".into())),
            Ok(response(200, "{}")),
        ]));
        let transport = transport(Arc::clone(&client));

        assert!(transport.send(&RequestDescriptor::get("x")).await.is_ok());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn network_failure_exhausts_retries() {
        let client = Arc::new(MockClient::new(vec![
            Err(HttpError::Timeout),
            Err(HttpError::Timeout),
            Err(HttpError::Timeout),
        ]));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Network {
                attempts: 3,
                source: HttpError::Timeout
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[tokio::test]
    async fn invalid_url_from_client_is_not_retried() {
        let client = Arc::new(MockClient::new(vec![Err(HttpError::InvalidUrl(
            "bad".to_string(),
        ))]));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert!(matches!(err, TransportError::InvalidUrl(_)));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn every_attempt_waits_on_the_rate_limiter() {
        let client = Arc::new(MockClient::statuses(&[500, 500, 200], "{}"));
        let transport = transport(Arc::clone(&client)).with_rate_limiter(RateLimiter::per_second(20));
        let start = std::time::Instant::now();

        transport.send(&RequestDescriptor::get("x")).await.unwrap();

        // Three attempts at 20/s span at least two 50ms intervals.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}

mod classification {
    use super::*;

    #[tokio::test]
    async fn unauthorized_is_authentication_without_retry() {
        let client = Arc::new(MockClient::statuses(
            &[401],
            r#"{"error":{"message":"Invalid token","code":190}}"#,
        ));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.code(), Some(190));
        assert_eq!(err.detail().unwrap().message, "Invalid token");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn forbidden_is_authentication() {
        let client = Arc::new(MockClient::statuses(&[403], ""));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn token_error_code_on_bad_request_is_authentication() {
        let client = Arc::new(MockClient::statuses(
            &[400],
            r#"{"error":{"message":"Session has expired","type":"OAuthException","code":190,"error_subcode":463}}"#,
        ));
        let transport = transport(client);

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.detail().unwrap().subcode, Some(463));
    }

    #[tokio::test]
    async fn bad_request_is_api_error_without_retry() {
        let client = Arc::new(MockClient::statuses(
            &[400],
            r#"{"error":{"message":"Invalid parameter","type":"OAuthException","code":100,"fbtrace_id":"Az1"}}"#,
        ));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.code(), Some(100));
        let detail = err.detail().unwrap();
        assert_eq!(detail.error_type.as_deref(), Some("OAuthException"));
        assert_eq!(detail.trace_id.as_deref(), Some("Az1"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn plain_text_error_body_becomes_message() {
        let client = Arc::new(MockClient::statuses(&[404], "no such node"));
        let transport = transport(client);

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.detail().unwrap().message, "no such node");
        assert_eq!(err.code(), None);
    }

    #[tokio::test]
    async fn persistent_429_is_rate_limited_with_retry_after() {
        let client = Arc::new(MockClient::new(vec![
            Ok(response_with_header(429, "", "retry-after", "1")),
            Ok(response_with_header(429, "", "retry-after", "1")),
            Ok(response_with_header(429, "", "retry-after", "7")),
        ]));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert!(matches!(
            err,
            TransportError::RateLimited {
                attempts: 3,
                retry_after: Some(d),
                ..
            } if d == Duration::from_secs(7)
        ));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn retry_after_lengthens_backoff_up_to_max_delay() {
        let client = Arc::new(MockClient::new(vec![
            Ok(response_with_header(429, "", "retry-after", "1")),
            Ok(response_with_header(429, "", "retry-after", "60")),
            Ok(response(200, "{}")),
        ]));
        let sleeper = RecordingSleeper::default();
        let transport = transport(client).with_sleeper(sleeper.clone());

        transport.send(&RequestDescriptor::get("x")).await.unwrap();

        assert_eq!(
            sleeper.delays(),
            [Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn non_retryable_5xx_is_api_error() {
        let client = Arc::new(MockClient::statuses(&[501], ""));
        let transport = transport(Arc::clone(&client));

        let err = transport.send(&RequestDescriptor::get("x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(client.calls(), 1);
    }
}

mod binary {
    use super::*;

    #[tokio::test]
    async fn absolute_url_is_used_verbatim() {
        let client = Arc::new(MockClient::new(vec![Ok(response(200, "\u{1}\u{2}bytes"))]));
        let transport = transport(Arc::clone(&client));

        let bytes = transport
            .fetch_binary("https://lookaside.example.net/whatsapp?mid=1&ext=2")
            .await
            .unwrap();

        assert_eq!(bytes, b"\x01\x02bytes");
        let request = client.last_request();
        assert_eq!(request.method, http::Method::GET);
        assert_eq!(
            request.url.as_str(),
            "https://lookaside.example.net/whatsapp?mid=1&ext=2"
        );
        assert!(request.header(&AUTHORIZATION).is_some());
    }

    #[tokio::test]
    async fn relative_path_is_resolved() {
        let client = Arc::new(MockClient::statuses(&[200], "raw"));
        let transport = transport(Arc::clone(&client));

        transport.fetch_binary("media_1").await.unwrap();

        assert_eq!(
            client.last_request().url.as_str(),
            "https://graph.example.com/v23.0/media_1"
        );
    }

    #[tokio::test]
    async fn body_is_not_parsed_as_json() {
        let client = Arc::new(MockClient::statuses(&[200], "not json"));
        let transport = transport(client);

        assert_eq!(transport.fetch_binary("m").await.unwrap(), b"not json");
    }

    #[tokio::test]
    async fn binary_fetch_is_retried() {
        let client = Arc::new(MockClient::statuses(&[500, 200], "ok"));
        let transport = transport(Arc::clone(&client));

        assert_eq!(transport.fetch_binary("m").await.unwrap(), b"ok");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn malformed_absolute_url_is_invalid_url() {
        let client = Arc::new(MockClient::default());
        let transport = transport(Arc::clone(&client));

        let err = transport.fetch_binary("https://").await.unwrap_err();

        assert!(matches!(err, TransportError::InvalidUrl(_)));
        assert_eq!(client.calls(), 0);
    }
}
