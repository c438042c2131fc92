use std::time::Duration;

use fireeagle::{Client, ClientConfig, Endpoints, Error, Format, TokenState};
use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        authorization_url: format!("{}/oauth/authorize", server.uri()),
        ..Endpoints::with_server(server.uri())
    }
}

#[tokio::test]
async fn handshake_then_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/request_token"))
        .and(query_param("oauth_consumer_key", "consumer-key"))
        .and(query_param("oauth_callback", "oob"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=req&oauth_token_secret=req-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .and(query_param("oauth_token", "req"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=acc&oauth_token_secret=acc-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/user.json"))
        .and(query_param("oauth_token", "acc"))
        .and(query_param("oauth_signature_method", "HMAC-SHA1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"stat":"ok","user":{"token":"acc"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new("consumer-key", "consumer-secret")
        .format(Format::Json)
        .endpoints(endpoints(&server));
    let client = Client::new(config).unwrap();

    let url = client.request_authorization_url().await.unwrap();
    assert_eq!(url, format!("{}/oauth/authorize?oauth_token=req", server.uri()));

    let token = client.convert_to_access_token(None).await.unwrap();
    assert_eq!(token.value(), "acc");
    assert_eq!(client.token_state().await, TokenState::AccessTokenObtained);

    let user = client.user().await.unwrap();
    assert_eq!(
        user.into_json().unwrap()["user"]["token"],
        serde_json::json!("acc")
    );
}

#[tokio::test]
async fn update_posts_signed_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/0.1/update.xml"))
        .and(header_exists("authorization"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("lat=51.5&lon=-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<rsp stat="ok"/>"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new("consumer-key", "consumer-secret")
        .access_token("acc", "acc-secret")
        .endpoints(endpoints(&server))
        .timeout(Duration::from_secs(5));
    let client = Client::new(config).unwrap();

    let decoded = client
        .update(&[("lat", "51.5"), ("lon", "-0.12"), ("bogus", "x")])
        .await
        .unwrap();
    assert_eq!(decoded.as_xml().unwrap().attribute("stat"), Some("ok"));
}

#[tokio::test]
async fn failure_document_becomes_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/lookup.xml"))
        .and(query_param("q", "Nowhere"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"<rsp stat="fail"><err code="12" msg="Invalid token"/></rsp>"#,
        ))
        .mount(&server)
        .await;

    let config = ClientConfig::new("consumer-key", "consumer-secret")
        .access_token("acc", "acc-secret")
        .endpoints(endpoints(&server));
    let client = Client::new(config).unwrap();

    let err = client.lookup(&[("q", "Nowhere")]).await.unwrap_err();
    assert_eq!(err.service_message(), Some("Invalid token"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let config = ClientConfig::new("consumer-key", "consumer-secret")
        .access_token("acc", "acc-secret")
        .endpoints(Endpoints::with_server("http://127.0.0.1:1"));
    let client = Client::new(config).unwrap();

    assert!(matches!(client.user().await, Err(Error::Transport(_))));
}

#[tokio::test]
async fn sub_second_timeout_still_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/user.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<rsp stat="ok"/>"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new("consumer-key", "consumer-secret")
        .access_token("acc", "acc-secret")
        .endpoints(endpoints(&server))
        .timeout(Duration::from_millis(500));
    let client = Client::new(config).unwrap();

    let decoded = client.user().await.unwrap();
    assert_eq!(decoded.as_xml().unwrap().attribute("stat"), Some("ok"));
}
