use super::*;
use crate::auth::SESSION_COOKIE;
use axum::http::{
    HeaderValue,
    header::{AUTHORIZATION, COOKIE},
};
use std::sync::Mutex;
use stowage_shared::{EmailError, JwtConfig};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::SendError("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push((
            to_email.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

fn jwt() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-at-least-32-bytes-long".to_string(),
        ..JwtConfig::default()
    })
}

fn provider(mailer: Arc<RecordingMailer>) -> JwtAuthProvider {
    JwtAuthProvider::new(jwt(), mailer, "https://files.example.com/")
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

fn token_from_link(body: &str) -> String {
    let start = body.find("token=").expect("link in body") + "token=".len();
    body[start..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_no_credentials_is_no_session() {
    let provider = provider(Arc::default());
    let session = provider.get_session(&HeaderMap::new()).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_garbage_token_is_no_session() {
    let provider = provider(Arc::default());
    let session = provider.get_session(&bearer("not-a-jwt")).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_session_token_resolves() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (token, _) = jwt().issue_token(&user, TokenPurpose::Session).unwrap();

    let session = provider.get_session(&bearer(&token)).await.unwrap();
    assert_eq!(session.map(|s| s.user), Some(user));
}

#[tokio::test]
async fn test_session_from_cookie() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (token, _) = jwt().issue_token(&user, TokenPurpose::Session).unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
    );

    let session = provider.get_session(&headers).await.unwrap();
    assert!(session.is_some());
}

#[tokio::test]
async fn test_magic_link_token_is_not_a_session() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (token, _) = jwt().issue_token(&user, TokenPurpose::MagicLink).unwrap();

    let session = provider.get_session(&bearer(&token)).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_magic_link_round_trip() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = provider(mailer.clone());

    provider
        .sign_in_magic_link("Ada@Example.com")
        .await
        .unwrap();

    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    let (to, subject, body) = &sent[0];
    assert_eq!(to, "ada@example.com");
    assert_eq!(subject, MAGIC_LINK_SUBJECT);
    assert!(body.contains("https://files.example.com/api/v1/auth/magic-link/verify?token="));

    let issued = provider
        .complete_magic_link(&token_from_link(body))
        .await
        .unwrap();
    assert_eq!(issued.session.user, User::from_email("ada@example.com"));

    let session = provider.get_session(&bearer(&issued.token)).await.unwrap();
    assert!(session.is_some());
}

#[tokio::test]
async fn test_magic_link_email_states_lifetime() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = provider(mailer.clone());

    provider.sign_in_magic_link("ada@example.com").await.unwrap();

    let (_, _, body) = mailer.sent.lock().unwrap()[0].clone();
    let minutes = jwt().magic_link_ttl_secs() / 60;
    assert!(body.contains(&format!("expires in {minutes} minutes")), "{body}");
    assert!(body.contains("can only be used once"));
}

#[tokio::test]
async fn test_magic_link_works_once() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = provider(mailer.clone());

    provider.sign_in_magic_link("ada@example.com").await.unwrap();
    let (_, _, body) = mailer.sent.lock().unwrap()[0].clone();
    let token = token_from_link(&body);

    assert!(provider.complete_magic_link(&token).await.is_ok());
    let err = provider.complete_magic_link(&token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidLink));
}

#[tokio::test]
async fn test_separate_links_are_independent() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (first, _) = jwt().issue_token(&user, TokenPurpose::MagicLink).unwrap();
    let (second, _) = jwt().issue_token(&user, TokenPurpose::MagicLink).unwrap();

    assert!(provider.complete_magic_link(&first).await.is_ok());
    assert!(provider.complete_magic_link(&second).await.is_ok());
}

#[tokio::test]
async fn test_magic_link_rejects_bad_address() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = provider(mailer.clone());

    let err = provider.sign_in_magic_link("not an email").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmail));
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_magic_link_mail_failure() {
    let mailer = Arc::new(RecordingMailer {
        fail: true,
        ..RecordingMailer::default()
    });
    let provider = provider(mailer);

    let err = provider
        .sign_in_magic_link("ada@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Email(_)));
}

#[tokio::test]
async fn test_session_token_cannot_complete_magic_link() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (token, _) = jwt().issue_token(&user, TokenPurpose::Session).unwrap();

    let err = provider.complete_magic_link(&token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidLink));
}

#[tokio::test]
async fn test_google_redirect_url() {
    let provider = provider(Arc::default()).with_google(GoogleOAuth {
        client_id: "client-123".to_string(),
        redirect_uri: "https://auth.example.com/callback/google".to_string(),
    });

    let response = provider.sign_in_social("google").await.unwrap();
    assert!(response.redirect);
    assert!(response.url.starts_with(GOOGLE_AUTHORIZE_URL));
    assert!(response.url.contains("client_id=client-123"));
    assert!(response.url.contains(
        "redirect_uri=https%3A%2F%2Fauth.example.com%2Fcallback%2Fgoogle"
    ));
    assert!(response.url.contains("response_type=code"));
    assert!(response.url.contains("state="));
}

#[tokio::test]
async fn test_google_without_client_id() {
    let provider = provider(Arc::default());
    let err = provider.sign_in_social("google").await.unwrap_err();
    assert!(matches!(err, AuthError::ProviderNotConfigured(ref p) if p == "google"));
}

#[tokio::test]
async fn test_unknown_provider() {
    let provider = provider(Arc::default());
    let err = provider.sign_in_social("myspace").await.unwrap_err();
    assert!(matches!(err, AuthError::UnsupportedProvider(ref p) if p == "myspace"));
}

#[tokio::test]
async fn test_sign_out_revokes_token() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (token, _) = jwt().issue_token(&user, TokenPurpose::Session).unwrap();
    let headers = bearer(&token);

    assert!(provider.get_session(&headers).await.unwrap().is_some());
    provider.sign_out(&headers).await.unwrap();
    assert!(provider.get_session(&headers).await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_out_leaves_other_sessions() {
    let provider = provider(Arc::default());
    let user = User::from_email("ada@example.com");
    let (first, _) = jwt().issue_token(&user, TokenPurpose::Session).unwrap();
    let (second, _) = jwt().issue_token(&user, TokenPurpose::Session).unwrap();

    provider.sign_out(&bearer(&first)).await.unwrap();
    assert!(provider.get_session(&bearer(&second)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_sign_out_without_session() {
    let provider = provider(Arc::default());
    assert!(provider.sign_out(&HeaderMap::new()).await.is_ok());
}
