use std::pin::Pin;
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::ports;
use crate::types::error::ClientError;
use crate::types::response::{
    MessageOpenedResponse, MessageOpenedResult, RegistrationResponse, RegistrationResult,
    UnregistrationResponse, UnregistrationResult,
};

const RESPONSE_CODE_OK: u16 = 200;
const RESPONSE_CODE_CREATED: u16 = 201;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl ports::TimeProvider for SystemTimeProvider {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Token provider for embedders that obtain the platform token themselves
/// and hand it to the client. `invalidate` has nothing to release.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Arc<str>,
}

impl StaticTokenProvider {
    pub fn new(token: &str) -> Self {
        Self {
            token: Arc::from(token),
        }
    }
}

impl ports::TokenProvider for StaticTokenProvider {
    type TokenFut<'a>
        = std::future::Ready<Result<String, ClientError>>
    where
        Self: 'a;
    type InvalidateFut<'a>
        = std::future::Ready<Result<(), ClientError>>
    where
        Self: 'a;

    fn token<'a>(&'a self) -> Self::TokenFut<'a> {
        std::future::ready(Ok(self.token.to_string()))
    }

    fn invalidate<'a>(&'a self) -> Self::InvalidateFut<'a> {
        log::debug!("static token provider has nothing to invalidate");
        std::future::ready(Ok(()))
    }
}

/// The production backend: one form-encoded POST per call against the single
/// push server endpoint, over a shared connection pool.
#[derive(Clone)]
pub struct HttpPushBackend {
    server_url: String,
    app_id: String,
    client_secret: String,
    platform: String,
    client: Arc<reqwest::Client>,
}

impl HttpPushBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok(Self {
            server_url: config.server_url.clone(),
            app_id: config.app_id.clone(),
            client_secret: config.client_secret.clone(),
            platform: config.platform.clone(),
            client: Arc::new(client),
        })
    }

    async fn post_form(
        &self,
        action: &str,
        token: &str,
        extra: &[(&str, &str)],
    ) -> Result<(u16, String), ClientError> {
        let mut fields = vec![
            ("action", action),
            ("appId", self.app_id.as_str()),
            ("clientSecret", self.client_secret.as_str()),
            ("type", self.platform.as_str()),
            ("token", token),
        ];
        fields.extend_from_slice(extra);

        let response = self
            .client
            .post(&self.server_url)
            .form(&fields)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        let code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok((code, body))
    }

    async fn register_call(
        &self,
        token: &str,
        tags: &[String],
    ) -> Result<RegistrationResponse, ClientError> {
        let joined = tags.join(",");
        let mut extra: Vec<(&str, &str)> = Vec::new();
        if !tags.is_empty() {
            extra.push(("tags", joined.as_str()));
        }
        let (code, body) = self.post_form("register", token, &extra).await?;

        let result = match code {
            RESPONSE_CODE_CREATED => {
                log::info!("registered push client");
                RegistrationResult::Registered
            }
            RESPONSE_CODE_OK => {
                log::info!("push client registration refreshed");
                RegistrationResult::Refreshed
            }
            _ => return Err(ClientError::UnexpectedStatus { code, body }),
        };

        let parsed: RegisterBody = serde_json::from_str(&body)
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))?;
        let client_uuid = Uuid::parse_str(&parsed.client_uuid)
            .map_err(|err| ClientError::MalformedResponse(format!("invalid clientUuid: {err}")))?;

        Ok(RegistrationResponse {
            client_uuid,
            result,
        })
    }

    async fn unregister_call(
        &self,
        token: &str,
        tags: &[String],
    ) -> Result<UnregistrationResponse, ClientError> {
        let joined = tags.join(",");
        let mut extra: Vec<(&str, &str)> = Vec::new();
        if !tags.is_empty() {
            extra.push(("tags", joined.as_str()));
        }
        let (code, body) = self.post_form("unregister", token, &extra).await?;

        if code != RESPONSE_CODE_OK {
            return Err(ClientError::UnexpectedStatus { code, body });
        }
        log::info!("unregistration successful");
        Ok(UnregistrationResponse {
            result: UnregistrationResult::Ok,
        })
    }

    async fn message_opened_call(
        &self,
        token: &str,
        message_uuid: Uuid,
    ) -> Result<MessageOpenedResponse, ClientError> {
        let uuid = message_uuid.to_string();
        let (code, body) = self
            .post_form("message_opened", token, &[("uuid", uuid.as_str())])
            .await?;

        if code != RESPONSE_CODE_OK {
            return Err(ClientError::UnexpectedStatus { code, body });
        }
        Ok(MessageOpenedResponse {
            result: MessageOpenedResult::Ok,
        })
    }
}

#[derive(serde::Deserialize)]
struct RegisterBody {
    #[serde(rename = "clientUuid")]
    client_uuid: String,
}

impl ports::PushBackend for HttpPushBackend {
    type RegisterFut<'a>
        = Pin<Box<dyn Future<Output = Result<RegistrationResponse, ClientError>> + Send + 'a>>
    where
        Self: 'a;
    type UnregisterFut<'a>
        = Pin<Box<dyn Future<Output = Result<UnregistrationResponse, ClientError>> + Send + 'a>>
    where
        Self: 'a;
    type MessageOpenedFut<'a>
        = Pin<Box<dyn Future<Output = Result<MessageOpenedResponse, ClientError>> + Send + 'a>>
    where
        Self: 'a;

    fn register<'a>(&'a self, token: &'a str, tags: &'a [String]) -> Self::RegisterFut<'a> {
        Box::pin(self.register_call(token, tags))
    }

    fn unregister<'a>(&'a self, token: &'a str, tags: &'a [String]) -> Self::UnregisterFut<'a> {
        Box::pin(self.unregister_call(token, tags))
    }

    fn message_opened<'a>(
        &'a self,
        token: &'a str,
        message_uuid: Uuid,
    ) -> Self::MessageOpenedFut<'a> {
        Box::pin(self.message_opened_call(token, message_uuid))
    }
}
