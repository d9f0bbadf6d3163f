use crate::types::error::ClientError;
use crate::types::response::{
    MessageOpenedResponse, RegistrationResponse, UnregistrationResponse,
};

use uuid::Uuid;

/// The push server seam. One method per `action` the server understands;
/// each call is a single form-encoded POST with no retries.
pub trait PushBackend: Clone + Send + Sync + 'static {
    type RegisterFut<'a>: Future<Output = Result<RegistrationResponse, ClientError>> + Send + 'a
    where
        Self: 'a;
    type UnregisterFut<'a>: Future<Output = Result<UnregistrationResponse, ClientError>> + Send + 'a
    where
        Self: 'a;
    type MessageOpenedFut<'a>: Future<Output = Result<MessageOpenedResponse, ClientError>>
        + Send
        + 'a
    where
        Self: 'a;

    /// Registers `token` under the supplied tags. An empty tag slice means
    /// the `tags` field is omitted from the request entirely.
    fn register<'a>(&'a self, token: &'a str, tags: &'a [String]) -> Self::RegisterFut<'a>;

    /// Removes the supplied tags from the registration, or the whole
    /// registration when `tags` is empty.
    fn unregister<'a>(&'a self, token: &'a str, tags: &'a [String]) -> Self::UnregisterFut<'a>;

    /// Records that the message with the supplied UUID was opened.
    fn message_opened<'a>(
        &'a self,
        token: &'a str,
        message_uuid: Uuid,
    ) -> Self::MessageOpenedFut<'a>;
}
