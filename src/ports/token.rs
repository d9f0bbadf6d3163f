use crate::types::error::ClientError;

/// The platform messaging seam. The platform service issues an opaque
/// registration token for this installation; obtaining and releasing it is
/// entirely the platform's business.
pub trait TokenProvider: Clone + Send + Sync + 'static {
    type TokenFut<'a>: Future<Output = Result<String, ClientError>> + Send + 'a
    where
        Self: 'a;
    type InvalidateFut<'a>: Future<Output = Result<(), ClientError>> + Send + 'a
    where
        Self: 'a;

    fn token<'a>(&'a self) -> Self::TokenFut<'a>;

    /// Releases the platform-level registration, after a full unregister.
    fn invalidate<'a>(&'a self) -> Self::InvalidateFut<'a>;
}
