use uuid::Uuid;

/// Outcome of a register or refresh call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub client_uuid: Uuid,
    pub result: RegistrationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationResult {
    /// A new registration was created on the server.
    Registered,
    /// The device was already registered and the server refreshed it.
    Refreshed,
    /// The stored registration is current; no request was made.
    AlreadyRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnregistrationResponse {
    pub result: UnregistrationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnregistrationResult {
    Ok,
    /// The device was not registered in the first place.
    NotRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOpenedResponse {
    pub result: MessageOpenedResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOpenedResult {
    Ok,
    /// The opening of this message had already been recorded.
    AlreadyOpened,
}
