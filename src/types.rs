pub mod error;
pub mod response;

pub use error::ClientError;
pub use response::{
    MessageOpenedResponse, MessageOpenedResult, RegistrationResponse, RegistrationResult,
    UnregistrationResponse, UnregistrationResult,
};
