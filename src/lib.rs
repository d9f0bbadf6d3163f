pub mod adapters;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod ports;
pub mod store;
pub mod types;

pub use client::StarFlightClient;
pub use config::ClientConfig;
pub use executor::{
    CallbackDriver, CallbackQueue, SharedCallback, StarFlightCallback, callback_queue,
};
pub use types::{
    ClientError, MessageOpenedResponse, MessageOpenedResult, RegistrationResponse,
    RegistrationResult, UnregistrationResponse, UnregistrationResult,
};
