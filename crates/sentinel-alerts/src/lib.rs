pub mod escape;
pub mod policy;
pub mod transport;

pub use policy::AlertPolicy;
pub use transport::{dispatch, ChatTransport, Transport, WebhookTransport};
