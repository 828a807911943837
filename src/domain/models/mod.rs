pub mod channel;
pub mod message;
pub mod outcome;
pub mod policy;
pub mod rendered;

pub use channel::ChannelType;
pub use message::{Message, MessageType};
pub use outcome::{ChannelStatus, DeliveryOutcome, SendReport, SkipReason};
pub use policy::PolicyResult;
pub use rendered::{RenderedContent, RenderedEmail, RenderedPushNotification};
