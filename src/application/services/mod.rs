pub mod channel;
pub mod clock;
pub mod policy;
pub mod renderer;
pub mod reporter;
