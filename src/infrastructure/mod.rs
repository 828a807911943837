pub mod channels;
pub mod monitoring;
pub mod plugins;
pub mod policies;
pub mod rendering;
