pub mod generator;
pub mod lifecycle;
pub mod notifications;
pub mod policy;
pub mod timers;
