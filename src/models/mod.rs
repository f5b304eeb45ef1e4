pub mod earnings;
pub mod notification;
pub mod order;
pub mod partner;
pub mod session;
