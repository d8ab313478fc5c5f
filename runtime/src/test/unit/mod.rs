pub mod context;
pub mod dispatch;
pub mod scenario;
