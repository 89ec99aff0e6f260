//! Infrastructure layer - External service implementations

pub mod audit;
pub mod invocation;
pub mod logging;
pub mod notifier;
pub mod services;
pub mod storage;
