pub mod conversations;
pub mod health;
pub mod interactions;
pub mod metrics;
