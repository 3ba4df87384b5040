pub mod deployments;
pub mod health;
