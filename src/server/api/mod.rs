pub mod health_controller;
pub mod stream_controller;
