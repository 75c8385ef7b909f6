pub mod health_dto;
pub mod response_dto;
