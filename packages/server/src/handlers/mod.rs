pub mod auth;
pub mod challenge;
pub mod content;
pub mod course;
pub mod health;
pub mod institution;
pub mod upload;
pub mod user;
