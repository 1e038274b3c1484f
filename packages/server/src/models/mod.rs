pub mod auth;
pub mod challenge;
pub mod course;
pub mod institution;
pub mod shared;
pub mod user;
