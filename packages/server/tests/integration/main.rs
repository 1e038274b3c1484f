
mod auth;
mod challenge;
mod course;
mod upload;
mod user;
