//! Data access and business rules, one module per resource.
//!
//! Functions are generic over [`sea_orm::ConnectionTrait`] so handlers can
//! pass the request transaction.

pub mod challenge;
pub mod course;
pub mod institution;
pub mod user;
