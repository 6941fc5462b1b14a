//! Model to entity mappers
//!
//! `From<Model> for Entity` conversions from database rows to domain objects.

mod refresh_token;
mod user;
