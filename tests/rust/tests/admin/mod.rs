//! Feature component tests
//!
//! Request -> backend -> result round trips through the mediator for the
//! authentication, resource and page shell components.

mod auth;
mod resource;
