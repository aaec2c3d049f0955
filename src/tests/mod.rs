//! Integration tests for the access layer
//!
//! Exercise the resolvers, authorizer, caches and sweeper together through
//! [`AccessComponents`](crate::auth::AccessComponents), the way the server
//! wires them.
