//! Profile configuration for connecting to the warehouse over ODBC, with
//! optional OAuth sign-in through the identity provider.

pub mod config;
