//! Step-up Resolver Module
//!
//! This module ranks the authentication methods an application may require,
//! gathers the requests for each login attempt into a transaction, decides
//! whether the attempt must step up to a stronger method and chains the
//! resulting authentications into one composite identity.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
