//! wsp-s3: S3 SDK adapter for wsp
//!
//! Implements the `ObjectStore` trait from wsp-core on top of aws-sdk-s3,
//! for AWS S3 and S3-compatible stores reachable through an endpoint override.

mod client;

pub use client::S3Client;
