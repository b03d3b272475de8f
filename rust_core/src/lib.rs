// Core modules (used by services)
pub mod boost;
pub mod db;
pub mod error;
pub mod feed_archiver;
pub mod market_mapping;
pub mod models;
pub mod publisher;
pub mod redis;
pub mod tenant_index;
pub mod urn;
