//! HTTP handlers for resource CRUD and the review/publish workflow.

pub mod resource;
