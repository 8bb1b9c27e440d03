#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod features;
pub mod observability;
pub mod recommend;
pub mod scenario;
