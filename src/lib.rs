//! crmlens: look at CRM API payloads as charts, insights and raw JSON.
//!
//! The core is a pure pipeline: [`shape::classify`] a decoded body, then turn
//! the shape into a [`chart::ChartSpec`] and an [`insight::InsightSet`], and
//! hand both to a [`render::DisplaySurface`]. Around it sit the HTTP
//! [`client`], the layered [`config`], the JSONL call log in [`analytics`],
//! the background [`monitor`], and the terminal and web front ends.

pub mod analytics;
pub mod chart;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod insight;
pub mod monitor;
pub mod pipeline;
pub mod render;
pub mod shape;
pub mod web;

pub use error::ApiError;
