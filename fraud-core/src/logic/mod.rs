//! Logic Module - Offline pipeline and online scoring
//!
//! ## Offline
//! - `dataset/` - CSV loading, seeded train/validation/test split
//! - `preprocessing/` - StandardScaler fit on train only, scaler artifact
//! - `model/` - dense classifier, trainer, threshold, model artifact
//!
//! ## Online
//! - `scoring/` - Ready-state scoring service
//! - `store/` - SQLite prediction log
//!
//! `features/` and `artifact` are shared by both sides.

pub mod artifact;
pub mod dataset;
pub mod features;
pub mod model;
pub mod preprocessing;
pub mod scoring;
pub mod store;
