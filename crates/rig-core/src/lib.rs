//! # rig-core
//!
//! Core types, checklist catalog and disposition rules for Rigcheck.
//!
//! This crate provides the foundational types shared across all Rigcheck crates:
//! - Entity structs (checklist records, answers, approvals, rejections, equipment)
//! - Status enums with the checklist transition table
//! - The static checklist catalog
//! - Answer aggregation and the disposition resolver
//! - Submission validation
//! - The equipment status projection
//! - Actor identity and the role permission policy
//! - View types consumed by list/detail screens

pub mod aggregate;
pub mod catalog;
pub mod disposition;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod projection;
pub mod responses;
pub mod validation;
