//! Words, flashcards and decks
//!
//! This module provides:
//! - The record types stored in the relational store
//! - Drafts and patches used to create and edit them
//! - Sort columns for each paginated collection

pub mod models;

pub use models::*;
