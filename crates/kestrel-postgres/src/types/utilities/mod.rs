//! Helpers shared by the models.

mod string_map;
mod time_helpers;

pub use string_map::{from_string_map, jsonb_text_len, to_string_map};
pub use time_helpers::{HasCreatedAt, HasDeletedAt, HasLastCheck, HasUpdatedAt};
