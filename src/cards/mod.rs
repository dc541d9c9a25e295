//! Card instances and their data bags.
//!
//! ## Key Types
//!
//! - `Card`: a card on the board (id, definition id, data bag)
//! - `DataValue` / `CardData`: the free-form instance data

pub mod card;
pub mod data;

pub use card::Card;
pub use data::{data_from_json, CardData, DataValue, KEY_AMOUNT, KEY_CHARGES, KEY_TASK_ID, KEY_TITLE};
