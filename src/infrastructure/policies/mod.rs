pub mod deny_list;
pub mod require_address;
