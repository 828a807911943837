pub mod delivery_scheduler;
