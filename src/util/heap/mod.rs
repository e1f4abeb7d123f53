pub mod oob_trigger;
