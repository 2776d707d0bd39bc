// Device connection state

pub mod status;
