pub mod collector;
pub mod hardware_port;
pub mod interfaces;
pub mod probe;
pub mod public_ip;
