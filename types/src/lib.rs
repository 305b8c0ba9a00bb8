pub mod beacon_state;
pub mod config;
pub mod consts;
pub mod containers;
pub mod nonstandard;
pub mod primitives;
