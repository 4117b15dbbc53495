//! ScreenLogic bridge library.
//!
//! Polls a Pentair ScreenLogic pool/spa controller and exposes its
//! temperature sensors and circuits as home-automation accessories.

pub mod accessory;
pub mod config;
pub mod controller;
pub mod error;
pub mod platform;
pub mod temperature;

pub use error::{BridgeError, ControllerError, Result};
pub use platform::Platform;
