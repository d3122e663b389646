//! Token ring implementation.
//!
//! The ring maps tokens to the endpoints owning them and provides the
//! clockwise walk every placement algorithm is built on.

pub mod ring;

pub use ring::TokenRing;
