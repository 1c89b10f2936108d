// georepd - platform/mod.rs
//
// Platform abstraction layer: extended-attribute access and
// configuration loading.
// Dependencies: standard library, xattr, toml, directories.
// Must NOT depend on: core or app layers.

pub mod attr;
pub mod config;
