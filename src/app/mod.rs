// georepd - app/mod.rs
//
// Application layer: the watermark cell, snapshot lifecycle, the
// transfer seam, and the poll loop that drives a replication cycle.
// Dependencies: core and platform layers.

pub mod poller;
pub mod snapshot;
pub mod syncer;
pub mod watermark;
