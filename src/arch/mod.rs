//! # Architecture Abstraction Layer
//!
//! Board-support boundary for the scheduler: tick-source hookup and
//! the idle primitive. Currently implements the Cortex-M4 port;
//! extensible to other architectures by adding sibling modules.

pub mod cortex_m4;
