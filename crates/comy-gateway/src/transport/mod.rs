//! WebSocket transport: frame decoding and the per-connection session loop.

pub mod codec;
pub mod ws;
