//! Pluggable tree-structured networking.
//!
//! The host supplies the transport by implementing [`Network`](network::Network). Protocols in this
//! crate never talk to the transport directly: they send through a tree-aware handle
//! (`unicast`, `send_to_parent`, `send_to_children`, ...) and receive through a selective, signal-aware
//! inbox stub, both owned by their [`TreeNodeInstance`](crate::instance::TreeNodeInstance).

pub mod network;

pub mod messages;

pub(crate) mod receiving;

pub mod sending;
