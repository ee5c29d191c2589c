//! Tree liveness probe: counts the nodes of a tree that are reachable from its root.
//!
//! The root sends an [`Announce`](messages::Announce) to itself. Every node forwards the announce to
//! its children, waits for a [`Reply`](messages::Reply) from each, and replies to its parent with the
//! size of its reachable subtree (itself plus the sizes its children replied with). Leaves reply with 1
//! right away. The root publishes the total.
//!
//! A child that does not reply within [`reply_timeout`](protocol::CountConfiguration::reply_timeout)
//! contributes nothing, so the total is smaller than the tree when some nodes are down.

pub mod messages;

pub mod protocol;
