//! Scene error taxonomy.

use thiserror::Error;

use crate::ephemeris::EphemerisError;
use crate::scene::{DofAxis, NodeId};

/// Errors from scene graph operations.
///
/// Invariant violations are not retried or silently corrected: every variant
/// names the offending node and the rule that was broken.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("scene is locked for rendering: cannot {operation} node {node}")]
    SceneLocked {
        node: NodeId,
        operation: &'static str,
    },

    #[error("node {node} does not exist in this scene")]
    UnknownNode { node: NodeId },

    #[error(
        "cannot set a manual {axis} on node {node}: descendant {descendant} \
         is ephemeris-driven and would be orphaned"
    )]
    ManualOverEphemerisDescendant {
        node: NodeId,
        descendant: NodeId,
        axis: DofAxis,
    },

    #[error(
        "cannot bind {axis} of node {node} to the ephemeris: parent {parent} \
         is manually placed"
    )]
    EphemerisUnderManualParent {
        node: NodeId,
        parent: NodeId,
        axis: DofAxis,
    },

    #[error("cannot set {axis} rate on node {node}: it is derived from the ephemeris")]
    RateFromEphemeris { node: NodeId, axis: DofAxis },

    #[error("node {node} has no ephemeris-driven ancestor for {axis}")]
    NoEphemerisAncestor { node: NodeId, axis: DofAxis },

    #[error("scale components must be nonzero (node {node})")]
    ZeroScale { node: NodeId },

    #[error("cannot remove the scene root")]
    CannotRemoveRoot,

    #[error("node {node} is not a camera")]
    NotACamera { node: NodeId },

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}
