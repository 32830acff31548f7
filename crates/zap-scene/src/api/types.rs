use slotmap::new_key_type;

new_key_type! {
    /// Identifier for a node in the scene's node arena.
    pub struct NodeId;

    /// Identifier for a layer in a scene.
    pub struct LayerId;
}

/// Non-owning back-reference from a node to whatever holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// Child of another node.
    Node(NodeId),
    /// Root of a layer.
    Layer(LayerId),
}

impl ParentRef {
    pub fn node(self) -> Option<NodeId> {
        match self {
            ParentRef::Node(id) => Some(id),
            ParentRef::Layer(_) => None,
        }
    }

    pub fn layer(self) -> Option<LayerId> {
        match self {
            ParentRef::Layer(id) => Some(id),
            ParentRef::Node(_) => None,
        }
    }
}
