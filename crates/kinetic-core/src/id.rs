use slotmap::new_key_type;

new_key_type! {
    /// Identifies a kinetic network in a [`NetworkIndex`](crate::index::NetworkIndex).
    ///
    /// Keys are generational: once a network is merged away, split, or
    /// emptied, its id never resolves again.
    pub struct NetworkId;
}
