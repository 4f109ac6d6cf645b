use smallvec::SmallVec;
pub mod integer;

/// A small, stack-allocated-first buffer used by synchronous serializers.
///
/// Backed by `smallvec`, this stores up to 32 bytes inline before spilling to the heap.
pub type DynBuf = SmallVec<[u8; 32]>;
