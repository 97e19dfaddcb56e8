#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// An element size of zero, or one that does not divide the chunk size.
    InvalidElementSize { element_size: usize },
    /// A chunk-internal slot, element index or leaf position outside its domain.
    IndexOutOfRange { index: usize, len: usize },
    /// A vector was built with an element count different from its sedes length.
    LengthMismatch { expected: usize, actual: usize },
    /// A caller-supplied argument outside the operation's domain.
    ArgumentError { message: &'static str },
    /// Adding chunks would exceed the leaf capacity of the tree.
    CapacityExceeded { len: usize, capacity: usize },
    /// An internal consistency check failed. Indicates a bug.
    InvariantViolation { message: &'static str },
}
