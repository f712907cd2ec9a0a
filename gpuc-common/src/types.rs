//! Identifiers shared by every compiler phase

/// Label identifier for basic blocks
pub type LabelId = u32;

/// Temporary value identifier for IR
pub type TempId = u32;
