use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = roster_common::id::prefixed_ulid("vw");
/// assert!(id.starts_with("vw_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    /// A viewer session on the `/clients` gateway.
    pub const VIEWER: &str = "vw";
    /// An upstream bridge connection on `/upstream`.
    pub const BRIDGE: &str = "br";
}
