//! Canonical team names
//!
//! Two teams collide when their names are equal after trimming the ends and
//! folding case. Whitespace inside the name is significant: `"mixed case"`
//! and `"mixed  case"` are different teams.

/// Comparison key for a team display name.
///
/// Detection and member lookup both bucket teams by this key in Rust, so the
/// result does not depend on how a backend implements `TRIM` or `UPPER`.
pub fn canonical_key(name: &str) -> String {
    name.trim().to_uppercase()
}
