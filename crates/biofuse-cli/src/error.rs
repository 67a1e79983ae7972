//! Exit-code mapping for the CLI.

use biofuse_core::FusionError;

/// Map a top-level error to a process exit code.
///
/// Fatal model errors (unreadable or malformed configuration) exit with 2;
/// everything else, including recoverable input-shape errors, exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FusionError>() {
        Some(fusion_err) if fusion_err.is_fatal() => 2,
        _ => 1,
    }
}
