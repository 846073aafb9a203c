//! Human-readable rendering of MongoDB driver errors.
//!
//! The export tool only reads from MongoDB, so the interesting failures are
//! connection, authentication, command and GridFS errors. They are rendered as
//! a single line so they fit next to per-asset warnings in the log.

/// Describe a MongoDB error on one line using the driver's typed error kinds.
pub fn describe_mongodb_error(error: &mongodb::error::Error) -> String {
    use mongodb::error::ErrorKind;

    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            let name = get_error_name(command_error.code)
                .unwrap_or_else(|| command_error.code_name.clone());
            format!(
                "MongoDB command failed ({name}, code {}): {}",
                command_error.code, command_error.message
            )
        }
        ErrorKind::Authentication { message, .. } => {
            format!("MongoDB authentication failed: {message}")
        }
        ErrorKind::ServerSelection { message, .. } => {
            format!("No reachable MongoDB server: {message}")
        }
        ErrorKind::InvalidArgument { message, .. } => {
            format!("Invalid MongoDB argument: {message}")
        }
        ErrorKind::Io(io_error) => format!("MongoDB I/O error: {io_error}"),
        ErrorKind::GridFs(gridfs_error) => format!("GridFS error: {gridfs_error:?}"),
        _ => format!("MongoDB error: {error}"),
    }
}

/// Get a human-readable error name from a MongoDB error code.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        43 => "CursorNotFound",
        50 => "MaxTimeMSExpired",
        _ => return None,
    };

    Some(name.to_string())
}
