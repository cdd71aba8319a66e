//! Error types for the tracker server binary.
//!
//! [`ServerError`] wraps every failure mode of startup and serving so
//! `main` can propagate with `?`.

/// Top-level error for the tracker server binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hunt_core::ConfigError,
    },

    /// The mob catalog could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: hunt_core::CatalogError,
    },

    /// Connecting to or migrating the store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: hunt_db::StoreError,
    },

    /// The projection could not be loaded.
    #[error("projection error: {source}")]
    Projection {
        /// The underlying projection error.
        #[from]
        source: hunt_projection::ProjectionError,
    },

    /// The HTTP server failed to start or stopped with an error.
    #[error("serve error: {source}")]
    Serve {
        /// The underlying server error.
        #[from]
        source: hunt_api::ServeError,
    },
}
