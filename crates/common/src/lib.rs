/**
 * Dialable address handling for the multiaddr strings
 *  stored in the node configuration.
 */
pub mod addr;
/**
 * On-disk node configuration shared between the
 *  command-line client and the daemon.
 */
pub mod config;
/**
 * Bounded, cancellable fetching of migration payloads
 *  from a content distribution gateway.
 */
pub mod migrations;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::addr::{dial_args, AddrError, DialArgs};
    pub use crate::config::{Config, ConfigError};
    pub use crate::migrations::{CancelHandle, CancelToken, FetchError, Fetcher, HttpFetcher};
    pub use crate::version::build_info;
}
