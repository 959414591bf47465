// # Local Address Sources
//
// Address sources that never leave the host:
//
// - [`CommandSource`]: runs a user-supplied shell command and takes its
//   trimmed stdout as the address
// - [`InterfaceSource`]: reads the first address of the requested family
//   from a named network interface
//
// Both are complete strategies. A failure is final for the invocation and
// never falls through to public detection.

mod command;
mod interface;

pub use command::{CommandSource, DEFAULT_COMMAND_TIMEOUT};
pub use interface::InterfaceSource;
