pub mod dispatch;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod views;

// Re-export the router builder to make it easily accessible
// to the binary that starts the web server.
pub use rest::router;
