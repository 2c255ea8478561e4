pub mod aggregate;
pub mod banner;
pub mod discovery;
pub mod network;
pub mod pool;
pub mod scanner;
pub mod session;

pub use banner::grab_banner;
pub use discovery::discover;
pub use scanner::scan_ports;
pub use session::{ScanConfig, Session};
