pub mod framing;
pub mod game_session;
pub mod pid;
pub mod protocol;
pub mod session;
pub mod tls;
pub mod transport;
