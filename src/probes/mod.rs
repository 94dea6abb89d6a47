pub mod helper;
pub mod mysql;
pub mod mysql_handshake;

pub use mysql::{detect_mysql, MysqlProbe};
pub use mysql_handshake::{decode, HandshakeRecord};
