//! # Módulo HTTP
//!
//! El servidor no parsea requests: cualquier dato recibido es solo el
//! disparador para enviar una respuesta fija. Este módulo se encarga de
//! construir esa respuesta y convertirla a bytes.
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 18\r\n
//! \r\n
//! Hello from server!
//! ```
//!
//! La única garantía que importa byte a byte es que `Content-Length`
//! coincida con el largo real del body.

pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

pub use response::Response;
pub use status::StatusCode;
