//! svcgate: HTTP gateway for diffusion-based singing voice conversion

pub mod http;
