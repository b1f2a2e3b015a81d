//! Byte-level infrastructure shared by the command protocol and the image
//! framing paths.
pub mod crc;
pub mod hex;
