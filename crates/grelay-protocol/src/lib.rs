//! Wire types for the canonical chat protocol and each upstream family.
//!
//! Types here only describe JSON shapes. Conversion between them lives in
//! `grelay-transform`.

pub mod claude;
pub mod openai;
pub mod scholarai;
pub mod sse;
