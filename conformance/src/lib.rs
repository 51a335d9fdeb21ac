//! Code generated by `json-msggen` from `fixtures/`, compiled as ordinary Rust.

#[allow(dead_code, clippy::all)]
pub mod lsp {
    use json_msggen::runtime::*;

    include!(concat!(env!("OUT_DIR"), "/lsp.rs"));
}
