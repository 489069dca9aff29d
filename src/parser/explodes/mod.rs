//! Per-family descriptor parsers.
//!
//! Each module exposes `explode_*` functions with the same shape: scan a
//! whole text for descriptors of one family, append every candidate that
//! survives validation, and report whether anything was added. Malformed
//! descriptors are never fatal to the batch.

pub mod clash;
pub mod hysteria2;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod vless;
pub mod vmess;

pub use clash::explode_clash;
pub use hysteria2::explode_hysteria2;
pub use ss::explode_ss;
pub use ssr::explode_ssr;
pub use trojan::explode_trojan;
pub use vless::explode_vless;
pub use vmess::explode_vmess;
