//! Speech provider implementations of [`TtsProvider`](narrator_core::TtsProvider).
//!
//! | Provider | Module | Network |
//! |---|---|---|
//! | [`HttpTtsProvider`] | [`http`] | yes |
//! | [`ToneProvider`] | [`tone`] | no |

pub mod http;
pub mod tone;

pub use http::{HttpTtsConfig, HttpTtsProvider};
pub use tone::ToneProvider;
