//! # StackOverflow Tokenizer
//!
//! Converts space separated token strings into padded next-token
//! `x`/`y` id arrays.
//!
//! ```rust
//! use fedstack::{
//!     examples::{Examples, Feature},
//!     tokenizer::TokenizerOptions,
//! };
//!
//! let tokenizer = TokenizerOptions::default().build(&["a", "b"]).unwrap();
//! let batch = Examples::new().with_feature("tokens", Feature::bytes_from(["a b"]));
//!
//! let out = tokenizer.as_preprocess_batch(4).apply(&batch).unwrap();
//! assert_eq!(out.get("x").unwrap().row(0), Some([1, 3, 4, 0].as_slice()));
//! assert_eq!(out.get("y").unwrap().row(0), Some([3, 4, 2, 0].as_slice()));
//! ```

mod preprocess_batch;
mod stackoverflow_tokenizer;
mod tokenizer_options;
mod vocab_table;

#[doc(inline)]
pub use preprocess_batch::*;
#[doc(inline)]
pub use stackoverflow_tokenizer::*;
#[doc(inline)]
pub use tokenizer_options::*;
#[doc(inline)]
pub use vocab_table::*;
