//! Output generation for episode lists.
//!
//! # Submodules
//!
//! - [`markdown`]: sorts episodes and renders the checklist lines
//! - [`file`]: rewrites the local checklist in place for `merge --replace`
//!
//! # Output Format
//!
//! ```text
//! [ ] 06/11 [#38](https://kitoakari-fc.com/live/55)   # unlistened
//! [x] 05/28 [#37](https://kitoakari-fc.com/live/54)   # listened
//! [ ] 05/14 [#36]                                     # no URL yet
//! ```

pub mod file;
pub mod markdown;
