//! Article discovery and text extraction.
//!
//! Follows a two-phase pattern:
//!
//! 1. **Indexing**: list candidate articles for a topic ([`newsapi`])
//! 2. **Fetching**: download each article page and keep its paragraph text
//!    ([`article`])
//!
//! | Module | Source | Method |
//! |--------|--------|--------|
//! | [`newsapi`] | NewsAPI v2 | JSON API (`/top-headlines`, `/everything`) |
//! | [`article`] | any publisher | HTML scraping of `<p>` elements |

pub mod article;
pub mod newsapi;
