//! Configuration section definitions.
//!
//! Each module corresponds to one or more sections in `sitepipe.toml`:
//!
//! | Module   | TOML Section                                            |
//! |----------|---------------------------------------------------------|
//! | `paths`  | `[paths]`                                               |
//! | `styles` | `[styles]`                                              |
//! | `assets` | `[html]` `[scripts]` `[images]` `[svg]` `[sprite]` `[copy]` |
//! | `serve`  | `[serve]`                                               |

mod assets;
mod paths;
mod serve;
mod styles;

pub use assets::{CopyConfig, HtmlConfig, ImagesConfig, ScriptsConfig, SpriteConfig, SvgConfig};
pub use paths::PathsConfig;
pub use serve::ServeConfig;
pub use styles::{BrowserTargets, INPUT_PLACEHOLDER, StylesConfig};
