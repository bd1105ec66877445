//! In-memory asset transformations.
//!
//! Every function here is synchronous and pure over bytes or text; tasks own
//! file I/O and run these on the blocking pool.
//!
//! | Module     | Input                 | Processor                      |
//! |------------|-----------------------|--------------------------------|
//! | `css`      | stylesheet entry      | lightningcss bundle, minify, map |
//! | `js`       | classic script        | oxc minifier + mangler         |
//! | `html`     | markup                | tl parse + whitespace collapse |
//! | `raster`   | PNG / JPEG            | image re-encode, WebP encode   |
//! | `svg`      | standalone SVG        | usvg normalized write          |
//! | `sprite`   | optimized icons       | quick-xml symbol extraction    |

pub mod css;
pub mod html;
pub mod js;
pub mod raster;
pub mod sprite;
pub mod svg;

use thiserror::Error;

/// A processor rejected its input.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("stylesheet: {0}")]
    Css(String),

    #[error("preprocessor: {0}")]
    Preprocessor(String),

    #[error("script: {0}")]
    Script(String),

    #[error("input is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("not a PNG or JPEG image")]
    UnsupportedImage,

    #[error("svg: {0}")]
    Svg(#[from] usvg::Error),

    #[error("sprite: {0}")]
    Sprite(String),
}
