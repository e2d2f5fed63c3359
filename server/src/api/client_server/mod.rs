mod feed;
mod post;

pub use feed::*;
pub use post::*;
